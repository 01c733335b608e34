//! CLI command implementations.

pub mod check;
pub mod common;
pub mod config;
pub mod download;
pub mod duplicates;
pub mod list;
