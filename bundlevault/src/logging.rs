//! Logging setup.
//!
//! Installs a global `tracing` subscriber with a stderr layer filtered by
//! `RUST_LOG` and an optional plain-text file layer. Timestamps use the
//! local UTC offset when it can be determined.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::UtcOffset;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::{self, time::OffsetTime};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Name of the log file inside the log directory.
pub const LOG_FILE_NAME: &str = "bundlevault.log";

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Filter for the file layer: full detail for this crate, info elsewhere.
const FILE_FILTER: &str = "info,bundlevault=debug";

#[derive(Debug, Error)]
pub enum LogError {
    #[error("logging already initialized")]
    AlreadyInitialized,
    #[error("failed to create log directory {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

/// Logging options.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Lower the default stderr level from `info` to `debug`.
    pub verbose: bool,
    /// Also write to `<dir>/bundlevault.log`.
    pub log_dir: Option<PathBuf>,
    /// Colour the stderr output.
    pub ansi: bool,
}

/// Keeps the file writer alive; drop it at process exit to flush.
#[derive(Debug)]
pub struct LoggingGuard {
    log_file: Option<PathBuf>,
    _worker: Option<WorkerGuard>,
}

impl LoggingGuard {
    /// Path of the log file, when file logging is enabled.
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

/// Install the global subscriber.
///
/// Fails with [`LogError::AlreadyInitialized`] if a global subscriber is
/// already set.
pub fn init_logging(options: LogOptions) -> Result<LoggingGuard, LogError> {
    let default_level = if options.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_ansi(options.ansi)
        .with_timer(local_timer())
        .with_writer(io::stderr)
        .with_filter(filter);

    let (file_layer, worker, log_file) = match &options.log_dir {
        Some(dir) => {
            fs::create_dir_all(dir).map_err(|source| LogError::Io {
                path: dir.clone(),
                source,
            })?;
            let (writer, worker) = tracing_appender::non_blocking(rolling::never(dir, LOG_FILE_NAME));
            let layer = fmt::layer()
                .with_ansi(false)
                .with_timer(local_timer())
                .with_writer(writer)
                .with_filter(EnvFilter::new(FILE_FILTER));
            (Some(layer), Some(worker), Some(dir.join(LOG_FILE_NAME)))
        }
        None => (None, None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|_| LogError::AlreadyInitialized)?;

    Ok(LoggingGuard {
        log_file,
        _worker: worker,
    })
}

fn local_timer() -> OffsetTime<&'static [BorrowedFormatItem<'static>]> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, TIMESTAMP_FORMAT)
}
