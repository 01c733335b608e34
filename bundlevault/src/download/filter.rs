//! Asset selection by label.

use std::fmt;

use crate::catalog::AssetReference;

/// Include/exclude lists over asset labels (`flac`, `mp3`, `album`,
/// `game`, `other`).
///
/// An empty `only` list admits every label. `exclude` always wins over
/// `only`. Labels compare case-insensitively. An unlabelled asset passes
/// only when `only` is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelFilter {
    only: Vec<String>,
    exclude: Vec<String>,
}

impl LabelFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict downloads to these labels.
    pub fn with_only<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.only = normalise(labels);
        self
    }

    /// Never download these labels.
    pub fn with_exclude<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude = normalise(labels);
        self
    }

    /// Parse a comma-separated label list, as written in the config file.
    pub fn parse_list(text: &str) -> Vec<String> {
        normalise(text.split(','))
    }

    pub fn only(&self) -> &[String] {
        &self.only
    }

    pub fn exclude(&self) -> &[String] {
        &self.exclude
    }

    /// Whether the filter admits everything.
    pub fn is_empty(&self) -> bool {
        self.only.is_empty() && self.exclude.is_empty()
    }

    /// Whether an asset passes the filter.
    pub fn allows(&self, asset: &AssetReference) -> bool {
        let label = asset.label.as_deref().map(str::to_lowercase);
        match label {
            Some(label) => {
                !self.exclude.contains(&label)
                    && (self.only.is_empty() || self.only.contains(&label))
            }
            None => self.only.is_empty(),
        }
    }
}

impl fmt::Display for LabelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "all");
        }
        if !self.only.is_empty() {
            write!(f, "only {}", self.only.join(","))?;
        }
        if !self.exclude.is_empty() {
            if !self.only.is_empty() {
                write!(f, ", ")?;
            }
            write!(f, "except {}", self.exclude.join(","))?;
        }
        Ok(())
    }
}

fn normalise<I, S>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for label in labels {
        let label = label.as_ref().trim().to_lowercase();
        if !label.is_empty() && !out.contains(&label) {
            out.push(label);
        }
    }
    out
}
