//! Error taxonomy of the analysis core.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed cause carried by provider and rule failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that abort an analysis run.
#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("unsupported target: {0} (expected trpc or next-trpc)")]
    UnsupportedTarget(String),
    #[error("failed to load sources under {}: {source}", root.display())]
    Provider {
        root: PathBuf,
        #[source]
        source: BoxError,
    },
    #[error("rule '{rule}' failed on {subject}: {source}")]
    RuleFailed {
        rule: String,
        subject: String,
        #[source]
        source: BoxError,
    },
}

impl AnalyzeError {
    /// Whether this error was raised before any file was processed.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AnalyzeError::InvalidPattern { .. }
                | AnalyzeError::Configuration(_)
                | AnalyzeError::UnsupportedTarget(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AnalyzeError>;
