//! Error types for reference data loading and validation

use crate::vocab::StrideCategory;
use std::path::PathBuf;

/// Reference data store is unusable
///
/// Every variant is fatal for an analysis run: scoring and mapping cannot
/// proceed safely on partial tables.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceDataError {
    /// A required table is absent or empty
    #[error("reference data is missing required table '{0}'")]
    MissingTable(&'static str),

    /// No base score for a STRIDE category
    #[error("reference data has no base score for {0}")]
    MissingBaseScore(StrideCategory),

    /// A table entry holds an unusable value
    #[error("invalid value in '{table}' for '{key}': {reason}")]
    InvalidValue {
        table: &'static str,
        key: String,
        reason: String,
    },

    /// File could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document could not be decoded
    #[error("failed to parse {origin}: {message}")]
    Parse { origin: String, message: String },
}

impl ReferenceDataError {
    /// Create invalid value error
    #[inline]
    pub fn invalid(table: &'static str, key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            table,
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create parse error
    #[inline]
    pub fn parse(origin: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Parse {
            origin: origin.into(),
            message: err.to_string(),
        }
    }

    /// Create I/O error for a path
    #[inline]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
