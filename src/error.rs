//src/error.rs

use std::path::PathBuf;

/// Errors raised while reading inputs or building the report.
///
/// Every variant is fatal for the run: the pipeline never skips a bad row.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed delimited data in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{}:{line}: expected {expected} fields, found {found}", .path.display())]
    FieldCount {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("{}:{line}: malformed composite identifier {value:?}: {reason}", .path.display())]
    MalformedCompositeId {
        path: PathBuf,
        line: u64,
        value: String,
        reason: CompositeIdError,
    },

    #[error("{}:{line}: column `{column}` is not a number: {value:?}", .path.display())]
    InvalidNumber {
        path: PathBuf,
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("column `{column}` not found in metadata")]
    ColumnNotFound { column: String },

    #[error("invalid filter {0:?}, expected FIELD=VALUE")]
    InvalidFilter(String),

    #[error("invalid histogram range: lower {lower} must be below upper {upper} with at least one bin")]
    InvalidHistogram { lower: f64, upper: f64 },
}

/// Why a composite `sample.sequence` identifier was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CompositeIdError {
    #[error("no `.` separator")]
    MissingSeparator,
    #[error("more than one `.` separator")]
    RepeatedSeparator,
    #[error("empty sample identifier")]
    EmptySample,
    #[error("empty sequence number")]
    EmptySequenceNumber,
}

impl ReportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReportError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        ReportError::Csv {
            path: path.into(),
            source,
        }
    }
}
