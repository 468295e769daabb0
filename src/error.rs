use std::path::PathBuf;

/// Failures that abort an analysis before any estimate is produced.
///
/// Statistics which cannot be estimated (an empty row, a single sample) are not errors, they are
/// reported as undefined values in [`crate::margin::Estimate`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("the error matrix must contain at least one class")]
    Empty,
    #[error("the error matrix must be square, found {rows} rows and {columns} columns")]
    NotSquare { rows: usize, columns: usize },
    #[error("error matrix row {row} has {found} entries, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("{what} has length {found}, expected one entry per class ({expected})")]
    LengthMismatch {
        what: &'static str,
        found: usize,
        expected: usize,
    },
    #[error("{what} contains a non-finite value at {index:?}")]
    NonFinite { what: &'static str, index: Vec<usize> },
    #[error("{what} contains a negative value at {index:?}")]
    NegativeValue { what: &'static str, index: Vec<usize> },
    #[error("pixel size must be positive and finite")]
    InvalidPixelSize,
    #[error("confidence level must lie strictly between 0 and 1")]
    InvalidConfidenceLevel,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to access {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error stems from the values supplied to the analysis, rather than from reading
    /// or writing files.
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        !matches!(self, Self::Io { .. } | Self::Toml(_) | Self::Csv(_))
    }
}
