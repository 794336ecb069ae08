//! Error types for recommender training and data loading.

use std::fmt;
use std::io;

/// Result type for recommender operations.
pub type Result<T> = std::result::Result<T, RecomendarError>;

/// Errors that can occur while building datasets or fitting a recommender.
#[derive(Debug)]
pub enum RecomendarError {
    /// Fit was called with an empty training set.
    NoTrainingData,

    /// Buffer length does not match the requested matrix shape.
    DimensionMismatch {
        /// Expected number of elements (rows * cols)
        expected: usize,
        /// Number of elements provided
        got: usize,
    },

    /// IO error during file operations.
    Io(io::Error),

    /// Network error while fetching a dataset.
    Download {
        /// URL that failed
        url: String,
        /// Underlying error message
        message: String,
    },

    /// Downloaded file does not match its pinned digest.
    ChecksumMismatch {
        /// Destination path of the download
        path: String,
        /// Expected SHA-256 digest (hex)
        expected: String,
        /// Computed SHA-256 digest (hex)
        got: String,
    },

    /// Malformed row in a dataset file.
    Parse {
        /// 1-based line number
        line: usize,
        /// Description of the parse failure
        message: String,
    },
}

impl fmt::Display for RecomendarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTrainingData => write!(f, "No training data"),

            Self::DimensionMismatch { expected, got } => {
                write!(f, "Expected {expected} elements, got {got}")
            }

            Self::Io(e) => write!(f, "IO error: {e}"),

            Self::Download { url, message } => {
                write!(f, "Failed to download {url}: {message}")
            }

            Self::ChecksumMismatch {
                path,
                expected,
                got,
            } => {
                write!(f, "Bad checksum for {path}: expected {expected}, got {got}")
            }

            Self::Parse { line, message } => {
                write!(f, "Parse error at line {line}: {message}")
            }
        }
    }
}

impl std::error::Error for RecomendarError {}

impl From<io::Error> for RecomendarError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
