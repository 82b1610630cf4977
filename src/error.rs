//! Error types for cosmolink.

use std::path::PathBuf;

/// Result type alias for cosmolink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while transcoding tables or driving the channel.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A column is not uniformly typed, uses an unsupported type, or the
    /// table shape is invalid.
    #[error("Schema error: {message}")]
    Schema {
        /// Description of the schema problem.
        message: String,
    },

    /// The IPC stream could not be written, finalized or read back.
    #[error("Encoding error: {message}")]
    Encoding {
        /// Description of the encoding failure.
        message: String,
    },

    /// The channel was used after it was closed.
    #[error("Channel is closed")]
    ChannelClosed,

    /// Unknown config field or a value of the wrong kind.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// Column not found in the table.
    #[error("Column '{name}' not found in table")]
    ColumnNotFound {
        /// The name of the missing column.
        name: String,
    },

    /// I/O error during file operations.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        /// The path where the error occurred, if known.
        path: Option<PathBuf>,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Arrow error raised while building arrays or batches.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet error while loading a table.
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// JSON error while parsing config or records.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unsupported input file format.
    #[error("Unsupported format: {format}")]
    UnsupportedFormat {
        /// The unsupported format name or extension.
        format: String,
    },
}

impl Error {
    /// Create a schema error.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Create an encoding error.
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a column not found error.
    pub fn column_not_found(name: impl Into<String>) -> Self {
        Self::ColumnNotFound { name: name.into() }
    }

    /// Create an I/O error with a path context.
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            path: Some(path.into()),
            source,
        }
    }

    /// Create an unsupported format error.
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }
}
