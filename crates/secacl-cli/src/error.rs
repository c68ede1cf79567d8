//! Error types for secacl-cli

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for secacl-cli operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in secacl-cli
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from secacl-core
    #[error("Core error: {0}")]
    Core(#[from] secacl_core::Error),

    /// Configuration could not be resolved or is invalid
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// I/O error tied to a file
    #[error("I/O error at {}: {source}", path.display())]
    File {
        /// File being read or written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// I/O error on standard streams
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A blob argument is not valid hex or base64
    #[error("Invalid blob text: {0}")]
    Blob(String),

    /// Config file is not valid TOML
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Config could not be written as TOML
    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    /// JSON output failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Wraps an I/O error with the path it concerns.
    pub fn file<P: Into<PathBuf>>(source: std::io::Error, path: P) -> Self {
        Error::File {
            path: path.into(),
            source,
        }
    }
}
