//! Error types for the access-control library.

/// Errors that can occur while building, encoding, or decoding access-control
/// objects.
///
/// All error variants are marked with `#[non_exhaustive]` to allow
/// adding new error types without breaking changes.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Memory for a decoded collection could not be reserved
    #[error("Allocation failure: {message}")]
    Allocation {
        /// What was being allocated
        message: String,
    },

    /// A caller-supplied value was rejected before any state changed
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Field or aspect that failed validation
        field: Option<String>,
        /// What went wrong
        message: String,
    },

    /// An encoded blob is truncated or internally inconsistent
    #[error("Malformed data at byte {offset}: {message}")]
    MalformedData {
        /// Byte offset at which decoding stopped
        offset: usize,
        /// What was wrong with the input
        message: String,
    },

    /// No constraint is attached to the requested operation
    #[error("No constraint for operation: {operation}")]
    NotFound {
        /// Operation that was looked up
        operation: String,
    },
}

/// Convenience `Result` type alias for access-control operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a new invalid-argument error.
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Error::InvalidArgument {
            field: None,
            message: message.into(),
        }
    }

    /// Creates a new invalid-argument error naming the offending field.
    pub fn invalid_field<F, M>(field: F, message: M) -> Self
    where
        F: Into<String>,
        M: Into<String>,
    {
        Error::InvalidArgument {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Creates a new malformed-data error at the given byte offset.
    pub fn malformed<S: Into<String>>(offset: usize, message: S) -> Self {
        Error::MalformedData {
            offset,
            message: message.into(),
        }
    }

    /// Creates a new allocation error.
    pub fn allocation<S: Into<String>>(message: S) -> Self {
        Error::Allocation {
            message: message.into(),
        }
    }

    /// Returns `true` if this error came from rejecting encoded input.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Error::MalformedData { .. })
    }

    /// Returns `true` if this error came from rejecting a caller argument.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument { .. })
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(err: std::collections::TryReserveError) -> Self {
        Error::allocation(err.to_string())
    }
}
