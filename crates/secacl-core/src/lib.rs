#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod access_control;
pub mod codec;
pub mod describe;
pub mod error;
pub mod types;

// Re-exports for convenience
pub use access_control::{AccessControl, ConstraintMap};
pub use codec::Envelope;
pub use error::{Error, Result};
pub use types::{
    AccessControlFlags, BiometricEnrollment, Constraint, KofN, MAX_CONSTRAINT_DEPTH, OperationId,
    PolicyId, Protection,
};
