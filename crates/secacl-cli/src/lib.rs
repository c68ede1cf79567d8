//! # secacl-cli
//!
//! Command-line tools for encoded access-control objects:
//! - Decode a blob to JSON or a readable summary
//! - Extract the constraint data for one operation
//! - Build objects from access-control flags
//! - Inspect and rewrite the fixed header without decoding the payload

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod blob;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use error::{Error, Result};
