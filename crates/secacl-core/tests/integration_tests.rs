//! Integration test suite for access-control objects.
//!
//! Exercises the public API end to end: building objects through setters,
//! encoding them, decoding into fresh instances, and working with the
//! envelope and per-operation constraint data.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;
mod integration;
