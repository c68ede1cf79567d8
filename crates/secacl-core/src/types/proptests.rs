//! Property-based tests for core types and their encoding.
