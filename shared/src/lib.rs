//! Shared types and utilities for herowatch
//!
//! This crate contains the data structures exchanged between the Wikipedia
//! adapter, the aggregation engine and the operator CLI.

pub mod types;
pub mod utils;

// Re-export commonly used types
pub use types::{page::*, roster::*};
