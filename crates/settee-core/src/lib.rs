//! Core types shared by the Settee crates.
//!
//! - [`error`]: the crate-wide error type and `Result` alias.
//! - [`json`]: structural comparison, hashing and canonical encoding of
//!   opaque JSON trees.
pub mod error;
pub mod json;
