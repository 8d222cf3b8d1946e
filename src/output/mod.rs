//! Result reporting
//!
//! - [`text`]: console banner and per-participant table
//! - [`json`]: machine-readable report file

pub mod json;
pub mod text;
