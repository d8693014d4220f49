//! Ambar Shared - types common to the deployment library and its CLI
//!
//! This crate contains the error type and the fixed names (files, images,
//! kernel parameters) that every other crate in the workspace agrees on.

pub mod constants;
pub mod errors;

pub use errors::{AmbarError, AmbarResult};
