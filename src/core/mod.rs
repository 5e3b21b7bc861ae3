//! Core constants and error types.
//!
//! This module has no crypto dependencies and is always included.

mod constants;
mod error;

pub use constants::*;
pub use error::*;
