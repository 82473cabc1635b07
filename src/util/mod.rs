//! Utility types and functions for DTS.
//!
//! This module contains fundamental types used throughout the library:
//! - [`Error`] / [`Result`] - Error handling
//! - Lane conversion between the file's little-endian order and host order
//! - Math type re-exports from glam plus packed storage types

mod endian;
mod error;
mod math;

pub use endian::*;
pub use error::*;
pub use math::*;
