//! Utility types and functions for MDAL.
//!
//! This module contains fundamental types used throughout the library:
//! - [`Error`] / [`Result`] - Error handling
//! - [`BBox`] / [`Vertex`] - Mesh extent and coordinates (glam based)
//! - [`trim`] / [`read_file_to_string`] - Text helpers for CRS sources

mod error;
mod math;
mod string;

pub use error::*;
pub use math::*;
pub use string::*;
