//! Core layer - value types shared by meshes, groups and datasets.
//!
//! This module provides:
//! - [`Metadata`] - Ordered key/value annotations of a dataset group
//! - [`RelativeTimestamp`] / [`TimeUnit`] - Dataset times with explicit units
//! - [`DateTime`] - Reference time of a dataset group
//! - [`Statistics`] - Min/max records
//! - [`Status`] / [`Warning`] / [`Diagnostics`] - Boundary status codes

mod metadata;
mod timestamp;
mod datetime;
mod statistics;
mod status;

pub use metadata::Metadata;
pub use timestamp::{RelativeTimestamp, TimeUnit};
pub use datetime::DateTime;
pub use statistics::Statistics;
pub use status::{Diagnostics, Status, Warning};
