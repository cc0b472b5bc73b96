//! # MDAL
//!
//! In-memory data model for unstructured meshes and the time-varying
//! datasets attached to them, independent of any file format.
//!
//! A format driver builds a [`Mesh`], attaches [`DatasetGroup`]s to it and
//! fills each group with [`Dataset`]s, one per timestep. Applications either
//! work with those types directly or go through the handle based
//! [`Session`](api::Session).
//!
//! ## Modules
//!
//! - [`util`] - Errors, extent and coordinate types, text helpers
//! - [`core`] - Metadata, times, statistics, status codes
//! - [`mesh`] - Meshes and streaming geometry
//! - [`dataset`] - Dataset groups and 2D/3D datasets
//! - [`driver`] - Format driver trait and registry
//! - [`api`] - Sessions and opaque handles
//! - [`config`] - Settings and logging setup
//!
//! ## Example
//!
//! ```ignore
//! use mdal::api::{DataType, Session};
//!
//! let mut session = Session::new();
//! let mesh = session.load_mesh("2DM:\"/data/lake.2dm\"")?;
//! session.load_datasets(mesh, "/data/lake_depth.dat")?;
//!
//! let group = session.group_by_name(mesh, "Depth")?;
//! let dataset = session.dataset(group, 0)?;
//! let mut depth = vec![0.0; session.dataset_value_count(dataset)?];
//! session.fetch_scalar(dataset, 0, &mut depth)?;
//! ```

pub mod util;
pub mod core;
pub mod mesh;
pub mod dataset;
pub mod driver;
pub mod api;
pub mod config;

// Re-export commonly used types
pub use util::{Error, Result};
pub use mesh::Mesh;
pub use dataset::{Dataset, DatasetGroup};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{BBox, Error, Result, Vertex};
    pub use crate::core::{DateTime, Diagnostics, Metadata, RelativeTimestamp, Statistics, Status, TimeUnit, Warning};
    pub use crate::mesh::{ElementCounts, MemoryGeometry, Mesh, MeshGeometry, MeshInfo};
    pub use crate::dataset::{
        DataLocation, Dataset, DatasetGroup, DatasetGroupBuilder, DatasetGroupMut, DatasetShape, DatasetValues,
        MemoryDataset2D, MemoryDataset3D,
    };
    pub use crate::driver::{Capabilities, Driver, DriverManager};
    pub use crate::api::{DataType, DatasetHandle, GroupHandle, MeshHandle, Session};
    pub use crate::config::Config;
}
