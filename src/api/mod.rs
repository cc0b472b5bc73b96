//! Handle based access to loaded meshes.
//!
//! A [`Session`] owns every mesh it opens and hands out `Copy` handles.
//! Each call returns a [`Result`] and also records a [`Status`]: in the
//! session (see [`Session::last_status`]) and, for calls on a live mesh,
//! in that mesh's own slot (see [`Session::mesh_status`]). A successful
//! call resets the status to [`Status::None`]; a load that succeeded with
//! warnings leaves the last warning.
//!
//! - [`Session`] - Open meshes, query them, fetch dataset values
//! - [`MeshHandle`] / [`GroupHandle`] / [`DatasetHandle`] - Handles
//! - [`DataType`] - Layout of [`Session::fetch_data`] buffers

mod handle;

use std::cell::Cell;
use std::sync::Arc;

use crate::config::Config;
use crate::core::{Diagnostics, Status};
use crate::dataset::{DataLocation, Dataset, DatasetGroup};
use crate::driver::DriverManager;
use crate::mesh::{collect_faces, collect_vertices, FaceVertices, Mesh};
use crate::util::{Error, Result, Vertex};

pub use handle::{DatasetHandle, GroupHandle, MeshHandle};
use handle::HandleArena;

/// Library version and build date.
pub fn version() -> String {
    format!("{} ({})", env!("CARGO_PKG_VERSION"), env!("MDAL_BUILD_DATE"))
}

/// Element layout of a [`Session::fetch_data`] buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    /// One `f64` per value.
    ScalarDouble,
    /// Two `f64` per value, `x` then `y`.
    Vector2dDouble,
    /// One byte per value, 1 active and 0 inactive.
    ActiveBool,
}

impl DataType {
    /// Bytes per value.
    pub fn value_size(self) -> usize {
        match self {
            Self::ScalarDouble => 8,
            Self::Vector2dDouble => 16,
            Self::ActiveBool => 1,
        }
    }
}

struct MeshEntry {
    mesh: Mesh,
    status: Cell<Status>,
    vertices: Vec<Vertex>,
    faces: Vec<FaceVertices>,
}

impl MeshEntry {
    fn new(mesh: Mesh) -> Self {
        let vertices = collect_vertices(mesh.read_vertices().as_mut(), mesh.vertex_count());
        let faces = collect_faces(
            mesh.read_faces().as_mut(),
            mesh.face_count(),
            mesh.face_vertices_maximum_count(),
        );
        if vertices.len() != mesh.vertex_count() || faces.len() != mesh.face_count() {
            tracing::warn!(
                uri = mesh.uri(),
                vertices = vertices.len(),
                expected_vertices = mesh.vertex_count(),
                faces = faces.len(),
                expected_faces = mesh.face_count(),
                "geometry does not match mesh counts"
            );
        }
        Self {
            mesh,
            status: Cell::new(Status::None),
            vertices,
            faces,
        }
    }

    fn group(&self, index: usize) -> Result<&DatasetGroup> {
        self.mesh.group_at(index).ok_or(Error::IndexOutOfBounds {
            index,
            count: self.mesh.group_count(),
        })
    }

    fn dataset(&self, handle: DatasetHandle) -> Result<&Dataset> {
        let group = self.group(handle.group)?;
        group.dataset(handle.dataset).ok_or(Error::IndexOutOfBounds {
            index: handle.dataset,
            count: group.dataset_count(),
        })
    }

    fn vertex(&self, index: usize) -> Result<Vertex> {
        self.vertices.get(index).copied().ok_or(Error::IndexOutOfBounds {
            index,
            count: self.vertices.len(),
        })
    }

    fn face(&self, index: usize) -> Result<&FaceVertices> {
        self.faces.get(index).ok_or(Error::IndexOutOfBounds {
            index,
            count: self.faces.len(),
        })
    }
}

/// A set of open meshes and the status of the last call.
///
/// Sessions are independent of each other. A session is not `Sync`; use one
/// per thread.
pub struct Session {
    config: Config,
    drivers: Arc<DriverManager>,
    meshes: HandleArena<MeshEntry>,
    last_status: Cell<Status>,
}

impl Session {
    /// Session on the global driver registry with environment config.
    pub fn new() -> Self {
        Self::with_config(Config::from_env())
    }

    pub fn with_config(config: Config) -> Self {
        Self::with_drivers(config, DriverManager::global())
    }

    /// Session on a caller-provided registry. The config's
    /// `disabled_drivers` apply to this session only; the registry is
    /// shared and left untouched.
    pub fn with_drivers(config: Config, drivers: Arc<DriverManager>) -> Self {
        Self {
            config,
            drivers,
            meshes: HandleArena::default(),
            last_status: Cell::new(Status::None),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn drivers(&self) -> &Arc<DriverManager> {
        &self.drivers
    }

    /// Status of the last call on this session.
    pub fn last_status(&self) -> Status {
        self.last_status.get()
    }

    /// Status of the last call on `mesh`, `None` for a closed mesh.
    pub fn mesh_status(&self, mesh: MeshHandle) -> Option<Status> {
        self.meshes.get(mesh).map(|e| e.status.get())
    }

    /// Number of open meshes.
    pub fn open_mesh_count(&self) -> usize {
        self.meshes.len()
    }

    fn record<T>(&self, entry: Option<&MeshEntry>, result: Result<T>) -> Result<T> {
        let status = match &result {
            Ok(_) => Status::None,
            Err(e) => {
                tracing::debug!(error = %e, "call failed");
                e.status()
            }
        };
        self.last_status.set(status);
        if let Some(entry) = entry {
            entry.status.set(status);
        }
        result
    }

    fn with_mesh<T>(&self, handle: MeshHandle, f: impl FnOnce(&MeshEntry) -> Result<T>) -> Result<T> {
        match self.meshes.get(handle) {
            Some(entry) => {
                let result = f(entry);
                self.record(Some(entry), result)
            }
            None => self.record(None, Err(stale(handle))),
        }
    }

    fn with_group<T>(&self, handle: GroupHandle, f: impl FnOnce(&DatasetGroup) -> Result<T>) -> Result<T> {
        self.with_mesh(handle.mesh, |entry| f(entry.group(handle.group)?))
    }

    fn with_dataset<T>(&self, handle: DatasetHandle, f: impl FnOnce(&Dataset) -> Result<T>) -> Result<T> {
        self.with_mesh(handle.mesh, |entry| f(entry.dataset(handle)?))
    }

    // ========================================================================
    // Mesh lifecycle
    // ========================================================================

    /// Open a mesh. `uri` is a path or `DRIVER:"path"`.
    pub fn load_mesh(&mut self, uri: &str) -> Result<MeshHandle> {
        if let Some(limit) = self.config.max_open_meshes {
            if self.meshes.len() >= limit {
                let err = Error::NotEnoughMemory(format!("{} meshes already open", limit));
                return self.record(None, Err(err));
            }
        }

        let mut diagnostics = Diagnostics::new();
        let loaded = self
            .drivers
            .load_mesh_excluding(uri, &self.config.disabled_drivers, &mut diagnostics);
        let mesh = match loaded {
            Ok(mesh) => mesh,
            Err(e) => return self.record(None, Err(e)),
        };

        let entry = MeshEntry::new(mesh);
        let status = diagnostics.last().map_or(Status::None, |w| w.status());
        entry.status.set(status);
        self.last_status.set(status);
        tracing::debug!(uri, status = %status, "mesh opened");
        Ok(self.meshes.insert(entry))
    }

    /// Release a mesh with all its groups and datasets. Later use of the
    /// handle fails with [`Error::InvalidHandle`].
    pub fn close_mesh(&mut self, mesh: MeshHandle) -> Result<()> {
        let result = match self.meshes.remove(mesh) {
            Some(entry) => {
                tracing::debug!(uri = entry.mesh.uri(), "mesh closed");
                Ok(())
            }
            None => Err(stale(mesh)),
        };
        self.record(None, result)
    }

    /// Attach the dataset groups in `path` to an open mesh. On failure the
    /// mesh keeps exactly the groups it had before.
    pub fn load_datasets(&mut self, mesh: MeshHandle, path: &str) -> Result<()> {
        let mut diagnostics = Diagnostics::new();
        let excluded = &self.config.disabled_drivers;
        let result = match self.meshes.get_mut(mesh) {
            Some(entry) => {
                self.drivers
                    .load_datasets_excluding(&mut entry.mesh, path, excluded, &mut diagnostics)
            }
            None => Err(stale(mesh)),
        };

        let entry = self.meshes.get(mesh);
        let result = self.record(entry, result);
        if result.is_ok() {
            if let Some(warning) = diagnostics.last() {
                self.last_status.set(warning.status());
                if let Some(entry) = entry {
                    entry.status.set(warning.status());
                }
            }
        }
        result
    }

    /// Borrow the mesh behind a handle.
    pub fn mesh(&self, mesh: MeshHandle) -> Result<&Mesh> {
        match self.meshes.get(mesh) {
            Some(entry) => self.record(Some(entry), Ok(&entry.mesh)),
            None => self.record(None, Err(stale(mesh))),
        }
    }

    // ========================================================================
    // Mesh accessors
    // ========================================================================

    pub fn mesh_projection(&self, mesh: MeshHandle) -> Result<String> {
        self.with_mesh(mesh, |e| Ok(e.mesh.crs().to_string()))
    }

    pub fn mesh_driver_name(&self, mesh: MeshHandle) -> Result<String> {
        self.with_mesh(mesh, |e| Ok(e.mesh.driver_name().to_string()))
    }

    pub fn mesh_vertex_count(&self, mesh: MeshHandle) -> Result<usize> {
        self.with_mesh(mesh, |e| Ok(e.mesh.vertex_count()))
    }

    pub fn mesh_face_count(&self, mesh: MeshHandle) -> Result<usize> {
        self.with_mesh(mesh, |e| Ok(e.mesh.face_count()))
    }

    pub fn mesh_edge_count(&self, mesh: MeshHandle) -> Result<usize> {
        self.with_mesh(mesh, |e| Ok(e.mesh.edge_count()))
    }

    pub fn mesh_face_vertices_maximum_count(&self, mesh: MeshHandle) -> Result<usize> {
        self.with_mesh(mesh, |e| Ok(e.mesh.face_vertices_maximum_count()))
    }

    pub fn vertex_x(&self, mesh: MeshHandle, index: usize) -> Result<f64> {
        self.with_mesh(mesh, |e| Ok(e.vertex(index)?.x))
    }

    pub fn vertex_y(&self, mesh: MeshHandle, index: usize) -> Result<f64> {
        self.with_mesh(mesh, |e| Ok(e.vertex(index)?.y))
    }

    pub fn vertex_z(&self, mesh: MeshHandle, index: usize) -> Result<f64> {
        self.with_mesh(mesh, |e| Ok(e.vertex(index)?.z))
    }

    /// Number of vertices of face `face`.
    pub fn face_vertex_count(&self, mesh: MeshHandle, face: usize) -> Result<usize> {
        self.with_mesh(mesh, |e| Ok(e.face(face)?.len()))
    }

    /// Global vertex index of the `local`-th vertex of face `face`.
    pub fn face_vertex_index(&self, mesh: MeshHandle, face: usize, local: usize) -> Result<usize> {
        self.with_mesh(mesh, |e| {
            let vertices = e.face(face)?;
            vertices.get(local).copied().ok_or(Error::IndexOutOfBounds {
                index: local,
                count: vertices.len(),
            })
        })
    }

    // ========================================================================
    // Dataset groups
    // ========================================================================

    pub fn group_count(&self, mesh: MeshHandle) -> Result<usize> {
        self.with_mesh(mesh, |e| Ok(e.mesh.group_count()))
    }

    pub fn group(&self, mesh: MeshHandle, index: usize) -> Result<GroupHandle> {
        self.with_mesh(mesh, |e| {
            e.group(index)?;
            Ok(GroupHandle { mesh, group: index })
        })
    }

    /// First group called `name`.
    pub fn group_by_name(&self, mesh: MeshHandle, name: &str) -> Result<GroupHandle> {
        self.with_mesh(mesh, |e| {
            let group = e
                .mesh
                .group_index(name)
                .ok_or_else(|| Error::IncompatibleDatasetGroup(format!("no group named '{}'", name)))?;
            Ok(GroupHandle { mesh, group })
        })
    }

    /// Owning mesh of a group.
    pub fn group_mesh(&self, group: GroupHandle) -> Result<MeshHandle> {
        self.with_group(group, |_| Ok(group.mesh))
    }

    pub fn group_dataset_count(&self, group: GroupHandle) -> Result<usize> {
        self.with_group(group, |g| Ok(g.dataset_count()))
    }

    pub fn dataset(&self, group: GroupHandle, index: usize) -> Result<DatasetHandle> {
        let handle = group.dataset(index);
        self.with_dataset(handle, |_| Ok(handle))
    }

    pub fn group_metadata_count(&self, group: GroupHandle) -> Result<usize> {
        self.with_group(group, |g| Ok(g.metadata().len()))
    }

    pub fn group_metadata_key(&self, group: GroupHandle, index: usize) -> Result<String> {
        self.metadata_entry(group, index, |(k, _)| k.to_string())
    }

    pub fn group_metadata_value(&self, group: GroupHandle, index: usize) -> Result<String> {
        self.metadata_entry(group, index, |(_, v)| v.to_string())
    }

    fn metadata_entry(
        &self,
        group: GroupHandle,
        index: usize,
        pick: impl FnOnce((&str, &str)) -> String,
    ) -> Result<String> {
        self.with_group(group, |g| {
            let entry = g.metadata().entry(index).ok_or(Error::IndexOutOfBounds {
                index,
                count: g.metadata().len(),
            })?;
            Ok(pick(entry))
        })
    }

    pub fn group_name(&self, group: GroupHandle) -> Result<String> {
        self.with_group(group, |g| Ok(g.name().to_string()))
    }

    pub fn group_has_scalar_data(&self, group: GroupHandle) -> Result<bool> {
        self.with_group(group, |g| Ok(g.is_scalar()))
    }

    pub fn group_is_on_vertices(&self, group: GroupHandle) -> Result<bool> {
        self.with_group(group, |g| Ok(g.data_location() == DataLocation::OnVertices))
    }

    pub fn group_data_location(&self, group: GroupHandle) -> Result<DataLocation> {
        self.with_group(group, |g| Ok(g.data_location()))
    }

    // ========================================================================
    // Datasets
    // ========================================================================

    pub fn dataset_group(&self, dataset: DatasetHandle) -> Result<GroupHandle> {
        self.with_dataset(dataset, |_| Ok(dataset.group_handle()))
    }

    /// Time of the dataset in the session's configured unit.
    pub fn dataset_time(&self, dataset: DatasetHandle) -> Result<f64> {
        let unit = self.config.time_unit;
        self.with_dataset(dataset, |d| Ok(d.time(unit)))
    }

    pub fn dataset_value_count(&self, dataset: DatasetHandle) -> Result<usize> {
        self.with_dataset(dataset, |d| Ok(d.values_count()))
    }

    pub fn dataset_is_valid(&self, dataset: DatasetHandle) -> Result<bool> {
        self.with_dataset(dataset, |d| Ok(d.is_valid()))
    }

    pub fn dataset_has_active_flag(&self, dataset: DatasetHandle) -> Result<bool> {
        self.with_dataset(dataset, |d| Ok(d.supports_active_flag()))
    }

    /// Release a dataset before its group. Datasets after it in the group
    /// move down one position.
    pub fn close_dataset(&mut self, dataset: DatasetHandle) -> Result<()> {
        let result = match self.meshes.get_mut(dataset.mesh) {
            Some(entry) => match entry.mesh.group_at_mut(dataset.group) {
                Some(mut group) => {
                    let count = group.dataset_count();
                    group
                        .remove_dataset(dataset.dataset)
                        .map(|_| ())
                        .ok_or(Error::IndexOutOfBounds {
                            index: dataset.dataset,
                            count,
                        })
                }
                None => Err(Error::IndexOutOfBounds {
                    index: dataset.group,
                    count: entry.mesh.group_count(),
                }),
            },
            None => Err(stale(dataset.mesh)),
        };
        let entry = self.meshes.get(dataset.mesh);
        self.record(entry, result)
    }

    // ========================================================================
    // Values
    // ========================================================================

    /// Fetch `count` values from `start` into `buffer`, laid out as
    /// `data_type` in native byte order. Returns the number of values
    /// written; positions past that hold NaN for the floating point types.
    /// A result other than `count` records [`Status::ErrInvalidData`].
    ///
    /// Asking for scalar values of a vector group or the other way round
    /// fails with [`Error::IncompatibleDataset`].
    pub fn fetch_data(
        &self,
        dataset: DatasetHandle,
        start: usize,
        count: usize,
        data_type: DataType,
        buffer: &mut [u8],
    ) -> Result<usize> {
        let needed = match count.checked_mul(data_type.value_size()) {
            Some(needed) if needed <= buffer.len() => needed,
            _ => {
                let err = Error::invalid(format!(
                    "buffer of {} bytes is too small for {} values of {:?}",
                    buffer.len(),
                    count,
                    data_type
                ));
                let entry = self.meshes.get(dataset.mesh);
                return self.record(entry, Err(err));
            }
        };
        let buffer = &mut buffer[..needed];

        match data_type {
            DataType::ScalarDouble => {
                let mut values = vec![f64::NAN; count];
                let n = self.fetch_scalar(dataset, start, &mut values)?;
                buffer.copy_from_slice(bytemuck::cast_slice(&values));
                Ok(n)
            }
            DataType::Vector2dDouble => {
                let mut values = vec![f64::NAN; count * 2];
                let n = self.fetch_vector(dataset, start, &mut values)?;
                buffer.copy_from_slice(bytemuck::cast_slice(&values));
                Ok(n)
            }
            DataType::ActiveBool => {
                let mut values = vec![0i32; count];
                let n = self.fetch_active(dataset, start, &mut values)?;
                for (byte, flag) in buffer.iter_mut().zip(&values) {
                    *byte = u8::from(*flag != 0);
                }
                Ok(n)
            }
        }
    }

    /// Scalar values; volume values for 3D datasets.
    pub fn fetch_scalar(&self, dataset: DatasetHandle, start: usize, out: &mut [f64]) -> Result<usize> {
        let requested = out.len();
        self.fetch(dataset, requested, |d| {
            expect_kind(d, true)?;
            Ok(if d.is_3d() {
                d.scalar_volumes_data(start, out)
            } else {
                d.scalar_data(start, out)
            })
        })
    }

    /// Vector values as `x, y` pairs; volume values for 3D datasets.
    pub fn fetch_vector(&self, dataset: DatasetHandle, start: usize, out: &mut [f64]) -> Result<usize> {
        let requested = out.len() / 2;
        self.fetch(dataset, requested, |d| {
            expect_kind(d, false)?;
            Ok(if d.is_3d() {
                d.vector_volumes_data(start, out)
            } else {
                d.vector_data(start, out)
            })
        })
    }

    /// Active flags. Datasets without active flag support report every
    /// element in range as active.
    pub fn fetch_active(&self, dataset: DatasetHandle, start: usize, out: &mut [i32]) -> Result<usize> {
        let requested = out.len();
        self.fetch(dataset, requested, |d| {
            if d.supports_active_flag() {
                Ok(d.active_data(start, out))
            } else {
                let n = d.values_count().saturating_sub(start).min(out.len());
                out[..n].fill(1);
                Ok(n)
            }
        })
    }

    fn fetch(
        &self,
        dataset: DatasetHandle,
        requested: usize,
        read: impl FnOnce(&Dataset) -> Result<usize>,
    ) -> Result<usize> {
        let entry = self.meshes.get(dataset.mesh);
        let result = match entry {
            Some(e) => e.dataset(dataset).and_then(read),
            None => Err(stale(dataset.mesh)),
        };
        let result = self.record(entry, result);
        if let Ok(n) = result {
            if n != requested {
                tracing::debug!(requested, written = n, "short fetch");
                self.last_status.set(Status::ErrInvalidData);
                if let Some(e) = entry {
                    e.status.set(Status::ErrInvalidData);
                }
            }
        }
        result
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("open_meshes", &self.meshes.len())
            .field("last_status", &self.last_status.get())
            .finish()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.meshes.len() > 0 {
            let uris: Vec<&str> = self.meshes.iter().map(|e| e.mesh.uri()).collect();
            tracing::debug!(?uris, "session dropped with open meshes");
        }
    }
}

fn stale(handle: MeshHandle) -> Error {
    Error::InvalidHandle(format!("{:?} is closed", handle))
}

fn expect_kind(dataset: &Dataset, scalar: bool) -> Result<()> {
    if dataset.is_scalar() == scalar {
        Ok(())
    } else {
        Err(Error::IncompatibleDataset(format!(
            "{} values requested from a {} dataset",
            if scalar { "scalar" } else { "vector" },
            if dataset.is_scalar() { "scalar" } else { "vector" }
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::MemoryGeometry;
    use smallvec::smallvec;

    fn session_with(mesh: Mesh) -> (Session, MeshHandle) {
        let mut session = Session::with_drivers(Config::default(), Arc::new(DriverManager::new()));
        let handle = session.meshes.insert(MeshEntry::new(mesh));
        (session, handle)
    }

    fn square() -> Mesh {
        Mesh::from_memory(
            "Memory",
            "square",
            MemoryGeometry::new(
                vec![
                    Vertex::new(0.0, 0.0, 0.0),
                    Vertex::new(1.0, 0.0, 0.5),
                    Vertex::new(1.0, 1.0, 1.0),
                    Vertex::new(0.0, 1.0, 1.5),
                ],
                vec![smallvec![0, 1, 2, 3]],
                vec![],
            ),
        )
    }

    #[test]
    fn test_version_has_crate_version() {
        assert!(version().starts_with(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_geometry_accessors() {
        let (session, mesh) = session_with(square());
        assert_eq!(session.mesh_vertex_count(mesh).unwrap(), 4);
        assert_eq!(session.vertex_z(mesh, 3).unwrap(), 1.5);
        assert_eq!(session.face_vertex_count(mesh, 0).unwrap(), 4);
        assert_eq!(session.face_vertex_index(mesh, 0, 2).unwrap(), 2);
        assert_eq!(session.last_status(), Status::None);

        assert!(session.vertex_x(mesh, 4).is_err());
        assert_eq!(session.last_status(), Status::ErrInvalidData);
        assert_eq!(session.mesh_status(mesh), Some(Status::ErrInvalidData));

        assert!(session.face_vertex_index(mesh, 0, 4).is_err());
        assert_eq!(session.mesh_face_count(mesh).unwrap(), 1);
        assert_eq!(session.last_status(), Status::None);
    }

    #[test]
    fn test_close_mesh_invalidates_handle() {
        let (mut session, mesh) = session_with(square());
        session.close_mesh(mesh).unwrap();
        assert_eq!(session.open_mesh_count(), 0);
        assert!(matches!(session.mesh_vertex_count(mesh), Err(Error::InvalidHandle(_))));
        assert_eq!(session.last_status(), Status::ErrIncompatibleMesh);
        assert_eq!(session.mesh_status(mesh), None);
        assert!(session.close_mesh(mesh).is_err());
    }

    #[test]
    fn test_fetch_bytes() {
        let mut m = square();
        let mut group = m.add_group(
            crate::dataset::DatasetGroupBuilder::new("Memory", "square")
                .name("Depth")
                .location(DataLocation::OnVertices),
        );
        let ds = Dataset::new_2d(
            &group,
            crate::dataset::MemoryDataset2D::scalar(vec![1.0, 2.0, 3.0, 4.0]),
        );
        group.push_dataset(ds).unwrap();

        let (session, mesh) = session_with(m);
        let ds = session.dataset(session.group(mesh, 0).unwrap(), 0).unwrap();

        let mut bytes = [0u8; 3 * 8];
        assert_eq!(session.fetch_data(ds, 2, 3, DataType::ScalarDouble, &mut bytes).unwrap(), 2);
        assert_eq!(session.last_status(), Status::ErrInvalidData);
        let values: Vec<f64> = bytes
            .chunks_exact(8)
            .map(|c| f64::from_ne_bytes(c.try_into().unwrap()))
            .collect();
        assert_eq!(&values[..2], &[3.0, 4.0]);
        assert!(values[2].is_nan());

        let mut active = [0u8; 4];
        assert_eq!(session.fetch_data(ds, 0, 4, DataType::ActiveBool, &mut active).unwrap(), 4);
        assert_eq!(session.last_status(), Status::None);
        assert_eq!(active, [1, 1, 1, 1]);

        let mut small = [0u8; 8];
        assert!(session.fetch_data(ds, 0, 4, DataType::ScalarDouble, &mut small).is_err());
        assert_eq!(session.last_status(), Status::ErrInvalidData);
    }

    #[test]
    fn test_fetch_count_overflow() {
        let mut m = square();
        let mut group = m.add_group(
            crate::dataset::DatasetGroupBuilder::new("Memory", "square")
                .name("Depth")
                .location(DataLocation::OnVertices),
        );
        let ds = Dataset::new_2d(&group, crate::dataset::MemoryDataset2D::scalar(vec![1.0; 4]));
        group.push_dataset(ds).unwrap();

        let (session, mesh) = session_with(m);
        let ds = session.dataset(session.group(mesh, 0).unwrap(), 0).unwrap();

        let mut bytes = [0u8; 16];
        for data_type in [DataType::ScalarDouble, DataType::Vector2dDouble] {
            let result = session.fetch_data(ds, 0, usize::MAX / 4 + 1, data_type, &mut bytes);
            assert!(matches!(result, Err(Error::InvalidData(_))));
            assert_eq!(session.last_status(), Status::ErrInvalidData);
        }
        assert_eq!(bytes, [0u8; 16]);
    }
}
