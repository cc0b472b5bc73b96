//! Mesh - the root of the data model.
//!
//! A [`Mesh`] holds fixed geometry counts, its extent and CRS, a
//! [`MeshGeometry`] source and the dataset groups loaded for it. Groups and
//! datasets are owned exclusively; their links back to the mesh are plain
//! identifiers ([`MeshId`]) resolved through the owner.

pub mod geometry;

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::dataset::{DatasetGroup, DatasetGroupBuilder, DatasetGroupMut, DatasetGroupRef};
use crate::util::{read_file_to_string, trim, BBox, Error, Result};

pub use geometry::{
    collect_edges, collect_faces, collect_vertices, Edge, FaceVertices, MemoryGeometry,
    MeshEdgeIterator, MeshFaceIterator, MeshGeometry, MeshVertexIterator,
};

/// Identifier of a mesh, unique within the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(u64);

impl MeshId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Element counts of a mesh, fixed at construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ElementCounts {
    pub vertices: usize,
    pub edges: usize,
    pub faces: usize,
}

/// Everything a driver knows about a mesh before any dataset is read.
#[derive(Clone, Debug, Default)]
pub struct MeshInfo {
    /// Name of the driver that produced the mesh.
    pub driver_name: String,
    pub counts: ElementCounts,
    /// Largest number of vertices in a single face.
    pub face_vertices_maximum_count: usize,
    pub extent: BBox,
    pub uri: String,
}

/// A loaded mesh and its dataset groups.
pub struct Mesh {
    id: MeshId,
    info: MeshInfo,
    crs: String,
    geometry: Box<dyn MeshGeometry>,
    groups: Vec<DatasetGroup>,
}

impl Mesh {
    /// Create a mesh from driver-provided info and a geometry source.
    pub fn new(info: MeshInfo, geometry: Box<dyn MeshGeometry>) -> Self {
        tracing::debug!(
            driver = %info.driver_name,
            uri = %info.uri,
            vertices = info.counts.vertices,
            faces = info.counts.faces,
            edges = info.counts.edges,
            "mesh created"
        );
        Self {
            id: MeshId::next(),
            info,
            crs: String::new(),
            geometry,
            groups: Vec::new(),
        }
    }

    /// Create a mesh over fully materialized geometry. Counts, the maximum
    /// face size and the extent are derived from `geometry`.
    pub fn from_memory(driver_name: &str, uri: &str, geometry: MemoryGeometry) -> Self {
        let info = MeshInfo {
            driver_name: driver_name.to_string(),
            counts: ElementCounts {
                vertices: geometry.vertices.len(),
                edges: geometry.edges.len(),
                faces: geometry.faces.len(),
            },
            face_vertices_maximum_count: geometry.face_vertices_maximum_count(),
            extent: BBox::from_vertices(&geometry.vertices),
            uri: uri.to_string(),
        };
        Self::new(info, Box::new(geometry))
    }

    #[inline]
    pub fn id(&self) -> MeshId {
        self.id
    }

    pub fn info(&self) -> &MeshInfo {
        &self.info
    }

    pub fn driver_name(&self) -> &str {
        &self.info.driver_name
    }

    pub fn uri(&self) -> &str {
        &self.info.uri
    }

    pub fn extent(&self) -> BBox {
        self.info.extent
    }

    #[inline]
    pub fn counts(&self) -> ElementCounts {
        self.info.counts
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.info.counts.vertices
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.info.counts.edges
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.info.counts.faces
    }

    #[inline]
    pub fn face_vertices_maximum_count(&self) -> usize {
        self.info.face_vertices_maximum_count
    }

    // ========================================================================
    // Geometry
    // ========================================================================

    pub fn read_vertices(&self) -> Box<dyn MeshVertexIterator + '_> {
        self.geometry.read_vertices()
    }

    pub fn read_faces(&self) -> Box<dyn MeshFaceIterator + '_> {
        self.geometry.read_faces()
    }

    pub fn read_edges(&self) -> Box<dyn MeshEdgeIterator + '_> {
        self.geometry.read_edges()
    }

    // ========================================================================
    // Coordinate reference system
    // ========================================================================

    /// Source CRS as stored (trimmed), empty when unknown.
    pub fn crs(&self) -> &str {
        &self.crs
    }

    /// Store a CRS definition. Only whitespace trimming is applied.
    pub fn set_source_crs(&mut self, crs: &str) {
        self.crs = trim(crs);
        tracing::debug!(uri = %self.info.uri, crs = %self.crs, "source crs set");
    }

    pub fn set_source_crs_from_wkt(&mut self, wkt: &str) {
        self.set_source_crs(wkt);
    }

    /// Store `EPSG:<code>`.
    pub fn set_source_crs_from_epsg(&mut self, code: i32) {
        self.set_source_crs(&format!("EPSG:{}", code));
    }

    /// Store the contents of a projection (`.prj`) file. A missing or
    /// unreadable file is returned as an error and the CRS is left unchanged.
    pub fn set_source_crs_from_prj_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let proj = read_file_to_string(path)?;
        self.set_source_crs(&proj);
        Ok(())
    }

    // ========================================================================
    // Dataset groups
    // ========================================================================

    /// Build a group for this mesh and attach it.
    pub fn add_group(&mut self, builder: DatasetGroupBuilder) -> DatasetGroupMut<'_> {
        let group = builder.build(self);
        let index = self.groups.len();
        self.groups.push(group);
        DatasetGroupMut::new(&mut self.groups[index])
    }

    /// Attach a group built for this mesh.
    pub fn push_group(&mut self, group: DatasetGroup) -> Result<DatasetGroupMut<'_>> {
        if group.mesh_id() != self.id {
            return Err(Error::IncompatibleDatasetGroup(format!(
                "group '{}' was built for another mesh",
                group.name()
            )));
        }
        let index = self.groups.len();
        self.groups.push(group);
        Ok(DatasetGroupMut::new(&mut self.groups[index]))
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn groups(&self) -> &[DatasetGroup] {
        &self.groups
    }

    pub fn groups_mut(&mut self) -> impl Iterator<Item = DatasetGroupMut<'_>> {
        self.groups.iter_mut().map(DatasetGroupMut::new)
    }

    pub fn group_at(&self, index: usize) -> Option<&DatasetGroup> {
        self.groups.get(index)
    }

    pub fn group_at_mut(&mut self, index: usize) -> Option<DatasetGroupMut<'_>> {
        self.groups.get_mut(index).map(DatasetGroupMut::new)
    }

    /// Index of the first group named `name`.
    pub fn group_index(&self, name: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.name() == name)
    }

    /// First group named `name`.
    pub fn group(&self, name: &str) -> Option<&DatasetGroup> {
        self.groups.iter().find(|g| g.name() == name)
    }

    pub fn group_mut(&mut self, name: &str) -> Option<DatasetGroupMut<'_>> {
        self.groups
            .iter_mut()
            .find(|g| g.name() == name)
            .map(DatasetGroupMut::new)
    }

    /// Detach a group together with its datasets.
    pub fn remove_group(&mut self, index: usize) -> Option<DatasetGroup> {
        (index < self.groups.len()).then(|| self.groups.remove(index))
    }

    /// Drop every group from `count` on. Used to undo a failed dataset load.
    pub(crate) fn truncate_groups(&mut self, count: usize) {
        self.groups.truncate(count);
    }

    /// Group at `index` with a link back to this mesh.
    pub fn group_ref(&self, index: usize) -> Option<DatasetGroupRef<'_>> {
        self.groups.get(index).map(|g| DatasetGroupRef::new(self, g))
    }

    /// All groups with links back to this mesh.
    pub fn group_refs(&self) -> impl Iterator<Item = DatasetGroupRef<'_>> {
        self.groups.iter().map(move |g| DatasetGroupRef::new(self, g))
    }
}

impl std::fmt::Debug for Mesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesh")
            .field("id", &self.id)
            .field("info", &self.info)
            .field("crs", &self.crs)
            .field("groups", &self.groups.len())
            .finish()
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        tracing::debug!(uri = %self.info.uri, groups = self.groups.len(), "mesh released");
    }
}
