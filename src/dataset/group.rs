//! Dataset groups.
//!
//! A group's shape (data location and scalar/vector) is chosen once on a
//! [`DatasetGroupBuilder`]. The built [`DatasetGroup`] has no way to change
//! it, so every dataset in a group is sized the same way.

use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};

use rayon::prelude::*;

use crate::core::{DateTime, Metadata, RelativeTimestamp, Statistics, TimeUnit};
use crate::dataset::{Dataset, DatasetRef};
use crate::mesh::{ElementCounts, Mesh, MeshId};
use crate::util::{Error, Result};

/// Mesh element a group's values are attached to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DataLocation {
    /// Location not known (yet).
    #[default]
    Invalid,
    OnVertices,
    OnFaces,
    /// 3D stacked cells below each face.
    OnVolumes,
    OnEdges,
}

impl DataLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::OnVertices => "vertices",
            Self::OnFaces => "faces",
            Self::OnVolumes => "volumes",
            Self::OnEdges => "edges",
        }
    }
}

/// Identifier of a dataset group, unique within the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(u64);

impl GroupId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Configures a group before it exists.
#[derive(Clone, Debug)]
pub struct DatasetGroupBuilder {
    driver_name: String,
    uri: String,
    metadata: Metadata,
    location: DataLocation,
    is_scalar: bool,
    reference_time: DateTime,
    statistics: Statistics,
}

impl DatasetGroupBuilder {
    /// Start a scalar group with unknown location.
    pub fn new(driver_name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            driver_name: driver_name.into(),
            uri: uri.into(),
            metadata: Metadata::new(),
            location: DataLocation::Invalid,
            is_scalar: true,
            reference_time: DateTime::default(),
            statistics: Statistics::EMPTY,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.metadata.set_name(name);
        self
    }

    pub fn location(mut self, location: DataLocation) -> Self {
        self.location = location;
        self
    }

    /// `true` for scalar values, `false` for 2D vectors.
    pub fn scalar(mut self, is_scalar: bool) -> Self {
        self.is_scalar = is_scalar;
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.set(key, value);
        self
    }

    pub fn reference_time(mut self, reference_time: DateTime) -> Self {
        self.reference_time = reference_time;
        self
    }

    pub fn statistics(mut self, statistics: Statistics) -> Self {
        self.statistics = statistics;
        self
    }

    /// Fix the shape and bind the group to `mesh`.
    pub fn build(self, mesh: &Mesh) -> DatasetGroup {
        DatasetGroup {
            id: GroupId::next(),
            mesh_id: mesh.id(),
            mesh_counts: mesh.counts(),
            driver_name: self.driver_name,
            uri: self.uri,
            metadata: self.metadata,
            location: self.location,
            is_scalar: self.is_scalar,
            reference_time: self.reference_time,
            statistics: self.statistics,
            in_edit_mode: false,
            datasets: Vec::new(),
        }
    }
}

/// Named, time-ordered collection of datasets of one shape.
#[derive(Debug)]
pub struct DatasetGroup {
    id: GroupId,
    mesh_id: MeshId,
    mesh_counts: ElementCounts,
    driver_name: String,
    uri: String,
    metadata: Metadata,
    location: DataLocation,
    is_scalar: bool,
    reference_time: DateTime,
    statistics: Statistics,
    in_edit_mode: bool,
    datasets: Vec<Dataset>,
}

impl DatasetGroup {
    #[inline]
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Mesh this group was built for.
    #[inline]
    pub fn mesh_id(&self) -> MeshId {
        self.mesh_id
    }

    /// Element counts of the owning mesh.
    #[inline]
    pub fn mesh_counts(&self) -> ElementCounts {
        self.mesh_counts
    }

    pub fn driver_name(&self) -> &str {
        &self.driver_name
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    #[inline]
    pub fn data_location(&self) -> DataLocation {
        self.location
    }

    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.is_scalar
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Value of the first entry for `key`, empty when absent.
    pub fn get_metadata(&self, key: &str) -> &str {
        self.metadata.get_or_empty(key)
    }

    /// Update the first entry for `key`, or append one.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.set(key, value);
    }

    /// Apply several entries with [`set_metadata`](Self::set_metadata) semantics.
    pub fn set_metadata_entries<'a>(&mut self, entries: impl IntoIterator<Item = (&'a str, &'a str)>) {
        self.metadata.extend_from(entries);
    }

    /// Entries in insertion order.
    pub fn metadata_entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.metadata.iter()
    }

    pub fn name(&self) -> &str {
        self.metadata.name()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.metadata.set_name(name);
    }

    // ========================================================================
    // Time and statistics
    // ========================================================================

    pub fn reference_time(&self) -> DateTime {
        self.reference_time
    }

    pub fn set_reference_time(&mut self, reference_time: DateTime) {
        self.reference_time = reference_time;
    }

    pub fn statistics(&self) -> Statistics {
        self.statistics
    }

    pub fn set_statistics(&mut self, statistics: Statistics) {
        self.statistics = statistics;
    }

    /// Compute statistics of every dataset from its values, store them on
    /// the datasets and the group, and return the group's.
    pub fn compute_statistics(&mut self) -> Statistics {
        let stats = self
            .datasets
            .par_iter_mut()
            .map(|ds| {
                let s = ds.compute_statistics();
                ds.set_statistics(s);
                s
            })
            .reduce(|| Statistics::EMPTY, Statistics::combine);
        self.statistics = stats;
        stats
    }

    // ========================================================================
    // Edit mode
    // ========================================================================

    pub fn is_in_edit_mode(&self) -> bool {
        self.in_edit_mode
    }

    pub fn start_editing(&mut self) {
        self.in_edit_mode = true;
    }

    pub fn stop_editing(&mut self) {
        self.in_edit_mode = false;
    }

    // ========================================================================
    // Datasets
    // ========================================================================

    /// Largest vertical level count of any dataset, 0 for an empty group.
    pub fn maximum_vertical_levels_count(&self) -> usize {
        self.datasets
            .iter()
            .map(Dataset::maximum_vertical_levels_count)
            .max()
            .unwrap_or(0)
    }

    /// Attach a dataset created for this group. Volume groups take only 3D
    /// datasets and every other location only 2D ones.
    pub fn push_dataset(&mut self, dataset: Dataset) -> Result<&Dataset> {
        if dataset.group_id() != self.id {
            return Err(Error::IncompatibleDataset(format!(
                "dataset was created for another group than '{}'",
                self.name()
            )));
        }
        let on_volumes = self.location == DataLocation::OnVolumes;
        if dataset.is_3d() != on_volumes {
            return Err(Error::IncompatibleDataset(format!(
                "{} dataset does not fit group '{}' on {}",
                if dataset.is_3d() { "3D" } else { "2D" },
                self.name(),
                self.location.as_str()
            )));
        }
        let index = self.datasets.len();
        self.datasets.push(dataset);
        Ok(&self.datasets[index])
    }

    pub fn dataset_count(&self) -> usize {
        self.datasets.len()
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn dataset(&self, index: usize) -> Option<&Dataset> {
        self.datasets.get(index)
    }

    /// Release a dataset before the group goes away.
    pub fn remove_dataset(&mut self, index: usize) -> Option<Dataset> {
        (index < self.datasets.len()).then(|| self.datasets.remove(index))
    }

    /// Index of the dataset whose time is closest to `time`.
    pub fn dataset_index_by_time(&self, time: RelativeTimestamp) -> Option<usize> {
        let target = time.value(TimeUnit::Milliseconds);
        self.datasets
            .iter()
            .enumerate()
            .map(|(i, ds)| (i, (ds.time(TimeUnit::Milliseconds) - target).abs()))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Dataset whose time is closest to `time`.
    pub fn dataset_by_time(&self, time: RelativeTimestamp) -> Option<&Dataset> {
        self.dataset_index_by_time(time).and_then(|i| self.datasets.get(i))
    }
}

/// A group borrowed together with its mesh.
#[derive(Clone, Copy)]
pub struct DatasetGroupRef<'a> {
    mesh: &'a Mesh,
    group: &'a DatasetGroup,
}

impl<'a> DatasetGroupRef<'a> {
    pub(crate) fn new(mesh: &'a Mesh, group: &'a DatasetGroup) -> Self {
        Self { mesh, group }
    }

    /// Owning mesh.
    pub fn mesh(&self) -> &'a Mesh {
        self.mesh
    }

    pub fn group(&self) -> &'a DatasetGroup {
        self.group
    }

    pub fn dataset_ref(&self, index: usize) -> Option<DatasetRef<'a>> {
        self.group
            .datasets
            .get(index)
            .map(|ds| DatasetRef::new(*self, ds))
    }

    pub fn dataset_refs(&self) -> impl Iterator<Item = DatasetRef<'a>> + 'a {
        let this = *self;
        self.group.datasets.iter().map(move |ds| DatasetRef::new(this, ds))
    }
}

impl<'a> Deref for DatasetGroupRef<'a> {
    type Target = DatasetGroup;

    fn deref(&self) -> &DatasetGroup {
        self.group
    }
}

/// Write access to a group attached to a mesh.
///
/// Only the parts that may change after attaching are reachable: name,
/// metadata, statistics, edit mode and the dataset list. The group itself
/// cannot be swapped out, so its mesh link always matches its owner.
pub struct DatasetGroupMut<'a> {
    group: &'a mut DatasetGroup,
}

impl<'a> DatasetGroupMut<'a> {
    pub(crate) fn new(group: &'a mut DatasetGroup) -> Self {
        Self { group }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.group.set_name(name);
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.group.set_metadata(key, value);
    }

    pub fn set_metadata_entries<'e>(&mut self, entries: impl IntoIterator<Item = (&'e str, &'e str)>) {
        self.group.set_metadata_entries(entries);
    }

    pub fn set_reference_time(&mut self, reference_time: DateTime) {
        self.group.set_reference_time(reference_time);
    }

    pub fn set_statistics(&mut self, statistics: Statistics) {
        self.group.set_statistics(statistics);
    }

    pub fn compute_statistics(&mut self) -> Statistics {
        self.group.compute_statistics()
    }

    pub fn start_editing(&mut self) {
        self.group.start_editing();
    }

    pub fn stop_editing(&mut self) {
        self.group.stop_editing();
    }

    /// See [`DatasetGroup::push_dataset`].
    pub fn push_dataset(&mut self, dataset: Dataset) -> Result<&Dataset> {
        self.group.push_dataset(dataset)
    }

    pub fn remove_dataset(&mut self, index: usize) -> Option<Dataset> {
        self.group.remove_dataset(index)
    }
}

impl Deref for DatasetGroupMut<'_> {
    type Target = DatasetGroup;

    fn deref(&self) -> &DatasetGroup {
        self.group
    }
}

impl std::fmt::Debug for DatasetGroupMut<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&*self.group, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Dataset, MemoryDataset2D, MemoryDataset3D};
    use crate::mesh::{ElementCounts, MemoryGeometry, MeshInfo};

    fn mesh(vertices: usize, faces: usize) -> Mesh {
        let info = MeshInfo {
            driver_name: "Test".into(),
            counts: ElementCounts { vertices, edges: 0, faces },
            face_vertices_maximum_count: 3,
            ..Default::default()
        };
        Mesh::new(info, Box::new(MemoryGeometry::default()))
    }

    #[test]
    fn test_builder_shape() {
        let m = mesh(10, 4);
        let group = DatasetGroupBuilder::new("Test", "res.dat")
            .name("Velocity")
            .location(DataLocation::OnFaces)
            .scalar(false)
            .build(&m);

        assert_eq!(group.name(), "Velocity");
        assert_eq!(group.get_metadata("name"), "Velocity");
        assert_eq!(group.data_location(), DataLocation::OnFaces);
        assert!(!group.is_scalar());
        assert_eq!(group.driver_name(), "Test");
        assert_eq!(group.uri(), "res.dat");
        assert_eq!(group.mesh_id(), m.id());
        assert!(!group.reference_time().is_valid());
    }

    #[test]
    fn test_metadata_ops() {
        let m = mesh(3, 1);
        let mut group = DatasetGroupBuilder::new("Test", "").build(&m);
        assert_eq!(group.get_metadata("units"), "");

        group.set_metadata("units", "m");
        group.set_metadata("units", "ft");
        assert_eq!(group.get_metadata("units"), "ft");
        assert_eq!(group.metadata().len(), 1);

        group.set_metadata_entries([("units", "m/s"), ("source", "model")]);
        assert_eq!(group.get_metadata("units"), "m/s");
        assert_eq!(group.metadata_entries().count(), 2);

        group.set_name("Speed");
        assert_eq!(group.name(), "Speed");
        assert_eq!(group.get_metadata("name"), "Speed");
    }

    #[test]
    fn test_edit_mode_flag() {
        let m = mesh(3, 1);
        let mut group = DatasetGroupBuilder::new("Test", "").build(&m);
        assert!(!group.is_in_edit_mode());
        group.start_editing();
        assert!(group.is_in_edit_mode());
        group.stop_editing();
        assert!(!group.is_in_edit_mode());
    }

    #[test]
    fn test_maximum_vertical_levels_true_maximum() {
        let m = mesh(3, 2);
        let mut group = DatasetGroupBuilder::new("Test", "")
            .location(DataLocation::OnVolumes)
            .build(&m);
        assert_eq!(group.maximum_vertical_levels_count(), 0);

        for levels in [[2, 1], [5, 3], [1, 4]] {
            let values = MemoryDataset3D::from_levels(&levels, Vec::new(), Vec::new());
            let ds = Dataset::from_memory_3d(&group, values);
            group.push_dataset(ds).unwrap();
        }
        // Max over all datasets, not the first one above zero.
        assert_eq!(group.maximum_vertical_levels_count(), 5);
    }

    #[test]
    fn test_push_dataset_from_other_group() {
        let m = mesh(3, 1);
        let a = DatasetGroupBuilder::new("Test", "")
            .location(DataLocation::OnVertices)
            .build(&m);
        let mut b = DatasetGroupBuilder::new("Test", "")
            .location(DataLocation::OnVertices)
            .build(&m);

        let ds = Dataset::new_2d(&a, MemoryDataset2D::scalar(vec![1.0, 2.0, 3.0]));
        assert!(matches!(b.push_dataset(ds), Err(Error::IncompatibleDataset(_))));
        assert_eq!(b.dataset_count(), 0);
    }

    #[test]
    fn test_push_dataset_shape_mismatch() {
        let m = mesh(3, 1);
        let mut flat = DatasetGroupBuilder::new("Test", "")
            .location(DataLocation::OnFaces)
            .build(&m);
        let stacked = MemoryDataset3D::from_levels(&[2], vec![0.0, -1.0, -2.0], vec![1.0, 2.0]);
        let ds = Dataset::from_memory_3d(&flat, stacked);
        assert!(matches!(flat.push_dataset(ds), Err(Error::IncompatibleDataset(_))));

        let mut volumes = DatasetGroupBuilder::new("Test", "")
            .location(DataLocation::OnVolumes)
            .build(&m);
        let ds = Dataset::new_2d(&volumes, MemoryDataset2D::scalar(vec![1.0]));
        assert!(matches!(volumes.push_dataset(ds), Err(Error::IncompatibleDataset(_))));
        assert_eq!(volumes.dataset_count(), 0);
    }

    #[test]
    fn test_dataset_by_time_and_remove() {
        let m = mesh(2, 1);
        let mut group = DatasetGroupBuilder::new("Test", "")
            .location(DataLocation::OnVertices)
            .build(&m);
        for hours in [0.0, 1.0, 2.0] {
            let mut ds = Dataset::new_2d(&group, MemoryDataset2D::scalar(vec![hours; 2]));
            ds.set_time(hours, TimeUnit::Hours);
            group.push_dataset(ds).unwrap();
        }

        let t = RelativeTimestamp::new(70.0, TimeUnit::Minutes);
        assert_eq!(group.dataset_index_by_time(t), Some(1));

        let nearest = group.dataset_by_time(RelativeTimestamp::from_hours(5.0)).unwrap();
        assert_eq!(nearest.time(TimeUnit::Hours), 2.0);

        let removed = group.remove_dataset(0).unwrap();
        assert_eq!(removed.time(TimeUnit::Hours), 0.0);
        assert_eq!(group.dataset_count(), 2);
        assert!(group.remove_dataset(9).is_none());
    }

    #[test]
    fn test_compute_statistics() {
        let m = mesh(3, 1);
        let mut group = DatasetGroupBuilder::new("Test", "")
            .location(DataLocation::OnVertices)
            .build(&m);
        for values in [vec![1.0, f64::NAN, 3.0], vec![-2.0, 0.0, 2.5]] {
            let ds = Dataset::new_2d(&group, MemoryDataset2D::scalar(values));
            group.push_dataset(ds).unwrap();
        }

        let stats = group.compute_statistics();
        assert_eq!(stats, Statistics::new(-2.0, 3.0));
        assert_eq!(group.statistics(), stats);
        assert_eq!(group.datasets()[0].statistics(), Statistics::new(1.0, 3.0));
    }
}
