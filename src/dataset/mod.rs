//! Datasets and dataset groups.
//!
//! A [`Dataset`] is one timestep of values for a [`DatasetGroup`]. It comes
//! in two shapes: 2D (values on vertices, faces or edges) and 3D (values on
//! volumes stacked below each face). Values come from a [`DatasetValues`]
//! source supplied by the driver; the dataset clamps every read to the
//! valid range and pads the rest of the caller's buffer with NaN.
//!
//! - [`DatasetGroupBuilder`] / [`DatasetGroup`] - Groups with a fixed shape
//! - [`Dataset`] / [`DatasetShape`] - Per-timestep values
//! - [`MemoryDataset2D`] / [`MemoryDataset3D`] - Fully materialized sources

mod group;
mod memory;

use std::fmt;
use std::ops::Deref;

use crate::core::{RelativeTimestamp, Statistics, TimeUnit};
use crate::mesh::{ElementCounts, Mesh};

pub use group::{DataLocation, DatasetGroup, DatasetGroupBuilder, DatasetGroupMut, DatasetGroupRef, GroupId};
pub use memory::{MemoryDataset2D, MemoryDataset3D};

/// Values read per chunk when computing statistics.
const STATISTICS_CHUNK: usize = 1000;

/// Value source of a dataset.
///
/// Every method receives the first element index and an output slice whose
/// length is the requested count (for vector data, two slots per value).
/// It returns how many values it wrote; it never writes past that. The
/// defaults write nothing, so a 2D source only implements the 2D methods.
pub trait DatasetValues: Send + Sync {
    /// Whether [`active_data`](Self::active_data) is meaningful.
    fn supports_active_flag(&self) -> bool {
        false
    }

    /// Scalar values on vertices, faces or edges.
    fn scalar_data(&self, _index: usize, _out: &mut [f64]) -> usize {
        0
    }

    /// Vector values as interleaved `x, y` pairs.
    fn vector_data(&self, _index: usize, _out: &mut [f64]) -> usize {
        0
    }

    /// Active flags (1 active, 0 inactive).
    fn active_data(&self, _index: usize, _out: &mut [i32]) -> usize {
        0
    }

    /// Number of vertical levels per face.
    fn vertical_level_count_data(&self, _index: usize, _out: &mut [i32]) -> usize {
        0
    }

    /// Level elevations, face by face, top to bottom.
    fn vertical_level_data(&self, _index: usize, _out: &mut [f64]) -> usize {
        0
    }

    /// Index of the first volume of each face.
    fn face_to_volume_data(&self, _index: usize, _out: &mut [i32]) -> usize {
        0
    }

    /// Scalar values on volumes.
    fn scalar_volumes_data(&self, _index: usize, _out: &mut [f64]) -> usize {
        0
    }

    /// Vector values on volumes as interleaved `x, y` pairs.
    fn vector_volumes_data(&self, _index: usize, _out: &mut [f64]) -> usize {
        0
    }
}

/// Structural variant of a dataset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DatasetShape {
    /// Values on the 2D mesh, no vertical dimension.
    #[default]
    TwoD,
    /// Values on volumes, fixed at construction.
    ThreeD {
        volumes_count: usize,
        maximum_vertical_levels_count: usize,
    },
}

/// Values of one dataset group at one time.
pub struct Dataset {
    group_id: GroupId,
    location: DataLocation,
    is_scalar: bool,
    mesh_counts: ElementCounts,
    shape: DatasetShape,
    time: RelativeTimestamp,
    is_valid: bool,
    supports_active_flag: bool,
    statistics: Statistics,
    values: Box<dyn DatasetValues>,
}

impl Dataset {
    fn with_shape(group: &DatasetGroup, shape: DatasetShape, values: Box<dyn DatasetValues>) -> Self {
        Self {
            group_id: group.id(),
            location: group.data_location(),
            is_scalar: group.is_scalar(),
            mesh_counts: group.mesh_counts(),
            shape,
            time: RelativeTimestamp::default(),
            is_valid: true,
            supports_active_flag: values.supports_active_flag(),
            statistics: Statistics::EMPTY,
            values,
        }
    }

    /// Create a 2D dataset for `group`. It still has to be pushed with
    /// [`DatasetGroup::push_dataset`].
    pub fn new_2d(group: &DatasetGroup, values: impl DatasetValues + 'static) -> Self {
        Self::with_shape(group, DatasetShape::TwoD, Box::new(values))
    }

    /// Create a 3D dataset with a fixed volume count and level maximum.
    pub fn new_3d(
        group: &DatasetGroup,
        volumes_count: usize,
        maximum_vertical_levels_count: usize,
        values: impl DatasetValues + 'static,
    ) -> Self {
        let shape = DatasetShape::ThreeD {
            volumes_count,
            maximum_vertical_levels_count,
        };
        Self::with_shape(group, shape, Box::new(values))
    }

    /// Create a 3D dataset whose counts come from the memory source.
    pub fn from_memory_3d(group: &DatasetGroup, values: MemoryDataset3D) -> Self {
        let volumes = values.volumes_count();
        let levels = values.maximum_vertical_levels_count();
        Self::new_3d(group, volumes, levels, values)
    }

    /// Group this dataset was created for.
    #[inline]
    pub fn group_id(&self) -> GroupId {
        self.group_id
    }

    #[inline]
    pub fn shape(&self) -> DatasetShape {
        self.shape
    }

    #[inline]
    pub fn is_3d(&self) -> bool {
        matches!(self.shape, DatasetShape::ThreeD { .. })
    }

    #[inline]
    pub fn data_location(&self) -> DataLocation {
        self.location
    }

    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.is_scalar
    }

    /// Number of values, following the group's data location.
    pub fn values_count(&self) -> usize {
        match self.location {
            DataLocation::OnVertices => self.mesh_counts.vertices,
            DataLocation::OnFaces => self.mesh_counts.faces,
            DataLocation::OnEdges => self.mesh_counts.edges,
            DataLocation::OnVolumes => self.volumes_count(),
            DataLocation::Invalid => 0,
        }
    }

    /// Volume count; always 0 for 2D datasets.
    pub fn volumes_count(&self) -> usize {
        match self.shape {
            DatasetShape::TwoD => 0,
            DatasetShape::ThreeD { volumes_count, .. } => volumes_count,
        }
    }

    /// Largest number of levels under one face; always 0 for 2D datasets.
    pub fn maximum_vertical_levels_count(&self) -> usize {
        match self.shape {
            DatasetShape::TwoD => 0,
            DatasetShape::ThreeD {
                maximum_vertical_levels_count,
                ..
            } => maximum_vertical_levels_count,
        }
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Time converted to `unit`.
    pub fn time(&self, unit: TimeUnit) -> f64 {
        self.time.value(unit)
    }

    pub fn timestamp(&self) -> RelativeTimestamp {
        self.time
    }

    pub fn set_time(&mut self, value: f64, unit: TimeUnit) {
        self.time = RelativeTimestamp::new(value, unit);
    }

    pub fn set_timestamp(&mut self, time: RelativeTimestamp) {
        self.time = time;
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn set_valid(&mut self, is_valid: bool) {
        self.is_valid = is_valid;
    }

    pub fn supports_active_flag(&self) -> bool {
        self.supports_active_flag
    }

    pub fn set_supports_active_flag(&mut self, supports: bool) {
        self.supports_active_flag = supports;
    }

    pub fn statistics(&self) -> Statistics {
        self.statistics
    }

    pub fn set_statistics(&mut self, statistics: Statistics) {
        self.statistics = statistics;
    }

    // ========================================================================
    // Values
    // ========================================================================

    /// Scalar values from `index`, `out.len()` requested. Positions past the
    /// data are set to NaN. 3D datasets have no 2D values and write 0.
    pub fn scalar_data(&self, index: usize, out: &mut [f64]) -> usize {
        let domain = if self.is_3d() { 0 } else { self.values_count() };
        read_f64(domain, index, out, 1, |i, buf| self.values.scalar_data(i, buf))
    }

    /// Vector values from `index` as `x, y` pairs; `out.len() / 2` values
    /// requested.
    pub fn vector_data(&self, index: usize, out: &mut [f64]) -> usize {
        let domain = if self.is_3d() { 0 } else { self.values_count() };
        read_f64(domain, index, out, 2, |i, buf| self.values.vector_data(i, buf))
    }

    /// Active flags from `index`.
    ///
    /// # Panics
    ///
    /// If the dataset does not support active flags.
    pub fn active_data(&self, index: usize, out: &mut [i32]) -> usize {
        assert!(
            self.supports_active_flag,
            "active flag requested from a dataset without active flag support"
        );
        read_i32(self.values_count(), index, out, |i, buf| self.values.active_data(i, buf))
    }

    /// Vertical level count per face. 2D datasets write 0 values.
    pub fn vertical_level_count_data(&self, index: usize, out: &mut [i32]) -> usize {
        if !self.is_3d() {
            return 0;
        }
        read_i32(self.mesh_counts.faces, index, out, |i, buf| {
            self.values.vertical_level_count_data(i, buf)
        })
    }

    /// Level elevations; one more level than volumes per face. 2D datasets
    /// write 0 values.
    pub fn vertical_level_data(&self, index: usize, out: &mut [f64]) -> usize {
        if !self.is_3d() {
            return 0;
        }
        let domain = self.volumes_count() + self.mesh_counts.faces;
        read_f64(domain, index, out, 1, |i, buf| self.values.vertical_level_data(i, buf))
    }

    /// First volume index per face. 2D datasets write 0 values.
    pub fn face_to_volume_data(&self, index: usize, out: &mut [i32]) -> usize {
        if !self.is_3d() {
            return 0;
        }
        read_i32(self.mesh_counts.faces, index, out, |i, buf| {
            self.values.face_to_volume_data(i, buf)
        })
    }

    /// Scalar values on volumes. 2D datasets write 0 values.
    pub fn scalar_volumes_data(&self, index: usize, out: &mut [f64]) -> usize {
        if !self.is_3d() {
            return 0;
        }
        read_f64(self.volumes_count(), index, out, 1, |i, buf| {
            self.values.scalar_volumes_data(i, buf)
        })
    }

    /// Vector values on volumes as `x, y` pairs. 2D datasets write 0 values.
    pub fn vector_volumes_data(&self, index: usize, out: &mut [f64]) -> usize {
        if !self.is_3d() {
            return 0;
        }
        read_f64(self.volumes_count(), index, out, 2, |i, buf| {
            self.values.vector_volumes_data(i, buf)
        })
    }

    /// Min/max over all values. Vector values contribute their magnitude.
    pub fn compute_statistics(&self) -> Statistics {
        let stride = if self.is_scalar { 1 } else { 2 };
        let mut stats = Statistics::EMPTY;
        let mut buf = vec![f64::NAN; STATISTICS_CHUNK * stride];
        let mut index = 0;
        while index < self.values_count() {
            let n = match (self.is_3d(), self.is_scalar) {
                (false, true) => self.scalar_data(index, &mut buf),
                (false, false) => self.vector_data(index, &mut buf),
                (true, true) => self.scalar_volumes_data(index, &mut buf),
                (true, false) => self.vector_volumes_data(index, &mut buf),
            };
            if n == 0 {
                break;
            }
            if self.is_scalar {
                stats.add_values(&buf[..n]);
            } else {
                for xy in buf[..n * 2].chunks_exact(2) {
                    stats.add_value(xy[0].hypot(xy[1]));
                }
            }
            index += n;
        }
        stats
    }
}

/// Read up to `out.len() / stride` values of a channel with `domain`
/// values, NaN-padding whatever the source did not fill.
fn read_f64(
    domain: usize,
    index: usize,
    out: &mut [f64],
    stride: usize,
    read: impl FnOnce(usize, &mut [f64]) -> usize,
) -> usize {
    let requested = out.len() / stride;
    let available = domain.saturating_sub(index).min(requested);
    let written = if available > 0 {
        read(index, &mut out[..available * stride]).min(available)
    } else {
        0
    };
    out[written * stride..].fill(f64::NAN);
    if written < requested {
        tracing::trace!(index, requested, written, "short dataset read");
    }
    written
}

/// Integer channels have no sentinel; positions past the data are left as is.
fn read_i32(
    domain: usize,
    index: usize,
    out: &mut [i32],
    read: impl FnOnce(usize, &mut [i32]) -> usize,
) -> usize {
    let available = domain.saturating_sub(index).min(out.len());
    if available == 0 {
        return 0;
    }
    read(index, &mut out[..available]).min(available)
}

impl fmt::Debug for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dataset")
            .field("group_id", &self.group_id)
            .field("location", &self.location)
            .field("shape", &self.shape)
            .field("time", &self.time)
            .field("is_valid", &self.is_valid)
            .field("statistics", &self.statistics)
            .finish()
    }
}

/// A dataset borrowed together with its group and mesh.
#[derive(Clone, Copy)]
pub struct DatasetRef<'a> {
    group: DatasetGroupRef<'a>,
    dataset: &'a Dataset,
}

impl<'a> DatasetRef<'a> {
    pub(crate) fn new(group: DatasetGroupRef<'a>, dataset: &'a Dataset) -> Self {
        Self { group, dataset }
    }

    /// Owning group.
    pub fn group(&self) -> DatasetGroupRef<'a> {
        self.group
    }

    /// Owning mesh, through the group.
    pub fn mesh(&self) -> &'a Mesh {
        self.group.mesh()
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }
}

impl<'a> Deref for DatasetRef<'a> {
    type Target = Dataset;

    fn deref(&self) -> &Dataset {
        self.dataset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{MemoryGeometry, MeshInfo};

    fn mesh(vertices: usize, edges: usize, faces: usize) -> Mesh {
        let info = MeshInfo {
            driver_name: "Test".into(),
            counts: ElementCounts { vertices, edges, faces },
            face_vertices_maximum_count: 4,
            ..Default::default()
        };
        Mesh::new(info, Box::new(MemoryGeometry::default()))
    }

    fn group(mesh: &Mesh, location: DataLocation, scalar: bool) -> DatasetGroup {
        DatasetGroupBuilder::new("Test", "")
            .location(location)
            .scalar(scalar)
            .build(mesh)
    }

    #[test]
    fn test_values_count_follows_location() {
        let m = mesh(100, 30, 50);
        for (location, expected) in [
            (DataLocation::OnVertices, 100),
            (DataLocation::OnEdges, 30),
            (DataLocation::OnFaces, 50),
            (DataLocation::OnVolumes, 0),
            (DataLocation::Invalid, 0),
        ] {
            let g = group(&m, location, true);
            let ds = Dataset::new_2d(&g, MemoryDataset2D::scalar(Vec::new()));
            assert_eq!(ds.values_count(), expected, "{:?}", location);
        }

        let g = group(&m, DataLocation::OnVolumes, true);
        let ds = Dataset::new_3d(&g, 240, 6, MemoryDataset3D::default());
        assert_eq!(ds.values_count(), 240);
    }

    #[test]
    fn test_2d_has_no_vertical_dimension() {
        let m = mesh(4, 0, 2);
        let g = group(&m, DataLocation::OnFaces, true);
        let ds = Dataset::new_2d(&g, MemoryDataset2D::scalar(vec![1.0, 2.0]));

        assert_eq!(ds.volumes_count(), 0);
        assert_eq!(ds.maximum_vertical_levels_count(), 0);

        let mut ints = [7i32; 4];
        let mut doubles = [7.0f64; 4];
        assert_eq!(ds.vertical_level_count_data(0, &mut ints), 0);
        assert_eq!(ds.face_to_volume_data(0, &mut ints), 0);
        assert_eq!(ds.vertical_level_data(0, &mut doubles), 0);
        assert_eq!(ds.scalar_volumes_data(0, &mut doubles), 0);
        assert_eq!(ds.vector_volumes_data(0, &mut doubles), 0);
        assert_eq!(ints, [7; 4]);
    }

    #[test]
    fn test_scalar_read_pads_with_nan() {
        let m = mesh(100, 0, 0);
        let g = group(&m, DataLocation::OnVertices, true);
        let values: Vec<f64> = (0..100).map(f64::from).collect();
        let ds = Dataset::new_2d(&g, MemoryDataset2D::scalar(values));

        let mut buf = [0.0; 10];
        assert_eq!(ds.scalar_data(95, &mut buf), 5);
        assert_eq!(&buf[..5], &[95.0, 96.0, 97.0, 98.0, 99.0]);
        assert!(buf[5..].iter().all(|v| v.is_nan()));

        let mut buf = [0.0; 3];
        assert_eq!(ds.scalar_data(500, &mut buf), 0);
        assert!(buf.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_short_source_is_padded() {
        // Source holds fewer values than the mesh has vertices.
        let m = mesh(10, 0, 0);
        let g = group(&m, DataLocation::OnVertices, true);
        let ds = Dataset::new_2d(&g, MemoryDataset2D::scalar(vec![1.0, 2.0]));

        let mut buf = [0.0; 4];
        assert_eq!(ds.scalar_data(0, &mut buf), 2);
        assert!(buf[2].is_nan() && buf[3].is_nan());
    }

    #[test]
    fn test_vector_read() {
        let m = mesh(3, 0, 0);
        let g = group(&m, DataLocation::OnVertices, false);
        let ds = Dataset::new_2d(
            &g,
            MemoryDataset2D::vector(vec![1.0, 0.0, 0.0, 2.0, 3.0, 4.0]),
        );

        let mut buf = [0.0; 6];
        assert_eq!(ds.vector_data(1, &mut buf), 2);
        assert_eq!(&buf[..4], &[0.0, 2.0, 3.0, 4.0]);
        assert!(buf[4].is_nan() && buf[5].is_nan());

        assert_eq!(ds.compute_statistics(), Statistics::new(1.0, 5.0));
    }

    #[test]
    fn test_active_flag() {
        let m = mesh(0, 0, 3);
        let g = group(&m, DataLocation::OnFaces, true);
        let values = MemoryDataset2D::scalar(vec![1.0, 2.0, 3.0]).with_active(vec![true, false, true]);
        let ds = Dataset::new_2d(&g, values);
        assert!(ds.supports_active_flag());

        let mut flags = [9i32; 4];
        assert_eq!(ds.active_data(0, &mut flags), 3);
        assert_eq!(flags, [1, 0, 1, 9]);
    }

    #[test]
    #[should_panic(expected = "active flag")]
    fn test_active_flag_without_support_panics() {
        let m = mesh(0, 0, 3);
        let g = group(&m, DataLocation::OnFaces, true);
        let ds = Dataset::new_2d(&g, MemoryDataset2D::scalar(vec![1.0, 2.0, 3.0]));
        let mut flags = [0i32; 3];
        ds.active_data(0, &mut flags);
    }

    #[test]
    fn test_3d_reads() {
        let m = mesh(0, 0, 2);
        let g = group(&m, DataLocation::OnVolumes, true);
        // Face 0 has 2 volumes, face 1 has 1.
        let values = MemoryDataset3D::from_levels(
            &[2, 1],
            vec![0.0, -1.0, -2.0, 0.0, -3.0],
            vec![10.0, 20.0, 30.0],
        );
        let ds = Dataset::from_memory_3d(&g, values);

        assert_eq!(ds.volumes_count(), 3);
        assert_eq!(ds.maximum_vertical_levels_count(), 2);
        assert_eq!(ds.values_count(), 3);

        let mut counts = [0i32; 2];
        assert_eq!(ds.vertical_level_count_data(0, &mut counts), 2);
        assert_eq!(counts, [2, 1]);

        let mut f2v = [0i32; 2];
        assert_eq!(ds.face_to_volume_data(0, &mut f2v), 2);
        assert_eq!(f2v, [0, 2]);

        let mut levels = [0.0; 6];
        assert_eq!(ds.vertical_level_data(0, &mut levels), 5);
        assert!(levels[5].is_nan());

        let mut vals = [0.0; 4];
        assert_eq!(ds.scalar_volumes_data(1, &mut vals), 2);
        assert_eq!(&vals[..2], &[20.0, 30.0]);
        assert!(vals[2].is_nan());

        // No 2D values on a 3D dataset.
        let mut flat = [0.0; 2];
        assert_eq!(ds.scalar_data(0, &mut flat), 0);
        assert!(flat.iter().all(|v| v.is_nan()));

        assert_eq!(ds.compute_statistics(), Statistics::new(10.0, 30.0));
    }

    #[test]
    fn test_time_units() {
        let m = mesh(1, 0, 0);
        let g = group(&m, DataLocation::OnVertices, true);
        let mut ds = Dataset::new_2d(&g, MemoryDataset2D::scalar(vec![0.0]));
        ds.set_time(1800.0, TimeUnit::Seconds);
        assert_eq!(ds.time(TimeUnit::Hours), 0.5);
        assert_eq!(ds.time(TimeUnit::Seconds), 1800.0);

        assert!(ds.is_valid());
        ds.set_valid(false);
        assert!(!ds.is_valid());
    }
}
