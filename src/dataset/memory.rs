//! Dataset sources backed by plain vectors.

use crate::dataset::DatasetValues;
use crate::util::DVec2;

/// Copy `out.len()` items of `src` starting at `index` (fewer at the end).
fn copy_from<T: Copy>(src: &[T], index: usize, out: &mut [T]) -> usize {
    let Some(rest) = src.get(index..) else {
        return 0;
    };
    let n = rest.len().min(out.len());
    out[..n].copy_from_slice(&rest[..n]);
    n
}

/// Interleaved `x, y` pairs; `index` counts pairs.
fn copy_pairs(src: &[f64], index: usize, out: &mut [f64]) -> usize {
    let pairs = out.len() / 2;
    let Some(rest) = src.get(index * 2..) else {
        return 0;
    };
    let n = (rest.len() / 2).min(pairs);
    out[..n * 2].copy_from_slice(&rest[..n * 2]);
    n
}

/// Values of a 2D dataset.
#[derive(Clone, Debug, Default)]
pub struct MemoryDataset2D {
    scalars: Vec<f64>,
    /// Interleaved `x, y`.
    vectors: Vec<f64>,
    active: Option<Vec<i32>>,
}

impl MemoryDataset2D {
    pub fn scalar(values: Vec<f64>) -> Self {
        Self {
            scalars: values,
            ..Default::default()
        }
    }

    /// Vector values given as interleaved `x, y` pairs.
    pub fn vector(values: Vec<f64>) -> Self {
        Self {
            vectors: values,
            ..Default::default()
        }
    }

    pub fn from_vectors(values: &[DVec2]) -> Self {
        Self::vector(values.iter().flat_map(|v| [v.x, v.y]).collect())
    }

    /// Add per-element active flags, which turns on active flag support.
    pub fn with_active(mut self, active: Vec<bool>) -> Self {
        self.active = Some(active.into_iter().map(i32::from).collect());
        self
    }
}

impl DatasetValues for MemoryDataset2D {
    fn supports_active_flag(&self) -> bool {
        self.active.is_some()
    }

    fn scalar_data(&self, index: usize, out: &mut [f64]) -> usize {
        copy_from(&self.scalars, index, out)
    }

    fn vector_data(&self, index: usize, out: &mut [f64]) -> usize {
        copy_pairs(&self.vectors, index, out)
    }

    fn active_data(&self, index: usize, out: &mut [i32]) -> usize {
        self.active.as_deref().map_or(0, |a| copy_from(a, index, out))
    }
}

/// Values of a 3D (stacked) dataset.
#[derive(Clone, Debug, Default)]
pub struct MemoryDataset3D {
    level_counts: Vec<i32>,
    face_to_volume: Vec<i32>,
    /// `level_counts[f] + 1` elevations per face.
    levels: Vec<f64>,
    scalars: Vec<f64>,
    /// Interleaved `x, y`.
    vectors: Vec<f64>,
}

impl MemoryDataset3D {
    /// Scalar volumes from per-face volume counts. Each face's first volume
    /// index is the running sum of the counts before it.
    pub fn from_levels(level_counts: &[i32], levels: Vec<f64>, values: Vec<f64>) -> Self {
        let face_to_volume = level_counts
            .iter()
            .scan(0i32, |next, &count| {
                let first = *next;
                *next += count.max(0);
                Some(first)
            })
            .collect();
        Self {
            level_counts: level_counts.to_vec(),
            face_to_volume,
            levels,
            scalars: values,
            vectors: Vec::new(),
        }
    }

    /// Vector volumes, values as interleaved `x, y` pairs.
    pub fn from_levels_vector(level_counts: &[i32], levels: Vec<f64>, values: Vec<f64>) -> Self {
        let mut this = Self::from_levels(level_counts, levels, Vec::new());
        this.vectors = values;
        this
    }

    /// Total number of volumes.
    pub fn volumes_count(&self) -> usize {
        self.level_counts.iter().map(|&c| c.max(0) as usize).sum()
    }

    /// Largest volume count of a single face.
    pub fn maximum_vertical_levels_count(&self) -> usize {
        self.level_counts
            .iter()
            .map(|&c| c.max(0) as usize)
            .max()
            .unwrap_or(0)
    }
}

impl DatasetValues for MemoryDataset3D {
    fn vertical_level_count_data(&self, index: usize, out: &mut [i32]) -> usize {
        copy_from(&self.level_counts, index, out)
    }

    fn vertical_level_data(&self, index: usize, out: &mut [f64]) -> usize {
        copy_from(&self.levels, index, out)
    }

    fn face_to_volume_data(&self, index: usize, out: &mut [i32]) -> usize {
        copy_from(&self.face_to_volume, index, out)
    }

    fn scalar_volumes_data(&self, index: usize, out: &mut [f64]) -> usize {
        copy_from(&self.scalars, index, out)
    }

    fn vector_volumes_data(&self, index: usize, out: &mut [f64]) -> usize {
        copy_pairs(&self.vectors, index, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_past_end() {
        let src = [1.0, 2.0, 3.0];
        let mut out = [0.0; 2];
        assert_eq!(copy_from(&src, 2, &mut out), 1);
        assert_eq!(out[0], 3.0);
        assert_eq!(copy_from(&src, 3, &mut out), 0);
        assert_eq!(copy_from(&src, 10, &mut out), 0);
    }

    #[test]
    fn test_vector_pairs() {
        let ds = MemoryDataset2D::from_vectors(&[DVec2::new(1.0, 2.0), DVec2::new(3.0, 4.0)]);
        let mut out = [0.0; 4];
        assert_eq!(ds.vector_data(1, &mut out), 1);
        assert_eq!(&out[..2], &[3.0, 4.0]);
        assert_eq!(ds.scalar_data(0, &mut out), 0);
        assert!(!ds.supports_active_flag());
    }

    #[test]
    fn test_active_flags() {
        let ds = MemoryDataset2D::scalar(vec![0.0; 3]).with_active(vec![false, true, true]);
        assert!(ds.supports_active_flag());
        let mut out = [5; 3];
        assert_eq!(ds.active_data(1, &mut out), 2);
        assert_eq!(out, [1, 1, 5]);
    }

    #[test]
    fn test_3d_layout() {
        let ds = MemoryDataset3D::from_levels(&[3, 0, 2], Vec::new(), vec![0.0; 5]);
        assert_eq!(ds.volumes_count(), 5);
        assert_eq!(ds.maximum_vertical_levels_count(), 3);

        let mut f2v = [0i32; 3];
        assert_eq!(ds.face_to_volume_data(0, &mut f2v), 3);
        assert_eq!(f2v, [0, 3, 3]);
    }
}
