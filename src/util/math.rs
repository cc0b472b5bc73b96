//! Math type re-exports and mesh extent types.

pub use glam::{DVec2, DVec3};

use bytemuck::{Pod, Zeroable};
use std::fmt;

/// Vertex coordinates (x, y, z). Z is NaN-free by convention; 2D formats store 0.
pub type Vertex = DVec3;

/// 2D bounding box of a mesh in its source CRS.
#[derive(Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct BBox {
    pub min: DVec2,
    pub max: DVec2,
}

impl BBox {
    /// Empty bounding box (inverted, will expand on first point).
    pub const EMPTY: Self = Self {
        min: DVec2::splat(f64::INFINITY),
        max: DVec2::splat(f64::NEG_INFINITY),
    };

    /// Create a new bounding box from min and max corners.
    #[inline]
    pub const fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    /// Create from individual bounds, in the `minX, maxX, minY, maxY` order
    /// drivers usually read them in.
    #[inline]
    pub const fn from_bounds(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min: DVec2::new(min_x, min_y),
            max: DVec2::new(max_x, max_y),
        }
    }

    /// Compute the extent of a set of vertices (z is ignored).
    pub fn from_vertices<'a>(vertices: impl IntoIterator<Item = &'a Vertex>) -> Self {
        let mut b = Self::EMPTY;
        for v in vertices {
            b.expand_by_point(v.truncate());
        }
        b
    }

    /// Check if this box is empty (has no area and no points).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// Expand this box to include a point.
    #[inline]
    pub fn expand_by_point(&mut self, p: DVec2) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Expand this box to include another box.
    #[inline]
    pub fn expand_by_box(&mut self, other: &Self) {
        if !other.is_empty() {
            self.min = self.min.min(other.min);
            self.max = self.max.max(other.max);
        }
    }

    /// Get the center of the box.
    #[inline]
    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    /// Get the size (extents) of the box.
    #[inline]
    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }
}

impl Default for BBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for BBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BBox({:?} - {:?})", self.min, self.max)
    }
}
