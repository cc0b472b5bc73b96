//! Streaming access to mesh geometry.
//!
//! Drivers backed by large files hand out geometry in batches instead of
//! materializing it. Each iterator is one-pass: once `next_batch` returns
//! 0 the sequence is exhausted. Consumers size their buffers from the
//! counts stored on [`Mesh`](super::Mesh).

use smallvec::SmallVec;

use crate::util::Vertex;

/// Vertex indices of one face, in winding order.
pub type FaceVertices = SmallVec<[usize; 4]>;

/// Start and end vertex index of an edge.
pub type Edge = [usize; 2];

/// Batched producer of vertex coordinates.
pub trait MeshVertexIterator {
    /// Write up to `vertices.len()` vertices and return how many were written.
    fn next_batch(&mut self, vertices: &mut [Vertex]) -> usize;
}

/// Batched producer of faces.
pub trait MeshFaceIterator {
    /// Write whole faces until either buffer is full.
    ///
    /// `face_offsets[i]` receives the end (exclusive) of face `i` inside
    /// `vertex_indices` for this batch. Returns the number of faces written.
    fn next_batch(&mut self, face_offsets: &mut [usize], vertex_indices: &mut [usize]) -> usize;
}

/// Batched producer of edges.
pub trait MeshEdgeIterator {
    /// Write up to `edges.len()` edges and return how many were written.
    fn next_batch(&mut self, edges: &mut [Edge]) -> usize;
}

/// Source of a mesh's geometry. Each call starts a fresh pass.
pub trait MeshGeometry: Send + Sync {
    fn read_vertices(&self) -> Box<dyn MeshVertexIterator + '_>;
    fn read_faces(&self) -> Box<dyn MeshFaceIterator + '_>;
    fn read_edges(&self) -> Box<dyn MeshEdgeIterator + '_>;
}

const BATCH: usize = 1024;

/// Drain a vertex iterator into a `Vec`.
pub fn collect_vertices(iter: &mut dyn MeshVertexIterator, expected: usize) -> Vec<Vertex> {
    let mut out = Vec::with_capacity(expected);
    let mut buf = vec![Vertex::ZERO; BATCH];
    loop {
        let n = iter.next_batch(&mut buf);
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buf[..n]);
    }
    out
}

/// Drain a face iterator into a `Vec`. `max_face_vertices` is the mesh's
/// `face_vertices_maximum_count` and bounds a single face.
pub fn collect_faces(
    iter: &mut dyn MeshFaceIterator,
    expected: usize,
    max_face_vertices: usize,
) -> Vec<FaceVertices> {
    let mut out = Vec::with_capacity(expected);
    let mut offsets = vec![0usize; BATCH];
    let mut indices = vec![0usize; BATCH * max_face_vertices.max(1)];
    loop {
        let n = iter.next_batch(&mut offsets, &mut indices);
        if n == 0 {
            break;
        }
        let mut start = 0;
        for &end in &offsets[..n] {
            out.push(indices[start..end].iter().copied().collect());
            start = end;
        }
    }
    out
}

/// Drain an edge iterator into a `Vec`.
pub fn collect_edges(iter: &mut dyn MeshEdgeIterator, expected: usize) -> Vec<Edge> {
    let mut out = Vec::with_capacity(expected);
    let mut buf = vec![[0usize; 2]; BATCH];
    loop {
        let n = iter.next_batch(&mut buf);
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buf[..n]);
    }
    out
}

/// Fully materialized geometry.
#[derive(Clone, Debug, Default)]
pub struct MemoryGeometry {
    pub vertices: Vec<Vertex>,
    pub faces: Vec<FaceVertices>,
    pub edges: Vec<Edge>,
}

impl MemoryGeometry {
    pub fn new(vertices: Vec<Vertex>, faces: Vec<FaceVertices>, edges: Vec<Edge>) -> Self {
        Self { vertices, faces, edges }
    }

    /// Largest vertex count of any face.
    pub fn face_vertices_maximum_count(&self) -> usize {
        self.faces.iter().map(|f| f.len()).max().unwrap_or(0)
    }
}

impl MeshGeometry for MemoryGeometry {
    fn read_vertices(&self) -> Box<dyn MeshVertexIterator + '_> {
        Box::new(SliceVertices { rest: &self.vertices })
    }

    fn read_faces(&self) -> Box<dyn MeshFaceIterator + '_> {
        Box::new(SliceFaces { rest: &self.faces })
    }

    fn read_edges(&self) -> Box<dyn MeshEdgeIterator + '_> {
        Box::new(SliceEdges { rest: &self.edges })
    }
}

struct SliceVertices<'a> {
    rest: &'a [Vertex],
}

impl MeshVertexIterator for SliceVertices<'_> {
    fn next_batch(&mut self, vertices: &mut [Vertex]) -> usize {
        let n = vertices.len().min(self.rest.len());
        let (head, tail) = self.rest.split_at(n);
        vertices[..n].copy_from_slice(head);
        self.rest = tail;
        n
    }
}

struct SliceFaces<'a> {
    rest: &'a [FaceVertices],
}

impl MeshFaceIterator for SliceFaces<'_> {
    fn next_batch(&mut self, face_offsets: &mut [usize], vertex_indices: &mut [usize]) -> usize {
        let mut faces = 0;
        let mut used = 0;
        while let Some((face, tail)) = self.rest.split_first() {
            if faces == face_offsets.len() || used + face.len() > vertex_indices.len() {
                break;
            }
            vertex_indices[used..used + face.len()].copy_from_slice(face);
            used += face.len();
            face_offsets[faces] = used;
            faces += 1;
            self.rest = tail;
        }
        faces
    }
}

struct SliceEdges<'a> {
    rest: &'a [Edge],
}

impl MeshEdgeIterator for SliceEdges<'_> {
    fn next_batch(&mut self, edges: &mut [Edge]) -> usize {
        let n = edges.len().min(self.rest.len());
        let (head, tail) = self.rest.split_at(n);
        edges[..n].copy_from_slice(head);
        self.rest = tail;
        n
    }
}
