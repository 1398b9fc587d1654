//! Lower level details for refinement.
//!
//! New vertices are identified by labels that refer to vertices of the coarse mesh, so that
//! a vertex shared by several refined cells is created exactly once.
use crate::Real;
use core::cmp::{max, min};
use core::hash::{Hash, Hasher};
use nalgebra::Point2;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VertexLabel(pub usize);

impl VertexLabel {
    pub fn construct_vertex<T: Real>(&self, all_vertices: &[Point2<T>]) -> Point2<T> {
        let &Self(vertex_idx) = self;
        all_vertices[vertex_idx]
    }
}

/// Label of the midpoint of the edge between two vertices, independent of edge orientation.
#[derive(Debug, Copy, Clone, Eq)]
pub struct EdgeMidpointLabel(pub [usize; 2]);

impl EdgeMidpointLabel {
    fn canonical_vertex_indices(&self) -> [usize; 2] {
        let &EdgeMidpointLabel([a, b]) = self;
        [min(a, b), max(a, b)]
    }

    pub fn construct_vertex<T: Real>(&self, all_vertices: &[Point2<T>]) -> Point2<T> {
        let [a, b] = self.0.map(|idx| all_vertices[idx]);
        Point2::from((a.coords + b.coords) * T::from_f64(0.5).unwrap())
    }
}

impl PartialEq for EdgeMidpointLabel {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_vertex_indices() == other.canonical_vertex_indices()
    }
}

impl Hash for EdgeMidpointLabel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_vertex_indices().hash(state)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum VertexOrEdgeMidpoint {
    Vertex(VertexLabel),
    EdgeMidpoint(EdgeMidpointLabel),
}

impl VertexOrEdgeMidpoint {
    pub fn construct_vertex<T: Real>(&self, all_vertices: &[Point2<T>]) -> Point2<T> {
        match self {
            Self::Vertex(label) => label.construct_vertex(all_vertices),
            Self::EdgeMidpoint(label) => label.construct_vertex(all_vertices),
        }
    }
}

impl From<VertexLabel> for VertexOrEdgeMidpoint {
    fn from(label: VertexLabel) -> Self {
        Self::Vertex(label)
    }
}

impl From<EdgeMidpointLabel> for VertexOrEdgeMidpoint {
    fn from(label: EdgeMidpointLabel) -> Self {
        Self::EdgeMidpoint(label)
    }
}

pub fn edge_midpoint(vertices: [usize; 2]) -> EdgeMidpointLabel {
    EdgeMidpointLabel(vertices)
}

pub fn vertex(vertex: usize) -> VertexLabel {
    VertexLabel(vertex)
}
