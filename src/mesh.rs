use crate::connectivity::{Connectivity, Segment2d2Connectivity, Tri3d2Connectivity};
use crate::{PoissonError, Real};
use fenris_nested_vec::NestedVec;
use nalgebra::{Point2, Scalar};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

pub mod procedural;
pub mod refinement;

/// Index-based data structure for conforming meshes (i.e. no hanging nodes) in two dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(bound(
    serialize = "T: Serialize, Connectivity: Serialize",
    deserialize = "T: Deserialize<'de>, Connectivity: Deserialize<'de>"
))]
pub struct Mesh2d<T: Scalar, Connectivity> {
    vertices: Vec<Point2<T>>,
    connectivity: Vec<Connectivity>,
}

pub type TriangleMesh2d<T> = Mesh2d<T, Tri3d2Connectivity>;

/// The kinds of mesh entities that have a measure.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum EntityKind {
    Node,
    Edge,
    Cell,
}

impl<T, C> Mesh2d<T, C>
where
    T: Scalar,
{
    /// Construct a mesh from vertices and connectivity.
    ///
    /// The connectivity is not checked here. Consumers that cannot trust their input call
    /// [`check_connectivity`](Self::check_connectivity) before indexing.
    pub fn from_vertices_and_connectivity(vertices: Vec<Point2<T>>, connectivity: Vec<C>) -> Self {
        Self { vertices, connectivity }
    }

    pub fn vertices(&self) -> &[Point2<T>] {
        &self.vertices
    }

    pub fn connectivity(&self) -> &[C] {
        &self.connectivity
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_cells(&self) -> usize {
        self.connectivity.len()
    }

    /// The dimension of the space the mesh is embedded in.
    pub fn geometry_dim(&self) -> usize {
        2
    }
}

impl<T, C> Mesh2d<T, C>
where
    T: Scalar,
    C: Connectivity,
{
    /// Checks that every cell references only existing vertices.
    pub fn check_connectivity(&self) -> Result<(), PoissonError> {
        let n = self.vertices.len();
        for (cell_index, cell) in self.connectivity.iter().enumerate() {
            if let Some(&bad) = cell.vertex_indices().iter().find(|&&v| v >= n) {
                return Err(PoissonError::MalformedMesh(format!(
                    "cell {cell_index} references vertex {bad}, but the mesh only has {n} vertices"
                )));
            }
        }
        Ok(())
    }

    /// Computes the node-to-cell incidence from the current connectivity.
    ///
    /// Entry `i` holds the indices of the cells incident to node `i` in ascending order. Nodes
    /// that are not referenced by any cell have an empty list of incident cells.
    pub fn node_to_cell(&self) -> NodeCellIncidence {
        let mut node_cells = vec![Vec::new(); self.vertices.len()];
        for (cell_index, cell) in self.connectivity.iter().enumerate() {
            for &v in cell.vertex_indices() {
                node_cells[v].push(cell_index);
            }
        }

        let mut incidence = NestedVec::new();
        for cells in &node_cells {
            incidence.push(cells);
        }
        incidence
    }
}

/// Node-to-cell incidence, one list of cell indices per node.
pub type NodeCellIncidence = NestedVec<usize>;

/// Edge topology of a triangle mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeTopology {
    /// Global edges as vertex pairs in ascending order.
    pub edges: Vec<[usize; 2]>,
    /// For each cell, the global edge index of each local edge.
    pub cell_edges: Vec<[usize; 3]>,
    /// For each edge, the number of incident cells (1 for boundary edges, 2 for interior edges).
    pub edge_cell_counts: Vec<usize>,
}

impl<T> TriangleMesh2d<T>
where
    T: Real,
{
    pub fn cell_vertices(&self, cell_index: usize) -> [Point2<T>; 3] {
        let [a, b, c] = self.connectivity[cell_index].0;
        [self.vertices[a], self.vertices[b], self.vertices[c]]
    }

    /// Signed area of the given cell, positive for counter-clockwise orientation.
    pub fn signed_cell_area(&self, cell_index: usize) -> T {
        let [a, b, c] = self.cell_vertices(cell_index);
        let ab = b - a;
        let ac = c - a;
        (ab.x * ac.y - ab.y * ac.x) * T::from_f64(0.5).unwrap()
    }

    /// Per-entity measures: zero for nodes, lengths for edges and areas for cells.
    ///
    /// Edges are ordered as in [`edge_topology`](Self::edge_topology).
    pub fn entity_measure(&self, kind: EntityKind) -> Vec<T> {
        match kind {
            EntityKind::Node => vec![T::zero(); self.num_vertices()],
            EntityKind::Edge => self
                .edge_topology()
                .edges
                .iter()
                .map(|&[a, b]| (self.vertices[b] - self.vertices[a]).norm())
                .collect(),
            EntityKind::Cell => (0..self.num_cells())
                .map(|i| self.signed_cell_area(i).abs())
                .collect(),
        }
    }

    /// Total area covered by the mesh.
    pub fn measure(&self) -> T {
        self.entity_measure(EntityKind::Cell)
            .into_iter()
            .fold(T::zero(), |acc, a| acc + a)
    }

    /// Enumerates the edges of the mesh.
    ///
    /// Edges are numbered in the order in which they are first encountered when traversing
    /// cells and their local edges, so the numbering is deterministic.
    pub fn edge_topology(&self) -> EdgeTopology {
        let mut edge_map = FxHashMap::default();
        let mut edges = Vec::new();
        let mut edge_cell_counts = Vec::new();
        let mut cell_edges = Vec::with_capacity(self.num_cells());

        for cell in &self.connectivity {
            let mut local = [0; 3];
            for (k, local_edge) in local.iter_mut().enumerate() {
                let key = cell
                    .edge(k)
                    .map(|segment| segment.canonical())
                    .expect("Triangles always have three edges");
                let index = *edge_map.entry(key).or_insert_with(|| {
                    edges.push(key);
                    edge_cell_counts.push(0);
                    edges.len() - 1
                });
                edge_cell_counts[index] += 1;
                *local_edge = index;
            }
            cell_edges.push(local);
        }

        EdgeTopology {
            edges,
            cell_edges,
            edge_cell_counts,
        }
    }

    /// Finds edges which are only connected to exactly one cell, along with the connected cell
    /// index and the local index of the edge within that cell.
    pub fn find_boundary_faces(&self) -> Vec<(Segment2d2Connectivity, usize, usize)> {
        let topology = self.edge_topology();
        let mut faces = Vec::new();
        for (cell_index, (cell, cell_edges)) in self
            .connectivity
            .iter()
            .zip(&topology.cell_edges)
            .enumerate()
        {
            for (local_index, &edge) in cell_edges.iter().enumerate() {
                if topology.edge_cell_counts[edge] == 1 {
                    let face = cell
                        .edge(local_index)
                        .expect("Local edge index is in bounds");
                    faces.push((face, cell_index, local_index));
                }
            }
        }
        faces
    }

    /// Returns a sorted list of vertices that are determined to be on the boundary.
    ///
    /// A vertex is considered to be a part of the boundary if it belongs to a boundary edge.
    pub fn find_boundary_vertices(&self) -> Vec<usize> {
        let mut indices = Vec::new();
        for (face, _, _) in self.find_boundary_faces() {
            indices.extend_from_slice(face.vertex_indices());
        }
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}
