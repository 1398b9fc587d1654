//! Functionality for mesh refinement.
//!
//! Two refinement schemes are provided for triangle meshes:
//!
//! - uniform ("red") refinement through [`refine_uniformly`], which splits every triangle into
//!   four similar triangles,
//! - newest vertex bisection of a set of marked cells through [`refine_marked`], which
//!   refines additional cells as needed to keep the mesh conforming.
use crate::connectivity::Tri3d2Connectivity;
use crate::mesh::TriangleMesh2d;
use crate::{PoissonError, Real};
use detail::{edge_midpoint, vertex, VertexOrEdgeMidpoint};
use nalgebra::Point2;
use rustc_hash::FxHashMap;

mod bisection;
pub mod detail;

pub use bisection::refine_marked;

/// Apply one round of uniform mesh refinement.
///
/// Each triangle `[a, b, c]` is replaced by the three corner triangles and the interior
/// triangle spanned by the edge midpoints. Vertex indices of the original mesh are preserved.
pub fn refine_uniformly<T>(mesh: &TriangleMesh2d<T>) -> TriangleMesh2d<T>
where
    T: Real,
{
    let mut label_to_idx_map = FxHashMap::default();
    let mut labels = Vec::new();

    // Original vertices keep their indices
    for idx in 0..mesh.num_vertices() {
        let label = VertexOrEdgeMidpoint::from(vertex(idx));
        label_to_idx_map.insert(label, idx);
        labels.push(label);
    }

    let mut index_of = |label: VertexOrEdgeMidpoint| {
        *label_to_idx_map.entry(label).or_insert_with(|| {
            labels.push(label);
            labels.len() - 1
        })
    };

    let mut new_connectivity = Vec::with_capacity(4 * mesh.num_cells());
    for &Tri3d2Connectivity([a, b, c]) in mesh.connectivity() {
        let d = index_of(edge_midpoint([a, b]).into());
        let e = index_of(edge_midpoint([b, c]).into());
        let f = index_of(edge_midpoint([c, a]).into());

        new_connectivity.extend_from_slice(&[
            Tri3d2Connectivity([a, d, f]),
            Tri3d2Connectivity([d, b, e]),
            Tri3d2Connectivity([f, e, c]),
            Tri3d2Connectivity([e, f, d]),
        ]);
    }

    let new_vertices: Vec<Point2<T>> = labels
        .iter()
        .map(|label| label.construct_vertex(mesh.vertices()))
        .collect();
    TriangleMesh2d::from_vertices_and_connectivity(new_vertices, new_connectivity)
}

/// Repeatedly applies uniform mesh refinement to the given mesh.
pub fn refine_uniformly_repeat<T>(mesh: &TriangleMesh2d<T>, repeat_times: usize) -> TriangleMesh2d<T>
where
    T: Real,
{
    let mut mesh = mesh.clone();
    for _ in 0..repeat_times {
        mesh = refine_uniformly(&mesh);
    }
    mesh
}

/// Checks that the given cell indices are valid for the mesh.
pub(crate) fn check_marked_cells<T>(mesh: &TriangleMesh2d<T>, marked: &[usize]) -> Result<(), PoissonError>
where
    T: Real,
{
    match marked.iter().find(|&&cell| cell >= mesh.num_cells()) {
        Some(&cell) => Err(PoissonError::dimension_mismatch(
            format!("marked cell {cell}: number of cells"),
            mesh.num_cells(),
            cell + 1,
        )),
        None => Ok(()),
    }
}
