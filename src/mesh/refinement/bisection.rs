use super::check_marked_cells;
use crate::connectivity::Tri3d2Connectivity;
use crate::mesh::TriangleMesh2d;
use crate::{PoissonError, Real};
use log::debug;
use nalgebra::Point2;

/// Refines the marked cells by newest vertex bisection.
///
/// Local vertex `0` of each triangle is its newest vertex and the opposite edge is its
/// refinement edge. Every marked cell is bisected at least once. Before bisecting, the set of
/// edges to split is closed so that any cell with a split edge also splits its refinement
/// edge, which guarantees that the refined mesh is conforming. Each cell is therefore split
/// into two, three or four children.
///
/// Returns an error if a marked cell index is out of bounds.
pub fn refine_marked<T>(mesh: &TriangleMesh2d<T>, marked_cells: &[usize]) -> Result<TriangleMesh2d<T>, PoissonError>
where
    T: Real,
{
    check_marked_cells(mesh, marked_cells)?;
    let topology = mesh.edge_topology();

    let mut edge_marked = vec![false; topology.edges.len()];
    for &cell in marked_cells {
        edge_marked[topology.cell_edges[cell][0]] = true;
    }

    // Propagate until every cell with a split edge also splits its refinement edge.
    // Terminates since each pass either marks a new edge or changes nothing.
    loop {
        let mut changed = false;
        for &[refinement_edge, e1, e2] in &topology.cell_edges {
            if !edge_marked[refinement_edge] && (edge_marked[e1] || edge_marked[e2]) {
                edge_marked[refinement_edge] = true;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let mut vertices = mesh.vertices().to_vec();
    let half = T::from_f64(0.5).unwrap();
    let midpoints: Vec<Option<usize>> = topology
        .edges
        .iter()
        .zip(&edge_marked)
        .map(|(&[a, b], &is_marked)| {
            is_marked.then(|| {
                let (pa, pb) = (mesh.vertices()[a], mesh.vertices()[b]);
                vertices.push(Point2::from((pa.coords + pb.coords) * half));
                vertices.len() - 1
            })
        })
        .collect();

    let mut cells = Vec::with_capacity(mesh.num_cells() + 2 * marked_cells.len());
    for (&Tri3d2Connectivity([a, b, c]), &[e0, e1, e2]) in mesh.connectivity().iter().zip(&topology.cell_edges) {
        let Some(m) = midpoints[e0] else {
            cells.push(Tri3d2Connectivity([a, b, c]));
            continue;
        };

        // Children of the first bisection. Their refinement edges are the parent's edges
        // (a, b) and (c, a) respectively.
        match midpoints[e2] {
            Some(m2) => cells.extend_from_slice(&[Tri3d2Connectivity([m2, m, a]), Tri3d2Connectivity([m2, b, m])]),
            None => cells.push(Tri3d2Connectivity([m, a, b])),
        }
        match midpoints[e1] {
            Some(m1) => cells.extend_from_slice(&[Tri3d2Connectivity([m1, m, c]), Tri3d2Connectivity([m1, a, m])]),
            None => cells.push(Tri3d2Connectivity([m, c, a])),
        }
    }

    debug!(
        "Bisection refined {} marked cells: {} -> {} cells",
        marked_cells.len(),
        mesh.num_cells(),
        cells.len()
    );

    Ok(TriangleMesh2d::from_vertices_and_connectivity(vertices, cells))
}
