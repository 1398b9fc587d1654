//! Basic procedural mesh generation routines.
use crate::connectivity::Tri3d2Connectivity;
use crate::mesh::TriangleMesh2d;
use crate::Real;
use nalgebra::{Point2, Vector2};

pub fn create_unit_square_uniform_tri_mesh_2d<T>(cells_per_dim: usize) -> TriangleMesh2d<T>
where
    T: Real,
{
    create_rectangular_uniform_tri_mesh_2d(
        &Point2::origin(),
        &Vector2::new(T::one(), T::one()),
        cells_per_dim,
        cells_per_dim,
    )
}

/// Generates an axis-aligned rectangular uniform triangle mesh.
///
/// The rectangle `[x0, x0 + extents.x] x [y0, y0 + extents.y]` is divided into
/// `cells_x * cells_y` quadrilaterals, each of which is split along its diagonal into two
/// counter-clockwise triangles. Each triangle lists the vertex opposite the diagonal first,
/// so that the diagonal is the refinement edge.
pub fn create_rectangular_uniform_tri_mesh_2d<T>(
    bottom_left: &Point2<T>,
    extents: &Vector2<T>,
    cells_x: usize,
    cells_y: usize,
) -> TriangleMesh2d<T>
where
    T: Real,
{
    if cells_x == 0 || cells_y == 0 {
        return TriangleMesh2d::from_vertices_and_connectivity(Vec::new(), Vec::new());
    }

    let to_t = |i: usize| T::from_usize(i).expect("Must be able to fit usize in T");
    let hx = extents.x / to_t(cells_x);
    let hy = extents.y / to_t(cells_y);
    let to_global_vertex_index = |i: usize, j: usize| (cells_x + 1) * j + i;

    let mut vertices = Vec::with_capacity((cells_x + 1) * (cells_y + 1));
    for j in 0..=cells_y {
        for i in 0..=cells_x {
            vertices.push(Point2::new(
                bottom_left.x + to_t(i) * hx,
                bottom_left.y + to_t(j) * hy,
            ));
        }
    }

    let mut cells = Vec::with_capacity(2 * cells_x * cells_y);
    for j in 0..cells_y {
        for i in 0..cells_x {
            let v00 = to_global_vertex_index(i, j);
            let v10 = to_global_vertex_index(i + 1, j);
            let v01 = to_global_vertex_index(i, j + 1);
            let v11 = to_global_vertex_index(i + 1, j + 1);
            cells.push(Tri3d2Connectivity([v10, v11, v00]));
            cells.push(Tri3d2Connectivity([v01, v00, v11]));
        }
    }

    TriangleMesh2d::from_vertices_and_connectivity(vertices, cells)
}

/// Generates a uniform triangle mesh of the L-shaped domain $[-1, 1]^2 \setminus (0, 1] \times [-1, 0)$.
///
/// `cells_per_dim` is the number of quadrilateral cells along each side of the full square
/// $[-1, 1]^2$ and is rounded up to the next even number, so that the re-entrant corner at the
/// origin is a mesh vertex.
pub fn create_lshape_uniform_tri_mesh_2d<T>(cells_per_dim: usize) -> TriangleMesh2d<T>
where
    T: Real,
{
    let n = cells_per_dim + cells_per_dim % 2;
    let square = create_rectangular_uniform_tri_mesh_2d(
        &Point2::new(-T::one(), -T::one()),
        &Vector2::new(T::one() + T::one(), T::one() + T::one()),
        n,
        n,
    );

    // Drop all cells in the lower right quadrant. Every cell lies entirely in one quadrant,
    // so it suffices to look at the centroid.
    let three = T::from_f64(3.0).unwrap();
    let kept_cells: Vec<_> = square
        .connectivity()
        .iter()
        .filter(|cell| {
            let [a, b, c] = cell.0.map(|v| square.vertices()[v]);
            let centroid_x = (a.x + b.x + c.x) / three;
            let centroid_y = (a.y + b.y + c.y) / three;
            !(centroid_x > T::zero() && centroid_y < T::zero())
        })
        .copied()
        .collect();

    compact_vertices(square.vertices(), kept_cells)
}

/// Removes vertices that are not referenced by any cell and relabels the connectivity.
fn compact_vertices<T>(vertices: &[Point2<T>], mut cells: Vec<Tri3d2Connectivity>) -> TriangleMesh2d<T>
where
    T: Real,
{
    let mut new_index = vec![usize::MAX; vertices.len()];
    let mut new_vertices = Vec::new();
    for cell in &mut cells {
        for v in cell.iter_mut() {
            if new_index[*v] == usize::MAX {
                new_index[*v] = new_vertices.len();
                new_vertices.push(vertices[*v]);
            }
            *v = new_index[*v];
        }
    }
    TriangleMesh2d::from_vertices_and_connectivity(new_vertices, cells)
}
