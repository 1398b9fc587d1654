//! Strategies for property-based testing with `proptest`.
use crate::element::Tri3d2Element;
use crate::mesh::procedural::create_rectangular_uniform_tri_mesh_2d;
use crate::mesh::refinement::refine_uniformly_repeat;
use crate::mesh::TriangleMesh2d;
use ::proptest::collection::vec;
use ::proptest::prelude::*;
use nalgebra::{Point2, Vector2};
use std::cmp::max;

pub fn point2() -> impl Strategy<Value = Point2<f64>> {
    // Keep coordinates moderate so that areas and gradients stay well within floating point range
    let range = -10.0..10.0;
    [range.clone(), range].prop_map(|[x, y]| Point2::new(x, y))
}

impl Arbitrary for Tri3d2Element<f64> {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    /// Counter-clockwise triangles whose area is not too small relative to their diameter.
    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        [point2(), point2(), point2()]
            .prop_map(|[a, b, c]| {
                let ab = b - a;
                let ac = c - a;
                if ab.x * ac.y - ab.y * ac.x >= 0.0 {
                    Tri3d2Element::from_vertices([a, b, c])
                } else {
                    Tri3d2Element::from_vertices([a, c, b])
                }
            })
            .prop_filter("triangle must be well shaped", |element| {
                let diameter = element.diameter();
                element.area() > 1e-2 * diameter * diameter
            })
            .boxed()
    }
}

/// Rectangular meshes with at most `max_cells` quadrilaterals, i.e. `2 * max_cells` triangles.
pub fn rectangular_uniform_mesh_strategy(max_cells: usize) -> impl Strategy<Value = TriangleMesh2d<f64>> {
    let max_cells = max(1, max_cells);
    (1..=max_cells)
        .prop_flat_map(move |cells_x| (Just(cells_x), 1..=max(1, max_cells / cells_x)))
        .prop_flat_map(|(cells_x, cells_y)| (Just(cells_x), Just(cells_y), 0.1..10.0, 0.1..10.0))
        .prop_map(|(cells_x, cells_y, width, height)| {
            create_rectangular_uniform_tri_mesh_2d(
                &Point2::new(-1.0, 0.5),
                &Vector2::new(width, height),
                cells_x,
                cells_y,
            )
        })
}

/// Uniformly refined rectangular meshes together with a (possibly repeating) selection of
/// cell indices that are in bounds.
pub fn mesh_and_marked_cells_strategy(max_cells: usize) -> impl Strategy<Value = (TriangleMesh2d<f64>, Vec<usize>)> {
    (rectangular_uniform_mesh_strategy(max_cells), 0..=2usize)
        .prop_map(|(mesh, refinements)| refine_uniformly_repeat(&mesh, refinements))
        .prop_flat_map(|mesh| {
            let num_cells = mesh.num_cells();
            (Just(mesh), vec(0..num_cells, 0..=num_cells))
        })
}
