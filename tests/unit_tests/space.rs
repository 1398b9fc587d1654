use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{DVector, Point2, Vector1, Vector2};
use poisson_afem::connectivity::Tri3d2Connectivity;
use poisson_afem::mesh::procedural::create_unit_square_uniform_tri_mesh_2d;
use poisson_afem::mesh::TriangleMesh2d;
use poisson_afem::space::{FieldEvaluator, FiniteElementFunction, LagrangeSpace};
use poisson_afem::PoissonError;
use std::sync::Arc;

fn quadratic(x: &Point2<f64>) -> f64 {
    1.0 + x.x - 2.0 * x.y + 3.0 * x.x * x.y + x.y * x.y
}

fn quadratic_gradient(x: &Point2<f64>) -> Vector2<f64> {
    Vector2::new(1.0 + 3.0 * x.y, -2.0 + 3.0 * x.x + 2.0 * x.y)
}

#[test]
fn p1_dofs_on_unit_square() {
    let space = LagrangeSpace::new(create_unit_square_uniform_tri_mesh_2d::<f64>(2), 1).unwrap();
    assert_eq!(space.degree(), 1);
    assert_eq!(space.number_of_global_dofs(), 9);
    assert_eq!(space.number_of_local_dofs(), 3);
    assert_eq!(space.boundary_dofs(), &[0, 1, 2, 3, 5, 6, 7, 8]);
    for cell in 0..space.num_cells() {
        assert_eq!(space.cell_dofs(cell), &space.mesh().connectivity()[cell].0);
    }
    assert_eq!(space.interpolation_points(), space.mesh().vertices());
}

#[test]
fn p2_dofs_on_unit_square() {
    let space = LagrangeSpace::new(create_unit_square_uniform_tri_mesh_2d::<f64>(1), 2).unwrap();
    // 4 vertices and 5 edges
    assert_eq!(space.number_of_global_dofs(), 9);
    assert_eq!(space.number_of_local_dofs(), 6);
    // Every dof except the midpoint of the diagonal lies on the boundary
    let diagonal_dof = space.cell_dofs(0)[3];
    assert_eq!(space.cell_dofs(1)[3], diagonal_dof);
    assert_eq!(space.boundary_dofs().len(), 8);
    assert!(!space.boundary_dofs().contains(&diagonal_dof));

    let points = space.interpolation_points();
    assert_eq!(points[diagonal_dof], Point2::new(0.5, 0.5));
    for &dof in space.boundary_dofs() {
        let p = points[dof];
        assert!(p.x == 0.0 || p.x == 1.0 || p.y == 0.0 || p.y == 1.0);
    }
}

#[test]
fn p2_reproduces_quadratics() {
    let space = Arc::new(LagrangeSpace::new(create_unit_square_uniform_tri_mesh_2d::<f64>(2), 2).unwrap());
    let coefficients = space.interpolate(|x| Vector1::new(quadratic(x)));
    let u_h = FiniteElementFunction::<f64, 1>::from_coefficients(Arc::clone(&space), coefficients).unwrap();

    for cell in 0..space.num_cells() {
        for xi in [Point2::new(0.1, 0.2), Point2::new(0.6, 0.3), Point2::new(0.25, 0.7)] {
            let x = space.element(cell).map_reference_coords(&xi);
            assert_scalar_eq!(u_h.value_at(cell, &xi)[0], quadratic(&x), comp = abs, tol = 1e-12);
            assert_matrix_eq!(u_h.gradient_at(cell, &xi), quadratic_gradient(&x), comp = abs, tol = 1e-11);
        }
    }
}

#[test]
fn p1_vector_valued_function() {
    let space = Arc::new(LagrangeSpace::new(create_unit_square_uniform_tri_mesh_2d::<f64>(2), 1).unwrap());
    let linear = |x: &Point2<f64>| Vector2::new(2.0 * x.x - x.y, 1.0 + x.y);
    let coefficients = space.interpolate(linear);
    assert_eq!(coefficients.len(), 2 * space.number_of_global_dofs());
    let f = FiniteElementFunction::<f64, 2>::from_coefficients(Arc::clone(&space), coefficients).unwrap();

    let xi = Point2::new(0.3, 0.3);
    for cell in 0..space.num_cells() {
        let x = space.element(cell).map_reference_coords(&xi);
        assert_matrix_eq!(f.value_at(cell, &xi), linear(&x), comp = abs, tol = 1e-13);
        // Column s holds the gradient of component s
        let gradient = f.gradient_at(cell, &xi);
        assert_matrix_eq!(gradient.column(0), Vector2::new(2.0, -1.0), comp = abs, tol = 1e-12);
        assert_matrix_eq!(gradient.column(1), Vector2::new(0.0, 1.0), comp = abs, tol = 1e-12);
    }
}

#[test]
fn zero_function() {
    let space = Arc::new(LagrangeSpace::new(create_unit_square_uniform_tri_mesh_2d::<f64>(1), 2).unwrap());
    let f = FiniteElementFunction::<f64, 1>::zeros(Arc::clone(&space));
    assert_eq!(f.coefficients(), &DVector::zeros(9));
    assert_eq!(f.value_at(0, &Point2::new(0.2, 0.2))[0], 0.0);
}

#[test]
fn coefficients_must_match_dof_count() {
    let space = Arc::new(LagrangeSpace::new(create_unit_square_uniform_tri_mesh_2d::<f64>(1), 1).unwrap());
    let result = FiniteElementFunction::<f64, 2>::from_coefficients(space, DVector::zeros(4));
    assert!(matches!(
        result,
        Err(PoissonError::DimensionMismatch {
            expected: 8,
            actual: 4,
            ..
        })
    ));
}

#[test]
fn invalid_meshes_are_rejected() {
    let vertices = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(2.0, 0.0)];
    let degenerate = TriangleMesh2d::from_vertices_and_connectivity(vertices.clone(), vec![Tri3d2Connectivity([0, 1, 2])]);
    assert!(matches!(LagrangeSpace::new(degenerate, 1), Err(PoissonError::MalformedMesh(_))));

    let out_of_bounds = TriangleMesh2d::from_vertices_and_connectivity(vertices, vec![Tri3d2Connectivity([0, 1, 5])]);
    assert!(matches!(LagrangeSpace::new(out_of_bounds, 1), Err(PoissonError::MalformedMesh(_))));

    let mesh = create_unit_square_uniform_tri_mesh_2d::<f64>(1);
    assert!(matches!(LagrangeSpace::new(mesh, 3), Err(PoissonError::UnsupportedConfiguration(_))));
}
