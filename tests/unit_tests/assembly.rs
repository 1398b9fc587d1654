use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{DMatrix, DMatrixViewMut, DVector, DVectorViewMut, Matrix3, Point2};
use poisson_afem::assembly::{assemble_element_source, assemble_element_stiffness, source_vector, stiff_matrix};
use poisson_afem::connectivity::Tri3d2Connectivity;
use poisson_afem::mesh::procedural::{create_lshape_uniform_tri_mesh_2d, create_unit_square_uniform_tri_mesh_2d};
use poisson_afem::mesh::TriangleMesh2d;
use poisson_afem::quadrature::triangle;
use poisson_afem::space::LagrangeSpace;
use poisson_afem::PoissonError;

fn reference_triangle_space(degree: usize) -> LagrangeSpace<f64> {
    let vertices = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0)];
    let mesh = TriangleMesh2d::from_vertices_and_connectivity(vertices, vec![Tri3d2Connectivity([0, 1, 2])]);
    LagrangeSpace::new(mesh, degree).unwrap()
}

#[test]
fn p1_element_stiffness_on_reference_triangle() {
    let space = reference_triangle_space(1);
    let quadrature = triangle::<f64>(1).unwrap();
    let mut element_matrix = DMatrix::zeros(3, 3);
    assemble_element_stiffness(DMatrixViewMut::from(&mut element_matrix), &space, 0, &quadrature, 0.5);

    #[rustfmt::skip]
    let expected = Matrix3::new(
        1.0, -0.5, -0.5,
        -0.5, 0.5, 0.0,
        -0.5, 0.0, 0.5);
    assert_matrix_eq!(element_matrix, expected, comp = abs, tol = 1e-14);
}

#[test]
fn p1_element_source_on_reference_triangle() {
    let space = reference_triangle_space(1);
    let quadrature = triangle::<f64>(2).unwrap();
    let mut element_vector = DVector::zeros(3);
    assemble_element_source(
        DVectorViewMut::from(&mut element_vector),
        |_| 6.0,
        &space,
        0,
        &quadrature,
        0.5,
    );
    assert_matrix_eq!(element_vector, DVector::from_element(3, 1.0), comp = abs, tol = 1e-14);
}

#[test]
fn element_stiffness_is_invariant_to_previous_contents() {
    let space = reference_triangle_space(2);
    let quadrature = triangle::<f64>(2).unwrap();
    let mut clean = DMatrix::zeros(6, 6);
    let mut dirty = DMatrix::from_element(6, 6, 42.0);
    assemble_element_stiffness(DMatrixViewMut::from(&mut clean), &space, 0, &quadrature, 0.5);
    assemble_element_stiffness(DMatrixViewMut::from(&mut dirty), &space, 0, &quadrature, 0.5);
    assert_eq!(clean, dirty);
    assert_matrix_eq!(clean, clean.transpose(), comp = abs, tol = 1e-14);
}

#[test]
fn stiffness_matrix_is_symmetric_with_vanishing_row_sums() {
    for degree in [1, 2] {
        let space = LagrangeSpace::new(create_lshape_uniform_tri_mesh_2d::<f64>(4), degree).unwrap();
        let quadrature = triangle::<f64>(2).unwrap();
        let a = stiff_matrix(&space, &quadrature, &space.cell_measure()).unwrap();
        let n = space.number_of_global_dofs();
        assert_eq!((a.nrows(), a.ncols()), (n, n));

        let dense = DMatrix::from(&a);
        assert_matrix_eq!(dense, dense.transpose(), comp = abs, tol = 1e-12);
        // Constants are in the kernel of the Laplacian
        let row_sums = &dense * DVector::from_element(n, 1.0);
        assert_matrix_eq!(row_sums, DVector::<f64>::zeros(n), comp = abs, tol = 1e-12);
        assert!(dense.diagonal().iter().all(|&a_ii| a_ii > 0.0));
    }
}

#[test]
fn stiffness_matrix_of_unit_square() {
    // The classic five point stencil appears at the interior vertex
    let space = LagrangeSpace::new(create_unit_square_uniform_tri_mesh_2d::<f64>(2), 1).unwrap();
    let quadrature = triangle::<f64>(1).unwrap();
    let a = DMatrix::from(&stiff_matrix(&space, &quadrature, &space.cell_measure()).unwrap());
    let center = 4;
    assert_eq!(space.interpolation_points()[center], Point2::new(0.5, 0.5));
    assert_scalar_eq!(a[(center, center)], 4.0, comp = abs, tol = 1e-14);
    let off_diagonal_sum: f64 = (0..9).filter(|&j| j != center).map(|j| a[(center, j)]).sum();
    assert_scalar_eq!(off_diagonal_sum, -4.0, comp = abs, tol = 1e-14);
}

#[test]
fn source_vector_of_constant_sums_to_area() {
    for degree in [1, 2] {
        let space = LagrangeSpace::new(create_lshape_uniform_tri_mesh_2d::<f64>(2), degree).unwrap();
        let quadrature = triangle::<f64>(3).unwrap();
        let b = source_vector(|_| 1.0, &space, &quadrature, &space.cell_measure()).unwrap();
        assert_eq!(b.len(), space.number_of_global_dofs());
        assert_scalar_eq!(b.sum(), 3.0, comp = abs, tol = 1e-13);
    }
}

#[test]
fn source_vector_is_consistent_with_stiffness() {
    // For u = x^2 + y^2 we have -Laplace(u) = -4, and A u_I equals b up to boundary rows
    // when u is reproduced exactly by P2 elements
    let space = LagrangeSpace::new(create_unit_square_uniform_tri_mesh_2d::<f64>(2), 2).unwrap();
    let quadrature = triangle::<f64>(4).unwrap();
    let measure = space.cell_measure();
    let a = stiff_matrix(&space, &quadrature, &measure).unwrap();
    let b = source_vector(|_| -4.0, &space, &quadrature, &measure).unwrap();
    let u = space.interpolate(|x| nalgebra::Vector1::new(x.coords.norm_squared()));

    let residual = &a * &u - &b;
    for dof in 0..space.number_of_global_dofs() {
        if space.boundary_dofs().binary_search(&dof).is_err() {
            assert_scalar_eq!(residual[dof], 0.0, comp = abs, tol = 1e-12);
        }
    }
}

#[test]
fn mismatched_cell_measures_are_rejected() {
    let space = LagrangeSpace::new(create_unit_square_uniform_tri_mesh_2d::<f64>(1), 1).unwrap();
    let quadrature = triangle::<f64>(1).unwrap();
    assert!(matches!(
        stiff_matrix(&space, &quadrature, &[0.5]),
        Err(PoissonError::DimensionMismatch { .. })
    ));
    assert!(matches!(
        source_vector(|_| 1.0, &space, &quadrature, &[0.5, 0.5, 0.5]),
        Err(PoissonError::DimensionMismatch { .. })
    ));
}
