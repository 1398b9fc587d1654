//! Assembly of the global stiffness matrix and load vector.
//!
//! Both operators loop over cells, compute a dense element contribution with the given
//! quadrature rule and scatter it into global storage. Matrix contributions are accumulated
//! in a COO matrix, whose conversion to CSR sums duplicate entries.
use crate::quadrature::Quadrature;
use crate::space::LagrangeSpace;
use crate::{PoissonError, Real};
use itertools::izip;
use log::debug;
use nalgebra::{DMatrix, DMatrixViewMut, DVector, DVectorViewMut, Point2};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

/// Computes the element stiffness matrix $\int_K \nabla \phi_i \cdot \nabla \phi_j \\, dx$.
///
/// # Panics
///
/// Panics if the output matrix is not square with one row per local degree of freedom.
pub fn assemble_element_stiffness<T, Q>(
    mut output: DMatrixViewMut<T>,
    space: &LagrangeSpace<T>,
    cell: usize,
    quadrature: &Q,
    cell_measure: T,
) where
    T: Real,
    Q: Quadrature<T>,
{
    let n = space.number_of_local_dofs();
    assert_eq!(output.shape(), (n, n), "Element matrix must be n x n");
    output.fill(T::zero());

    for (&w, xi) in izip!(quadrature.weights(), quadrature.points()) {
        let phi_grad = space.cell_basis_gradients(cell, xi);
        for i in 0..n {
            for j in i..n {
                output[(i, j)] += phi_grad[i].dot(&phi_grad[j]) * w;
            }
        }
    }

    for i in 0..n {
        for j in i..n {
            let a_ij = output[(i, j)] * cell_measure;
            output[(i, j)] = a_ij;
            output[(j, i)] = a_ij;
        }
    }
}

/// Computes the element load vector $\int_K f \phi_i \\, dx$.
///
/// # Panics
///
/// Panics if the output vector does not have one entry per local degree of freedom.
pub fn assemble_element_source<T, Q>(
    mut output: DVectorViewMut<T>,
    f: impl Fn(&Point2<T>) -> T,
    space: &LagrangeSpace<T>,
    cell: usize,
    quadrature: &Q,
    cell_measure: T,
) where
    T: Real,
    Q: Quadrature<T>,
{
    let n = space.number_of_local_dofs();
    assert_eq!(output.len(), n, "Element vector must have length n");
    output.fill(T::zero());

    let element = space.element(cell);
    for (&w, xi) in izip!(quadrature.weights(), quadrature.points()) {
        let phi = space.cell_basis(xi);
        let f_x = f(&element.map_reference_coords(xi));
        for i in 0..n {
            output[i] += f_x * phi[i] * w;
        }
    }
    output *= cell_measure;
}

/// Assembles the global stiffness matrix $A_{ij} = \sum_K \int_K \nabla \phi_i \cdot \nabla \phi_j \\, dx$.
///
/// Returns an error if the number of cell measures does not match the number of cells.
pub fn stiff_matrix<T, Q>(
    space: &LagrangeSpace<T>,
    quadrature: &Q,
    cell_measure: &[T],
) -> Result<CsrMatrix<T>, PoissonError>
where
    T: Real,
    Q: Quadrature<T>,
{
    PoissonError::check_dimension("stiffness assembly cell measures", space.num_cells(), cell_measure.len())?;
    let num_dofs = space.number_of_global_dofs();
    let n = space.number_of_local_dofs();

    let mut coo = CooMatrix::new(num_dofs, num_dofs);
    let mut element_matrix = DMatrix::zeros(n, n);
    for (cell, &measure) in cell_measure.iter().enumerate() {
        assemble_element_stiffness(DMatrixViewMut::from(&mut element_matrix), space, cell, quadrature, measure);
        let dofs = space.cell_dofs(cell);
        for (i, &global_i) in dofs.iter().enumerate() {
            for (j, &global_j) in dofs.iter().enumerate() {
                coo.push(global_i, global_j, element_matrix[(i, j)]);
            }
        }
    }

    let matrix = CsrMatrix::from(&coo);
    debug!(
        "Assembled stiffness matrix with {} rows and {} non-zeros",
        matrix.nrows(),
        matrix.nnz()
    );
    Ok(matrix)
}

/// Assembles the global load vector $b_i = \sum_K \int_K f \phi_i \\, dx$.
///
/// Returns an error if the number of cell measures does not match the number of cells.
pub fn source_vector<T, Q>(
    f: impl Fn(&Point2<T>) -> T,
    space: &LagrangeSpace<T>,
    quadrature: &Q,
    cell_measure: &[T],
) -> Result<DVector<T>, PoissonError>
where
    T: Real,
    Q: Quadrature<T>,
{
    PoissonError::check_dimension("load vector cell measures", space.num_cells(), cell_measure.len())?;
    let n = space.number_of_local_dofs();

    let mut b = DVector::zeros(space.number_of_global_dofs());
    let mut element_vector = DVector::zeros(n);
    for (cell, &measure) in cell_measure.iter().enumerate() {
        assemble_element_source(DVectorViewMut::from(&mut element_vector), &f, space, cell, quadrature, measure);
        for (&global_i, &b_local) in space.cell_dofs(cell).iter().zip(element_vector.iter()) {
            b[global_i] += b_local;
        }
    }
    Ok(b)
}
