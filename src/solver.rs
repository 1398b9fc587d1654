//! Linear solvers for the assembled system.
use crate::{PoissonError, Real};
use log::debug;
use nalgebra::DVector;
use nalgebra_sparse::factorization::CscCholesky;
use nalgebra_sparse::{CscMatrix, CsrMatrix};

/// Solves `A x = b` for a square sparse matrix `A`.
pub trait LinearSolver<T: Real> {
    fn solve(&self, matrix: &CsrMatrix<T>, rhs: &DVector<T>) -> Result<DVector<T>, PoissonError>;
}

/// Direct solver based on a sparse Cholesky factorization.
///
/// The discrete Laplace operator is symmetric positive definite once boundary conditions have
/// been applied, which is what this solver requires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CholeskySolver;

impl<T: Real> LinearSolver<T> for CholeskySolver {
    fn solve(&self, matrix: &CsrMatrix<T>, rhs: &DVector<T>) -> Result<DVector<T>, PoissonError> {
        PoissonError::check_dimension("linear system columns", matrix.nrows(), matrix.ncols())?;
        PoissonError::check_dimension("linear system right-hand side", matrix.nrows(), rhs.len())?;
        if rhs.is_empty() {
            return Ok(DVector::zeros(0));
        }

        let csc = CscMatrix::from(matrix);
        let cholesky = CscCholesky::factor(&csc)
            .map_err(|err| PoissonError::LinearAlgebra(format!("Cholesky factorization failed: {err}")))?;
        debug!("Factored system with {} unknowns", rhs.len());
        let x = cholesky.solve(rhs);
        Ok(x.column(0).into_owned())
    }
}
