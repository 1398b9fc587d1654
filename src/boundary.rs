//! Enforcement of boundary conditions on assembled linear systems.
use crate::space::LagrangeSpace;
use crate::{PoissonError, Real};
use nalgebra::{DVector, Point2};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

/// Modifies an assembled system `A x = b` so that its solution satisfies a boundary condition.
pub trait BoundaryCondition<T: Real> {
    fn apply(&self, matrix: CsrMatrix<T>, rhs: DVector<T>) -> Result<(CsrMatrix<T>, DVector<T>), PoissonError>;
}

/// Dirichlet conditions $u = g$ on a set of degrees of freedom.
#[derive(Debug, Clone, PartialEq)]
pub struct DirichletBC<T: Real> {
    dofs: Vec<usize>,
    values: Vec<T>,
}

impl<T: Real> DirichletBC<T> {
    /// Prescribes `g` at the boundary degrees of freedom of the space.
    pub fn new(space: &LagrangeSpace<T>, g: impl Fn(&Point2<T>) -> T) -> Self {
        let points = space.interpolation_points();
        let dofs = space.boundary_dofs().to_vec();
        let values = dofs.iter().map(|&dof| g(&points[dof])).collect();
        Self { dofs, values }
    }

    pub fn from_dofs_and_values(dofs: Vec<usize>, values: Vec<T>) -> Result<Self, PoissonError> {
        PoissonError::check_dimension("Dirichlet values", dofs.len(), values.len())?;
        Ok(Self { dofs, values })
    }

    pub fn dofs(&self) -> &[usize] {
        &self.dofs
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }
}

impl<T: Real> BoundaryCondition<T> for DirichletBC<T> {
    /// Eliminates the Dirichlet degrees of freedom while keeping the matrix symmetric.
    ///
    /// The known values are moved to the right-hand side, the corresponding rows and columns
    /// are zeroed and their diagonal entries are replaced by a representative scale of the
    /// matrix, with the right-hand side adjusted accordingly.
    fn apply(&self, matrix: CsrMatrix<T>, mut rhs: DVector<T>) -> Result<(CsrMatrix<T>, DVector<T>), PoissonError> {
        let n = matrix.nrows();
        PoissonError::check_dimension("Dirichlet system matrix columns", n, matrix.ncols())?;
        PoissonError::check_dimension("Dirichlet right-hand side", n, rhs.len())?;
        if let Some(&dof) = self.dofs.iter().find(|&&dof| dof >= n) {
            return Err(PoissonError::dimension_mismatch(
                format!("Dirichlet dof {dof}: number of dofs"),
                n,
                dof + 1,
            ));
        }

        // The first non-zero diagonal entry serves as a scale that keeps the conditioning of
        // the matrix intact.
        let scale = matrix
            .triplet_iter()
            .filter(|&(i, j, v)| i == j && *v != T::zero())
            .map(|(_, _, v)| v.abs())
            .next()
            .unwrap_or_else(T::one);

        let mut is_dirichlet = vec![false; n];
        let mut x_dirichlet = DVector::zeros(n);
        for (&dof, &value) in self.dofs.iter().zip(&self.values) {
            is_dirichlet[dof] = true;
            x_dirichlet[dof] = value;
        }

        let mut coo = CooMatrix::new(n, n);
        for (i, j, &v) in matrix.triplet_iter() {
            rhs[i] -= v * x_dirichlet[j];
            if !is_dirichlet[i] && !is_dirichlet[j] {
                coo.push(i, j, v);
            }
        }

        for (dof, _) in is_dirichlet.iter().enumerate().filter(|&(_, &d)| d) {
            coo.push(dof, dof, scale);
            rhs[dof] = x_dirichlet[dof] * scale;
        }

        Ok((CsrMatrix::from(&coo), rhs))
    }
}
