use crate::space::LagrangeSpace;
use crate::{PoissonError, Real};
use nalgebra::{DVector, Point2, SMatrix, SVector};
use std::sync::Arc;

/// A field that can be evaluated cell by cell at reference coordinates.
pub trait FieldEvaluator<T: Real, const S: usize> {
    fn value_at(&self, cell: usize, xi: &Point2<T>) -> SVector<T, S>;

    /// The gradient of the field, with column `s` holding the gradient of component `s`.
    fn gradient_at(&self, cell: usize, xi: &Point2<T>) -> SMatrix<T, 2, S>;
}

/// A function in a [`LagrangeSpace`] with `S` components.
///
/// Coefficients are stored interleaved, i.e. component `s` of degree of freedom `i` is found at
/// index `S * i + s`.
#[derive(Debug, Clone)]
pub struct FiniteElementFunction<T: Real, const S: usize> {
    space: Arc<LagrangeSpace<T>>,
    coefficients: DVector<T>,
}

impl<T: Real, const S: usize> FiniteElementFunction<T, S> {
    pub fn zeros(space: Arc<LagrangeSpace<T>>) -> Self {
        let coefficients = DVector::zeros(S * space.number_of_global_dofs());
        Self { space, coefficients }
    }

    pub fn from_coefficients(space: Arc<LagrangeSpace<T>>, coefficients: DVector<T>) -> Result<Self, PoissonError> {
        PoissonError::check_dimension(
            "finite element function coefficients",
            S * space.number_of_global_dofs(),
            coefficients.len(),
        )?;
        Ok(Self { space, coefficients })
    }

    pub fn space(&self) -> &Arc<LagrangeSpace<T>> {
        &self.space
    }

    pub fn coefficients(&self) -> &DVector<T> {
        &self.coefficients
    }

    pub fn coefficients_mut(&mut self) -> &mut DVector<T> {
        &mut self.coefficients
    }
}

impl<T: Real, const S: usize> FieldEvaluator<T, S> for FiniteElementFunction<T, S> {
    fn value_at(&self, cell: usize, xi: &Point2<T>) -> SVector<T, S> {
        let phi = self.space.cell_basis(xi);
        let mut value = SVector::zeros();
        for (&dof, &phi_i) in self.space.cell_dofs(cell).iter().zip(&phi) {
            value += self.coefficients.fixed_rows::<S>(S * dof) * phi_i;
        }
        value
    }

    fn gradient_at(&self, cell: usize, xi: &Point2<T>) -> SMatrix<T, 2, S> {
        let gradients = self.space.cell_basis_gradients(cell, xi);
        let mut gradient = SMatrix::zeros();
        for (&dof, grad_phi) in self.space.cell_dofs(cell).iter().zip(&gradients) {
            gradient += grad_phi * self.coefficients.fixed_rows::<S>(S * dof).transpose();
        }
        gradient
    }
}
