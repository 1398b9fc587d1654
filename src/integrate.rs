//! Integration of fields and error norms over triangle meshes.
//!
//! Integrands are described by [`CellEvaluator`]s, which are evaluated at quadrature points
//! given by cell index, reference coordinates and physical coordinates. This allows
//! analytic functions of physical coordinates and discrete fields, which are naturally
//! evaluated in reference coordinates, to be compared directly.
use crate::element::Tri3d2Element;
use crate::mesh::TriangleMesh2d;
use crate::quadrature::Quadrature;
use crate::space::FieldEvaluator;
use crate::{PoissonError, Real};
use itertools::izip;
use nalgebra::{DVector, Point2, SVector};

/// A quantity with `S` components that can be evaluated at a quadrature point.
pub trait CellEvaluator<T: Real, const S: usize> {
    /// Evaluates at reference coordinates `xi` of the given cell, which map to the physical
    /// point `x`.
    fn evaluate(&self, cell: usize, xi: &Point2<T>, x: &Point2<T>) -> SVector<T, S>;
}

/// A function of physical coordinates.
#[derive(Debug, Clone, Copy)]
pub struct SpatialFn<F>(pub F);

impl<T, F, const S: usize> CellEvaluator<T, S> for SpatialFn<F>
where
    T: Real,
    F: Fn(&Point2<T>) -> SVector<T, S>,
{
    fn evaluate(&self, _cell: usize, _xi: &Point2<T>, x: &Point2<T>) -> SVector<T, S> {
        (self.0)(x)
    }
}

/// A function of the cell index and reference coordinates.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceFn<F>(pub F);

impl<T, F, const S: usize> CellEvaluator<T, S> for ReferenceFn<F>
where
    T: Real,
    F: Fn(usize, &Point2<T>) -> SVector<T, S>,
{
    fn evaluate(&self, cell: usize, xi: &Point2<T>, _x: &Point2<T>) -> SVector<T, S> {
        (self.0)(cell, xi)
    }
}

/// The values of a field.
#[derive(Debug)]
pub struct ValueOf<'a, E>(pub &'a E);

impl<'a, T, E, const S: usize> CellEvaluator<T, S> for ValueOf<'a, E>
where
    T: Real,
    E: FieldEvaluator<T, S>,
{
    fn evaluate(&self, cell: usize, xi: &Point2<T>, _x: &Point2<T>) -> SVector<T, S> {
        self.0.value_at(cell, xi)
    }
}

/// The gradient of a scalar field.
#[derive(Debug)]
pub struct GradientOf<'a, E>(pub &'a E);

impl<'a, T, E> CellEvaluator<T, 2> for GradientOf<'a, E>
where
    T: Real,
    E: FieldEvaluator<T, 1>,
{
    fn evaluate(&self, cell: usize, xi: &Point2<T>, _x: &Point2<T>) -> SVector<T, 2> {
        self.0.gradient_at(cell, xi).column(0).into_owned()
    }
}

/// Quadrature-based integration over all cells of a mesh.
#[derive(Debug)]
pub struct IntegralAlg<'a, T: Real, Q> {
    quadrature: &'a Q,
    mesh: &'a TriangleMesh2d<T>,
    cell_measure: &'a [T],
}

impl<'a, T, Q> IntegralAlg<'a, T, Q>
where
    T: Real,
    Q: Quadrature<T>,
{
    /// Returns an error if the number of cell measures does not match the number of cells.
    pub fn new(quadrature: &'a Q, mesh: &'a TriangleMesh2d<T>, cell_measure: &'a [T]) -> Result<Self, PoissonError> {
        PoissonError::check_dimension("cell measures", mesh.num_cells(), cell_measure.len())?;
        Ok(Self {
            quadrature,
            mesh,
            cell_measure,
        })
    }

    fn integrate_cell<const S: usize>(
        &self,
        cell: usize,
        mut integrand: impl FnMut(&Point2<T>, &Point2<T>) -> SVector<T, S>,
    ) -> SVector<T, S> {
        let element = Tri3d2Element::from_vertices(self.mesh.cell_vertices(cell));
        let mut result = SVector::zeros();
        for (&w, xi) in izip!(self.quadrature.weights(), self.quadrature.points()) {
            let x = element.map_reference_coords(xi);
            result += integrand(xi, &x) * w;
        }
        result * self.cell_measure[cell]
    }

    /// Per-cell integrals of the given quantity.
    pub fn cellwise_integral<const S: usize>(&self, f: &impl CellEvaluator<T, S>) -> Vec<SVector<T, S>> {
        (0..self.mesh.num_cells())
            .map(|cell| self.integrate_cell(cell, |xi, x| f.evaluate(cell, xi, x)))
            .collect()
    }

    /// Integral of the given quantity over the whole mesh.
    pub fn integral<const S: usize>(&self, f: &impl CellEvaluator<T, S>) -> SVector<T, S> {
        self.cellwise_integral(f)
            .into_iter()
            .fold(SVector::zeros(), |acc, v| acc + v)
    }

    /// Computes $\int_K |u - v|^2 \\, dx$ for every cell $K$.
    pub fn cellwise_squared_error<const S: usize>(
        &self,
        u: &impl CellEvaluator<T, S>,
        v: &impl CellEvaluator<T, S>,
    ) -> DVector<T> {
        DVector::from_iterator(
            self.mesh.num_cells(),
            (0..self.mesh.num_cells()).map(|cell| {
                let squared = self.integrate_cell(cell, |xi, x| {
                    let diff = u.evaluate(cell, xi, x) - v.evaluate(cell, xi, x);
                    SVector::<T, 1>::new(diff.norm_squared())
                });
                squared[0]
            }),
        )
    }

    /// Computes $\norm{u - v}_{L^2}$ over the mesh.
    pub fn l2_error<const S: usize>(&self, u: &impl CellEvaluator<T, S>, v: &impl CellEvaluator<T, S>) -> T {
        self.cellwise_squared_error(u, v).sum().sqrt()
    }
}
