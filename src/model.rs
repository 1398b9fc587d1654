//! The Poisson solver session.
use crate::assembly::{source_vector, stiff_matrix};
use crate::boundary::{BoundaryCondition, DirichletBC};
use crate::element::LagrangeBasis;
use crate::integrate::{GradientOf, IntegralAlg, SpatialFn, ValueOf};
use crate::mesh::TriangleMesh2d;
use crate::problem::PoissonProblem;
use crate::quadrature::TriangleQuadrature;
use crate::solver::{CholeskySolver, LinearSolver};
use crate::space::{FieldEvaluator, FiniteElementFunction, LagrangeSpace};
use crate::{PoissonError, Real};
use log::{debug, info};
use nalgebra::{DVector, Point2, Vector1, Vector2};
use nalgebra_sparse::CsrMatrix;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Discretization parameters of a [`PoissonFemModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Polynomial degree of the Lagrange elements, either `1` or `2`.
    pub degree: usize,
    /// Strength of the triangle quadrature rule used for assembly and error norms.
    pub quadrature_strength: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            degree: 1,
            quadrature_strength: 4,
        }
    }
}

impl ModelConfig {
    pub fn with_degree(self, degree: usize) -> Self {
        Self { degree, ..self }
    }

    pub fn with_quadrature_strength(self, quadrature_strength: usize) -> Self {
        Self {
            quadrature_strength,
            ..self
        }
    }

    /// Checks that an element of the requested degree and a quadrature rule of the requested
    /// strength are available.
    pub fn validate(&self) -> Result<(), PoissonError> {
        LagrangeBasis::new(self.degree)?;
        self.quadrature::<f64>()?;
        Ok(())
    }

    fn quadrature<T: Real>(&self) -> Result<TriangleQuadrature<T>, PoissonError> {
        let strength = self.quadrature_strength;
        TriangleQuadrature::new(strength)
            .map_err(|err| PoissonError::UnsupportedConfiguration(format!("quadrature of strength {strength}: {err}")))
    }
}

/// A solver session for $-\Delta u = f$ with Dirichlet data from a [`PoissonProblem`] on a
/// fixed mesh.
///
/// The session owns the discrete solution `uh` and the interpolant `uI` of the exact solution.
/// To continue on a refined mesh, build a new session with [`reinit`](Self::reinit).
#[derive(Debug)]
pub struct PoissonFemModel<T: Real, P> {
    pde: Arc<P>,
    config: ModelConfig,
    space: Arc<LagrangeSpace<T>>,
    quadrature: TriangleQuadrature<T>,
    cell_measure: Vec<T>,
    uh: FiniteElementFunction<T, 1>,
    ui: FiniteElementFunction<T, 1>,
}

impl<T, P> PoissonFemModel<T, P>
where
    T: Real,
    P: PoissonProblem<T>,
{
    /// Builds a session with a zero solution on the given mesh.
    ///
    /// Returns an error if the configuration is unsupported or the mesh is malformed.
    pub fn new(pde: Arc<P>, mesh: TriangleMesh2d<T>, config: ModelConfig) -> Result<Self, PoissonError> {
        let quadrature = config.quadrature()?;
        let space = Arc::new(LagrangeSpace::new(mesh, config.degree)?);
        let cell_measure = space.cell_measure();

        let uh = FiniteElementFunction::zeros(Arc::clone(&space));
        let ui_coefficients = space.interpolate(|x| Vector1::new(pde.solution(x)));
        let ui = FiniteElementFunction::from_coefficients(Arc::clone(&space), ui_coefficients)?;

        debug!(
            "Initialized Poisson model: {} cells, {} dofs, degree {}",
            space.num_cells(),
            space.number_of_global_dofs(),
            config.degree
        );

        Ok(Self {
            pde,
            config,
            space,
            quadrature,
            cell_measure,
            uh,
            ui,
        })
    }

    /// Builds a new session for the given mesh with the same problem and configuration.
    pub fn reinit(&self, mesh: TriangleMesh2d<T>) -> Result<Self, PoissonError> {
        Self::new(Arc::clone(&self.pde), mesh, self.config)
    }

    pub fn pde(&self) -> &Arc<P> {
        &self.pde
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn mesh(&self) -> &TriangleMesh2d<T> {
        self.space.mesh()
    }

    pub fn space(&self) -> &Arc<LagrangeSpace<T>> {
        &self.space
    }

    pub fn quadrature(&self) -> &TriangleQuadrature<T> {
        &self.quadrature
    }

    pub fn cell_measure(&self) -> &[T] {
        &self.cell_measure
    }

    pub fn number_of_global_dofs(&self) -> usize {
        self.space.number_of_global_dofs()
    }

    /// The discrete solution `uh`.
    pub fn solution(&self) -> &FiniteElementFunction<T, 1> {
        &self.uh
    }

    /// The interpolant `uI` of the exact solution.
    pub fn interpolant(&self) -> &FiniteElementFunction<T, 1> {
        &self.ui
    }

    pub fn stiff_matrix(&self) -> Result<CsrMatrix<T>, PoissonError> {
        stiff_matrix(&self.space, &self.quadrature, &self.cell_measure)
    }

    pub fn source_vector(&self) -> Result<DVector<T>, PoissonError> {
        source_vector(|x| self.pde.source(x), &self.space, &self.quadrature, &self.cell_measure)
    }

    /// Solves the discrete problem with Dirichlet data taken from the problem and a direct
    /// Cholesky solver.
    pub fn solve(&mut self) -> Result<(), PoissonError> {
        let bc = DirichletBC::new(&self.space, |x| self.pde.dirichlet(x));
        self.solve_with(&bc, &CholeskySolver)
    }

    /// Assembles, applies the boundary condition and solves with the given solver.
    ///
    /// The solution is left untouched if any step fails.
    pub fn solve_with(
        &mut self,
        bc: &impl BoundaryCondition<T>,
        solver: &impl LinearSolver<T>,
    ) -> Result<(), PoissonError> {
        let num_dofs = self.number_of_global_dofs();

        let assembly_timer = Instant::now();
        let a = self.stiff_matrix()?;
        let b = self.source_vector()?;
        debug!("Assembled system with {} dofs in {:?}", num_dofs, assembly_timer.elapsed());

        let (a, b) = bc.apply(a, b)?;
        PoissonError::check_dimension("boundary condition matrix rows", num_dofs, a.nrows())?;
        PoissonError::check_dimension("boundary condition matrix columns", num_dofs, a.ncols())?;
        PoissonError::check_dimension("boundary condition right-hand side", num_dofs, b.len())?;

        let solve_timer = Instant::now();
        let x = solver.solve(&a, &b)?;
        PoissonError::check_dimension("linear solver solution", num_dofs, x.len())?;
        info!("Solved system with {} dofs in {:?}", num_dofs, solve_timer.elapsed());

        *self.uh.coefficients_mut() = x;
        Ok(())
    }

    fn integral_alg(&self) -> Result<IntegralAlg<'_, T, TriangleQuadrature<T>>, PoissonError> {
        IntegralAlg::new(&self.quadrature, self.mesh(), &self.cell_measure)
    }

    /// Root mean square of the nodal difference `uh - uI`.
    pub fn l2_error(&self) -> T {
        let n = self.number_of_global_dofs();
        if n == 0 {
            return T::zero();
        }
        let diff = self.uh.coefficients() - self.ui.coefficients();
        (diff.norm_squared() / T::from_usize(n).unwrap()).sqrt()
    }

    /// The discrete energy norm $\sqrt{e^T A e}$ of $e = u_I - u_h$.
    pub fn energy_error(&self) -> Result<T, PoissonError> {
        let a = self.stiff_matrix()?;
        let e = self.ui.coefficients() - self.uh.coefficients();
        let energy = a
            .triplet_iter()
            .fold(T::zero(), |acc, (i, j, &a_ij)| acc + e[i] * a_ij * e[j]);
        Ok(energy.max(T::zero()).sqrt())
    }

    /// $\norm{u - u_h}_{L^2}$.
    #[allow(non_snake_case)]
    pub fn L2_error(&self) -> Result<T, PoissonError> {
        let u = SpatialFn(|x: &Point2<T>| Vector1::new(self.pde.solution(x)));
        Ok(self.integral_alg()?.l2_error(&u, &ValueOf(&self.uh)))
    }

    /// $\seminorm{u - u_h}_{H^1}$.
    #[allow(non_snake_case)]
    pub fn H1_error(&self) -> Result<T, PoissonError> {
        let u_grad = SpatialFn(|x: &Point2<T>| self.pde.gradient(x));
        Ok(self.integral_alg()?.l2_error(&u_grad, &GradientOf(&self.uh)))
    }

    fn check_recovery_supported(&self) -> Result<(), PoissonError> {
        match self.config.degree {
            1 => Ok(()),
            degree => Err(PoissonError::UnsupportedConfiguration(format!(
                "gradient recovery requires degree 1 elements, but the model uses degree {degree}"
            ))),
        }
    }

    /// The recovered gradient, a continuous piecewise linear field whose nodal values are the
    /// averages of the gradients of `uh` on the incident cells, weighted by inverse cell area.
    ///
    /// Returns an error for elements of degree other than one, or if a node has no incident
    /// cells or is incident to a cell of zero area.
    pub fn recovered_gradient(&self) -> Result<FiniteElementFunction<T, 2>, PoissonError> {
        self.check_recovery_supported()?;
        let centroid = Point2::new(T::one(), T::one()) / T::from_f64(3.0).unwrap();
        let cell_gradients: Vec<Vector2<T>> = (0..self.space.num_cells())
            .map(|cell| self.uh.gradient_at(cell, &centroid).column(0).into_owned())
            .collect();

        let incidence = self.mesh().node_to_cell();
        let mut coefficients = DVector::zeros(2 * incidence.len());
        for (node, cells) in incidence.iter().enumerate() {
            if cells.is_empty() {
                return Err(PoissonError::MalformedMesh(format!("node {node} has no incident cells")));
            }
            let mut weighted_sum = Vector2::zeros();
            let mut weight_total = T::zero();
            for &cell in cells {
                let measure = self.cell_measure[cell];
                if measure <= T::zero() {
                    return Err(PoissonError::MalformedMesh(format!(
                        "cell {cell} incident to node {node} has zero measure"
                    )));
                }
                let weight = T::one() / measure;
                weighted_sum += cell_gradients[cell] * weight;
                weight_total += weight;
            }
            coefficients
                .fixed_rows_mut::<2>(2 * node)
                .copy_from(&(weighted_sum / weight_total));
        }

        FiniteElementFunction::from_coefficients(Arc::clone(&self.space), coefficients)
    }

    /// Per-cell recovery error indicator $\eta_K = \norm{G(\nabla u_h) - \nabla u_h}_{L^2(K)}$,
    /// where $G$ denotes gradient recovery.
    pub fn recover_estimate(&self) -> Result<DVector<T>, PoissonError> {
        let timer = Instant::now();
        let rguh = self.recovered_gradient()?;
        let eta = self
            .integral_alg()?
            .cellwise_squared_error(&ValueOf(&rguh), &GradientOf(&self.uh))
            .map(|eta_squared| eta_squared.sqrt());
        debug!("Computed recovery estimate for {} cells in {:?}", eta.len(), timer.elapsed());
        Ok(eta)
    }

    /// $\norm{\nabla u - G(\nabla u_h)}_{L^2}$.
    pub fn recover_error(&self) -> Result<T, PoissonError> {
        let rguh = self.recovered_gradient()?;
        let u_grad = SpatialFn(|x: &Point2<T>| self.pde.gradient(x));
        Ok(self.integral_alg()?.l2_error(&u_grad, &ValueOf(&rguh)))
    }
}
