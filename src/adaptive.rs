//! The solve-estimate-mark-refine loop.
use crate::mesh::refinement::{refine_marked, refine_uniformly};
use crate::model::PoissonFemModel;
use crate::problem::PoissonProblem;
use crate::{PoissonError, Real};
use log::info;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How the mesh is refined between iterations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefinementKind {
    /// Every cell is split into four.
    #[default]
    Uniform,
    /// Cells selected by the marking strategy are bisected by newest vertex bisection.
    Bisection,
}

/// Selection of cells for refinement from a per-cell error indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MarkingStrategy {
    /// Marks every cell whose indicator exceeds `theta` times the largest indicator.
    Maximum { theta: f64 },
    /// Marks a smallest set of cells with the largest indicators whose squared indicators sum
    /// to at least `theta` times the total (Dörfler marking).
    Bulk { theta: f64 },
}

impl Default for MarkingStrategy {
    fn default() -> Self {
        Self::Maximum { theta: 0.5 }
    }
}

impl MarkingStrategy {
    pub fn theta(&self) -> f64 {
        match *self {
            Self::Maximum { theta } | Self::Bulk { theta } => theta,
        }
    }

    pub fn validate(&self) -> Result<(), PoissonError> {
        let theta = self.theta();
        if (0.0..=1.0).contains(&theta) {
            Ok(())
        } else {
            Err(PoissonError::UnsupportedConfiguration(format!(
                "marking parameter theta must lie in [0, 1], got {theta}"
            )))
        }
    }
}

/// Returns the indices of the cells selected for refinement in ascending order.
pub fn mark_cells<T: Real>(eta: &DVector<T>, strategy: &MarkingStrategy) -> Vec<usize> {
    if eta.is_empty() {
        return Vec::new();
    }
    let theta = T::from_f64(strategy.theta()).unwrap();
    match strategy {
        MarkingStrategy::Maximum { .. } => {
            let threshold = eta.max() * theta;
            (0..eta.len()).filter(|&i| eta[i] > threshold).collect()
        }
        MarkingStrategy::Bulk { .. } => {
            let mut order: Vec<usize> = (0..eta.len()).collect();
            order.sort_by(|&i, &j| eta[j].partial_cmp(&eta[i]).unwrap_or(Ordering::Equal));

            let target = eta.norm_squared() * theta;
            let mut accumulated = T::zero();
            let mut marked = Vec::new();
            for i in order {
                if accumulated >= target {
                    break;
                }
                accumulated += eta[i] * eta[i];
                marked.push(i);
            }
            marked.sort_unstable();
            marked
        }
    }
}

/// Parameters of the adaptive loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveConfig {
    /// Number of solves. The mesh is refined between consecutive solves.
    pub max_iterations: usize,
    pub refinement: RefinementKind,
    /// Only used for [`RefinementKind::Bisection`].
    pub marking: MarkingStrategy,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            max_iterations: 4,
            refinement: RefinementKind::default(),
            marking: MarkingStrategy::default(),
        }
    }
}

/// Error norms recorded in each iteration of the adaptive loop.
///
/// The recovery error and the estimator require linear elements and are left empty otherwise.
#[allow(non_snake_case)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
pub struct ErrorHistory<T> {
    pub number_of_dofs: Vec<usize>,
    pub l2_error: Vec<T>,
    pub energy_error: Vec<T>,
    pub L2_error: Vec<T>,
    pub H1_error: Vec<T>,
    pub recover_error: Vec<T>,
    /// $(\sum_K \eta_K^2)^{1/2}$.
    pub estimator: Vec<T>,
}

impl<T> Default for ErrorHistory<T> {
    fn default() -> Self {
        Self {
            number_of_dofs: Vec::new(),
            l2_error: Vec::new(),
            energy_error: Vec::new(),
            L2_error: Vec::new(),
            H1_error: Vec::new(),
            recover_error: Vec::new(),
            estimator: Vec::new(),
        }
    }
}

/// Observed orders of convergence with respect to the number of degrees of freedom.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
pub struct ConvergenceRates<T> {
    pub l2_error: Option<T>,
    pub energy_error: Option<T>,
    pub L2_error: Option<T>,
    pub H1_error: Option<T>,
    pub recover_error: Option<T>,
    pub estimator: Option<T>,
}

impl<T: Real> ErrorHistory<T> {
    pub fn len(&self) -> usize {
        self.number_of_dofs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.number_of_dofs.is_empty()
    }

    /// Least-squares order of convergence $p$ in $e \sim N^{-p}$, where $N$ is the number of
    /// degrees of freedom.
    ///
    /// Returns `None` if the errors do not cover every recorded iteration, if there are fewer
    /// than two distinct numbers of degrees of freedom or if an error is not positive.
    /// In two dimensions $N \sim h^{-2}$, so the order with respect to the mesh size is $2p$.
    pub fn convergence_rate(&self, errors: &[T]) -> Option<T> {
        if errors.len() != self.len() || errors.iter().any(|&e| e <= T::zero()) {
            return None;
        }
        let x: Vec<T> = self
            .number_of_dofs
            .iter()
            .map(|&n| T::from_usize(n).map(|n| n.ln()))
            .collect::<Option<_>>()?;
        let y: Vec<T> = errors.iter().map(|e| e.ln()).collect();
        let count = T::from_usize(x.len())?;
        let x_mean = x.iter().fold(T::zero(), |acc, &v| acc + v) / count;
        let y_mean = y.iter().fold(T::zero(), |acc, &v| acc + v) / count;

        let (covariance, variance) = x
            .iter()
            .zip(&y)
            .fold((T::zero(), T::zero()), |(cov, var), (&xi, &yi)| {
                (cov + (xi - x_mean) * (yi - y_mean), var + (xi - x_mean) * (xi - x_mean))
            });
        (variance > T::zero()).then(|| -covariance / variance)
    }

    pub fn convergence_rates(&self) -> ConvergenceRates<T> {
        ConvergenceRates {
            l2_error: self.convergence_rate(&self.l2_error),
            energy_error: self.convergence_rate(&self.energy_error),
            L2_error: self.convergence_rate(&self.L2_error),
            H1_error: self.convergence_rate(&self.H1_error),
            recover_error: self.convergence_rate(&self.recover_error),
            estimator: self.convergence_rate(&self.estimator),
        }
    }
}

/// Runs the adaptive loop starting from the given session.
///
/// Each iteration solves, records all error norms and, unless it is the last iteration,
/// refines the mesh and builds a new session on it. Returns the final session together with
/// the recorded history.
pub fn run_adaptive<T, P>(
    model: PoissonFemModel<T, P>,
    config: &AdaptiveConfig,
) -> Result<(PoissonFemModel<T, P>, ErrorHistory<T>), PoissonError>
where
    T: Real,
    P: PoissonProblem<T>,
{
    config.marking.validate()?;
    let recovery_available = model.config().degree == 1;
    if config.refinement == RefinementKind::Bisection && !recovery_available {
        return Err(PoissonError::UnsupportedConfiguration(format!(
            "adaptive bisection requires the recovery estimator, which is unavailable for degree {}",
            model.config().degree
        )));
    }

    let mut model = model;
    let mut history = ErrorHistory::default();
    for iteration in 0..config.max_iterations {
        model.solve()?;

        history.number_of_dofs.push(model.number_of_global_dofs());
        history.l2_error.push(model.l2_error());
        history.energy_error.push(model.energy_error()?);
        history.L2_error.push(model.L2_error()?);
        history.H1_error.push(model.H1_error()?);

        let eta = if recovery_available {
            let eta = model.recover_estimate()?;
            history.recover_error.push(model.recover_error()?);
            history.estimator.push(eta.norm());
            Some(eta)
        } else {
            None
        };

        info!(
            "Iteration {}: {} dofs, {} cells, L2 error {}, H1 error {}",
            iteration,
            model.number_of_global_dofs(),
            model.mesh().num_cells(),
            history.L2_error[iteration],
            history.H1_error[iteration]
        );

        if iteration + 1 == config.max_iterations {
            break;
        }

        let mesh = match (config.refinement, &eta) {
            (RefinementKind::Bisection, Some(eta)) => {
                let marked = mark_cells(eta, &config.marking);
                info!("Marked {} of {} cells for refinement", marked.len(), eta.len());
                refine_marked(model.mesh(), &marked)?
            }
            _ => refine_uniformly(model.mesh()),
        };
        model = model.reinit(mesh)?;
    }

    Ok((model, history))
}
