use matrixcompare::assert_scalar_eq;
use nalgebra::DVector;
use poisson_afem::adaptive::{
    mark_cells, run_adaptive, AdaptiveConfig, ErrorHistory, MarkingStrategy, RefinementKind,
};
use poisson_afem::mesh::TriangleMesh2d;
use poisson_afem::model::{ModelConfig, PoissonFemModel};
use poisson_afem::problem::{LShapeRSinData, PoissonProblem, SinSinData};
use poisson_afem::PoissonError;
use std::sync::Arc;

fn model<P: PoissonProblem<f64>>(pde: P, refinements: usize, degree: usize) -> PoissonFemModel<f64, P> {
    let mesh: TriangleMesh2d<f64> = pde.init_mesh(refinements);
    PoissonFemModel::new(Arc::new(pde), mesh, ModelConfig::default().with_degree(degree)).unwrap()
}

#[test]
fn maximum_marking() {
    let eta = DVector::from_vec(vec![0.1, 1.0, 0.6, 0.4]);
    assert_eq!(mark_cells(&eta, &MarkingStrategy::Maximum { theta: 0.5 }), vec![1, 2]);
    assert_eq!(mark_cells(&eta, &MarkingStrategy::Maximum { theta: 0.0 }), vec![0, 1, 2, 3]);
    // The largest indicator never exceeds itself
    assert!(mark_cells(&eta, &MarkingStrategy::Maximum { theta: 1.0 }).is_empty());
}

#[test]
fn bulk_marking() {
    // Squared indicators are [0.01, 1.0, 0.36, 0.16] with total 1.53
    let eta = DVector::from_vec(vec![0.1, 1.0, 0.6, 0.4]);
    assert_eq!(mark_cells(&eta, &MarkingStrategy::Bulk { theta: 0.5 }), vec![1]);
    assert_eq!(mark_cells(&eta, &MarkingStrategy::Bulk { theta: 0.8 }), vec![1, 2]);
    assert_eq!(mark_cells(&eta, &MarkingStrategy::Bulk { theta: 1.0 }), vec![0, 1, 2, 3]);
    assert!(mark_cells(&eta, &MarkingStrategy::Bulk { theta: 0.0 }).is_empty());
}

#[test]
fn marking_empty_indicators() {
    let eta = DVector::<f64>::zeros(0);
    assert!(mark_cells(&eta, &MarkingStrategy::default()).is_empty());
    assert!(mark_cells(&eta, &MarkingStrategy::Bulk { theta: 0.5 }).is_empty());
}

#[test]
fn marking_parameter_validation() {
    assert_eq!(MarkingStrategy::default(), MarkingStrategy::Maximum { theta: 0.5 });
    assert_eq!(MarkingStrategy::Bulk { theta: 0.3 }.theta(), 0.3);
    assert!(MarkingStrategy::Bulk { theta: 1.0 }.validate().is_ok());
    assert!(matches!(
        MarkingStrategy::Maximum { theta: 1.5 }.validate(),
        Err(PoissonError::UnsupportedConfiguration(_))
    ));
    assert!(MarkingStrategy::Bulk { theta: -0.1 }.validate().is_err());
}

#[test]
fn uniform_adaptive_loop() {
    let config = AdaptiveConfig {
        max_iterations: 3,
        ..AdaptiveConfig::default()
    };
    let (final_model, history) = run_adaptive(model(SinSinData, 2, 1), &config).unwrap();

    assert_eq!(history.len(), 3);
    for errors in [
        &history.l2_error,
        &history.energy_error,
        &history.L2_error,
        &history.H1_error,
        &history.recover_error,
        &history.estimator,
    ] {
        assert_eq!(errors.len(), 3);
        assert!(errors.windows(2).all(|w| w[1] < w[0]), "{errors:?}");
    }
    assert!(history.number_of_dofs.windows(2).all(|w| w[1] > w[0]));
    assert_eq!(*history.number_of_dofs.last().unwrap(), final_model.number_of_global_dofs());
    // The final session holds the last solution
    assert_scalar_eq!(
        final_model.H1_error().unwrap(),
        *history.H1_error.last().unwrap(),
        comp = abs,
        tol = 1e-14
    );
}

#[test]
fn quadratic_elements_skip_recovery() {
    let config = AdaptiveConfig {
        max_iterations: 2,
        ..AdaptiveConfig::default()
    };
    let (_, history) = run_adaptive(model(SinSinData, 1, 2), &config).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history.H1_error.len(), 2);
    assert!(history.recover_error.is_empty());
    assert!(history.estimator.is_empty());
    assert_eq!(history.convergence_rates().estimator, None);
}

#[test]
fn bisection_adaptive_loop() {
    let config = AdaptiveConfig {
        max_iterations: 4,
        refinement: RefinementKind::Bisection,
        marking: MarkingStrategy::Bulk { theta: 0.5 },
    };
    let initial = model(LShapeRSinData, 1, 1);
    let initial_cells = initial.mesh().num_cells();
    let (final_model, history) = run_adaptive(initial, &config).unwrap();

    assert_eq!(history.len(), 4);
    assert!(history.number_of_dofs.windows(2).all(|w| w[1] > w[0]));
    assert!(final_model.mesh().num_cells() > initial_cells);
    // Only part of the mesh is refined in each step
    assert!(final_model.mesh().num_cells() < initial_cells * 64);
    assert!(history.H1_error.last().unwrap() < &history.H1_error[0]);
}

#[test]
fn bisection_requires_linear_elements() {
    let config = AdaptiveConfig {
        refinement: RefinementKind::Bisection,
        ..AdaptiveConfig::default()
    };
    let result = run_adaptive(model(SinSinData, 0, 2), &config);
    assert!(matches!(result, Err(PoissonError::UnsupportedConfiguration(_))));
}

#[test]
fn invalid_marking_is_rejected_before_solving() {
    let config = AdaptiveConfig {
        marking: MarkingStrategy::Maximum { theta: 2.0 },
        ..AdaptiveConfig::default()
    };
    let result = run_adaptive(model(SinSinData, 0, 1), &config);
    assert!(matches!(result, Err(PoissonError::UnsupportedConfiguration(_))));
}

#[test]
fn zero_iterations_give_empty_history() {
    let config = AdaptiveConfig {
        max_iterations: 0,
        ..AdaptiveConfig::default()
    };
    let (model, history) = run_adaptive(model(SinSinData, 0, 1), &config).unwrap();
    assert!(history.is_empty());
    assert_eq!(history, ErrorHistory::default());
    assert_eq!(model.mesh().num_cells(), 2);
}

#[test]
fn convergence_rate_of_synthetic_history() {
    let history = ErrorHistory::<f64> {
        number_of_dofs: vec![10, 40, 160, 640],
        ..ErrorHistory::default()
    };
    // e = 3 / N
    let errors: Vec<f64> = history.number_of_dofs.iter().map(|&n| 3.0 / n as f64).collect();
    assert_scalar_eq!(history.convergence_rate(&errors).unwrap(), 1.0, comp = abs, tol = 1e-12);

    let half_order: Vec<f64> = history.number_of_dofs.iter().map(|&n| (n as f64).powf(-0.5)).collect();
    assert_scalar_eq!(history.convergence_rate(&half_order).unwrap(), 0.5, comp = abs, tol = 1e-12);

    assert_eq!(history.convergence_rate(&errors[..3]), None);
    assert_eq!(history.convergence_rate(&[1.0, 0.5, 0.0, 0.1]), None);

    let constant_dofs = ErrorHistory::<f64> {
        number_of_dofs: vec![10, 10],
        ..ErrorHistory::default()
    };
    assert_eq!(constant_dofs.convergence_rate(&[1.0, 0.5]), None);
}

#[test]
fn history_serialization() {
    let config = AdaptiveConfig {
        max_iterations: 2,
        ..AdaptiveConfig::default()
    };
    let (_, history) = run_adaptive(model(SinSinData, 1, 1), &config).unwrap();
    let json = serde_json::to_string(&history).unwrap();
    let deserialized: ErrorHistory<f64> = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized.number_of_dofs, history.number_of_dofs);
    for (a, b) in deserialized.H1_error.iter().zip(&history.H1_error) {
        assert_scalar_eq!(*a, *b, comp = abs, tol = 1e-12 * b.abs());
    }

    let config: AdaptiveConfig = serde_json::from_str(r#"{ "refinement": "Bisection" }"#).unwrap();
    assert_eq!(config.refinement, RefinementKind::Bisection);
    assert_eq!(config.max_iterations, 4);
    assert_eq!(config.marking, MarkingStrategy::default());
}
