//! Solves a Poisson problem with a known solution on a sequence of refined meshes and reports
//! the error history together with the observed orders of convergence.
//!
//! Example:
//!
//! ```text
//! cargo run --release --example poisson_adaptive -- --problem lshape --refinement bisection --max-iterations 10
//! ```
use clap::{Parser, ValueEnum};
use eyre::eyre;
use log::info;
use poisson_afem::adaptive::{run_adaptive, AdaptiveConfig, ErrorHistory, MarkingStrategy, RefinementKind};
use poisson_afem::mesh::TriangleMesh2d;
use poisson_afem::model::{ModelConfig, PoissonFemModel};
use poisson_afem::problem::{CosCosData, LShapeRSinData, PoissonProblem, SinCosData, SinSinData};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Problem {
    CosCos,
    SinSin,
    SinCos,
    Lshape,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Refinement {
    Uniform,
    Bisection,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Marking {
    Maximum,
    Bulk,
}

#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    #[arg(long, value_enum, default_value_t = Problem::Lshape)]
    problem: Problem,

    /// Number of uniform refinements of the initial mesh of the problem.
    #[arg(long, default_value_t = 1)]
    initial_refinements: usize,

    /// Polynomial degree of the elements (1 or 2).
    #[arg(long, default_value_t = 1)]
    degree: usize,

    #[arg(long, default_value_t = 4)]
    quadrature_strength: usize,

    #[arg(long, value_enum, default_value_t = Refinement::Bisection)]
    refinement: Refinement,

    #[arg(long, value_enum, default_value_t = Marking::Bulk)]
    marking: Marking,

    /// Marking parameter in [0, 1].
    #[arg(long, default_value_t = 0.5)]
    theta: f64,

    #[arg(long, default_value_t = 8)]
    max_iterations: usize,

    /// Write the error history as JSON to the given file.
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    match args.problem {
        Problem::CosCos => run(CosCosData, &args),
        Problem::SinSin => run(SinSinData, &args),
        Problem::SinCos => run(SinCosData, &args),
        Problem::Lshape => run(LShapeRSinData, &args),
    }
}

fn run<P: PoissonProblem<f64>>(pde: P, args: &Args) -> eyre::Result<()> {
    let model_config = ModelConfig::default()
        .with_degree(args.degree)
        .with_quadrature_strength(args.quadrature_strength);
    let adaptive_config = AdaptiveConfig {
        max_iterations: args.max_iterations,
        refinement: match args.refinement {
            Refinement::Uniform => RefinementKind::Uniform,
            Refinement::Bisection => RefinementKind::Bisection,
        },
        marking: match args.marking {
            Marking::Maximum => MarkingStrategy::Maximum { theta: args.theta },
            Marking::Bulk => MarkingStrategy::Bulk { theta: args.theta },
        },
    };
    info!("Running {:?} with {:?} and {:?}", args.problem, model_config, adaptive_config);

    let mesh: TriangleMesh2d<f64> = pde.init_mesh(args.initial_refinements);
    let model = PoissonFemModel::new(Arc::new(pde), mesh, model_config)?;
    let (model, history) = run_adaptive(model, &adaptive_config)?;
    info!(
        "Final mesh has {} vertices and {} cells",
        model.mesh().num_vertices(),
        model.mesh().num_cells()
    );

    print_history(&history);

    if let Some(path) = &args.output {
        let file = File::create(path).map_err(|err| eyre!("Failed to create {}: {}", path.display(), err))?;
        serde_json::to_writer_pretty(file, &history)?;
        info!("Wrote error history to {}", path.display());
    }
    Ok(())
}

fn print_history(history: &ErrorHistory<f64>) {
    let columns: [(&str, &[f64]); 6] = [
        ("l2", &history.l2_error),
        ("energy", &history.energy_error),
        ("L2", &history.L2_error),
        ("H1", &history.H1_error),
        ("recovery", &history.recover_error),
        ("estimator", &history.estimator),
    ];
    let columns: Vec<_> = columns
        .into_iter()
        .filter(|(_, errors)| !errors.is_empty())
        .collect();

    print!("{:>10}", "dofs");
    for (name, _) in &columns {
        print!(" {:>12}", name);
    }
    println!();
    for (i, dofs) in history.number_of_dofs.iter().enumerate() {
        print!("{:>10}", dofs);
        for (_, errors) in &columns {
            print!(" {:>12.4e}", errors[i]);
        }
        println!();
    }

    print!("{:>10}", "order");
    for (_, errors) in &columns {
        match history.convergence_rate(errors) {
            Some(rate) => print!(" {:>12.3}", rate),
            None => print!(" {:>12}", "-"),
        }
    }
    println!();
}
