use mapf_waypoints::config::{Cli, Config};
use mapf_waypoints::problem::{Problem, SolutionFile};
use mapf_waypoints::solver::{IndependenceDetection, OperatorDecomposition, Solver};

use anyhow::{anyhow, Context};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    let config = if let Some(config_file) = cli.config.as_ref() {
        let config_str = std::fs::read_to_string(config_file)
            .with_context(|| format!("failed to read config file: {config_file}"))?;
        Config::from_yaml_str(&config_str)
            .with_context(|| format!("error with config file: {config_file}"))?
    } else {
        info!("No config file specified, using default config");
        Config::default()
    }
    .override_from_command_line(&cli)?;

    let problem = match &config.problem_path {
        Some(path) => Problem::load_from_file(path)?,
        None => {
            let mut rng = StdRng::seed_from_u64(config.seed);
            info!(
                "Generating {}x{} problem with {} agents and {} waypoints each",
                config.size, config.size, config.agents, config.waypoints
            );
            Problem::generate(config.agents, config.waypoints, config.size, &mut rng)?
        }
    };
    let grid = problem.to_grid().context("invalid problem")?;
    debug!("grid:\n{grid}");

    let options = config.solve_options()?;
    let mut solver: Box<dyn Solver + '_> = match config.solver.as_str() {
        "od" => Box::new(OperatorDecomposition::new(&grid, options)),
        _ => Box::new(IndependenceDetection::new(&grid, options)),
    };

    let paths = match solver.solve() {
        Ok(paths) => paths,
        Err(err) => {
            error!("{} solve fails: {err}", config.solver);
            return Err(err.into());
        }
    };
    if !paths.verify(&grid, options.sequential) {
        return Err(anyhow!("solver returned an invalid solution"));
    }
    info!("Solution cost {} makespan {}", paths.cost(), paths.makespan());

    if let Some(output_path) = &config.output_path {
        SolutionFile::new(paths).write(output_path)?;
        info!("Solution written to {output_path}");
    }

    Ok(())
}
