use crate::solver::{SolveOptions, TspMode};

use anyhow::anyhow;
use clap::Parser;
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(
    name = "MAPF waypoints",
    about = "Multi-agent path finding with waypoints: operator decomposition and independence detection.",
    version = "1.0"
)]
pub struct Cli {
    #[arg(long, help = "Path to a YAML config file")]
    pub config: Option<String>,

    #[arg(long, help = "Path to a JSON or YAML problem file")]
    pub problem_path: Option<String>,

    #[arg(long, help = "Path to the JSON solution output")]
    pub output_path: Option<String>,

    #[arg(long, help = "Number of agents of a generated problem")]
    pub agents: Option<usize>,

    #[arg(long, help = "Waypoints per agent of a generated problem")]
    pub waypoints: Option<usize>,

    #[arg(long, help = "Side length of a generated problem")]
    pub size: Option<usize>,

    #[arg(long, help = "Seed for the random number generator")]
    pub seed: Option<u64>,

    #[arg(long, help = "Solver to use: id or od")]
    pub solver: Option<String>,

    #[arg(long, help = "Waypoint heuristic: exact or mst")]
    pub tsp: Option<String>,

    #[arg(
        long,
        help = "Visit waypoints in the given order",
        default_value_t = false
    )]
    pub sequential: bool,

    #[arg(
        long,
        help = "Optimization: Prioritize Conflicts",
        default_value_t = false
    )]
    pub op_prioritize_conflicts: bool,

    #[arg(long, help = "Extra cost allowed when replanning around another group")]
    pub replan_slack: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub problem_path: Option<String>,
    pub output_path: Option<String>,
    pub agents: usize,
    pub waypoints: usize,
    pub size: usize,
    pub seed: u64,
    pub solver: String,
    pub tsp: String,
    pub sequential: bool,
    pub op_prioritize_conflicts: bool,
    pub replan_slack: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            problem_path: None,
            output_path: None,
            agents: 4,
            waypoints: 2,
            size: 16,
            seed: 0,
            solver: "id".to_string(),
            tsp: "exact".to_string(),
            sequential: false,
            op_prioritize_conflicts: false,
            replan_slack: 0,
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Command line values win over the file; flags can only switch options on.
    pub fn override_from_command_line(mut self, cli: &Cli) -> anyhow::Result<Self> {
        if let Some(problem_path) = &cli.problem_path {
            self.problem_path = Some(problem_path.clone());
        }
        if let Some(output_path) = &cli.output_path {
            self.output_path = Some(output_path.clone());
        }
        if let Some(agents) = cli.agents {
            self.agents = agents;
        }
        if let Some(waypoints) = cli.waypoints {
            self.waypoints = waypoints;
        }
        if let Some(size) = cli.size {
            self.size = size;
        }
        if let Some(seed) = cli.seed {
            self.seed = seed;
        }
        if let Some(solver) = &cli.solver {
            self.solver = solver.clone();
        }
        if let Some(tsp) = &cli.tsp {
            self.tsp = tsp.clone();
        }
        if let Some(replan_slack) = cli.replan_slack {
            self.replan_slack = replan_slack;
        }
        self.sequential |= cli.sequential;
        self.op_prioritize_conflicts |= cli.op_prioritize_conflicts;

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        match self.solver.as_str() {
            "id" | "od" => {}
            other => return Err(anyhow!("Unknown solver {other:?}, expected id or od")),
        }
        self.tsp_mode()?;

        if self.problem_path.is_none() {
            if self.size < 2 {
                return Err(anyhow!(
                    "Generated grid size must be at least 2, got {}",
                    self.size
                ));
            }
            if self.waypoints > crate::heuristic::MAX_WAYPOINTS {
                return Err(anyhow!(
                    "At most {} waypoints per agent are supported, got {}",
                    crate::heuristic::MAX_WAYPOINTS,
                    self.waypoints
                ));
            }
        }
        Ok(())
    }

    fn tsp_mode(&self) -> anyhow::Result<TspMode> {
        match self.tsp.as_str() {
            "exact" => Ok(TspMode::Exact),
            "mst" => Ok(TspMode::Mst),
            other => Err(anyhow!("Unknown tsp mode {other:?}, expected exact or mst")),
        }
    }

    pub fn solve_options(&self) -> anyhow::Result<SolveOptions> {
        Ok(SolveOptions {
            tsp: self.tsp_mode()?,
            sequential: self.sequential,
            prioritize_conflicts: self.op_prioritize_conflicts,
            replan_slack: self.replan_slack,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_missing_keys_default() {
        let config = Config::from_yaml_str("solver: od\nreplan_slack: 2\n").unwrap();
        assert_eq!(config.solver, "od");
        assert_eq!(config.replan_slack, 2);
        assert_eq!(config.tsp, "exact");
        assert_eq!(config.agents, Config::default().agents);
    }

    #[test]
    fn test_command_line_overrides_file() {
        let config = Config::from_yaml_str("tsp: exact\nseed: 3\n").unwrap();
        let cli = Cli::parse_from(["mapf", "--tsp", "mst", "--sequential", "--agents", "6"]);

        let config = config.override_from_command_line(&cli).unwrap();
        assert_eq!(config.seed, 3);
        assert_eq!(config.agents, 6);

        let options = config.solve_options().unwrap();
        assert_eq!(options.tsp, TspMode::Mst);
        assert!(options.sequential);
        assert!(!options.prioritize_conflicts);
    }

    #[test]
    fn test_validate_rejects_unknown_values() {
        let config = Config {
            solver: "cbs".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            tsp: "greedy".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            waypoints: 40,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        assert!(Config::default().validate().is_ok());
    }
}
