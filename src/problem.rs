use crate::common::{PathSet, Position};
use crate::error::GridError;
use crate::grid::Grid;

use anyhow::{anyhow, Context};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::debug;

const WALL_PROBABILITY: f64 = 0.2;

/// A problem instance as stored on disk. Positions are `[x, y]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub walls: Vec<Position>,
    pub starts: Vec<Position>,
    pub goals: Vec<Position>,
    /// Per agent; may be shorter than `starts`.
    #[serde(default)]
    pub waypoints: Vec<Vec<Position>>,
}

impl Problem {
    /// Read a problem, as JSON or YAML depending on the file extension.
    pub fn load_from_file(path: &str) -> anyhow::Result<Self> {
        let file = File::open(path).with_context(|| format!("failed to open problem {path}"))?;
        let reader = BufReader::new(file);

        match Path::new(path).extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_reader(reader)
                .with_context(|| format!("failed to parse JSON problem {path}")),
            Some("yaml") | Some("yml") => serde_yaml::from_reader(reader)
                .with_context(|| format!("failed to parse YAML problem {path}")),
            _ => Err(anyhow!("unsupported problem format: {path}")),
        }
    }

    pub fn to_grid(&self) -> Result<Grid, GridError> {
        if self.starts.len() != self.goals.len() {
            return Err(GridError::AgentCountMismatch {
                starts: self.starts.len(),
                goals: self.goals.len(),
            });
        }

        let mut grid = Grid::new(self.width, self.height);
        for &(x, y) in &self.walls {
            grid.add_wall(x, y)?;
        }
        for (&start, &goal) in self.starts.iter().zip(&self.goals) {
            grid.add_agent(start, goal)?;
        }
        for (agent, waypoints) in self.waypoints.iter().enumerate() {
            for &(x, y) in waypoints {
                grid.add_waypoint(agent, x, y)?;
            }
        }
        Ok(grid)
    }

    /// Random square instance. Starts, goals and waypoints are distinct cells
    /// of the largest connected open region, so all agents can reach their
    /// targets. Fewer agents are placed when that region is too small.
    pub fn generate<R: Rng>(
        agents: usize,
        waypoints: usize,
        size: usize,
        rng: &mut R,
    ) -> Result<Self, GridError> {
        let mut walls = Vec::new();
        let mut grid = Grid::new(size, size);
        for y in 0..size {
            for x in 0..size {
                if rng.gen_bool(WALL_PROBABILITY) {
                    grid.add_wall(x, y)?;
                    walls.push((x, y));
                }
            }
        }

        let mut pool = largest_region(&grid);
        debug!("largest open region has {} cells", pool.len());
        pool.shuffle(rng);

        // Each agent takes a start, a goal and its waypoints off the pool.
        let mut starts = Vec::new();
        let mut goals = Vec::new();
        let mut agent_waypoints = Vec::new();
        for tiles in pool.chunks_exact(waypoints + 2).take(agents) {
            starts.push(tiles[0]);
            goals.push(tiles[1]);
            agent_waypoints.push(tiles[2..].to_vec());
        }
        if starts.len() < agents {
            debug!("placed {} of {} agents", starts.len(), agents);
        }

        Ok(Problem {
            width: size,
            height: size,
            walls,
            starts,
            goals,
            waypoints: agent_waypoints,
        })
    }
}

fn largest_region(grid: &Grid) -> Vec<Position> {
    let mut seen = vec![vec![false; grid.width()]; grid.height()];
    let mut largest = Vec::new();

    for y in 0..grid.height() {
        for x in 0..grid.width() {
            if seen[y][x] || grid.is_wall(x, y) {
                continue;
            }
            let distances = grid.backtrack_heuristics((x, y));
            let mut region = Vec::new();
            for cy in 0..grid.height() {
                for cx in 0..grid.width() {
                    if distances.get((cx, cy)).is_some() {
                        seen[cy][cx] = true;
                        region.push((cx, cy));
                    }
                }
            }
            if region.len() > largest.len() {
                largest = region;
            }
        }
    }

    largest
}

/// Solution as written by the binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionFile {
    pub cost: usize,
    pub makespan: usize,
    pub paths: PathSet,
}

impl SolutionFile {
    pub fn new(paths: PathSet) -> Self {
        SolutionFile {
            cost: paths.cost(),
            makespan: paths.makespan(),
            paths,
        }
    }

    pub fn write(&self, path: &str) -> anyhow::Result<()> {
        let file =
            File::create(path).with_context(|| format!("failed to create output {path}"))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .with_context(|| format!("failed to write solution to {path}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::fs;

    fn temp_file(name: &str, contents: &str) -> String {
        let path = std::env::temp_dir().join(name);
        fs::write(&path, contents).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_load_json_and_yaml() {
        let json = temp_file(
            "mapf_waypoints_problem.json",
            r#"{"width": 5, "height": 2, "walls": [[1, 0], [2, 0]],
                "starts": [[0, 0]], "goals": [[4, 1]], "waypoints": [[[4, 0]]]}"#,
        );
        let yaml = temp_file(
            "mapf_waypoints_problem.yaml",
            "width: 5\nheight: 2\nwalls: [[1, 0], [2, 0]]\nstarts: [[0, 0]]\ngoals: [[4, 1]]\nwaypoints: [[[4, 0]]]\n",
        );

        let from_json = Problem::load_from_file(&json).unwrap();
        let from_yaml = Problem::load_from_file(&yaml).unwrap();
        assert_eq!(from_json, from_yaml);

        let grid = from_json.to_grid().unwrap();
        assert_eq!(grid.agents(), 1);
        assert!(grid.is_wall(2, 0));
        assert_eq!(grid.waypoints(0), &[(4, 0)]);
    }

    #[test]
    fn test_unknown_extension() {
        let path = temp_file("mapf_waypoints_problem.txt", "width: 1");
        assert!(Problem::load_from_file(&path).is_err());
    }

    #[test]
    fn test_to_grid_errors() {
        let problem = Problem {
            width: 3,
            height: 3,
            walls: vec![(1, 1)],
            starts: vec![(1, 1)],
            goals: vec![(0, 0)],
            waypoints: Vec::new(),
        };
        assert_eq!(problem.to_grid().unwrap_err(), GridError::OnWall { x: 1, y: 1 });

        let problem = Problem {
            walls: Vec::new(),
            starts: vec![(0, 0), (2, 2)],
            goals: vec![(0, 1)],
            ..problem
        };
        assert_eq!(
            problem.to_grid().unwrap_err(),
            GridError::AgentCountMismatch {
                starts: 2,
                goals: 1
            }
        );
    }

    #[test]
    fn test_generate_places_agents_in_one_region() {
        let mut rng = StdRng::seed_from_u64(11);
        let problem = Problem::generate(5, 3, 10, &mut rng).unwrap();
        let grid = problem.to_grid().unwrap();

        assert_eq!(grid.agents(), 5);
        for agent in 0..grid.agents() {
            // No waypoint was dropped for sitting on a start or goal.
            assert_eq!(grid.waypoints(agent).len(), 3);
            let distances = grid.backtrack_heuristics(grid.start(agent));
            assert!(distances.get(grid.goal(agent)).is_some());
            assert!(grid
                .waypoints(agent)
                .iter()
                .all(|&waypoint| distances.get(waypoint).is_some()));
        }

        let mut tiles: Vec<Position> = problem
            .starts
            .iter()
            .chain(&problem.goals)
            .chain(problem.waypoints.iter().flatten())
            .copied()
            .collect();
        tiles.sort();
        tiles.dedup();
        assert_eq!(tiles.len(), 5 * (2 + 3));

        let mut rng = StdRng::seed_from_u64(11);
        assert_eq!(Problem::generate(5, 3, 10, &mut rng).unwrap(), problem);
    }

    #[test]
    fn test_generate_small_region_places_fewer_agents() {
        let mut rng = StdRng::seed_from_u64(3);
        let problem = Problem::generate(4, 1, 2, &mut rng).unwrap();

        // At most 4 open cells, three per agent.
        assert!(problem.starts.len() <= 1);
        assert_eq!(problem.starts.len(), problem.goals.len());
        assert_eq!(problem.starts.len(), problem.waypoints.len());
        assert!(problem.to_grid().is_ok());
    }

    #[test]
    fn test_solution_file() {
        let paths: PathSet = serde_json::from_str("[[[0,0],[1,0],[1,0]], [[2,2],[2,1],[2,0]]]").unwrap();
        let solution = SolutionFile::new(paths);
        assert_eq!(solution.cost, 3);
        assert_eq!(solution.makespan, 2);

        let path = std::env::temp_dir().join("mapf_waypoints_solution.json");
        let path = path.to_string_lossy().into_owned();
        solution.write(&path).unwrap();
        let read: SolutionFile = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(read, solution);
    }
}
