use super::{Group, SolveOptions, Solver};
use crate::common::PathSet;
use crate::error::SolveError;
use crate::grid::Grid;
use crate::stat::Stats;

use std::time::Instant;
use tracing::instrument;

/// Plans every agent in one joint operator decomposition search, without
/// independence detection.
pub struct OperatorDecomposition<'a> {
    grid: &'a Grid,
    options: SolveOptions,
    stats: Stats,
}

impl<'a> OperatorDecomposition<'a> {
    pub fn new(grid: &'a Grid, options: SolveOptions) -> Self {
        OperatorDecomposition {
            grid,
            options,
            stats: Stats::default(),
        }
    }
}

impl Solver for OperatorDecomposition<'_> {
    #[instrument(skip_all, name = "operator_decomposition", fields(agents = self.grid.agents()), level = "debug")]
    fn solve(&mut self) -> Result<PathSet, SolveError> {
        let total_solve_start_time = Instant::now();
        let mut group = Group::new((0..self.grid.agents()).collect());

        if !group.solve(self.grid, None, &self.options, &mut self.stats)? {
            return Err(SolveError::NoSolution);
        }
        let Some(solution) = group.solution() else {
            return Err(SolveError::NoSolution);
        };
        let paths = PathSet::merge(&[(solution, group.agents())]);

        self.stats.time_us = total_solve_start_time.elapsed().as_micros() as usize;
        self.stats.costs = paths.cost();
        self.stats.makespan = paths.makespan();
        self.stats.largest_group = group.agents().len();
        self.stats.print();

        Ok(paths)
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{IndependenceDetection, TspMode};

    #[test]
    fn test_joint_search_matches_independence_detection() {
        let mut grid = Grid::new(3, 2);
        grid.add_wall(0, 1).unwrap();
        grid.add_wall(2, 1).unwrap();
        grid.add_agent((0, 0), (2, 0)).unwrap();
        grid.add_agent((2, 0), (0, 0)).unwrap();

        let mut joint = OperatorDecomposition::new(&grid, SolveOptions::default());
        let paths = joint.solve().unwrap();
        assert!(paths.verify(&grid, false));
        assert_eq!(joint.stats().largest_group, 2);
        assert_eq!(joint.stats().merges, 0);

        let mut id = IndependenceDetection::new(&grid, SolveOptions::default());
        assert_eq!(id.solve().unwrap().cost(), paths.cost());
    }

    #[test]
    fn test_mst_mode_stays_optimal() {
        let mut grid = Grid::new(6, 6);
        for (x, y) in [(0, 1), (1, 1), (0, 3), (1, 4), (2, 4), (5, 4)] {
            grid.add_wall(x, y).unwrap();
        }
        grid.add_agent((1, 2), (5, 5)).unwrap();
        grid.add_agent((5, 0), (3, 0)).unwrap();
        grid.add_waypoint(0, 0, 5).unwrap();
        grid.add_waypoint(1, 2, 0).unwrap();

        // Agent 0 walks 8 to (0, 5) and 5 more to its goal; agent 1 walks 3
        // to (2, 0) and back 1. The two never meet.
        for tsp in [TspMode::Exact, TspMode::Mst] {
            let options = SolveOptions {
                tsp,
                ..SolveOptions::default()
            };
            let mut joint = OperatorDecomposition::new(&grid, options);
            let paths = joint.solve().unwrap();
            assert!(paths.verify(&grid, false));
            assert_eq!(paths.cost(), 17);

            let mut id = IndependenceDetection::new(&grid, options);
            assert_eq!(id.solve().unwrap().cost(), 17);
        }
    }

    #[test]
    fn test_no_agents() {
        let grid = Grid::new(2, 2);
        let mut joint = OperatorDecomposition::new(&grid, SolveOptions::default());
        let paths = joint.solve().unwrap();
        assert_eq!(paths.agents(), 0);
        assert_eq!(paths.cost(), 0);
    }
}
