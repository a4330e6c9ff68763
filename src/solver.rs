mod cat;
mod group;
mod id;
mod od;

pub use cat::ConflictAvoidanceTable;
pub use group::Group;
pub use id::IndependenceDetection;
pub use od::OperatorDecomposition;

use crate::common::PathSet;
use crate::error::SolveError;
use crate::grid::Grid;
use crate::heuristic::HeuristicKind;
use crate::stat::Stats;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TspMode {
    #[default]
    Exact,
    Mst,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolveOptions {
    pub tsp: TspMode,
    /// Visit waypoints in the order they were added; overrides `tsp`.
    pub sequential: bool,
    /// Break f-cost ties by soft conflict count before the heuristic.
    pub prioritize_conflicts: bool,
    /// Extra cost a group may spend when replanning around another group.
    pub replan_slack: usize,
}

impl SolveOptions {
    pub fn heuristic_kind(&self) -> HeuristicKind {
        match (self.sequential, self.tsp) {
            (true, _) => HeuristicKind::Sequential,
            (false, TspMode::Exact) => HeuristicKind::Exact,
            (false, TspMode::Mst) => HeuristicKind::Mst,
        }
    }
}

pub trait Solver {
    fn solve(&mut self) -> Result<PathSet, SolveError>;

    fn stats(&self) -> &Stats;
}

/// Solve `grid` with independence detection.
pub fn solve(grid: &Grid, options: &SolveOptions) -> Result<PathSet, SolveError> {
    IndependenceDetection::new(grid, *options).solve()
}
