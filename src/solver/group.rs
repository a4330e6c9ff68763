use super::{ConflictAvoidanceTable, SolveOptions};
use crate::algorithm::{od_search, SearchOutcome};
use crate::common::PathSet;
use crate::error::SolveError;
use crate::grid::Grid;
use crate::stat::Stats;

use tracing::debug;

/// Agents planned jointly, with their current solution in local order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    agents: Vec<usize>,
    solution: Option<PathSet>,
    cost: Option<usize>,
}

impl Group {
    pub fn new(mut agents: Vec<usize>) -> Self {
        agents.sort_unstable();
        agents.dedup();
        Group {
            agents,
            solution: None,
            cost: None,
        }
    }

    /// Sorted global agent ids.
    pub fn agents(&self) -> &[usize] {
        &self.agents
    }

    pub fn solution(&self) -> Option<&PathSet> {
        self.solution.as_ref()
    }

    pub fn cost(&self) -> Option<usize> {
        self.cost
    }

    /// Unsolved union of two groups.
    pub fn merge(self, other: Group) -> Group {
        let mut agents = self.agents;
        agents.extend(other.agents);
        Group::new(agents)
    }

    #[allow(clippy::too_many_arguments)]
    fn plan(
        &self,
        grid: &Grid,
        illegal_moves: Option<&PathSet>,
        cat: Option<&ConflictAvoidanceTable>,
        cost_ceiling: Option<usize>,
        options: &SolveOptions,
        stats: &mut Stats,
    ) -> Result<Option<SearchOutcome>, SolveError> {
        let mut view = grid.view(&self.agents, illegal_moves);
        if let Some(cat) = cat {
            view = view.with_cat(cat);
        }
        od_search(&view, options, cost_ceiling, stats)
    }

    fn accept(&mut self, outcome: SearchOutcome) {
        self.cost = Some(outcome.cost);
        self.solution = Some(outcome.paths);
    }

    /// Solve the group jointly. Returns `false` and keeps the previous state
    /// when no plan exists.
    pub fn solve(
        &mut self,
        grid: &Grid,
        cat: Option<&ConflictAvoidanceTable>,
        options: &SolveOptions,
        stats: &mut Stats,
    ) -> Result<bool, SolveError> {
        match self.plan(grid, None, cat, None, options, stats)? {
            Some(outcome) => {
                debug!("group {:?} solved with cost {:?}", self.agents, outcome.cost);
                self.accept(outcome);
                Ok(true)
            }
            None => {
                debug!("group {:?} has no solution", self.agents);
                Ok(false)
            }
        }
    }

    /// Replan around `rival` without raising the cost beyond the current one
    /// plus `options.replan_slack`.
    pub fn find_non_conflicting_alt(
        &mut self,
        grid: &Grid,
        rival: &PathSet,
        cat: Option<&ConflictAvoidanceTable>,
        options: &SolveOptions,
        stats: &mut Stats,
    ) -> Result<bool, SolveError> {
        stats.replans_attempted += 1;
        let ceiling = self.cost.map(|cost| cost + options.replan_slack);

        match self.plan(grid, Some(rival), cat, ceiling, options, stats)? {
            Some(outcome) => {
                debug!(
                    "group {:?} replanned with cost {:?} (ceiling {:?})",
                    self.agents, outcome.cost, ceiling
                );
                stats.replans_succeeded += 1;
                self.accept(outcome);
                Ok(true)
            }
            None => {
                debug!("group {:?} found no alternative", self.agents);
                Ok(false)
            }
        }
    }
}
