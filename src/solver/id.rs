use super::{ConflictAvoidanceTable, Group, SolveOptions, Solver};
use crate::common::PathSet;
use crate::error::SolveError;
use crate::grid::Grid;
use crate::stat::Stats;

use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, instrument};

/// Independence detection: plan agents alone, repair conflicts with one-sided
/// replans and merge groups only when those fail.
pub struct IndependenceDetection<'a> {
    grid: &'a Grid,
    options: SolveOptions,
    stats: Stats,
}

impl<'a> IndependenceDetection<'a> {
    pub fn new(grid: &'a Grid, options: SolveOptions) -> Self {
        IndependenceDetection {
            grid,
            options,
            stats: Stats::default(),
        }
    }

    /// Replan `target` so that it avoids the current paths of `rival`.
    fn replan(
        &mut self,
        groups: &mut [Group],
        target: usize,
        rival: usize,
        cat: &ConflictAvoidanceTable,
    ) -> Result<bool, SolveError> {
        let Some(rival_paths) = groups[rival].solution().cloned() else {
            return Ok(false);
        };
        groups[target].find_non_conflicting_alt(
            self.grid,
            &rival_paths,
            Some(cat),
            &self.options,
            &mut self.stats,
        )
    }
}

/// Unordered pair of groups, identified by their agents.
fn pair_key(a: &Group, b: &Group) -> (Vec<usize>, Vec<usize>) {
    let (a, b) = (a.agents().to_vec(), b.agents().to_vec());
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl Solver for IndependenceDetection<'_> {
    #[instrument(skip_all, name = "independence_detection", fields(agents = self.grid.agents()), level = "debug")]
    fn solve(&mut self) -> Result<PathSet, SolveError> {
        let total_solve_start_time = Instant::now();
        let agents = self.grid.agents();

        let mut groups: Vec<Group> = (0..agents).map(|agent| Group::new(vec![agent])).collect();
        for group in &mut groups {
            if !group.solve(self.grid, None, &self.options, &mut self.stats)? {
                return Err(SolveError::NoSolution);
            }
        }
        self.stats.largest_group = usize::from(agents > 0);

        let mut tried = HashSet::new();
        let paths = loop {
            let cat = ConflictAvoidanceTable::new(agents, &groups);
            let Some(conflict) = cat.paths().conflicts() else {
                break cat.into_paths();
            };
            debug!(
                "conflict between agents {:?} at time {}: {conflict:?}",
                conflict.agents(),
                conflict.time_step()
            );

            let (agent_1, agent_2) = conflict.agents();
            let (ga, gb) = (cat.group_of(agent_1), cat.group_of(agent_2));
            if ga == gb {
                // Group solutions are conflict free by construction.
                return Err(SolveError::NoSolution);
            }

            if tried.insert(pair_key(&groups[ga], &groups[gb])) {
                if self.replan(&mut groups, ga, gb, &cat)? {
                    continue;
                }
                if self.replan(&mut groups, gb, ga, &cat)? {
                    continue;
                }
            }

            let (low, high) = (ga.min(gb), ga.max(gb));
            let second = groups.remove(high);
            let first = groups.remove(low);
            let mut merged = first.merge(second);
            debug!("merge into group {:?}", merged.agents());

            if !merged.solve(self.grid, Some(&cat), &self.options, &mut self.stats)? {
                return Err(SolveError::NoSolution);
            }
            self.stats.merges += 1;
            self.stats.largest_group = self.stats.largest_group.max(merged.agents().len());
            groups.push(merged);
        };

        self.stats.time_us = total_solve_start_time.elapsed().as_micros() as usize;
        self.stats.costs = paths.cost();
        self.stats.makespan = paths.makespan();
        self.stats.print();

        Ok(paths)
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}
