mod mst;
mod tsp;

use crate::common::Position;
use crate::error::{GridError, SolveError};
use crate::grid::DistanceMap;

use mst::Mst;
use std::cell::RefCell;
use std::collections::HashMap;

/// Waypoints per agent. The exact heuristic keeps one Held-Karp row per
/// waypoint subset, so memory grows with `2^MAX_WAYPOINTS`.
pub const MAX_WAYPOINTS: usize = 16;

/// Set of waypoint indices of one agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WaypointSet(u16);

impl WaypointSet {
    /// The set `{0, .., count - 1}`.
    pub fn full(count: usize) -> Self {
        if count >= MAX_WAYPOINTS {
            WaypointSet(u16::MAX)
        } else {
            WaypointSet((1u16 << count) - 1)
        }
    }

    pub fn contains(self, index: usize) -> bool {
        self.0 & (1 << index) != 0
    }

    pub fn with(self, index: usize) -> Self {
        WaypointSet(self.0 | (1 << index))
    }

    pub fn difference(self, other: WaypointSet) -> Self {
        WaypointSet(self.0 & !other.0)
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = usize> {
        (0..MAX_WAYPOINTS).filter(move |&index| self.contains(index))
    }
}

/// How the remaining waypoints are estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeuristicKind {
    /// Optimal tour over the unvisited waypoints (Held-Karp).
    Exact,
    /// Minimum spanning tree lower bound of the tour.
    Mst,
    /// Waypoints are visited in the order they were added.
    Sequential,
}

/// Admissible cost-to-go of one agent: visit the remaining waypoints, then
/// walk to the goal.
#[derive(Debug, Clone)]
pub struct WaypointHeuristic {
    agent: usize,
    goal: Position,
    goal_distances: DistanceMap,
    waypoints: Vec<Position>,
    waypoint_distances: Vec<DistanceMap>,
    // Walking waypoint i, i + 1, .. in order and then to the goal.
    sequence_costs: Vec<Option<usize>>,
    cache: RefCell<HashMap<(HeuristicKind, Position, WaypointSet), usize>>,
    // Unvisited set -> (waypoint, cost of the best tour starting there).
    residual_cache: RefCell<HashMap<WaypointSet, Vec<(usize, usize)>>>,
}

impl WaypointHeuristic {
    pub(crate) fn new(agent: usize, goal: Position, goal_distances: DistanceMap) -> Self {
        WaypointHeuristic {
            agent,
            goal,
            goal_distances,
            waypoints: Vec::new(),
            waypoint_distances: Vec::new(),
            sequence_costs: Vec::new(),
            cache: RefCell::new(HashMap::new()),
            residual_cache: RefCell::new(HashMap::new()),
        }
    }

    pub(crate) fn add_waypoint(
        &mut self,
        position: Position,
        distances: DistanceMap,
    ) -> Result<(), GridError> {
        if self.waypoints.len() >= MAX_WAYPOINTS {
            return Err(GridError::TooManyWaypoints {
                agent: self.agent,
                limit: MAX_WAYPOINTS,
            });
        }

        self.waypoints.push(position);
        self.waypoint_distances.push(distances);
        self.cache.get_mut().clear();
        self.residual_cache.get_mut().clear();

        let mut sequence_costs = vec![None; self.waypoints.len()];
        for index in (0..self.waypoints.len()).rev() {
            let here = self.waypoints[index];
            sequence_costs[index] = if index + 1 == self.waypoints.len() {
                self.goal_distances.get(here)
            } else {
                self.waypoint_distances[index + 1]
                    .get(here)
                    .zip(sequence_costs[index + 1])
                    .map(|(step, rest)| step + rest)
            };
        }
        self.sequence_costs = sequence_costs;

        Ok(())
    }

    pub fn waypoints(&self) -> &[Position] {
        &self.waypoints
    }

    pub fn is_complete(&self, visited: WaypointSet) -> bool {
        visited.len() == self.waypoints.len()
    }

    /// At the goal with nothing left to visit.
    pub fn is_done(&self, position: Position, visited: WaypointSet) -> bool {
        position == self.goal && self.is_complete(visited)
    }

    /// Visited set after standing on `position`.
    pub fn visit(&self, kind: HeuristicKind, position: Position, visited: WaypointSet) -> WaypointSet {
        match kind {
            HeuristicKind::Sequential => {
                let next = visited.len();
                if self.waypoints.get(next) == Some(&position) {
                    visited.with(next)
                } else {
                    visited
                }
            }
            HeuristicKind::Exact | HeuristicKind::Mst => self
                .waypoints
                .iter()
                .position(|waypoint| *waypoint == position)
                .map_or(visited, |index| visited.with(index)),
        }
    }

    /// Lower bound on the remaining cost from `position` with `visited`
    /// already done.
    pub fn estimate(
        &self,
        kind: HeuristicKind,
        position: Position,
        visited: WaypointSet,
    ) -> Result<usize, SolveError> {
        if let Some(&cost) = self.cache.borrow().get(&(kind, position, visited)) {
            return Ok(cost);
        }

        let cost = if self.is_complete(visited) {
            self.goal_distance(position)?
        } else {
            match kind {
                HeuristicKind::Exact => self.exact(position, visited)?,
                HeuristicKind::Mst => self.mst(position, visited)?,
                HeuristicKind::Sequential => self.sequential(position, visited)?,
            }
        };

        self.cache
            .borrow_mut()
            .insert((kind, position, visited), cost);
        Ok(cost)
    }

    fn unreachable(&self, position: Position) -> SolveError {
        SolveError::Unreachable {
            agent: self.agent,
            position,
        }
    }

    fn goal_distance(&self, position: Position) -> Result<usize, SolveError> {
        self.goal_distances
            .get(position)
            .ok_or_else(|| self.unreachable(position))
    }

    fn waypoint_distance(&self, waypoint: usize, position: Position) -> Result<usize, SolveError> {
        self.waypoint_distances[waypoint]
            .get(position)
            .ok_or_else(|| self.unreachable(position))
    }

    fn exact(&self, position: Position, visited: WaypointSet) -> Result<usize, SolveError> {
        let unvisited = WaypointSet::full(self.waypoints.len()).difference(visited);
        let mut best = usize::MAX;
        for (waypoint, residual) in self.residuals(unvisited)? {
            best = best.min(self.waypoint_distance(waypoint, position)? + residual);
        }
        Ok(best)
    }

    /// Best tour costs over `unvisited` for every possible first waypoint.
    /// One DP run fills the cache for all subsets of `unvisited`.
    fn residuals(&self, unvisited: WaypointSet) -> Result<Vec<(usize, usize)>, SolveError> {
        if let Some(residuals) = self.residual_cache.borrow().get(&unvisited) {
            return Ok(residuals.clone());
        }

        let indices: Vec<usize> = unvisited.iter().collect();
        let to_goal = indices
            .iter()
            .map(|&index| self.goal_distance(self.waypoints[index]))
            .collect::<Result<Vec<_>, _>>()?;
        let distances = indices
            .iter()
            .map(|&from| {
                indices
                    .iter()
                    .map(|&to| self.waypoint_distance(to, self.waypoints[from]))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let table = tsp::held_karp(&to_goal, &distances);

        let mut cache = self.residual_cache.borrow_mut();
        for (mask, costs) in table.iter().enumerate().skip(1) {
            let mut subset = WaypointSet::default();
            let mut residuals = Vec::new();
            for (local, &index) in indices.iter().enumerate() {
                if mask & (1 << local) != 0 {
                    subset = subset.with(index);
                    residuals.push((index, costs[local]));
                }
            }
            cache.entry(subset).or_insert(residuals);
        }

        Ok(cache[&unvisited].clone())
    }

    fn mst(&self, position: Position, visited: WaypointSet) -> Result<usize, SolveError> {
        let unvisited: Vec<usize> = WaypointSet::full(self.waypoints.len())
            .difference(visited)
            .iter()
            .collect();

        // Vertex 0 is the agent, 1 the goal, then the unvisited waypoints.
        let mut tree = Mst::new(unvisited.len() + 2);
        tree.add_edge(0, 1, self.goal_distance(position)?);
        for (i, &waypoint) in unvisited.iter().enumerate() {
            let here = self.waypoints[waypoint];
            tree.add_edge(0, i + 2, self.waypoint_distance(waypoint, position)?);
            tree.add_edge(1, i + 2, self.goal_distance(here)?);
            for (j, &other) in unvisited.iter().enumerate().skip(i + 1) {
                tree.add_edge(i + 2, j + 2, self.waypoint_distance(other, here)?);
            }
        }

        Ok(tree.cost())
    }

    fn sequential(&self, position: Position, visited: WaypointSet) -> Result<usize, SolveError> {
        let next = visited.len();
        let rest = self.sequence_costs[next].ok_or_else(|| self.unreachable(self.waypoints[next]))?;
        Ok(self.waypoint_distance(next, position)? + rest)
    }
}
