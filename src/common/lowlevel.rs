use super::Position;
use crate::heuristic::WaypointSet;

use std::cmp::Ordering;

/// Move of one agent within the timestep that is being decomposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Move {
    Unset,
    Committed(Position),
}

/// Node of the operator decomposition search. Nodes live in an arena and
/// refer to their parent by index.
#[derive(Debug, Clone)]
pub(crate) struct SearchNode {
    pub(crate) positions: Vec<Position>,
    pub(crate) moves: Vec<Move>,
    // Visited waypoints after the committed moves.
    pub(crate) visited: Vec<WaypointSet>,
    pub(crate) agent_h_costs: Vec<usize>,
    pub(crate) g_cost: usize,
    pub(crate) h_cost: usize,
    pub(crate) conflicts: usize,
    // Directed edges taken during the current timestep.
    pub(crate) claimed_edges: Vec<(Position, Position)>,
    pub(crate) time_step: usize,
    pub(crate) parent: Option<usize>,
}

impl SearchNode {
    pub(crate) fn root(
        positions: Vec<Position>,
        visited: Vec<WaypointSet>,
        agent_h_costs: Vec<usize>,
    ) -> Self {
        let agents = positions.len();
        SearchNode {
            positions,
            moves: vec![Move::Unset; agents],
            visited,
            h_cost: agent_h_costs.iter().sum(),
            agent_h_costs,
            g_cost: 0,
            conflicts: 0,
            claimed_edges: Vec::new(),
            time_step: 0,
            parent: None,
        }
    }

    pub(crate) fn f_cost(&self) -> usize {
        self.g_cost + self.h_cost
    }

    /// Every agent has a position for a closed timestep and no pending move.
    pub(crate) fn is_standard(&self) -> bool {
        self.moves.iter().all(|m| *m == Move::Unset)
    }

    pub(crate) fn next_agent(&self) -> Option<usize> {
        self.moves.iter().position(|m| *m == Move::Unset)
    }

    /// Position of `agent` once its move for this timestep is applied.
    pub(crate) fn post_move(&self, agent: usize) -> Position {
        match self.moves[agent] {
            Move::Committed(position) => position,
            Move::Unset => self.positions[agent],
        }
    }

    pub(crate) fn occupied(&self, position: Position) -> bool {
        self.moves.contains(&Move::Committed(position))
    }

    /// Whether `from -> to` would swap with a move already taken this timestep.
    pub(crate) fn crosses(&self, from: Position, to: Position) -> bool {
        from != to && self.claimed_edges.contains(&(to, from))
    }

    /// Child in which `agent` commits to `to`. Closes the timestep when this
    /// was the last pending agent.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn child(
        &self,
        parent: usize,
        agent: usize,
        to: Position,
        visited: WaypointSet,
        h_cost: usize,
        step_cost: usize,
        conflicts: usize,
    ) -> SearchNode {
        let from = self.positions[agent];
        let mut child = self.clone();
        child.parent = Some(parent);
        child.moves[agent] = Move::Committed(to);
        child.visited[agent] = visited;
        child.h_cost = self.h_cost - self.agent_h_costs[agent] + h_cost;
        child.agent_h_costs[agent] = h_cost;
        child.g_cost += step_cost;
        child.conflicts += conflicts;
        if from != to {
            child.claimed_edges.push((from, to));
        }

        if child.next_agent().is_none() {
            child.positions = (0..child.moves.len()).map(|a| child.post_move(a)).collect();
            child.moves.fill(Move::Unset);
            child.claimed_edges.clear();
            child.time_step += 1;
        }

        child
    }

    /// Identity of a standard node for duplicate detection.
    pub(crate) fn state_key(&self, time_cap: Option<usize>) -> StateKey {
        StateKey {
            positions: self.positions.clone(),
            visited: self.visited.clone(),
            time_step: time_cap.map(|cap| self.time_step.min(cap)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct StateKey {
    positions: Vec<Position>,
    visited: Vec<WaypointSet>,
    time_step: Option<usize>,
}

/// Open list entry; the arena index doubles as insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OpenEntry {
    pub(crate) f_cost: usize,
    pub(crate) h_cost: usize,
    pub(crate) conflicts: usize,
    pub(crate) prioritize_conflicts: bool,
    pub(crate) id: usize,
}

impl OpenEntry {
    pub(crate) fn new(node: &SearchNode, id: usize, prioritize_conflicts: bool) -> Self {
        OpenEntry {
            f_cost: node.f_cost(),
            h_cost: node.h_cost,
            conflicts: node.conflicts,
            prioritize_conflicts,
            id,
        }
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        let tie_break = if self.prioritize_conflicts {
            self.conflicts
                .cmp(&other.conflicts)
                .then_with(|| self.h_cost.cmp(&other.h_cost))
        } else {
            self.h_cost
                .cmp(&other.h_cost)
                .then_with(|| self.conflicts.cmp(&other.conflicts))
        };

        self.f_cost
            .cmp(&other.f_cost)
            .then(tie_break)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
