use super::{Conflict, ConflictType, Position};
use crate::grid::Grid;

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

/// Positions of a single agent, one per timestep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path {
    steps: VecDeque<Position>,
}

impl From<Vec<Position>> for Path {
    fn from(steps: Vec<Position>) -> Self {
        Path {
            steps: steps.into(),
        }
    }
}

impl Path {
    pub fn new() -> Self {
        Path::default()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last(&self) -> Option<Position> {
        self.steps.back().copied()
    }

    pub fn prepend(&mut self, position: Position) {
        self.steps.push_front(position);
    }

    /// Position at `time`. Past the end the agent holds its last cell.
    pub fn at(&self, time: usize) -> Option<Position> {
        self.steps.get(time).or_else(|| self.steps.back()).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.steps.iter()
    }

    /// Fill the path with its last position until it has `length` steps.
    pub fn pad_to(&mut self, length: usize) {
        if let Some(last) = self.last() {
            while self.steps.len() < length {
                self.steps.push_back(last);
            }
        }
    }

    /// Copy of the path without the trailing waits at its final cell.
    pub fn unpadded(&self) -> Path {
        let mut path = self.clone();
        while path.steps.len() > 1 && path.steps[path.steps.len() - 1] == path.steps[path.steps.len() - 2]
        {
            path.steps.pop_back();
        }
        path
    }

    pub fn to_vec(&self) -> Vec<Position> {
        self.steps.iter().copied().collect()
    }
}

/// One path per agent. Indexed by global agent id once merged, by local
/// index while it belongs to a single group search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathSet {
    paths: Vec<Path>,
}

impl From<Vec<Path>> for PathSet {
    fn from(paths: Vec<Path>) -> Self {
        PathSet { paths }
    }
}

impl PathSet {
    pub fn new(agents: usize) -> Self {
        PathSet {
            paths: vec![Path::new(); agents],
        }
    }

    pub fn agents(&self) -> usize {
        self.paths.len()
    }

    /// Length of the longest contained path.
    pub fn len(&self) -> usize {
        self.paths.iter().map(Path::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn path(&self, agent: usize) -> &Path {
        &self.paths[agent]
    }

    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    /// Prepend one position for each agent.
    pub fn prepend_positions(&mut self, positions: &[Position]) {
        for (path, &position) in self.paths.iter_mut().zip(positions) {
            path.prepend(position);
        }
    }

    pub fn pad(&mut self) {
        let length = self.len();
        for path in &mut self.paths {
            path.pad_to(length);
        }
    }

    /// Sum over agents of the moves made before settling at the final cell.
    pub fn cost(&self) -> usize {
        self.paths
            .iter()
            .map(|path| path.unpadded().len().saturating_sub(1))
            .sum()
    }

    pub fn makespan(&self) -> usize {
        self.len().saturating_sub(1)
    }

    pub fn to_vec(&self) -> Vec<Vec<Position>> {
        self.paths.iter().map(Path::to_vec).collect()
    }

    /// First conflict between two agents, scanning timestep by timestep.
    pub fn conflicts(&self) -> Option<Conflict> {
        for step in 0..self.len() {
            for i in 0..self.paths.len() {
                for j in (i + 1)..self.paths.len() {
                    let (Some(pos1), Some(pos2)) = (self.paths[i].at(step), self.paths[j].at(step))
                    else {
                        continue;
                    };

                    if pos1 == pos2 {
                        return Some(Conflict {
                            agent_1: i,
                            agent_2: j,
                            conflict_type: ConflictType::Vertex {
                                position: pos1,
                                time_step: step,
                            },
                        });
                    }

                    // Edge conflicts need a previous step.
                    if step == 0 {
                        continue;
                    }
                    let (Some(prev_pos1), Some(prev_pos2)) =
                        (self.paths[i].at(step - 1), self.paths[j].at(step - 1))
                    else {
                        continue;
                    };

                    if prev_pos1 == pos2 && prev_pos2 == pos1 {
                        return Some(Conflict {
                            agent_1: i,
                            agent_2: j,
                            conflict_type: ConflictType::Edge {
                                u: prev_pos1,
                                v: pos1,
                                time_step: step,
                            },
                        });
                    }
                }
            }
        }

        None
    }

    /// Whether moving `from` at `time` to `to` at `time + 1` avoids every path
    /// of this set.
    pub fn move_possible(&self, time: usize, from: Position, to: Position) -> bool {
        self.paths.iter().all(|path| {
            let (Some(now), Some(next)) = (path.at(time), path.at(time + 1)) else {
                return true;
            };
            next != to && !(now == to && next == from)
        })
    }

    /// Scatter group solutions into global agent slots and pad every path to
    /// the longest one. Slots of agents missing from `solutions` stay empty.
    pub fn merge(solutions: &[(&PathSet, &[usize])]) -> PathSet {
        let total_agents = solutions
            .iter()
            .flat_map(|(_, agents)| agents.iter())
            .max()
            .map_or(0, |&agent| agent + 1);
        let mut combined = PathSet::new(total_agents);

        for (solution, agents) in solutions {
            for (index_in_solution, &agent) in agents.iter().enumerate() {
                combined.paths[agent] = solution.paths[index_in_solution].clone();
            }
        }

        combined.pad();
        combined
    }

    /// Check that this is a complete, conflict-free solution for `grid`.
    /// With `ordered`, waypoints count only when visited in insertion order.
    pub fn verify(&self, grid: &Grid, ordered: bool) -> bool {
        if self.paths.len() != grid.agents() {
            debug!("expected {} paths, got {}", grid.agents(), self.paths.len());
            return false;
        }

        let length = self.len();
        for (agent, path) in self.paths.iter().enumerate() {
            if path.len() != length {
                debug!("agent {agent} path is not padded");
                return false;
            }
            let steps = path.to_vec();
            if steps.first() != Some(&grid.start(agent)) {
                debug!("agent {agent} does not begin at its start");
                return false;
            }
            if steps.last() != Some(&grid.goal(agent)) {
                debug!("agent {agent} does not end at its goal");
                return false;
            }
            if steps.iter().any(|&(x, y)| grid.is_wall(x, y)) {
                debug!("agent {agent} walks through a wall");
                return false;
            }
            let jumps = steps.windows(2).any(|step| {
                step[0] != step[1] && !grid.valid_neighbours(step[0]).contains(&step[1])
            });
            if jumps {
                debug!("agent {agent} makes a move that is not a unit step");
                return false;
            }

            let waypoints = grid.waypoints(agent);
            let visited_all = if ordered {
                let mut next = 0;
                for position in &steps {
                    if next < waypoints.len() && waypoints[next] == *position {
                        next += 1;
                    }
                }
                next == waypoints.len()
            } else {
                waypoints.iter().all(|waypoint| steps.contains(waypoint))
            };
            if !visited_all {
                debug!("agent {agent} misses waypoints");
                return false;
            }
        }

        if let Some(conflict) = self.conflicts() {
            debug!("solution has conflict {conflict:?}");
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_set(json: &str) -> PathSet {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_vertex_conflict() {
        let paths = path_set("[[[0,0],[0,1]], [[0,2],[0,1]], [[1,1],[1,2]]]");
        let conflict = paths.conflicts().unwrap();
        assert_eq!(conflict.agents(), (0, 1));
        assert_eq!(
            conflict.conflict_type,
            ConflictType::Vertex {
                position: (0, 1),
                time_step: 1
            }
        );
    }

    #[test]
    fn test_edge_conflict() {
        let paths = path_set("[[[0,0],[0,1]], [[1,2],[1,1]], [[0,1],[0,0]]]");
        let conflict = paths.conflicts().unwrap();
        assert_eq!(conflict.agents(), (0, 2));
        assert!(matches!(
            conflict.conflict_type,
            ConflictType::Edge { time_step: 1, .. }
        ));
    }

    #[test]
    fn test_no_conflict() {
        let paths = path_set("[[[0,0],[0,1]], [[0,2],[0,3]], [[1,1],[1,2]]]");
        assert!(paths.conflicts().is_none());
    }

    #[test]
    fn test_conflict_after_shorter_path_ends() {
        // Agent 0 waits at (1, 0) while agent 1 walks onto it.
        let paths = path_set("[[[0,0],[1,0]], [[3,0],[2,0],[1,0]]]");
        let conflict = paths.conflicts().unwrap();
        assert_eq!(conflict.time_step(), 2);
    }

    #[test]
    fn test_merge_pads_and_orders_by_global_id() {
        let short = PathSet::from(vec![Path::from(vec![(0, 0), (1, 0)])]);
        let long = PathSet::from(vec![Path::from(vec![(4, 4), (4, 3), (4, 2), (4, 1)])]);

        let merged = PathSet::merge(&[(&long, &[0][..]), (&short, &[1][..])]);

        assert_eq!(merged.agents(), 2);
        assert_eq!(merged.len(), 4);
        assert_eq!(merged.path(0).to_vec(), vec![(4, 4), (4, 3), (4, 2), (4, 1)]);
        assert_eq!(
            merged.path(1).to_vec(),
            vec![(0, 0), (1, 0), (1, 0), (1, 0)]
        );
        assert_eq!(merged.cost(), 4);
        assert_eq!(merged.makespan(), 3);
    }

    #[test]
    fn test_merge_scatters_group_local_order() {
        let group = PathSet::from(vec![
            Path::from(vec![(2, 2)]),
            Path::from(vec![(0, 0), (0, 1)]),
        ]);
        let single = PathSet::from(vec![Path::from(vec![(5, 5)])]);

        let merged = PathSet::merge(&[(&group, &[2, 0][..]), (&single, &[1][..])]);

        assert_eq!(merged.path(0).to_vec(), vec![(0, 0), (0, 1)]);
        assert_eq!(merged.path(1).to_vec(), vec![(5, 5), (5, 5)]);
        assert_eq!(merged.path(2).to_vec(), vec![(2, 2), (2, 2)]);
    }

    #[test]
    fn test_move_possible() {
        let paths = path_set("[[[1,0],[2,0],[3,0]]]");
        // Vertex: (2, 0) is taken at time 1.
        assert!(!paths.move_possible(0, (2, 1), (2, 0)));
        // Swap with the rival crossing (1, 0) -> (2, 0).
        assert!(!paths.move_possible(0, (2, 0), (1, 0)));
        assert!(paths.move_possible(0, (0, 0), (0, 1)));
        // The rival holds (3, 0) once its path has ended.
        assert!(!paths.move_possible(7, (3, 1), (3, 0)));
    }

    #[test]
    fn test_unpadded() {
        let path = Path::from(vec![(0, 0), (1, 0), (1, 0), (1, 0)]);
        assert_eq!(path.unpadded().to_vec(), vec![(0, 0), (1, 0)]);
        let waiting = Path::from(vec![(3, 3), (3, 3)]);
        assert_eq!(waiting.unpadded().len(), 1);
    }
}
