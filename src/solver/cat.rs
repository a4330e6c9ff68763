use super::Group;
use crate::common::{PathSet, Position};

/// Current paths of every group plus the group each agent belongs to. Used to
/// count, never to forbid, moves that run into other groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictAvoidanceTable {
    owners: Vec<usize>,
    paths: PathSet,
}

impl ConflictAvoidanceTable {
    /// Unsolved groups own their agents but reserve no path.
    pub fn new(agents: usize, groups: &[Group]) -> Self {
        let mut owners = vec![usize::MAX; agents];
        for (index, group) in groups.iter().enumerate() {
            for &agent in group.agents() {
                owners[agent] = index;
            }
        }

        let solutions: Vec<(&PathSet, &[usize])> = groups
            .iter()
            .filter_map(|group| group.solution().map(|paths| (paths, group.agents())))
            .collect();

        ConflictAvoidanceTable {
            owners,
            paths: PathSet::merge(&solutions),
        }
    }

    pub fn group_of(&self, agent: usize) -> usize {
        self.owners[agent]
    }

    /// Combined, padded solution of all solved groups.
    pub fn paths(&self) -> &PathSet {
        &self.paths
    }

    pub fn into_paths(self) -> PathSet {
        self.paths
    }

    /// Conflicts of one move with the agents not listed in `searching`.
    pub fn conflicts(&self, time: usize, from: Position, to: Position, searching: &[usize]) -> usize {
        self.paths
            .paths()
            .iter()
            .enumerate()
            .filter(|(agent, _)| !searching.contains(agent))
            .filter(|(_, path)| {
                let (Some(now), Some(next)) = (path.at(time), path.at(time + 1)) else {
                    return false;
                };
                next == to || (from != to && now == to && next == from)
            })
            .count()
    }
}
