mod od;

pub(crate) use od::od_search;

use crate::common::{PathSet, SearchNode};

/// Result of a successful group search, in the view's local agent order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub paths: PathSet,
    pub cost: usize,
    pub conflicts: usize,
}

/// Walk the parent links back to the root, keeping standard nodes only.
fn construct_solution(arena: &[SearchNode], mut current: usize) -> PathSet {
    let mut paths = PathSet::new(arena[current].positions.len());
    loop {
        let node = &arena[current];
        if node.is_standard() {
            paths.prepend_positions(&node.positions);
        }
        match node.parent {
            Some(parent) => current = parent,
            None => break,
        }
    }
    paths
}
