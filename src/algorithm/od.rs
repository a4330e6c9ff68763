use super::{construct_solution, SearchOutcome};
use crate::common::{OpenEntry, PathSet, Position, SearchNode};
use crate::error::SolveError;
use crate::grid::GridView;
use crate::heuristic::{HeuristicKind, WaypointSet};
use crate::solver::SolveOptions;
use crate::stat::Stats;

use std::collections::{BTreeSet, HashMap};
use std::iter;
use tracing::{debug, instrument, trace};

/// A* with operator decomposition over the agents of `view`.
///
/// Returns `Ok(None)` when the open list runs out, which includes every node
/// being cut by `cost_ceiling`.
#[instrument(skip_all, name = "od_search", fields(agents = ?view.agents(), ceiling = ?cost_ceiling), level = "debug")]
pub(crate) fn od_search(
    view: &GridView,
    options: &SolveOptions,
    cost_ceiling: Option<usize>,
    stats: &mut Stats,
) -> Result<Option<SearchOutcome>, SolveError> {
    let kind = options.heuristic_kind();
    // Reserved paths make states time dependent until they end.
    let time_cap = view.illegal_moves().map(PathSet::len);

    let root = root_node(view, kind)?;
    if cost_ceiling.is_some_and(|ceiling| root.f_cost() > ceiling) {
        debug!("root exceeds the cost ceiling");
        return Ok(None);
    }

    let mut arena = vec![root];
    let mut open_list = BTreeSet::new();
    // Best g per standard state. MST estimates are not consistent, so a
    // state is reopened when it is reached more cheaply.
    let mut closed_list = HashMap::new();
    open_list.insert(OpenEntry::new(&arena[0], 0, options.prioritize_conflicts));

    while let Some(entry) = open_list.pop_first() {
        let current = &arena[entry.id];

        if current.is_standard() {
            let key = current.state_key(time_cap);
            if closed_list
                .get(&key)
                .is_some_and(|&best_g| best_g <= current.g_cost)
            {
                continue;
            }
            closed_list.insert(key, current.g_cost);
            if is_goal(view, current) {
                debug!(
                    "found solution with cost {:?} and {:?} soft conflicts",
                    current.g_cost, current.conflicts
                );
                return Ok(Some(SearchOutcome {
                    paths: construct_solution(&arena, entry.id),
                    cost: current.g_cost,
                    conflicts: current.conflicts,
                }));
            }
        }

        stats.expanded_nodes += 1;
        trace!("expand node: {current:?}");

        let children = expand(view, kind, current, entry.id, cost_ceiling)?;
        for child in children {
            let id = arena.len();
            open_list.insert(OpenEntry::new(&child, id, options.prioritize_conflicts));
            arena.push(child);
            stats.generated_nodes += 1;
        }
    }

    debug!("cannot find solution");
    Ok(None)
}

fn root_node(view: &GridView, kind: HeuristicKind) -> Result<SearchNode, SolveError> {
    let positions: Vec<Position> = (0..view.len()).map(|agent| view.start(agent)).collect();
    let mut visited = Vec::with_capacity(view.len());
    let mut h_costs = Vec::with_capacity(view.len());

    for (agent, &position) in positions.iter().enumerate() {
        let heuristic = view.heuristic(agent);
        let agent_visited = heuristic.visit(kind, position, WaypointSet::default());
        h_costs.push(heuristic.estimate(kind, position, agent_visited)?);
        visited.push(agent_visited);
    }

    Ok(SearchNode::root(positions, visited, h_costs))
}

fn is_goal(view: &GridView, node: &SearchNode) -> bool {
    (0..view.len()).all(|agent| {
        view.heuristic(agent)
            .is_done(node.positions[agent], node.visited[agent])
    }) && view.can_remain(node.time_step, &node.positions)
}

/// Children for every legal move of the next agent without a move.
fn expand(
    view: &GridView,
    kind: HeuristicKind,
    node: &SearchNode,
    id: usize,
    cost_ceiling: Option<usize>,
) -> Result<Vec<SearchNode>, SolveError> {
    let Some(agent) = node.next_agent() else {
        return Ok(Vec::new());
    };

    let heuristic = view.heuristic(agent);
    let from = node.positions[agent];
    let finished = heuristic.is_done(from, node.visited[agent]);
    let mut children = Vec::new();

    for to in iter::once(from).chain(view.valid_neighbours(from)) {
        // Vertex conflict with an agent that already moved.
        if node.occupied(to) {
            continue;
        }
        // Swap with an agent that already moved.
        if node.crosses(from, to) {
            continue;
        }
        if !view.move_possible(node.time_step, from, to) {
            continue;
        }

        let visited = heuristic.visit(kind, to, node.visited[agent]);
        let h_cost = heuristic.estimate(kind, to, visited)?;
        // Finished agents wait at their goal for free.
        let step_cost = if finished && to == from { 0 } else { 1 };
        let conflicts = view.count_conflicts(node.time_step, from, to);

        let child = node.child(id, agent, to, visited, h_cost, step_cost, conflicts);
        if cost_ceiling.is_some_and(|ceiling| child.f_cost() > ceiling) {
            continue;
        }
        children.push(child);
    }

    Ok(children)
}
