use std::collections::VecDeque;
use std::fmt;

use crate::common::{PathSet, Position};
use crate::error::GridError;
use crate::heuristic::WaypointHeuristic;
use crate::solver::ConflictAvoidanceTable;

/// Shortest walking distance from a root cell to every cell, `None` where the
/// root cannot be reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceMap {
    distances: Vec<Vec<Option<usize>>>,
}

impl DistanceMap {
    pub fn get(&self, (x, y): Position) -> Option<usize> {
        self.distances
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .flatten()
    }
}

#[derive(Debug, Clone)]
pub struct Grid {
    width: usize,
    height: usize,
    walls: Vec<Vec<bool>>,
    starts: Vec<Position>,
    goals: Vec<Position>,
    heuristics: Vec<WaypointHeuristic>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Grid {
            width,
            height,
            walls: vec![vec![false; width]; height],
            starts: Vec::new(),
            goals: Vec::new(),
            heuristics: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn agents(&self) -> usize {
        self.starts.len()
    }

    pub fn is_wall(&self, x: usize, y: usize) -> bool {
        self.walls[y][x]
    }

    pub fn start(&self, agent: usize) -> Position {
        self.starts[agent]
    }

    pub fn goal(&self, agent: usize) -> Position {
        self.goals[agent]
    }

    pub fn waypoints(&self, agent: usize) -> &[Position] {
        self.heuristics[agent].waypoints()
    }

    pub fn heuristic(&self, agent: usize) -> &WaypointHeuristic {
        &self.heuristics[agent]
    }

    fn check_in_bounds(&self, x: usize, y: usize) -> Result<(), GridError> {
        if x >= self.width || y >= self.height {
            return Err(GridError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    fn check_open(&self, (x, y): Position) -> Result<(), GridError> {
        self.check_in_bounds(x, y)?;
        if self.walls[y][x] {
            return Err(GridError::OnWall { x, y });
        }
        Ok(())
    }

    /// Walls are fixed once the first agent is added, since every agent
    /// precomputes distance fields over them.
    pub fn add_wall(&mut self, x: usize, y: usize) -> Result<(), GridError> {
        if !self.starts.is_empty() {
            return Err(GridError::WallAfterAgents { x, y });
        }
        self.check_in_bounds(x, y)?;
        self.walls[y][x] = true;
        Ok(())
    }

    pub fn add_agent(&mut self, start: Position, goal: Position) -> Result<usize, GridError> {
        self.check_open(start)?;
        self.check_open(goal)?;

        let agent = self.starts.len();
        let goal_distances = self.backtrack_heuristics(goal);
        self.starts.push(start);
        self.goals.push(goal);
        self.heuristics
            .push(WaypointHeuristic::new(agent, goal, goal_distances));
        Ok(agent)
    }

    /// Waypoints on the agent's own start or goal, or repeated ones, are
    /// ignored.
    pub fn add_waypoint(&mut self, agent: usize, x: usize, y: usize) -> Result<(), GridError> {
        if agent >= self.agents() {
            return Err(GridError::UnknownAgent(agent));
        }
        let position = (x, y);
        self.check_open(position)?;

        if position == self.starts[agent]
            || position == self.goals[agent]
            || self.heuristics[agent].waypoints().contains(&position)
        {
            return Ok(());
        }

        let distances = self.backtrack_heuristics(position);
        self.heuristics[agent].add_waypoint(position, distances)
    }

    /// Orthogonal, in-bounds, non-wall neighbours. Never contains `position`.
    pub fn valid_neighbours(&self, (x, y): Position) -> Vec<Position> {
        let directions = [(-1, 0), (0, -1), (0, 1), (1, 0)];
        let mut neighbours = Vec::with_capacity(4);

        for &(dx, dy) in &directions {
            let new_x = x as i64 + dx;
            let new_y = y as i64 + dy;
            if new_x >= 0
                && new_y >= 0
                && new_x < self.width as i64
                && new_y < self.height as i64
                && !self.walls[new_y as usize][new_x as usize]
            {
                neighbours.push((new_x as usize, new_y as usize));
            }
        }

        neighbours
    }

    /// Breadth-first distance field rooted at `from`.
    pub fn backtrack_heuristics(&self, from: Position) -> DistanceMap {
        let mut distances = vec![vec![None; self.width]; self.height];
        let mut queue = VecDeque::new();

        distances[from.1][from.0] = Some(0);
        queue.push_back((from, 0));

        while let Some((position, distance)) = queue.pop_front() {
            for (x, y) in self.valid_neighbours(position) {
                if distances[y][x].is_none() {
                    distances[y][x] = Some(distance + 1);
                    queue.push_back(((x, y), distance + 1));
                }
            }
        }

        DistanceMap { distances }
    }

    /// Restricted view exposing `agents` as local indices `0..agents.len()`,
    /// in the given order.
    pub fn view<'a>(&'a self, agents: &[usize], illegal_moves: Option<&'a PathSet>) -> GridView<'a> {
        GridView {
            grid: self,
            agents: agents.to_vec(),
            illegal_moves,
            cat: None,
        }
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let border = format!("+{}+", "-".repeat(self.width));
        writeln!(f, "{border}")?;
        for y in 0..self.height {
            write!(f, "|")?;
            for x in 0..self.width {
                let cell = if self.walls[y][x] {
                    '#'
                } else if let Some(agent) = self.starts.iter().position(|s| *s == (x, y)) {
                    char::from(b'0' + (agent % 10) as u8)
                } else if self.goals.contains(&(x, y)) {
                    'G'
                } else if self.heuristics.iter().any(|h| h.waypoints().contains(&(x, y))) {
                    '*'
                } else {
                    '.'
                };
                write!(f, "{cell}")?;
            }
            writeln!(f, "|")?;
        }
        write!(f, "{border}")
    }
}

/// Per-search view of a [`Grid`]. Shares walls and heuristics with the grid
/// and optionally carries constraints from other groups.
#[derive(Debug, Clone)]
pub struct GridView<'a> {
    grid: &'a Grid,
    agents: Vec<usize>,
    illegal_moves: Option<&'a PathSet>,
    cat: Option<&'a ConflictAvoidanceTable>,
}

impl<'a> GridView<'a> {
    pub fn with_cat(mut self, cat: &'a ConflictAvoidanceTable) -> Self {
        self.cat = Some(cat);
        self
    }

    /// Global ids of the visible agents, in local order.
    pub fn agents(&self) -> &[usize] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn start(&self, local: usize) -> Position {
        self.grid.start(self.agents[local])
    }

    pub fn goal(&self, local: usize) -> Position {
        self.grid.goal(self.agents[local])
    }

    pub fn heuristic(&self, local: usize) -> &'a WaypointHeuristic {
        self.grid.heuristic(self.agents[local])
    }

    pub fn valid_neighbours(&self, position: Position) -> Vec<Position> {
        self.grid.valid_neighbours(position)
    }

    pub fn illegal_moves(&self) -> Option<&'a PathSet> {
        self.illegal_moves
    }

    /// Whether a move is allowed by the reserved paths of another group.
    pub fn move_possible(&self, time: usize, from: Position, to: Position) -> bool {
        self.illegal_moves
            .map_or(true, |paths| paths.move_possible(time, from, to))
    }

    /// Agents parked at `positions` from `time` on never collide with the
    /// reserved paths.
    pub fn can_remain(&self, time: usize, positions: &[Position]) -> bool {
        let Some(paths) = self.illegal_moves else {
            return true;
        };
        (time..paths.len()).all(|t| positions.iter().all(|&p| paths.move_possible(t, p, p)))
    }

    /// Soft conflicts of a move against agents outside this view.
    pub fn count_conflicts(&self, time: usize, from: Position, to: Position) -> usize {
        self.cat
            .map_or(0, |cat| cat.conflicts(time, from, to, &self.agents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor() -> Grid {
        let mut grid = Grid::new(5, 2);
        grid.add_wall(1, 0).unwrap();
        grid.add_wall(2, 0).unwrap();
        grid
    }

    #[test]
    fn test_valid_neighbours() {
        let grid = corridor();

        assert_eq!(grid.valid_neighbours((0, 0)), vec![(0, 1)]);

        let mut neighbours = grid.valid_neighbours((3, 1));
        neighbours.sort();
        assert_eq!(neighbours, vec![(2, 1), (3, 0), (4, 1)]);
        assert!(!neighbours.contains(&(3, 1)));
    }

    #[test]
    fn test_backtrack_heuristics() {
        let grid = corridor();
        let distances = grid.backtrack_heuristics((0, 0));

        assert_eq!(distances.get((0, 0)), Some(0));
        assert_eq!(distances.get((3, 0)), Some(5));
        assert_eq!(distances.get((1, 0)), None);
        assert_eq!(distances.get((9, 9)), None);
    }

    #[test]
    fn test_wall_after_agent_is_rejected() {
        let mut grid = corridor();
        grid.add_agent((0, 1), (3, 1)).unwrap();
        assert_eq!(
            grid.add_wall(4, 0),
            Err(GridError::WallAfterAgents { x: 4, y: 0 })
        );
        assert!(!grid.is_wall(4, 0));
    }

    #[test]
    fn test_agent_on_wall_is_rejected() {
        let mut grid = corridor();
        assert_eq!(
            grid.add_agent((1, 0), (3, 1)),
            Err(GridError::OnWall { x: 1, y: 0 })
        );
        assert!(matches!(
            grid.add_agent((0, 1), (7, 1)),
            Err(GridError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_waypoint_on_start_or_goal_is_ignored() {
        let mut grid = corridor();
        let agent = grid.add_agent((0, 1), (3, 1)).unwrap();
        grid.add_waypoint(agent, 4, 1).unwrap();

        grid.add_waypoint(agent, 0, 1).unwrap();
        grid.add_waypoint(agent, 3, 1).unwrap();
        grid.add_waypoint(agent, 4, 1).unwrap();

        assert_eq!(grid.waypoints(agent), &[(4, 1)]);
        assert_eq!(grid.add_waypoint(3, 4, 1), Err(GridError::UnknownAgent(3)));
    }

    #[test]
    fn test_view_remaps_agents_in_given_order() {
        let mut grid = Grid::new(4, 4);
        grid.add_agent((0, 0), (3, 0)).unwrap();
        grid.add_agent((0, 1), (3, 1)).unwrap();
        grid.add_agent((0, 2), (3, 2)).unwrap();

        let view = grid.view(&[2, 0], None);
        assert_eq!(view.len(), 2);
        assert_eq!(view.start(0), (0, 2));
        assert_eq!(view.goal(1), (3, 0));
        assert!(view.move_possible(0, (0, 0), (1, 0)));
        assert_eq!(view.count_conflicts(0, (0, 0), (1, 0)), 0);
    }

    #[test]
    fn test_display() {
        let mut grid = corridor();
        grid.add_agent((0, 1), (3, 1)).unwrap();
        grid.add_waypoint(0, 4, 0).unwrap();
        let rendered = grid.to_string();
        assert_eq!(rendered, "+-----+\n|.##.*|\n|0..G.|\n+-----+");
    }
}
