use thiserror::Error;

use crate::common::Position;

/// Misuse of the grid construction API.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("wall at ({x}, {y}) added after agents; add all walls first")]
    WallAfterAgents { x: usize, y: usize },
    #[error("cell ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
    #[error("cell ({x}, {y}) is a wall")]
    OnWall { x: usize, y: usize },
    #[error("agent {0} does not exist")]
    UnknownAgent(usize),
    #[error("{starts} starts but {goals} goals")]
    AgentCountMismatch { starts: usize, goals: usize },
    #[error("agent {agent} already has the maximum of {limit} waypoints")]
    TooManyWaypoints { agent: usize, limit: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SolveError {
    #[error("no solution exists for this instance")]
    NoSolution,
    /// A distance lookup hit a cell that cannot reach the queried root.
    #[error("agent {agent}: position {position:?} cannot reach a required cell")]
    Unreachable { agent: usize, position: Position },
}
