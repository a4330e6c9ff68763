use super::Position;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConflictType {
    Vertex {
        position: Position,
        time_step: usize,
    },
    /// Two agents swap cells across one edge between `time_step - 1` and
    /// `time_step`; `u -> v` is the move of `agent_1`.
    Edge {
        u: Position,
        v: Position,
        time_step: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Conflict {
    pub agent_1: usize,
    pub agent_2: usize,
    pub conflict_type: ConflictType,
}

impl Conflict {
    pub fn agents(&self) -> Position {
        (self.agent_1, self.agent_2)
    }

    pub fn time_step(&self) -> usize {
        match self.conflict_type {
            ConflictType::Vertex { time_step, .. } | ConflictType::Edge { time_step, .. } => {
                time_step
            }
        }
    }
}
