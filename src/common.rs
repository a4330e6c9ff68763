mod highlevel;
mod lowlevel;
mod path;

pub use highlevel::{Conflict, ConflictType};
pub(crate) use lowlevel::{OpenEntry, SearchNode};
pub use path::{Path, PathSet};

/// Grid cell as `(x, y)`.
pub type Position = (usize, usize);
