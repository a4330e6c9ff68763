pub mod algorithm;
pub mod common;
pub mod config;
pub mod error;
pub mod grid;
pub mod heuristic;
pub mod problem;
pub mod solver;
pub mod stat;
