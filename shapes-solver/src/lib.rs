#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

pub mod error;
pub mod solver;

pub use crate::error::SolveError;
pub use crate::solver::{
    Context, SolverResult, count_solutions, has_unique_solution, is_solvable, solve, solve_ex,
    validate,
};
pub use shapes_core::Puzzle;
