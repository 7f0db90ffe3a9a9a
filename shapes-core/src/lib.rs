#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

pub mod constraint;
pub mod error;
pub mod puzzle;
pub mod rng;
pub mod shape;

pub use crate::constraint::{CellOp, Constraint, CountOp, Region};
pub use crate::error::CoreError;
pub use crate::puzzle::{Board, MAX_CELLS, MAX_CONSTRAINTS, MAX_HEIGHT, MAX_WIDTH, Puzzle};
pub use crate::shape::{Domain, Shape};
