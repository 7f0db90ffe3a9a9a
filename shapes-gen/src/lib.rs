#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

pub mod generator;
pub mod optimizer;
mod parallel;

pub use crate::generator::{
    GeneratedPuzzle, GeneratorConfig, default_config, generate, quick, validate_unique,
};
pub use crate::optimizer::optimize_constraints;

use shapes_core::Puzzle;
use shapes_solver::SolveError;

#[derive(thiserror::Error, Debug)]
pub enum GenError {
    #[error(transparent)]
    Core(#[from] shapes_core::CoreError),
    #[error(transparent)]
    Solve(#[from] SolveError),
    #[error("generator config invalid ({width}x{height} board)")]
    InvalidConfig { width: u8, height: u8 },
    #[error("generation exhausted attempts ({attempts})")]
    AttemptsExhausted { attempts: u32 },
}

/// Counts solutions (up to `limit`, 0 = unbounded) for a batch of puzzles.
/// Each puzzle is solved on a private clone, so the inputs stay untouched.
pub fn count_solutions_batch(puzzles: &[Puzzle], limit: u64) -> Result<Vec<u64>, GenError> {
    #[cfg(feature = "parallel-rayon")]
    {
        use rayon::prelude::*;
        puzzles
            .par_iter()
            .map(|p| {
                let mut p = p.clone();
                Ok(shapes_solver::solve(&mut p, limit)?.solution_count)
            })
            .collect()
    }

    #[cfg(not(feature = "parallel-rayon"))]
    {
        puzzles
            .iter()
            .map(|p| {
                let mut p = p.clone();
                Ok(shapes_solver::solve(&mut p, limit)?.solution_count)
            })
            .collect()
    }
}

pub fn is_unique_batch(puzzles: &[Puzzle]) -> Result<Vec<bool>, GenError> {
    Ok(count_solutions_batch(puzzles, 2)?
        .into_iter()
        .map(|c| c == 1)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapes_core::{Constraint, CountOp, Shape};

    #[test]
    fn batch_counts_work_for_small_boards() {
        let mut pinned = Puzzle::new(2, 2).unwrap();
        pinned
            .push_constraint(Constraint::global_count(Shape::Cat, CountOp::Exactly, 0))
            .unwrap();
        for (i, &shape) in [Shape::Square, Shape::Circle, Shape::Triangle, Shape::Square]
            .iter()
            .enumerate()
        {
            let (x, y) = pinned.coords(i);
            pinned.push_constraint(Constraint::cell_is(x, y, shape)).unwrap();
        }
        let open = Puzzle::new(2, 2).unwrap();

        let counts = count_solutions_batch(&[pinned.clone(), open.clone()], 0).unwrap();
        assert_eq!(counts, vec![1, 256]);
        assert_eq!(is_unique_batch(&[pinned, open]).unwrap(), vec![true, false]);
    }
}
