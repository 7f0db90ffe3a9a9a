//! Counting solver for Schrödinger's Shapes puzzles.
//!
//! Design goals:
//! - **Deterministic**: fixed cell order, fixed shape order, seeded zobrist keys.
//! - **Library-first**: errors are typed (`SolveError`) and callers control the
//!   solution cap.
//! - **Performance-oriented**: precomputed region masks, per-cell domain
//!   reduction, and a direct-mapped transposition cache of refuted states.
//!
//! The board is mutated during search and restored along the backtrack path;
//! locked cells and cells that already hold a concrete shape are treated as
//! committed and never touched.

use std::time::Instant;

use smallvec::{SmallVec, smallvec};

use shapes_core::puzzle::{Board, MAX_CELLS};
use shapes_core::{CellOp, Constraint, Domain, Puzzle, Shape};

use crate::error::SolveError;

#[cfg(feature = "tracing")]
use tracing::trace;

#[cfg(not(feature = "tracing"))]
macro_rules! trace {
    ($($tt:tt)*) => {};
}

/// Direct-mapped transposition cache size; power of two for mask indexing.
const CACHE_SIZE: usize = 1 << 17;
const CACHE_MASK: u64 = (CACHE_SIZE - 1) as u64;

/// Zobrist keys derive from this fixed seed so counts are reproducible.
const ZOBRIST_SEED: u64 = 0x0123_4567_89AB_CDEF;
const ZOBRIST_MIXER: u64 = 0x2545_F491_4F6C_DD1D;

/// Concrete commitments tighten count constraints immediately; Cat defers
/// commitment and is harder to prune, so it goes last.
const SHAPE_ORDER: [Shape; 4] = [Shape::Square, Shape::Circle, Shape::Triangle, Shape::Cat];

#[derive(Debug, Clone, Copy, Default)]
struct CacheEntry {
    hash: u64,
    valid: bool,
}

/// Reusable allocation bundle: the transposition cache plus the zobrist
/// table. One context per thread; creating it allocates once, and every
/// solve starts from a zeroed cache.
pub struct Context {
    cache: Box<[CacheEntry]>,
    zobrist: Box<[[u64; Shape::COUNT]; MAX_CELLS]>,
}

impl Context {
    pub fn new() -> Context {
        let mut zobrist = Box::new([[0u64; Shape::COUNT]; MAX_CELLS]);
        let mut state = ZOBRIST_SEED;
        for keys in zobrist.iter_mut() {
            for key in keys.iter_mut() {
                state ^= state >> 12;
                state ^= state << 25;
                state ^= state >> 27;
                *key = state.wrapping_mul(ZOBRIST_MIXER);
            }
        }
        Context {
            cache: vec![CacheEntry::default(); CACHE_SIZE].into_boxed_slice(),
            zobrist,
        }
    }

    /// Drops every cached entry. Called at the top of each solve; stale
    /// negatives from a different constraint set would be unsound.
    pub fn reset(&mut self) {
        self.cache.fill(CacheEntry::default());
    }

    #[inline]
    fn contains(&self, hash: u64) -> bool {
        let entry = &self.cache[(hash & CACHE_MASK) as usize];
        entry.valid && entry.hash == hash
    }

    #[inline]
    fn record(&mut self, hash: u64) {
        self.cache[(hash & CACHE_MASK) as usize] = CacheEntry { hash, valid: true };
    }
}

impl Default for Context {
    fn default() -> Context {
        Context::new()
    }
}

/// Outcome of one solve: the count (up to the cap), search statistics, and
/// the first satisfying assignment encountered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverResult {
    pub solution_count: u64,
    pub states_explored: u64,
    pub time_ms: f64,
    pub is_solvable: bool,
    pub solution: Option<Board>,
}

/// Counts satisfying assignments, stopping once `max_solutions` have been
/// found (0 means unbounded).
pub fn solve_ex(
    ctx: &mut Context,
    puzzle: &mut Puzzle,
    max_solutions: u64,
) -> Result<SolverResult, SolveError> {
    puzzle.validate()?;
    let start = Instant::now();

    puzzle.precompute_masks();
    ctx.reset();

    trace!(
        cells = puzzle.cells(),
        constraints = puzzle.constraints.len(),
        max_solutions,
        "solve.start"
    );

    let Some(domains) = init_domains(puzzle) else {
        // A cell constraint contradicts a locked value (or another cell
        // constraint); no assignment can exist.
        trace!("solve.empty_domain");
        return Ok(SolverResult {
            time_ms: start.elapsed().as_secs_f64() * 1000.0,
            ..SolverResult::default()
        });
    };

    let hash = full_board_hash(ctx, puzzle);
    let mut search = Search {
        puzzle,
        ctx,
        domains,
        cap: if max_solutions == 0 { u64::MAX } else { max_solutions },
        solution_count: 0,
        states_explored: 0,
        hash,
        solution: None,
    };
    search.dfs(0);

    let result = SolverResult {
        solution_count: search.solution_count,
        states_explored: search.states_explored,
        time_ms: start.elapsed().as_secs_f64() * 1000.0,
        is_solvable: search.solution_count > 0,
        solution: search.solution,
    };
    trace!(
        solutions = result.solution_count,
        states = result.states_explored,
        "solve.done"
    );
    Ok(result)
}

/// One-shot variant that allocates a private [`Context`].
pub fn solve(puzzle: &mut Puzzle, max_solutions: u64) -> Result<SolverResult, SolveError> {
    let mut ctx = Context::new();
    solve_ex(&mut ctx, puzzle, max_solutions)
}

pub fn has_unique_solution(puzzle: &mut Puzzle) -> Result<bool, SolveError> {
    Ok(solve(puzzle, 2)?.solution_count == 1)
}

pub fn count_solutions(puzzle: &mut Puzzle) -> Result<u64, SolveError> {
    Ok(solve(puzzle, 0)?.solution_count)
}

pub fn is_solvable(puzzle: &mut Puzzle) -> Result<bool, SolveError> {
    Ok(solve(puzzle, 1)?.is_solvable)
}

/// Final satisfaction check of the current board, no search. Cat cells stand
/// in for any concrete shape.
pub fn validate(puzzle: &Puzzle) -> bool {
    puzzle
        .constraints
        .iter()
        .all(|c| c.is_satisfied(&puzzle.board, puzzle.width, puzzle.height))
}

/// Per-cell shape domains: everything for free cells, the locked value for
/// locked cells, then intersected with the cell constraints. `None` when a
/// domain empties out.
fn init_domains(puzzle: &Puzzle) -> Option<SmallVec<[Domain; MAX_CELLS]>> {
    let mut domains: SmallVec<[Domain; MAX_CELLS]> = smallvec![Domain::ALL; puzzle.cells()];

    for idx in 0..puzzle.cells() {
        if puzzle.is_locked(idx) {
            domains[idx] = Domain::singleton(puzzle.board[idx]);
        }
    }

    for constraint in &puzzle.constraints {
        let Constraint::Cell { x, y, shape, op } = *constraint else {
            continue;
        };
        let idx = puzzle.index(x, y);
        let allowed = match op {
            // A Cat cell satisfies "is X", so Cat stays in the domain.
            CellOp::Is => {
                let mut d = Domain::singleton(shape);
                d.insert(Shape::Cat);
                d
            }
            CellOp::IsNot => {
                if shape.is_cat() {
                    Domain::CONCRETE
                } else {
                    Domain::ALL.without(shape).without(Shape::Cat)
                }
            }
        };
        domains[idx] = domains[idx].and(allowed);
    }

    if domains.iter().any(|d| d.is_empty()) {
        return None;
    }
    Some(domains)
}

fn full_board_hash(ctx: &Context, puzzle: &Puzzle) -> u64 {
    let mut hash = 0u64;
    for (idx, &shape) in puzzle.board.iter().enumerate() {
        hash ^= ctx.zobrist[idx][shape.index()];
    }
    hash
}

struct Search<'a> {
    puzzle: &'a mut Puzzle,
    ctx: &'a mut Context,
    domains: SmallVec<[Domain; MAX_CELLS]>,
    cap: u64,
    solution_count: u64,
    states_explored: u64,
    hash: u64,
    solution: Option<Board>,
}

impl Search<'_> {
    fn dfs(&mut self, mut idx: usize) {
        if self.solution_count >= self.cap {
            return;
        }
        self.states_explored += 1;

        let total = self.puzzle.cells();
        while idx < total
            && (self.puzzle.is_locked(idx) || self.puzzle.board[idx].is_concrete())
        {
            idx += 1;
        }

        if idx >= total {
            if self.all_satisfied() {
                self.solution_count += 1;
                if self.solution.is_none() {
                    self.solution = Some(self.puzzle.board.clone());
                }
            }
            return;
        }

        if self.any_violated() {
            return;
        }
        if self.ctx.contains(self.hash) {
            // Already proved: no completion of this state satisfies the
            // constraints.
            return;
        }

        let before = self.solution_count;
        let domain = self.domains[idx];
        for shape in SHAPE_ORDER {
            if !domain.contains(shape) {
                continue;
            }
            let previous = self.puzzle.board[idx];
            self.place(idx, shape);
            self.dfs(idx + 1);
            self.place(idx, previous);
            if self.solution_count >= self.cap {
                // Interrupted by the cap; the subtree is not proved empty,
                // so it must not be cached.
                return;
            }
        }

        if self.solution_count == before {
            self.ctx.record(self.hash);
        }
    }

    #[inline]
    fn place(&mut self, idx: usize, shape: Shape) {
        let old = self.puzzle.board[idx];
        self.hash ^= self.ctx.zobrist[idx][old.index()] ^ self.ctx.zobrist[idx][shape.index()];
        self.puzzle.board[idx] = shape;
    }

    fn all_satisfied(&self) -> bool {
        self.puzzle
            .constraints
            .iter()
            .all(|c| c.is_satisfied(&self.puzzle.board, self.puzzle.width, self.puzzle.height))
    }

    fn any_violated(&self) -> bool {
        self.puzzle
            .constraints
            .iter()
            .any(|c| c.is_violated(&self.puzzle.board, self.puzzle.width, self.puzzle.height))
    }
}
