//! Solution-first puzzle generation.
//!
//! A candidate starts from a sampled solution board, so every constraint is a
//! true statement about *some* assignment and the puzzle is satisfiable by
//! construction (statements are literal; under the Cat-wildcard reading the
//! final unique solution may legally differ from the sampled board). The
//! solver is the oracle: constraints are added until it reports exactly one
//! assignment for the all-Cat board.

use smallvec::SmallVec;

use shapes_core::puzzle::{Board, MAX_CELLS, MAX_CONSTRAINTS};
use shapes_core::rng::Rng;
use shapes_core::{Constraint, CountOp, Puzzle, Shape};
use shapes_solver::{Context, solve_ex};

use crate::GenError;

#[cfg(feature = "telemetry-tracing")]
use tracing::trace;

#[cfg(not(feature = "telemetry-tracing"))]
macro_rules! trace {
    ($($tt:tt)*) => {};
}

/// Candidate solution boards tried by the serial path before giving up.
pub(crate) const SERIAL_ATTEMPTS: u32 = 50;

/// Boards at or above this cell count use the parallel worker pool.
const PARALLEL_THRESHOLD: usize = 12;

/// Uniform jitter added to every fact score before ranking.
const SCORE_JITTER: u64 = 40;

/// Pushes a fact kind to the bottom of the ranking when its quota is zero;
/// jitter can never rescue it.
const QUOTA_PENALTY: i32 = -1000;

/// Board size, difficulty quotas, and the constraint-count window for one
/// generation run. The mandatory global Cat count is pinned outside the
/// window: `min_constraints`/`max_constraints` bound the fact-derived
/// constraints only.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneratorConfig {
    pub width: u8,
    pub height: u8,
    /// Difficulty level this config was derived from (0 for custom configs).
    pub difficulty: u8,
    pub min_constraints: u8,
    pub max_constraints: u8,
    /// Cats stamped into the solution board.
    pub required_cats: u8,
    /// Cells pre-revealed from the solution.
    pub max_locked_cells: u8,
    /// Quota: "cell is X" constraints per puzzle.
    pub max_cell_is: u8,
    /// Quota: "cell is not Cat" constraints per puzzle.
    pub max_cell_is_not_cat: u8,
    /// Floor: count constraints the final puzzle must carry.
    pub min_count_constraints: u8,
    /// Disables the worker pool so output is a pure function of the seed.
    pub force_serial: bool,
}

const LEVEL_CONFIGS: [GeneratorConfig; 5] = [
    GeneratorConfig {
        width: 2,
        height: 2,
        difficulty: 1,
        min_constraints: 2,
        max_constraints: 4,
        required_cats: 1,
        max_locked_cells: 0,
        max_cell_is: 2,
        max_cell_is_not_cat: 1,
        min_count_constraints: 1,
        force_serial: false,
    },
    GeneratorConfig {
        width: 2,
        height: 3,
        difficulty: 2,
        min_constraints: 3,
        max_constraints: 12,
        required_cats: 1,
        max_locked_cells: 0,
        max_cell_is: 1,
        max_cell_is_not_cat: 1,
        min_count_constraints: 2,
        force_serial: false,
    },
    GeneratorConfig {
        width: 3,
        height: 3,
        difficulty: 3,
        min_constraints: 4,
        max_constraints: 20,
        required_cats: 1,
        max_locked_cells: 1,
        max_cell_is: 0,
        max_cell_is_not_cat: 1,
        min_count_constraints: 3,
        force_serial: false,
    },
    GeneratorConfig {
        width: 3,
        height: 4,
        difficulty: 4,
        min_constraints: 5,
        max_constraints: 25,
        required_cats: 1,
        max_locked_cells: 2,
        max_cell_is: 0,
        max_cell_is_not_cat: 0,
        min_count_constraints: 4,
        force_serial: false,
    },
    GeneratorConfig {
        width: 4,
        height: 4,
        difficulty: 5,
        min_constraints: 6,
        max_constraints: 30,
        required_cats: 2,
        max_locked_cells: 3,
        max_cell_is: 0,
        max_cell_is_not_cat: 0,
        min_count_constraints: 5,
        force_serial: false,
    },
];

/// Preset for a difficulty level in 1..=5; anything else yields the zeroed
/// config, which `generate` rejects.
pub fn default_config(level: u8) -> GeneratorConfig {
    match level {
        1..=5 => LEVEL_CONFIGS[level as usize - 1],
        _ => GeneratorConfig::default(),
    }
}

/// A generated puzzle together with its unique solution and the number of
/// candidate boards consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPuzzle {
    pub puzzle: Puzzle,
    pub solution: Board,
    pub attempts: u32,
}

/// Generates a puzzle with exactly one solution, or fails once the retry
/// budget is exhausted (50 serial candidates, or 4 workers x 15 each).
pub fn generate(config: &GeneratorConfig, seed: u64) -> Result<GeneratedPuzzle, GenError> {
    validate_config(config)?;
    let cells = (config.width as usize) * (config.height as usize);
    if cells >= PARALLEL_THRESHOLD && !config.force_serial {
        crate::parallel::generate_parallel(config, seed)
    } else {
        generate_serial(config, seed)
    }
}

/// Convenience wrapper: preset config for `level`, then [`generate`].
pub fn quick(level: u8, seed: u64) -> Result<GeneratedPuzzle, GenError> {
    generate(&default_config(level), seed)
}

/// True when the solver finds exactly one assignment.
pub fn validate_unique(puzzle: &mut Puzzle) -> Result<bool, GenError> {
    Ok(shapes_solver::has_unique_solution(puzzle)?)
}

fn validate_config(config: &GeneratorConfig) -> Result<(), GenError> {
    let ok = (1..=6).contains(&config.width) && (1..=6).contains(&config.height);
    if !ok {
        return Err(GenError::InvalidConfig {
            width: config.width,
            height: config.height,
        });
    }
    Ok(())
}

fn generate_serial(config: &GeneratorConfig, seed: u64) -> Result<GeneratedPuzzle, GenError> {
    let mut rng = Rng::new(seed);
    let mut ctx = Context::new();
    trace!(seed, width = config.width, height = config.height, "gen.start");
    for attempt in 0..SERIAL_ATTEMPTS {
        if let Some(mut generated) = attempt_candidate(config, &mut rng, &mut ctx)? {
            generated.attempts = attempt + 1;
            trace!(
                attempt,
                constraints = generated.puzzle.constraints.len(),
                "gen.accept"
            );
            return Ok(generated);
        }
        trace!(attempt, "gen.retry");
    }
    Err(GenError::AttemptsExhausted {
        attempts: SERIAL_ATTEMPTS,
    })
}

/// One true statement about a solution board; a candidate constraint.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Fact {
    RowCount { y: u8, shape: Shape, count: u8 },
    ColumnCount { x: u8, shape: Shape, count: u8 },
    GlobalCount { shape: Shape, count: u8 },
    CellIs { x: u8, y: u8, shape: Shape },
    CellIsNot { x: u8, y: u8, shape: Shape },
}

impl Fact {
    fn to_constraint(self) -> Constraint {
        match self {
            Fact::RowCount { y, shape, count } => {
                Constraint::row_count(y, shape, CountOp::Exactly, count)
            }
            Fact::ColumnCount { x, shape, count } => {
                Constraint::column_count(x, shape, CountOp::Exactly, count)
            }
            Fact::GlobalCount { shape, count } => {
                Constraint::global_count(shape, CountOp::Exactly, count)
            }
            Fact::CellIs { x, y, shape } => Constraint::cell_is(x, y, shape),
            Fact::CellIsNot { x, y, shape } => Constraint::cell_is_not(x, y, shape),
        }
    }
}

/// Every literal count and cell statement of the solution board, in a fixed
/// extraction order (score ties keep it, the sort being stable).
fn extract_facts(config: &GeneratorConfig, board: &[Shape]) -> Vec<Fact> {
    let width = config.width;
    let height = config.height;
    let mut facts = Vec::with_capacity(4 + 4 * (width + height) as usize + 4 * board.len());

    for shape in Shape::ALL {
        let count = board.iter().filter(|&&s| s == shape).count() as u8;
        facts.push(Fact::GlobalCount { shape, count });
    }

    for y in 0..height {
        for shape in Shape::ALL {
            let count = (0..width)
                .filter(|&x| board[(y as usize) * (width as usize) + x as usize] == shape)
                .count() as u8;
            facts.push(Fact::RowCount { y, shape, count });
        }
    }

    for x in 0..width {
        for shape in Shape::ALL {
            let count = (0..height)
                .filter(|&y| board[(y as usize) * (width as usize) + x as usize] == shape)
                .count() as u8;
            facts.push(Fact::ColumnCount { x, shape, count });
        }
    }

    for y in 0..height {
        for x in 0..width {
            let cell = board[(y as usize) * (width as usize) + x as usize];
            facts.push(Fact::CellIs { x, y, shape: cell });
            for shape in Shape::ALL {
                if shape != cell {
                    facts.push(Fact::CellIsNot { x, y, shape });
                }
            }
        }
    }

    facts
}

/// Base score biased toward deductive difficulty; jitter is added separately.
fn score_fact(fact: &Fact, config: &GeneratorConfig) -> i32 {
    fn line_score(count: u8, len: u8) -> i32 {
        if count == 0 {
            130
        } else if count == len {
            120
        } else {
            115
        }
    }

    match *fact {
        Fact::RowCount { count, .. } => line_score(count, config.width),
        Fact::ColumnCount { count, .. } => line_score(count, config.height),
        Fact::GlobalCount { count, .. } => {
            let total = config.width * config.height;
            if count == 0 {
                110
            } else if count == total {
                100
            } else {
                70
            }
        }
        Fact::CellIsNot { shape, .. } => {
            if shape.is_cat() {
                if config.max_cell_is_not_cat == 0 {
                    30 + QUOTA_PENALTY
                } else {
                    30
                }
            } else {
                60
            }
        }
        Fact::CellIs { shape, .. } => {
            let base = if shape.is_cat() { 10 } else { 20 };
            if config.max_cell_is == 0 {
                base + QUOTA_PENALTY
            } else {
                base
            }
        }
    }
}

/// Per-puzzle quota counters. `charge` and `refund` are symmetric so a
/// rolled-back fact leaves every counter exactly as it found it.
#[derive(Debug, Clone, Copy, Default)]
struct Quotas {
    cell_is: u8,
    cell_is_not_cat: u8,
    count_constraints: u8,
}

impl Quotas {
    fn admits(&self, fact: &Fact, config: &GeneratorConfig) -> bool {
        match fact {
            Fact::CellIs { .. } => self.cell_is < config.max_cell_is,
            Fact::CellIsNot { shape, .. } if shape.is_cat() => {
                self.cell_is_not_cat < config.max_cell_is_not_cat
            }
            _ => true,
        }
    }

    fn charge(&mut self, fact: &Fact) {
        match fact {
            Fact::CellIs { .. } => self.cell_is += 1,
            Fact::CellIsNot { shape, .. } if shape.is_cat() => self.cell_is_not_cat += 1,
            Fact::CellIsNot { .. } => {}
            _ => self.count_constraints += 1,
        }
    }

    fn refund(&mut self, fact: &Fact) {
        match fact {
            Fact::CellIs { .. } => self.cell_is -= 1,
            Fact::CellIsNot { shape, .. } if shape.is_cat() => self.cell_is_not_cat -= 1,
            Fact::CellIsNot { .. } => {}
            _ => self.count_constraints -= 1,
        }
    }
}

/// Redundancy: a cell constraint on a locked cell (already shown), or any
/// constraint repeating an earlier one's target.
fn is_redundant_or_conflicting(puzzle: &Puzzle, candidate: &Constraint) -> bool {
    if let Constraint::Cell { x, y, .. } = *candidate {
        if puzzle.is_locked(puzzle.index(x, y)) {
            return true;
        }
    }
    puzzle.constraints.iter().any(|c| c.same_target(candidate))
}

fn batch_bonus(cells: usize) -> usize {
    if cells >= 12 {
        8
    } else if cells >= 9 {
        4
    } else {
        2
    }
}

fn sample_solution_board(config: &GeneratorConfig, rng: &mut Rng) -> Board {
    let cells = (config.width as usize) * (config.height as usize);
    let mut board: Board = (0..cells)
        .map(|_| Shape::CONCRETE[rng.bounded(3) as usize])
        .collect();

    if config.required_cats > 0 {
        let mut indices: SmallVec<[usize; MAX_CELLS]> = (0..cells).collect();
        rng.shuffle(&mut indices);
        for &idx in indices.iter().take(config.required_cats as usize) {
            board[idx] = Shape::Cat;
        }
    }
    board
}

/// Pre-reveals up to `max_locked_cells` concrete cells of the solution.
fn add_locked_cells(config: &GeneratorConfig, rng: &mut Rng, solution: &[Shape], puzzle: &mut Puzzle) {
    if config.max_locked_cells == 0 {
        return;
    }
    let mut candidates: SmallVec<[usize; MAX_CELLS]> = (0..solution.len())
        .filter(|&idx| solution[idx].is_concrete())
        .collect();
    rng.shuffle(&mut candidates);
    for &idx in candidates.iter().take(config.max_locked_cells as usize) {
        puzzle.board[idx] = solution[idx];
        puzzle.set_locked(idx, true);
    }
}

/// Runs one candidate board through constraint selection. `Ok(None)` means
/// the candidate was abandoned (unsatisfiable or never reached uniqueness).
pub(crate) fn attempt_candidate(
    config: &GeneratorConfig,
    rng: &mut Rng,
    ctx: &mut Context,
) -> Result<Option<GeneratedPuzzle>, GenError> {
    let solution = sample_solution_board(config, rng);
    let mut puzzle = Puzzle::new(config.width, config.height)?;
    add_locked_cells(config, rng, &solution, &mut puzzle);

    let facts = extract_facts(config, &solution);
    let mut scored: Vec<(i32, Fact)> = facts
        .into_iter()
        .map(|fact| {
            (
                score_fact(&fact, config) + rng.bounded(SCORE_JITTER) as i32,
                fact,
            )
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    let mut quotas = Quotas::default();

    // The Cat count anchors uniqueness: without it, surplus Cats satisfy
    // nearly every count set. Always first; pinned through optimization; does
    // not count against the constraint window.
    let cat_count = solution.iter().filter(|s| s.is_cat()).count() as u8;
    if cat_count > 0 {
        puzzle.push_constraint(Constraint::global_count(
            Shape::Cat,
            CountOp::Exactly,
            cat_count,
        ))?;
        quotas.count_constraints += 1;
    }

    let max_selected =
        (config.max_constraints as usize).min(MAX_CONSTRAINTS.saturating_sub(puzzle.constraints.len()));
    let cells = puzzle.cells();
    let target = (config.min_constraints as usize + batch_bonus(cells)).min(max_selected);

    // Bulk batch: reach the target size before paying for the first solve.
    let mut selected = 0usize;
    let mut cursor = 0usize;
    while selected < target && cursor < scored.len() {
        let fact = scored[cursor].1;
        cursor += 1;
        let constraint = fact.to_constraint();
        if !quotas.admits(&fact, config) || is_redundant_or_conflicting(&puzzle, &constraint) {
            continue;
        }
        puzzle.push_constraint(constraint)?;
        quotas.charge(&fact);
        selected += 1;
    }

    puzzle.reset_unlocked();
    let mut result = solve_ex(ctx, &mut puzzle, 2)?;
    trace!(
        constraints = puzzle.constraints.len(),
        solutions = result.solution_count,
        "gen.bulk_solved"
    );
    if result.solution_count == 0 {
        return Ok(None);
    }

    // Incremental tightening: walk the remaining facts, keeping each addition
    // unless it kills the last solution.
    while cursor < scored.len() && selected < max_selected {
        if result.solution_count == 1 && goals_met(selected, &quotas, config) {
            break;
        }
        let fact = scored[cursor].1;
        cursor += 1;
        let constraint = fact.to_constraint();
        if !quotas.admits(&fact, config) || is_redundant_or_conflicting(&puzzle, &constraint) {
            continue;
        }
        puzzle.push_constraint(constraint)?;
        quotas.charge(&fact);
        selected += 1;
        puzzle.reset_unlocked();
        let tentative = solve_ex(ctx, &mut puzzle, 2)?;
        if tentative.solution_count == 0 {
            puzzle.constraints.pop();
            quotas.refund(&fact);
            selected -= 1;
        } else {
            result = tentative;
        }
    }

    if result.solution_count != 1 || !goals_met(selected, &quotas, config) {
        return Ok(None);
    }
    let Some(found) = result.solution else {
        return Ok(None);
    };

    puzzle.reset_unlocked();
    Ok(Some(GeneratedPuzzle {
        puzzle,
        solution: found,
        attempts: 0,
    }))
}

fn goals_met(selected: usize, quotas: &Quotas, config: &GeneratorConfig) -> bool {
    selected >= config.min_constraints as usize
        && quotas.count_constraints >= config.min_count_constraints
}
