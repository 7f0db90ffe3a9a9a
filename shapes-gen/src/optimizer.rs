//! Display-set optimization.
//!
//! The solver constraint list is built for uniqueness, not readability: it
//! routinely pins a cell three different ways. This pass rewrites it into a
//! shorter list that is still implied by the solver list, then shuffles the
//! presentation order with a seeded PRNG so puzzles do not always lead with
//! the strongest clue. The global Cat count, when present, stays pinned at
//! position 0.

use smallvec::SmallVec;

use shapes_core::puzzle::MAX_CONSTRAINTS;
use shapes_core::rng::Rng;
use shapes_core::{CellOp, Constraint, CountOp, Puzzle, Region, Shape};

/// Rewrites `puzzle.display_constraints` from the solver constraints.
/// Deterministic: the same solver list and seed yield the same display list,
/// and re-running is idempotent.
pub fn optimize_constraints(puzzle: &mut Puzzle, seed: u64) {
    let pinned = puzzle.constraints.iter().position(is_global_cat_count);

    let mut kept: Vec<Constraint> = Vec::with_capacity(puzzle.constraints.len());
    if let Some(idx) = pinned {
        kept.push(puzzle.constraints[idx]);
    }
    for (idx, constraint) in puzzle.constraints.iter().enumerate() {
        if Some(idx) == pinned {
            continue;
        }
        if redundant_against(&kept, constraint, puzzle) {
            continue;
        }
        kept.push(*constraint);
    }

    loop {
        let mut changed = false;
        for y in 0..puzzle.height {
            let cells: SmallVec<[(u8, u8); 6]> = (0..puzzle.width).map(|x| (x, y)).collect();
            changed |= consolidate_line(&mut kept, puzzle, &cells, Region::Row(y));
        }
        for x in 0..puzzle.width {
            let cells: SmallVec<[(u8, u8); 6]> = (0..puzzle.height).map(|y| (x, y)).collect();
            changed |= consolidate_line(&mut kept, puzzle, &cells, Region::Column(x));
        }
        if !changed {
            break;
        }
    }

    let mut rng = Rng::new(seed);
    if !kept.is_empty() && is_global_cat_count(&kept[0]) {
        rng.shuffle(&mut kept[1..]);
    } else {
        rng.shuffle(&mut kept);
    }
    kept.truncate(MAX_CONSTRAINTS);
    puzzle.display_constraints = kept;
}

fn is_global_cat_count(constraint: &Constraint) -> bool {
    matches!(
        constraint,
        Constraint::Count {
            region: Region::Global,
            shape: Shape::Cat,
            op: CountOp::Exactly,
            ..
        }
    )
}

/// Same clue: variant, shape, operator, and region or coordinates agree.
fn same_clue(a: &Constraint, b: &Constraint) -> bool {
    match (*a, *b) {
        (
            Constraint::Count { region: ra, shape: sa, op: oa, .. },
            Constraint::Count { region: rb, shape: sb, op: ob, .. },
        ) => ra == rb && sa == sb && oa == ob,
        (
            Constraint::Cell { x: xa, y: ya, shape: sa, op: oa },
            Constraint::Cell { x: xb, y: yb, shape: sb, op: ob },
        ) => xa == xb && ya == yb && sa == sb && oa == ob,
        _ => false,
    }
}

fn redundant_against(kept: &[Constraint], candidate: &Constraint, puzzle: &Puzzle) -> bool {
    if kept.iter().any(|k| same_clue(k, candidate)) {
        return true;
    }

    let Constraint::Cell { x, y, shape, op } = *candidate else {
        return false;
    };

    // The cell is already shown to the player.
    if puzzle.is_locked(puzzle.index(x, y)) {
        return true;
    }

    // "is not s" says nothing once the cell is positively identified.
    if op == CellOp::IsNot
        && kept.iter().any(|k| {
            matches!(
                *k,
                Constraint::Cell { x: kx, y: ky, shape: kshape, op: CellOp::Is }
                    if kx == x && ky == y && kshape != shape
            )
        })
    {
        return true;
    }

    // Implied by a kept count: a zero count over the cell's region forces
    // "is not", a full count forces "is".
    for k in kept {
        let Constraint::Count {
            region,
            shape: kshape,
            op: kop,
            count,
            ..
        } = *k
        else {
            continue;
        };
        if kshape != shape || !region.contains(x, y) {
            continue;
        }
        let zero = kop == CountOp::None || (kop == CountOp::Exactly && count == 0);
        let full = kop == CountOp::Exactly && count == region.len(puzzle.width, puzzle.height);
        match op {
            CellOp::IsNot if zero => return true,
            CellOp::Is if full => return true,
            _ => {}
        }
    }

    false
}

/// Replaces the kept "is s" constraints of one line with a single exact
/// count, but only when every cell of the line is positively determined to
/// the same shape (a kept "is s" or a locked cell holding s) and at least
/// two constraints actually go away, so the list strictly shortens.
fn consolidate_line(
    kept: &mut Vec<Constraint>,
    puzzle: &Puzzle,
    cells: &[(u8, u8)],
    line: Region,
) -> bool {
    for shape in Shape::ALL {
        let mut replaced: SmallVec<[usize; 6]> = SmallVec::new();
        let mut all_determined = true;
        for &(x, y) in cells {
            let idx = puzzle.index(x, y);
            if puzzle.is_locked(idx) && puzzle.board[idx] == shape {
                continue;
            }
            let kept_is = kept.iter().position(|k| {
                matches!(
                    *k,
                    Constraint::Cell { x: kx, y: ky, shape: kshape, op: CellOp::Is }
                        if kx == x && ky == y && kshape == shape
                )
            });
            match kept_is {
                Some(pos) => replaced.push(pos),
                None => {
                    all_determined = false;
                    break;
                }
            }
        }
        if !all_determined || replaced.len() < 2 {
            continue;
        }

        let count = cells.len() as u8;
        let replacement = match line {
            Region::Row(y) => Constraint::row_count(y, shape, CountOp::Exactly, count),
            Region::Column(x) => Constraint::column_count(x, shape, CountOp::Exactly, count),
            Region::Global => continue,
        };
        replaced.sort_unstable_by(|a, b| b.cmp(a));
        for pos in replaced {
            kept.remove(pos);
        }
        kept.push(replacement);
        return true;
    }
    false
}
