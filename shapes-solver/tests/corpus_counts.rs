//! Golden solution-count corpus.
//!
//! Each entry is a small board with a hand-verified exact count. The counts
//! exercise the Cat-wildcard semantics, every count operator, boundary
//! targets (0 and region size), locked cells, and the solution cap.

use shapes_core::{Constraint, CountOp, Puzzle, Shape};
use shapes_solver::{Context, has_unique_solution, solve_ex};

struct GoldenCount {
    width: u8,
    height: u8,
    locked: Vec<(u8, u8, Shape)>,
    constraints: Vec<Constraint>,
    /// Exact number of satisfying assignments.
    solutions: u64,
    label: &'static str,
}

fn golden_corpus() -> Vec<GoldenCount> {
    use Shape::{Cat, Circle, Square, Triangle};
    vec![
        GoldenCount {
            width: 2,
            height: 2,
            locked: vec![],
            constraints: vec![],
            solutions: 256, // 4^4
            label: "2x2 unconstrained",
        },
        GoldenCount {
            width: 2,
            height: 2,
            locked: vec![],
            constraints: vec![Constraint::cell_is(0, 0, Square)],
            solutions: 128, // cell 0 in {Square, Cat}, rest free
            label: "2x2 single is-Square",
        },
        GoldenCount {
            width: 2,
            height: 2,
            locked: vec![],
            constraints: vec![Constraint::cell_is_not(0, 0, Circle)],
            solutions: 128, // cell 0 in {Square, Triangle}
            label: "2x2 single is-not-Circle",
        },
        GoldenCount {
            width: 2,
            height: 2,
            locked: vec![],
            constraints: vec![Constraint::cell_is_not(0, 0, Cat)],
            solutions: 192, // cell 0 concrete
            label: "2x2 single is-not-Cat",
        },
        GoldenCount {
            width: 2,
            height: 2,
            locked: vec![],
            constraints: vec![Constraint::global_count(Cat, CountOp::Exactly, 0)],
            solutions: 81, // 3^4 concrete boards
            label: "2x2 no cats",
        },
        GoldenCount {
            width: 2,
            height: 2,
            locked: vec![],
            constraints: vec![Constraint::global_count(Square, CountOp::Exactly, 4)],
            solutions: 16, // every cell in {Square, Cat}
            label: "2x2 all Square (wildcard)",
        },
        GoldenCount {
            width: 2,
            height: 2,
            locked: vec![],
            constraints: vec![
                Constraint::row_count(0, Square, CountOp::Exactly, 1),
                Constraint::global_count(Cat, CountOp::Exactly, 0),
            ],
            solutions: 36, // 4 row-0 arrangements x 9 free row-1 boards
            label: "2x2 row count on a concrete board",
        },
        GoldenCount {
            width: 2,
            height: 2,
            locked: vec![],
            constraints: vec![Constraint::global_count(Cat, CountOp::AtMost, 1)],
            solutions: 189, // 81 cat-free + 108 one-cat boards
            label: "2x2 at most one cat",
        },
        GoldenCount {
            width: 2,
            height: 2,
            locked: vec![],
            constraints: vec![Constraint::global_count(Triangle, CountOp::AtLeast, 3)],
            solutions: 80, // cells split {Triangle,Cat} vs {Square,Circle}: (4+1)*16
            label: "2x2 at least three Triangles (wildcard)",
        },
        GoldenCount {
            width: 2,
            height: 2,
            locked: vec![],
            constraints: vec![Constraint::row_count(0, Circle, CountOp::None, 0)],
            solutions: 64, // row 0 cells in {Square, Triangle}, row 1 free
            label: "2x2 none-Circle row",
        },
        GoldenCount {
            width: 2,
            height: 2,
            locked: vec![(0, 0, Square)],
            constraints: vec![],
            solutions: 64, // 4^3, locked cell fixed
            label: "2x2 one locked cell",
        },
        GoldenCount {
            width: 2,
            height: 3,
            locked: vec![],
            constraints: vec![Constraint::column_count(0, Square, CountOp::Exactly, 3)],
            solutions: 512, // column 0 in {Square,Cat}^3, other column free
            label: "2x3 full-column count",
        },
        GoldenCount {
            width: 2,
            height: 2,
            locked: vec![],
            constraints: vec![
                Constraint::global_count(Cat, CountOp::Exactly, 0),
                Constraint::cell_is(0, 0, Square),
                Constraint::cell_is(1, 0, Circle),
                Constraint::cell_is(0, 1, Triangle),
                Constraint::cell_is(1, 1, Square),
            ],
            solutions: 1,
            label: "2x2 fully pinned",
        },
        GoldenCount {
            width: 2,
            height: 2,
            locked: vec![],
            constraints: vec![
                Constraint::global_count(Square, CountOp::Exactly, 4),
                Constraint::global_count(Square, CountOp::None, 0),
            ],
            solutions: 0,
            label: "2x2 contradiction",
        },
    ]
}

fn build(entry: &GoldenCount) -> Puzzle {
    let mut p = Puzzle::new(entry.width, entry.height).unwrap();
    for &(x, y, shape) in &entry.locked {
        let idx = p.index(x, y);
        p.board[idx] = shape;
        p.set_locked(idx, true);
    }
    for &c in &entry.constraints {
        p.push_constraint(c).unwrap();
    }
    p
}

#[test]
fn corpus_counts_are_exact() {
    let mut ctx = Context::new();
    for entry in golden_corpus() {
        let mut p = build(&entry);
        let result = solve_ex(&mut ctx, &mut p, 0).unwrap();
        assert_eq!(
            result.solution_count, entry.solutions,
            "count mismatch for {}",
            entry.label
        );
        assert_eq!(
            result.is_solvable,
            entry.solutions > 0,
            "solvability mismatch for {}",
            entry.label
        );
    }
}

#[test]
fn corpus_counts_respect_the_cap() {
    let mut ctx = Context::new();
    for entry in golden_corpus() {
        let mut p = build(&entry);
        let capped = solve_ex(&mut ctx, &mut p, 2).unwrap();
        assert_eq!(
            capped.solution_count,
            entry.solutions.min(2),
            "capped count mismatch for {}",
            entry.label
        );
        p.reset_unlocked();
        assert_eq!(
            has_unique_solution(&mut p).unwrap(),
            entry.solutions == 1,
            "uniqueness mismatch for {}",
            entry.label
        );
    }
}

#[test]
fn returned_solution_satisfies_the_puzzle() {
    let mut ctx = Context::new();
    for entry in golden_corpus() {
        if entry.solutions == 0 {
            continue;
        }
        let mut p = build(&entry);
        let result = solve_ex(&mut ctx, &mut p, 1).unwrap();
        let solution = result.solution.expect(entry.label);
        p.board.clone_from(&solution);
        assert!(
            shapes_solver::validate(&p),
            "first solution fails validate for {}",
            entry.label
        );
    }
}
