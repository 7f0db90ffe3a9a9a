use smallvec::{SmallVec, smallvec};

use crate::constraint::{Constraint, Region};
use crate::error::CoreError;
use crate::shape::Shape;

pub const MAX_WIDTH: usize = 6;
pub const MAX_HEIGHT: usize = 6;
/// 36 cells fit a u64 bitmask with room to spare.
pub const MAX_CELLS: usize = MAX_WIDTH * MAX_HEIGHT;
pub const MAX_CONSTRAINTS: usize = 32;

/// Row-major cell storage, inline up to the 6x6 maximum.
pub type Board = SmallVec<[Shape; MAX_CELLS]>;

/// A puzzle instance: board state, pre-revealed (locked) cells, the solver
/// constraint list, and the optimized display list shown to a human.
///
/// Locked cells hold their solution value and are never mutated by the
/// solver. The display list is derived from the solver list and is always
/// implied by it.
#[derive(Debug, Clone, PartialEq)]
pub struct Puzzle {
    pub width: u8,
    pub height: u8,
    pub board: Board,
    pub locked_mask: u64,
    pub constraints: Vec<Constraint>,
    pub display_constraints: Vec<Constraint>,
}

impl Puzzle {
    /// An all-Cat board with no constraints.
    pub fn new(width: u8, height: u8) -> Result<Puzzle, CoreError> {
        check_dimensions(width, height)?;
        Ok(Puzzle {
            width,
            height,
            board: smallvec![Shape::Cat; (width as usize) * (height as usize)],
            locked_mask: 0,
            constraints: Vec::new(),
            display_constraints: Vec::new(),
        })
    }

    #[inline]
    pub fn cells(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    #[inline]
    pub fn index(&self, x: u8, y: u8) -> usize {
        (y as usize) * (self.width as usize) + x as usize
    }

    #[inline]
    pub fn coords(&self, index: usize) -> (u8, u8) {
        (
            (index % self.width as usize) as u8,
            (index / self.width as usize) as u8,
        )
    }

    #[inline]
    pub fn is_locked(&self, index: usize) -> bool {
        self.locked_mask >> index & 1 != 0
    }

    pub fn set_locked(&mut self, index: usize, locked: bool) {
        if locked {
            self.locked_mask |= 1u64 << index;
        } else {
            self.locked_mask &= !(1u64 << index);
        }
    }

    /// Appends to the solver constraint list, enforcing the 32-entry cap and
    /// coordinate bounds.
    pub fn push_constraint(&mut self, constraint: Constraint) -> Result<(), CoreError> {
        if self.constraints.len() >= MAX_CONSTRAINTS {
            return Err(CoreError::TooManyConstraints {
                len: self.constraints.len() + 1,
                max: MAX_CONSTRAINTS,
            });
        }
        check_constraint_bounds(&constraint, self.width, self.height)?;
        self.constraints.push(constraint);
        Ok(())
    }

    /// Fills the cached region mask on every solver constraint. Called once
    /// per solve; cheap and idempotent.
    pub fn precompute_masks(&mut self) {
        let (width, height) = (self.width, self.height);
        for constraint in &mut self.constraints {
            constraint.precompute_mask(width, height);
        }
    }

    /// Sets every unlocked cell back to Cat, the "unsolved" state.
    pub fn reset_unlocked(&mut self) {
        for (idx, cell) in self.board.iter_mut().enumerate() {
            if self.locked_mask >> idx & 1 == 0 {
                *cell = Shape::Cat;
            }
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        check_dimensions(self.width, self.height)?;
        if self.board.len() != self.cells() {
            return Err(CoreError::BoardSizeMismatch {
                expected: self.cells(),
                got: self.board.len(),
            });
        }
        for list in [&self.constraints, &self.display_constraints] {
            if list.len() > MAX_CONSTRAINTS {
                return Err(CoreError::TooManyConstraints {
                    len: list.len(),
                    max: MAX_CONSTRAINTS,
                });
            }
            for constraint in list {
                check_constraint_bounds(constraint, self.width, self.height)?;
            }
        }
        Ok(())
    }
}

fn check_dimensions(width: u8, height: u8) -> Result<(), CoreError> {
    if width == 0 || height == 0 || width as usize > MAX_WIDTH || height as usize > MAX_HEIGHT {
        return Err(CoreError::InvalidDimensions { width, height });
    }
    Ok(())
}

fn check_constraint_bounds(constraint: &Constraint, width: u8, height: u8) -> Result<(), CoreError> {
    match *constraint {
        Constraint::Cell { x, y, .. } => {
            if x >= width || y >= height {
                return Err(CoreError::CellOutOfRange {
                    x,
                    y,
                    width,
                    height,
                });
            }
        }
        Constraint::Count { region, .. } => match region {
            Region::Row(index) if index >= height => {
                return Err(CoreError::RowOutOfRange { index, height });
            }
            Region::Column(index) if index >= width => {
                return Err(CoreError::ColumnOutOfRange { index, width });
            }
            _ => {}
        },
    }
    Ok(())
}

impl core::fmt::Display for Puzzle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "Puzzle {}x{}:", self.width, self.height)?;
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = self.index(x, y);
                let glyph = self.board[idx].glyph();
                if self.is_locked(idx) {
                    write!(f, "[{glyph}]")?;
                } else {
                    write!(f, " {glyph} ")?;
                }
            }
            writeln!(f)?;
        }
        writeln!(f, "Constraints ({}):", self.constraints.len())?;
        for (i, constraint) in self.constraints.iter().enumerate() {
            writeln!(f, "  {}. {constraint}", i + 1)?;
        }
        Ok(())
    }
}

#[cfg(kani)]
mod kani_verification {
    use super::*;

    /// Proves index and coords form a roundtrip bijection for valid boards.
    #[kani::proof]
    fn index_coords_roundtrip() {
        let width: u8 = kani::any();
        let height: u8 = kani::any();
        kani::assume(width >= 1 && width as usize <= MAX_WIDTH);
        kani::assume(height >= 1 && height as usize <= MAX_HEIGHT);

        let x: u8 = kani::any();
        let y: u8 = kani::any();
        kani::assume(x < width && y < height);

        let puzzle = Puzzle::new(width, height).unwrap();
        let idx = puzzle.index(x, y);
        kani::assert(idx < puzzle.cells(), "index out of bounds");
        let (bx, by) = puzzle.coords(idx);
        kani::assert(bx == x && by == y, "coords roundtrip failed");
    }

    /// Proves every valid cell index has a representable locked-mask bit.
    #[kani::proof]
    fn locked_mask_bit_representable() {
        let idx: usize = kani::any();
        kani::assume(idx < MAX_CELLS);

        let mut puzzle = Puzzle::new(6, 6).unwrap();
        puzzle.set_locked(idx, true);
        kani::assert(puzzle.is_locked(idx), "locked bit lost");
        puzzle.set_locked(idx, false);
        kani::assert(!puzzle.is_locked(idx), "locked bit stuck");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::CountOp;

    #[test]
    fn new_board_is_all_cats() {
        let p = Puzzle::new(3, 4).unwrap();
        assert_eq!(p.cells(), 12);
        assert!(p.board.iter().all(|&s| s == Shape::Cat));
        assert_eq!(p.locked_mask, 0);
    }

    #[test]
    fn rejects_oversized_boards() {
        assert!(matches!(
            Puzzle::new(7, 2),
            Err(CoreError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            Puzzle::new(0, 3),
            Err(CoreError::InvalidDimensions { .. })
        ));
        assert!(Puzzle::new(6, 6).is_ok());
    }

    #[test]
    fn last_cell_of_a_6x6_board_locks() {
        let mut p = Puzzle::new(6, 6).unwrap();
        p.set_locked(35, true);
        assert!(p.is_locked(35));
        assert_eq!(p.locked_mask, 1u64 << 35);
    }

    #[test]
    fn reset_unlocked_preserves_locked_cells() {
        let mut p = Puzzle::new(2, 2).unwrap();
        p.board[0] = Shape::Square;
        p.board[3] = Shape::Triangle;
        p.set_locked(0, true);
        p.reset_unlocked();
        assert_eq!(p.board[0], Shape::Square);
        assert_eq!(p.board[3], Shape::Cat);
    }

    #[test]
    fn push_constraint_enforces_bounds_and_cap() {
        let mut p = Puzzle::new(2, 2).unwrap();
        assert!(matches!(
            p.push_constraint(Constraint::cell_is(2, 0, Shape::Square)),
            Err(CoreError::CellOutOfRange { .. })
        ));
        assert!(matches!(
            p.push_constraint(Constraint::row_count(2, Shape::Cat, CountOp::Exactly, 0)),
            Err(CoreError::RowOutOfRange { .. })
        ));
        for i in 0..MAX_CONSTRAINTS {
            p.push_constraint(Constraint::global_count(
                Shape::Square,
                CountOp::AtMost,
                i as u8,
            ))
            .unwrap();
        }
        assert!(matches!(
            p.push_constraint(Constraint::global_count(Shape::Cat, CountOp::None, 0)),
            Err(CoreError::TooManyConstraints { .. })
        ));
    }

    #[test]
    fn precompute_fills_count_masks() {
        let mut p = Puzzle::new(3, 2).unwrap();
        p.push_constraint(Constraint::row_count(1, Shape::Circle, CountOp::Exactly, 1))
            .unwrap();
        p.precompute_masks();
        let Constraint::Count { cell_mask, .. } = p.constraints[0] else {
            panic!("expected count constraint");
        };
        assert_eq!(cell_mask, 0b111_000);
    }

    #[test]
    fn coords_roundtrip() {
        let p = Puzzle::new(4, 3).unwrap();
        for idx in 0..p.cells() {
            let (x, y) = p.coords(idx);
            assert_eq!(p.index(x, y), idx);
        }
    }
}
