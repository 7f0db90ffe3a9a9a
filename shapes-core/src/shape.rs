#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Cell symbol. `Cat` is the superposition symbol: in satisfaction checks it
/// stands for any concrete shape, so a partially-specified board can already
/// satisfy "is X" and count constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum Shape {
    Cat = 0,
    Square = 1,
    Circle = 2,
    Triangle = 3,
}

impl Shape {
    pub const COUNT: usize = 4;

    /// All shapes, Cat first (index order).
    pub const ALL: [Shape; 4] = [Shape::Cat, Shape::Square, Shape::Circle, Shape::Triangle];

    /// The non-Cat shapes, in the order the solver commits them.
    pub const CONCRETE: [Shape; 3] = [Shape::Square, Shape::Circle, Shape::Triangle];

    pub fn from_index(index: u8) -> Option<Shape> {
        match index {
            0 => Some(Shape::Cat),
            1 => Some(Shape::Square),
            2 => Some(Shape::Circle),
            3 => Some(Shape::Triangle),
            _ => None,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn is_cat(self) -> bool {
        self == Shape::Cat
    }

    #[inline]
    pub fn is_concrete(self) -> bool {
        self != Shape::Cat
    }

    /// Wildcard matching: a Cat cell matches any concrete target, while a Cat
    /// target is matched only by Cat itself.
    #[inline]
    pub fn matches(self, target: Shape) -> bool {
        self == target || (self == Shape::Cat && target != Shape::Cat)
    }

    pub fn name(self) -> &'static str {
        match self {
            Shape::Cat => "Cat",
            Shape::Square => "Square",
            Shape::Circle => "Circle",
            Shape::Triangle => "Triangle",
        }
    }

    /// Single-character board glyph.
    pub fn glyph(self) -> char {
        match self {
            Shape::Cat => '?',
            Shape::Square => '#',
            Shape::Circle => 'O',
            Shape::Triangle => '^',
        }
    }
}

impl core::fmt::Display for Shape {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of shapes still possible for a cell, as a 4-bit mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Domain(u8);

impl Domain {
    /// Every shape, Cat included.
    pub const ALL: Domain = Domain(0b1111);

    /// Every shape except Cat.
    pub const CONCRETE: Domain = Domain(0b1110);

    pub const fn empty() -> Domain {
        Domain(0)
    }

    pub const fn singleton(shape: Shape) -> Domain {
        Domain(1 << shape as u8)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn contains(self, shape: Shape) -> bool {
        self.0 & (1 << shape as u8) != 0
    }

    #[inline]
    pub fn insert(&mut self, shape: Shape) {
        self.0 |= 1 << shape as u8;
    }

    #[inline]
    pub fn remove(&mut self, shape: Shape) {
        self.0 &= !(1 << shape as u8);
    }

    #[inline]
    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    #[inline]
    pub fn and(self, other: Domain) -> Domain {
        Domain(self.0 & other.0)
    }

    /// The domain minus one shape.
    #[inline]
    pub fn without(self, shape: Shape) -> Domain {
        Domain(self.0 & !(1 << shape as u8))
    }

    pub fn iter(self) -> impl Iterator<Item = Shape> {
        Shape::ALL.into_iter().filter(move |s| self.contains(*s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cat_matches_concrete_targets_only_one_way() {
        assert!(Shape::Cat.matches(Shape::Square));
        assert!(Shape::Cat.matches(Shape::Triangle));
        assert!(Shape::Cat.matches(Shape::Cat));
        assert!(!Shape::Square.matches(Shape::Cat));
        assert!(Shape::Circle.matches(Shape::Circle));
        assert!(!Shape::Circle.matches(Shape::Square));
    }

    #[test]
    fn index_roundtrip() {
        for s in Shape::ALL {
            assert_eq!(Shape::from_index(s as u8), Some(s));
        }
        assert_eq!(Shape::from_index(4), None);
    }

    #[test]
    fn domain_insert_remove() {
        let mut d = Domain::empty();
        assert!(d.is_empty());
        d.insert(Shape::Circle);
        assert!(d.contains(Shape::Circle));
        assert_eq!(d.count(), 1);
        d.remove(Shape::Circle);
        assert!(d.is_empty());
    }

    #[test]
    fn concrete_excludes_cat() {
        assert!(!Domain::CONCRETE.contains(Shape::Cat));
        assert_eq!(Domain::CONCRETE.count(), 3);
        assert_eq!(Domain::ALL.without(Shape::Cat), Domain::CONCRETE);
    }

    #[test]
    fn iter_follows_index_order() {
        let shapes: Vec<Shape> = Domain::ALL.iter().collect();
        assert_eq!(shapes, Shape::ALL);
    }
}
