//! Bounded mastery level of a card within a session.

use std::fmt;

/// Mastery depth, always within `1..=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(u8);

impl Level {
    pub const MIN: Level = Level(1);
    pub const MAX: Level = Level(6);
    /// Number of distinct levels.
    pub const COUNT: usize = 6;

    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN.0..=Self::MAX.0)
            .contains(&value)
            .then_some(Level(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Zero-based position, for fixed-size per-level tables.
    pub fn index(self) -> usize {
        (self.0 - Self::MIN.0) as usize
    }

    /// The next level up, or `None` from the top level.
    pub fn promoted(self) -> Option<Level> {
        Level::new(self.0 + 1)
    }

    pub fn all() -> impl Iterator<Item = Level> {
        (Self::MIN.0..=Self::MAX.0).map(Level)
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::MIN
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert!(Level::new(0).is_none());
        assert!(Level::new(7).is_none());
        assert_eq!(Level::new(1), Some(Level::MIN));
        assert_eq!(Level::new(6), Some(Level::MAX));
    }

    #[test]
    fn test_promotion_stops_at_max() {
        let mut level = Level::MIN;
        let mut steps = 0;
        while let Some(next) = level.promoted() {
            level = next;
            steps += 1;
        }
        assert_eq!(steps, 5);
        assert_eq!(level, Level::MAX);
    }

    #[test]
    fn test_indices_cover_table() {
        let indices: Vec<usize> = Level::all().map(Level::index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(Level::all().count(), Level::COUNT);
    }
}
