//! Read-only progress summary of a session.

use super::card::StudyCard;
use super::level::Level;

/// Snapshot of how far a session has come. Only used for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub total: usize,
    pub mastered: usize,
    pub percent_complete: u32,
    /// Unmastered cards per level, index 0 is level 1.
    pub level_counts: [usize; Level::COUNT],
    /// One-based position of the current card in its round, 0 when none.
    pub round_position: usize,
    pub round_length: usize,
}

impl Progress {
    pub(crate) fn new(
        cards: &[StudyCard],
        current_index: Option<usize>,
        round_length: usize,
    ) -> Self {
        let total = cards.len();
        let mut mastered = 0;
        let mut level_counts = [0; Level::COUNT];
        for card in cards {
            if card.mastered {
                mastered += 1;
            } else {
                level_counts[card.level.index()] += 1;
            }
        }

        let percent_complete = if total == 0 {
            0
        } else {
            (mastered as f64 / total as f64 * 100.0).round() as u32
        };

        Self {
            total,
            mastered,
            percent_complete,
            level_counts,
            round_position: current_index.map_or(0, |i| i + 1),
            round_length,
        }
    }

    pub fn pending(&self) -> usize {
        self.total - self.mastered
    }

    pub fn count_at(&self, level: Level) -> usize {
        self.level_counts[level.index()]
    }
}
