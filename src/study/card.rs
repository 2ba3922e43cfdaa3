//! Session-scoped working copy of a card.

use super::level::Level;
use crate::models::Card;

/// A card as seen by a running session.
///
/// Question and answer are copied from the deck when the session starts and
/// never change afterwards. Once `mastered` is set the card no longer enters a
/// round and its `level` is meaningless.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyCard {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub level: Level,
    pub mastered: bool,
    pub hits: u32,
    pub misses: u32,
}

impl StudyCard {
    pub fn from_card(card: &Card) -> Self {
        Self {
            id: card.id.clone(),
            question: card.question.clone(),
            answer: card.answer.clone(),
            level: Level::MIN,
            mastered: false,
            hits: 0,
            misses: 0,
        }
    }

    /// A hit at the top level masters the card; otherwise it climbs one level.
    pub fn record_hit(&mut self) {
        self.hits += 1;
        match self.level.promoted() {
            Some(next) => self.level = next,
            None => self.mastered = true,
        }
    }

    /// A miss always drops the card back to the first level.
    pub fn record_miss(&mut self) {
        self.misses += 1;
        self.level = Level::MIN;
    }
}
