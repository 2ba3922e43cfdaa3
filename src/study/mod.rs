//! Study-session scheduler.
//!
//! A [`StudySession`] is built from a deck snapshot and walked one card at a
//! time. Each round presents every unmastered card, lowest level first with
//! ties shuffled. A hit promotes a card one level (or masters it at the top
//! level), a miss sends it back to level 1. The session finishes when every
//! card is mastered.
//!
//! The scheduler never touches storage. Answering a card returns a
//! [`StatUpdate`] that the caller applies to a [`DeckStore`]; a finished
//! session becomes a [`GameResult`] for a [`SessionRecorder`].

mod card;
mod level;
mod progress;
mod queue;
mod session;

use thiserror::Error;

use crate::models::{AnswerKind, Deck, GameResult};

pub use card::StudyCard;
pub use level::Level;
pub use progress::Progress;
pub use queue::build_round;
pub use session::{StudySession, ANONYMOUS_PLAYER, HIT_REWARD, MISS_PENALTY};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StudyError {
    #[error("Deck '{0}' has no cards to study")]
    EmptyDeck(String),
}

/// Persistent stat increment produced by answering a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatUpdate {
    pub deck_id: String,
    pub card_id: String,
    pub kind: AnswerKind,
}

impl StatUpdate {
    pub fn apply<S: DeckStore + ?Sized>(&self, store: &mut S) -> anyhow::Result<()> {
        store.increment_card_stat(&self.deck_id, &self.card_id, self.kind)
    }
}

/// Owner of the canonical decks and their long-lived card stats.
pub trait DeckStore {
    fn increment_card_stat(
        &mut self,
        deck_id: &str,
        card_id: &str,
        kind: AnswerKind,
    ) -> anyhow::Result<()>;
}

/// Sink for finished games.
pub trait SessionRecorder {
    fn record_game(&mut self, game: &GameResult) -> anyhow::Result<()>;
}

impl DeckStore for Deck {
    fn increment_card_stat(
        &mut self,
        deck_id: &str,
        card_id: &str,
        kind: AnswerKind,
    ) -> anyhow::Result<()> {
        if self.id != deck_id {
            anyhow::bail!("Stat update for deck {} applied to deck {}", deck_id, self.id);
        }
        let card = self
            .card_mut(card_id)
            .ok_or_else(|| anyhow::anyhow!("Card {} not found in deck {}", card_id, deck_id))?;
        card.stats.record(kind);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_to_deck() {
        let mut deck = Deck::new("Verbs".to_string());
        let card_id = deck.add_card("ser".to_string(), "to be".to_string()).id.clone();

        let update = StatUpdate {
            deck_id: deck.id.clone(),
            card_id: card_id.clone(),
            kind: AnswerKind::Miss,
        };
        update.apply(&mut deck).unwrap();
        update.apply(&mut deck).unwrap();

        let stats = deck.card(&card_id).unwrap().stats;
        assert_eq!((stats.hits, stats.misses), (0, 2));
    }

    #[test]
    fn test_apply_rejects_unknown_targets() {
        let mut deck = Deck::new("Verbs".to_string());
        let card_id = deck.add_card("ir".to_string(), "to go".to_string()).id.clone();

        let wrong_deck = StatUpdate {
            deck_id: "other".to_string(),
            card_id,
            kind: AnswerKind::Hit,
        };
        assert!(wrong_deck.apply(&mut deck).is_err());

        let wrong_card = StatUpdate {
            deck_id: deck.id.clone(),
            card_id: "nope".to_string(),
            kind: AnswerKind::Hit,
        };
        assert!(wrong_card.apply(&mut deck).is_err());
    }
}
