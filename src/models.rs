//! Data models for decks, cards and recorded games.

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn short_id() -> String {
    Uuid::new_v4().to_string()[..8].to_string()
}

/// Outcome of answering a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerKind {
    Hit,
    Miss,
}

impl AnswerKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hit => "Hit",
            Self::Miss => "Miss",
        }
    }
}

/// Historical hit/miss counters kept on a card across every session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardStats {
    pub hits: u32,
    pub misses: u32,
}

impl CardStats {
    pub fn record(&mut self, kind: AnswerKind) {
        match kind {
            AnswerKind::Hit => self.hits += 1,
            AnswerKind::Miss => self.misses += 1,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.hits + self.misses
    }

    /// Rounded hit percentage, `None` until the card has been answered.
    pub fn accuracy(&self) -> Option<u32> {
        let attempts = self.attempts();
        if attempts == 0 {
            return None;
        }
        Some((self.hits as f64 / attempts as f64 * 100.0).round() as u32)
    }
}

/// A single question/answer card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub stats: CardStats,
    pub created_at: DateTime<Local>,
}

impl Card {
    pub fn new(question: String, answer: String) -> Self {
        Self {
            id: short_id(),
            question,
            answer,
            stats: CardStats::default(),
            created_at: Local::now(),
        }
    }
}

/// A named collection of cards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deck {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub cards: Vec<Card>,
    pub created_at: DateTime<Local>,
}

impl Deck {
    pub fn new(name: String) -> Self {
        Self {
            id: short_id(),
            name,
            description: String::new(),
            cards: Vec::new(),
            created_at: Local::now(),
        }
    }

    pub fn add_card(&mut self, question: String, answer: String) -> &Card {
        self.cards.push(Card::new(question, answer));
        &self.cards[self.cards.len() - 1]
    }

    pub fn card(&self, card_id: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == card_id)
    }

    pub fn card_mut(&mut self, card_id: &str) -> Option<&mut Card> {
        self.cards.iter_mut().find(|c| c.id == card_id)
    }

    /// Replace a card's text, keeping its id and stats.
    pub fn update_card(&mut self, card_id: &str, question: String, answer: String) -> bool {
        match self.card_mut(card_id) {
            Some(card) => {
                card.question = question;
                card.answer = answer;
                true
            }
            None => false,
        }
    }

    pub fn delete_card(&mut self, card_id: &str) -> bool {
        let before = self.cards.len();
        self.cards.retain(|c| c.id != card_id);
        self.cards.len() < before
    }
}

/// Session tally for one card, as stored with a finished game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardResult {
    pub card_id: String,
    pub hits: u32,
    pub misses: u32,
}

/// A finished study session, ready to be recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub id: String,
    pub deck_id: String,
    pub player_name: String,
    pub date: NaiveDate,
    pub score: f64,
    pub card_results: Vec<CardResult>,
}

impl GameResult {
    pub fn new(
        deck_id: String,
        player_name: String,
        date: NaiveDate,
        score: f64,
        card_results: Vec<CardResult>,
    ) -> Self {
        Self {
            id: short_id(),
            deck_id,
            player_name,
            date,
            score,
            card_results,
        }
    }
}
