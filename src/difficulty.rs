//! Per-card difficulty derived from historical hit/miss stats.

use std::cmp::Ordering;

use crate::models::Deck;

/// Bucket a card falls into by its miss percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifficultyLabel {
    NoData,
    Easy,
    Medium,
    Hard,
}

impl DifficultyLabel {
    pub fn from_percent(attempts: u32, miss_percent: u32) -> Self {
        if attempts == 0 {
            Self::NoData
        } else if miss_percent > 60 {
            Self::Hard
        } else if miss_percent > 30 {
            Self::Medium
        } else {
            Self::Easy
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::NoData => "No data",
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardDifficulty {
    pub card_id: String,
    pub question: String,
    pub answer: String,
    pub hits: u32,
    pub misses: u32,
    pub attempts: u32,
    pub miss_ratio: f64,
    pub miss_percent: u32,
    pub label: DifficultyLabel,
}

/// Rank a deck's cards from hardest to easiest.
///
/// Cards with the same miss ratio are ordered by raw miss count.
pub fn summarize(deck: &Deck) -> Vec<CardDifficulty> {
    let mut rows: Vec<CardDifficulty> = deck
        .cards
        .iter()
        .map(|card| {
            let attempts = card.stats.attempts();
            let miss_ratio = if attempts == 0 {
                0.0
            } else {
                card.stats.misses as f64 / attempts as f64
            };
            let miss_percent = (miss_ratio * 100.0).round() as u32;
            CardDifficulty {
                card_id: card.id.clone(),
                question: card.question.clone(),
                answer: card.answer.clone(),
                hits: card.stats.hits,
                misses: card.stats.misses,
                attempts,
                miss_ratio,
                miss_percent,
                label: DifficultyLabel::from_percent(attempts, miss_percent),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.miss_ratio
            .partial_cmp(&a.miss_ratio)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.misses.cmp(&a.misses))
    });
    rows
}
