//! Leveled-queue flashcard study engine.
//!
//! The scheduler lives in [`study`]; decks and games are persisted as JSON by
//! [`storage`] and [`games`].

pub mod config;
pub mod difficulty;
pub mod games;
pub mod models;
pub mod storage;
pub mod study;

pub use models::{AnswerKind, Card, CardResult, CardStats, Deck, GameResult};
pub use study::{Progress, StatUpdate, StudyCard, StudyError, StudySession};
