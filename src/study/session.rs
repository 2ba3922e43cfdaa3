//! Active study session state and its transitions.

use chrono::Local;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::card::StudyCard;
use super::progress::Progress;
use super::queue::build_round;
use super::{StatUpdate, StudyError};
use crate::models::{AnswerKind, CardResult, Deck, GameResult};

pub const HIT_REWARD: f64 = 1.0;
pub const MISS_PENALTY: f64 = 1.5;
/// Player name recorded when none is given.
pub const ANONYMOUS_PLAYER: &str = "Anonymous";

/// One study attempt over a deck.
///
/// Owned by the caller for its whole life; dropped (or [`abandon`]ed) when
/// the user leaves, or turned into a [`GameResult`] with [`finalize`].
///
/// [`abandon`]: StudySession::abandon
/// [`finalize`]: StudySession::finalize
#[derive(Debug)]
pub struct StudySession {
    deck_id: String,
    deck_name: String,
    cards: Vec<StudyCard>,
    score: f64,
    /// Indices into `cards` for the current round.
    queue: Vec<usize>,
    current_index: Option<usize>,
    flipped: bool,
    finished: bool,
    round: usize,
    rng: StdRng,
}

impl StudySession {
    pub fn start(deck: &Deck) -> Result<Self, StudyError> {
        Self::with_rng(deck, StdRng::seed_from_u64(rand::random()))
    }

    /// Start a session whose round shuffles come from `rng`.
    pub fn with_rng(deck: &Deck, rng: StdRng) -> Result<Self, StudyError> {
        if deck.cards.is_empty() {
            return Err(StudyError::EmptyDeck(deck.name.clone()));
        }

        let mut session = Self {
            deck_id: deck.id.clone(),
            deck_name: deck.name.clone(),
            cards: deck.cards.iter().map(StudyCard::from_card).collect(),
            score: 0.0,
            queue: Vec::new(),
            current_index: None,
            flipped: false,
            finished: false,
            round: 0,
            rng,
        };
        session.rebuild_queue();

        log::info!(
            "Started session on deck '{}' with {} cards",
            session.deck_name,
            session.cards.len()
        );
        Ok(session)
    }

    pub fn deck_id(&self) -> &str {
        &self.deck_id
    }

    pub fn deck_name(&self) -> &str {
        &self.deck_name
    }

    pub fn cards(&self) -> &[StudyCard] {
        &self.cards
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn round(&self) -> usize {
        self.round
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Cards of the current round in presentation order.
    pub fn round_cards(&self) -> impl Iterator<Item = &StudyCard> + '_ {
        self.queue.iter().filter_map(move |&i| self.cards.get(i))
    }

    pub fn current_card(&self) -> Option<&StudyCard> {
        if self.finished {
            return None;
        }
        let slot = *self.queue.get(self.current_index?)?;
        self.cards.get(slot)
    }

    fn current_card_mut(&mut self) -> Option<&mut StudyCard> {
        if self.finished {
            return None;
        }
        let slot = *self.queue.get(self.current_index?)?;
        self.cards.get_mut(slot)
    }

    /// Reveal the answer face. Repeated calls change nothing.
    pub fn flip(&mut self) {
        if self.current_card().is_some() {
            self.flipped = true;
        }
    }

    pub fn hit(&mut self) -> Option<StatUpdate> {
        let card = self.current_card_mut()?;
        card.record_hit();
        let card_id = card.id.clone();

        self.score += HIT_REWARD;
        Some(self.answered(card_id, AnswerKind::Hit))
    }

    pub fn miss(&mut self) -> Option<StatUpdate> {
        let card = self.current_card_mut()?;
        card.record_miss();
        let card_id = card.id.clone();

        self.score = round_cents(self.score - MISS_PENALTY);
        Some(self.answered(card_id, AnswerKind::Miss))
    }

    fn answered(&mut self, card_id: String, kind: AnswerKind) -> StatUpdate {
        log::debug!("{} on card {} (score {})", kind.name(), card_id, self.score);
        self.advance();
        StatUpdate {
            deck_id: self.deck_id.clone(),
            card_id,
            kind,
        }
    }

    fn advance(&mut self) {
        self.flipped = false;
        match self.current_index {
            Some(i) if i + 1 < self.queue.len() => self.current_index = Some(i + 1),
            _ => self.rebuild_queue(),
        }
    }

    fn rebuild_queue(&mut self) {
        match build_round(&self.cards, &mut self.rng) {
            Some(queue) => {
                self.queue = queue;
                self.current_index = Some(0);
                self.round += 1;
                log::debug!("Round {} with {} cards", self.round, self.queue.len());
            }
            None => {
                self.finished = true;
                log::info!(
                    "Session on deck '{}' finished with score {}",
                    self.deck_name,
                    self.score
                );
            }
        }
    }

    pub fn progress(&self) -> Progress {
        let round_length = if self.finished { 0 } else { self.queue.len() };
        let current = if self.finished { None } else { self.current_index };
        Progress::new(&self.cards, current, round_length)
    }

    /// Materialize the outcome of the session.
    ///
    /// An empty or blank name is recorded as [`ANONYMOUS_PLAYER`]. Every card
    /// is listed, mastered or not.
    pub fn finalize(&self, player_name: &str) -> GameResult {
        let player_name = match player_name.trim() {
            "" => ANONYMOUS_PLAYER.to_string(),
            name => name.to_string(),
        };
        let card_results = self
            .cards
            .iter()
            .map(|c| CardResult {
                card_id: c.id.clone(),
                hits: c.hits,
                misses: c.misses,
            })
            .collect();

        GameResult::new(
            self.deck_id.clone(),
            player_name,
            Local::now().date_naive(),
            self.score,
            card_results,
        )
    }

    /// Discard the session without recording anything.
    pub fn abandon(self) {
        log::info!(
            "Abandoned session on deck '{}' at score {}",
            self.deck_name,
            self.score
        );
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::study::{DeckStore, Level};

    fn deck(cards: &[(&str, &str)]) -> Deck {
        let mut deck = Deck::new("Test Deck".to_string());
        for (q, a) in cards {
            deck.add_card(q.to_string(), a.to_string());
        }
        deck
    }

    fn session(deck: &Deck) -> StudySession {
        StudySession::with_rng(deck, StdRng::seed_from_u64(11)).unwrap()
    }

    #[test]
    fn test_start_fresh_state() {
        let deck = deck(&[("a", "1"), ("b", "2"), ("c", "3")]);
        let session = session(&deck);

        assert_eq!(session.cards().len(), 3);
        assert!(session.cards().iter().all(|c| c.level == Level::MIN && !c.mastered));
        assert_eq!(session.score(), 0.0);
        assert_eq!(session.current_index(), Some(0));
        assert_eq!(session.round(), 1);
        assert!(!session.is_flipped());
        assert!(!session.is_finished());
        assert_eq!(session.round_cards().count(), 3);
        assert!(session.current_card().is_some());
    }

    #[test]
    fn test_start_rejects_empty_deck() {
        let deck = deck(&[]);
        let err = StudySession::start(&deck).unwrap_err();
        assert_eq!(err, StudyError::EmptyDeck("Test Deck".to_string()));
    }

    #[test]
    fn test_six_hits_master_single_card() {
        let deck = deck(&[("only", "card")]);
        let mut session = session(&deck);

        for _ in 0..5 {
            session.hit().unwrap();
            assert!(!session.is_finished());
        }
        assert_eq!(session.cards()[0].level, Level::MAX);

        session.hit().unwrap();
        assert!(session.cards()[0].mastered);
        assert!(session.is_finished());
        assert_eq!(session.score(), 6.0);
        assert_eq!(session.progress().percent_complete, 100);
    }

    #[test]
    fn test_miss_resets_from_any_level() {
        for hits_before in 0..6 {
            let deck = deck(&[("only", "card")]);
            let mut session = session(&deck);
            for _ in 0..hits_before {
                session.hit();
            }
            session.miss().unwrap();

            let card = &session.cards()[0];
            assert_eq!(card.level, Level::MIN);
            assert!(!card.mastered);
            assert!(!session.is_finished());
        }
    }

    #[test]
    fn test_hit_then_miss_score() {
        let deck = deck(&[("a", "1"), ("b", "2")]);
        let mut session = session(&deck);

        session.hit();
        assert_eq!(session.score(), 1.0);
        session.miss();
        assert_eq!(session.score(), -0.5);
        session.miss();
        assert_eq!(session.score(), -2.0);
    }

    #[test]
    fn test_flip_is_idempotent_and_reset_on_answer() {
        let deck = deck(&[("a", "1"), ("b", "2")]);
        let mut session = session(&deck);

        session.flip();
        session.flip();
        assert!(session.is_flipped());

        session.hit();
        assert!(!session.is_flipped());
    }

    #[test]
    fn test_answers_emit_stat_updates() {
        let deck = deck(&[("a", "1"), ("b", "2")]);
        let mut session = session(&deck);

        let first = session.current_card().unwrap().id.clone();
        let update = session.hit().unwrap();
        assert_eq!(update.deck_id, deck.id);
        assert_eq!(update.card_id, first);
        assert_eq!(update.kind, AnswerKind::Hit);

        let second = session.current_card().unwrap().id.clone();
        let update = session.miss().unwrap();
        assert_eq!(update.card_id, second);
        assert_eq!(update.kind, AnswerKind::Miss);
    }

    #[test]
    fn test_round_rebuild_orders_by_level() {
        let deck = deck(&[("a", "1"), ("b", "2"), ("c", "3")]);
        let mut session = session(&deck);

        // round 1: hit, miss, hit
        session.hit();
        session.miss();
        session.hit();

        assert_eq!(session.round(), 2);
        assert_eq!(session.current_index(), Some(0));
        let levels: Vec<u8> = session.round_cards().map(|c| c.level.get()).collect();
        assert_eq!(levels, vec![1, 2, 2]);
        assert_eq!(session.current_card().unwrap().level, Level::MIN);
    }

    #[test]
    fn test_mastered_cards_leave_the_queue() {
        let deck = deck(&[("A", "first"), ("B", "second")]);
        let a = deck.cards[0].id.clone();
        let mut session = session(&deck);

        // A is always hit, B always missed.
        while session.cards().iter().all(|c| !c.mastered) {
            if session.current_card().unwrap().id == a {
                session.hit();
            } else {
                session.miss();
            }
        }

        assert_eq!(session.round(), 7);
        let ids: Vec<&str> = session.round_cards().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec![deck.cards[1].id.as_str()]);
        assert_eq!(session.score(), -3.0);
    }

    #[test]
    fn test_two_card_deck_end_to_end() {
        let mut deck = deck(&[("A", "first"), ("B", "second")]);
        let (a, b) = (deck.cards[0].id.clone(), deck.cards[1].id.clone());
        let mut session = session(&deck);

        let mut answers = 0;
        while !session.is_finished() {
            session.flip();
            let update = session.hit().unwrap();
            deck.increment_card_stat(&update.deck_id, &update.card_id, update.kind)
                .unwrap();
            answers += 1;
            assert!(answers <= 12, "session should finish after twelve hits");
        }

        assert_eq!(session.score(), 12.0);
        assert!(session.cards().iter().all(|c| c.mastered));
        let progress = session.progress();
        assert_eq!(progress.mastered, 2);
        assert_eq!(progress.percent_complete, 100);

        let game = session.finalize("Ana");
        assert_eq!(game.deck_id, deck.id);
        assert_eq!(game.player_name, "Ana");
        assert_eq!(game.score, 12.0);
        assert_eq!(
            game.card_results,
            vec![
                CardResult { card_id: a, hits: 6, misses: 0 },
                CardResult { card_id: b, hits: 6, misses: 0 },
            ]
        );
        assert!(deck.cards.iter().all(|c| c.stats.hits == 6));
    }

    #[test]
    fn test_finished_session_ignores_answers() {
        let deck = deck(&[("only", "card")]);
        let mut session = session(&deck);
        for _ in 0..6 {
            session.hit();
        }
        assert!(session.is_finished());
        assert!(session.current_card().is_none());

        assert!(session.hit().is_none());
        assert!(session.miss().is_none());
        session.flip();
        assert!(!session.is_flipped());
        assert_eq!(session.score(), 6.0);
        assert_eq!(session.cards()[0].hits, 6);
    }

    #[test]
    fn test_finalize_uses_anonymous_for_blank_name() {
        let deck = deck(&[("a", "1")]);
        let mut session = session(&deck);
        session.miss();

        let game = session.finalize("   ");
        assert_eq!(game.player_name, ANONYMOUS_PLAYER);
        assert_eq!(game.score, -1.5);
        assert_eq!(game.card_results[0].misses, 1);
        assert_eq!(game.date, Local::now().date_naive());

        assert_eq!(session.finalize("  Luis ").player_name, "Luis");
    }

    #[test]
    fn test_abandon_keeps_written_stats() {
        let mut deck = deck(&[("a", "1"), ("b", "2")]);
        let mut session = session(&deck);

        let update = session.miss().unwrap();
        update.apply(&mut deck).unwrap();
        session.abandon();

        let total_misses: u32 = deck.cards.iter().map(|c| c.stats.misses).sum();
        assert_eq!(total_misses, 1);
    }

    #[test]
    fn test_progress_tracks_round_position() {
        let deck = deck(&[("a", "1"), ("b", "2"), ("c", "3")]);
        let mut session = session(&deck);

        let progress = session.progress();
        assert_eq!((progress.round_position, progress.round_length), (1, 3));
        assert_eq!(progress.count_at(Level::MIN), 3);

        session.hit();
        let progress = session.progress();
        assert_eq!(progress.round_position, 2);
        assert_eq!(progress.count_at(Level::MIN), 2);
        assert_eq!(progress.count_at(Level::new(2).unwrap()), 1);
    }

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(1.0 - 1.5), -0.5);
        assert_eq!(round_cents(0.1 + 0.2), 0.3);
        assert_eq!(round_cents(-3.0), -3.0);
    }
}
