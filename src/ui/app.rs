//! Main application state and logic.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{
        block::BorderType, Block, Borders, Cell, Clear, Gauge, List, ListItem, ListState,
        Paragraph, Row, Table, TableState, Wrap,
    },
    Frame,
};

use anyhow::anyhow;
use unicode_width::UnicodeWidthStr;

use super::theme::Theme;
use super::widgets::{
    tail_to_width, AnswerButtons, FinishedScreen, FlashcardWidget, KeyHints, LevelBar, Logo,
    ScoreBar,
};
use levelcards::config::Config;
use levelcards::difficulty::{self, CardDifficulty};
use levelcards::games::GameStorage;
use levelcards::models::{AnswerKind, Card, Deck, GameResult};
use levelcards::storage::{DeckInfo, DeckStorage};
use levelcards::study::SessionRecorder;
use levelcards::StudySession;

const MAX_NAME_LEN: usize = 40;

// ══════════════════════════════════════════════════════════════════════════
// Application State
// ══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    DeckSelect,
    DeckForm,
    CardBrowser,
    AddCard,
    Study,
    Finished,
    Ranking,
    Summary,
}

/// Two text inputs with one focused at a time.
#[derive(Debug, Clone, Default)]
pub struct TextForm {
    pub fields: [String; 2],
    pub focus: usize,
}

impl TextForm {
    fn filled(first: &str, second: &str) -> Self {
        Self {
            fields: [first.to_string(), second.to_string()],
            focus: 0,
        }
    }

    fn value(&self, field: usize) -> &str {
        self.fields[field].trim()
    }

    /// Apply a typing key. Other keys are ignored.
    fn edit(&mut self, key: KeyCode) {
        match key {
            KeyCode::Tab => self.focus = (self.focus + 1) % 2,
            KeyCode::Backspace => {
                self.fields[self.focus].pop();
            }
            KeyCode::Char(c) => self.fields[self.focus].push(c),
            _ => {}
        }
    }
}

pub struct App {
    pub screen: Screen,
    pub running: bool,

    // Config and theme
    pub config: Config,
    pub config_path: PathBuf,
    pub theme: Theme,

    // Storage
    pub storage: DeckStorage,
    pub games: GameStorage,

    // Deck selection
    pub deck_list: Vec<DeckInfo>,
    pub deck_list_state: ListState,
    pub deck_delete_pending: bool,

    // Deck form, `editing_deck_id` is None when creating
    pub deck_form: TextForm,
    pub editing_deck_id: Option<String>,

    // Card browser
    pub current_deck: Option<Deck>,
    pub card_list_state: ListState,
    pub card_form: TextForm,
    pub card_edit: Option<TextForm>,
    pub card_delete_pending: bool,

    // Study state
    pub session: Option<StudySession>,
    pub abandon_pending: bool,

    // Finished screen
    pub player_name: String,

    // Ranking
    pub ranking: Vec<GameResult>,
    pub ranking_filter: Option<String>,
    pub ranking_state: TableState,
    pub game_delete_pending: bool,

    // Difficulty summary
    pub summary_deck_name: String,
    pub summary: Vec<CardDifficulty>,
    pub summary_state: TableState,

    // Status message (shown temporarily)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    pub fn new(storage: DeckStorage, games: GameStorage, config: Config) -> Self {
        let deck_list = storage.list_decks().unwrap_or_default();
        let theme = Theme::from_name(&config.theme);
        let selected = if deck_list.is_empty() { None } else { Some(0) };

        Self {
            screen: Screen::DeckSelect,
            running: true,
            config,
            config_path: Config::default_path(),
            theme,
            storage,
            games,
            deck_list,
            deck_list_state: ListState::default().with_selected(selected),
            deck_delete_pending: false,
            deck_form: TextForm::default(),
            editing_deck_id: None,
            current_deck: None,
            card_list_state: ListState::default(),
            card_form: TextForm::default(),
            card_edit: None,
            card_delete_pending: false,
            session: None,
            abandon_pending: false,
            player_name: String::new(),
            ranking: Vec::new(),
            ranking_filter: None,
            ranking_state: TableState::default(),
            game_delete_pending: false,
            summary_deck_name: String::new(),
            summary: Vec::new(),
            summary_state: TableState::default(),
            status_message: None,
        }
    }

    fn selected_deck(&self) -> Option<&DeckInfo> {
        self.deck_list_state
            .selected()
            .and_then(|i| self.deck_list.get(i))
    }

    pub fn refresh_deck_list(&mut self) {
        self.deck_list = self.storage.list_decks().unwrap_or_else(|e| {
            log::warn!("Could not list decks: {}", e);
            Vec::new()
        });
        let selected = match self.deck_list_state.selected() {
            _ if self.deck_list.is_empty() => None,
            Some(i) if i >= self.deck_list.len() => Some(self.deck_list.len() - 1),
            Some(i) => Some(i),
            None => Some(0),
        };
        self.deck_list_state.select(selected);
    }

    pub fn delete_selected_deck(&mut self) {
        let Some(deck_id) = self.selected_deck().map(|d| d.id.clone()) else {
            return;
        };
        match self.storage.delete_deck(&deck_id) {
            Ok(_) => self.set_status("Deck deleted".to_string()),
            Err(e) => self.set_status(format!("Delete failed: {}", e)),
        }
        self.refresh_deck_list();
    }

    pub fn cycle_theme(&mut self) {
        let new_theme_name = self.theme.name.next();
        self.theme = Theme::new(new_theme_name);
        self.config.theme = new_theme_name.as_str().to_string();
        if let Err(e) = self.config.save_to(&self.config_path) {
            log::warn!("Could not save theme choice: {}", e);
        }
    }

    pub fn set_status(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    pub fn export_backup(&mut self) {
        let path = DeckStorage::default_backup_path();
        match self.storage.export_backup(&self.games, &path) {
            Ok(count) => {
                self.set_status(format!("Exported {} decks to {}", count, path.display()));
            }
            Err(e) => {
                self.set_status(format!("Export failed: {}", e));
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Deck & Card Authoring
    // ══════════════════════════════════════════════════════════════════════

    /// Open the deck form, filled with the selected deck when editing.
    pub fn open_deck_form(&mut self, edit_selected: bool) {
        if edit_selected {
            let Some(deck) = self.selected_deck() else {
                return;
            };
            let form = TextForm::filled(&deck.name, &deck.description);
            let id = deck.id.clone();
            self.deck_form = form;
            self.editing_deck_id = Some(id);
        } else {
            self.deck_form = TextForm::default();
            self.editing_deck_id = None;
        }
        self.screen = Screen::DeckForm;
    }

    pub fn save_deck_form(&mut self) {
        let name = self.deck_form.value(0).to_string();
        let description = self.deck_form.value(1).to_string();
        if name.is_empty() {
            self.set_status("Deck name is required".to_string());
            return;
        }

        match self.editing_deck_id.take() {
            Some(deck_id) => {
                match self.update_deck_details(&deck_id, name, description) {
                    Ok(()) => self.set_status("Deck updated".to_string()),
                    Err(e) => self.set_status(format!("Save failed: {}", e)),
                }
                self.screen = Screen::DeckSelect;
            }
            None => {
                let mut deck = Deck::new(name);
                deck.description = description;
                if let Err(e) = self.storage.save_deck(&deck) {
                    self.set_status(format!("Save failed: {}", e));
                    return;
                }
                log::info!("Created deck '{}'", deck.name);
                self.current_deck = Some(deck);
                self.open_add_card();
            }
        }
        self.refresh_deck_list();
    }

    fn update_deck_details(
        &self,
        deck_id: &str,
        name: String,
        description: String,
    ) -> anyhow::Result<()> {
        let mut deck = self
            .storage
            .load_deck(deck_id)?
            .ok_or_else(|| anyhow!("Deck not found: {}", deck_id))?;
        deck.name = name;
        deck.description = description;
        self.storage.save_deck(&deck)?;
        Ok(())
    }

    pub fn browse_selected_deck(&mut self) {
        let Some(deck_id) = self.selected_deck().map(|d| d.id.clone()) else {
            return;
        };
        match self.storage.load_deck(&deck_id) {
            Ok(Some(deck)) => {
                self.current_deck = Some(deck);
                self.card_list_state.select(None);
                self.enter_card_browser();
            }
            Ok(None) => self.set_status(format!("Deck not found: {}", deck_id)),
            Err(e) => self.set_status(format!("Could not load deck: {}", e)),
        }
    }

    pub fn enter_card_browser(&mut self) {
        let len = self.current_deck.as_ref().map_or(0, |d| d.cards.len());
        let selected = match self.card_list_state.selected() {
            _ if len == 0 => None,
            Some(i) => Some(i.min(len - 1)),
            None => Some(0),
        };
        self.card_list_state.select(selected);
        self.card_edit = None;
        self.card_delete_pending = false;
        self.screen = Screen::CardBrowser;
    }

    fn selected_card(&self) -> Option<&Card> {
        let deck = self.current_deck.as_ref()?;
        deck.cards.get(self.card_list_state.selected()?)
    }

    pub fn open_add_card(&mut self) {
        self.card_form = TextForm::default();
        self.screen = Screen::AddCard;
    }

    /// Add the typed card to the current deck. New cards start with no stats.
    pub fn add_card(&mut self) {
        let question = self.card_form.value(0).to_string();
        let answer = self.card_form.value(1).to_string();
        if question.is_empty() || answer.is_empty() {
            self.set_status("Question and answer are required".to_string());
            return;
        }
        let Some(deck) = self.current_deck.as_mut() else {
            return;
        };

        deck.add_card(question, answer);
        let count = deck.cards.len();
        match self.storage.save_deck(deck) {
            Ok(_) => {
                self.card_form = TextForm::default();
                self.set_status(format!("Card added ({} in deck)", count));
            }
            Err(e) => self.set_status(format!("Save failed: {}", e)),
        }
    }

    pub fn start_edit_card(&mut self) {
        if let Some(card) = self.selected_card() {
            self.card_edit = Some(TextForm::filled(&card.question, &card.answer));
            self.card_delete_pending = false;
        }
    }

    pub fn save_card_edit(&mut self) {
        let Some(form) = self.card_edit.take() else {
            return;
        };
        let question = form.value(0).to_string();
        let answer = form.value(1).to_string();
        if question.is_empty() || answer.is_empty() {
            self.set_status("Question and answer are required".to_string());
            self.card_edit = Some(form);
            return;
        }
        let Some(card_id) = self.selected_card().map(|c| c.id.clone()) else {
            return;
        };
        let Some(deck) = self.current_deck.as_mut() else {
            return;
        };

        deck.update_card(&card_id, question, answer);
        if let Err(e) = self.storage.save_deck(deck) {
            self.set_status(format!("Save failed: {}", e));
        }
    }

    pub fn delete_selected_card(&mut self) {
        self.card_delete_pending = false;
        let Some(card_id) = self.selected_card().map(|c| c.id.clone()) else {
            return;
        };
        let Some(deck) = self.current_deck.as_mut() else {
            return;
        };

        deck.delete_card(&card_id);
        let remaining = deck.cards.len();
        if let Err(e) = self.storage.save_deck(deck) {
            self.set_status(format!("Delete failed: {}", e));
        }
        self.enter_card_browser();
        if remaining == 0 {
            self.card_list_state.select(None);
        }
    }

    pub fn leave_card_browser(&mut self) {
        self.current_deck = None;
        self.card_edit = None;
        self.refresh_deck_list();
        self.screen = Screen::DeckSelect;
    }

    // ══════════════════════════════════════════════════════════════════════
    // Study
    // ══════════════════════════════════════════════════════════════════════

    pub fn start_study(&mut self, deck_id: &str) {
        let deck = match self.storage.load_deck(deck_id) {
            Ok(Some(deck)) => deck,
            Ok(None) => {
                self.set_status(format!("Deck not found: {}", deck_id));
                return;
            }
            Err(e) => {
                self.set_status(format!("Could not load deck: {}", e));
                return;
            }
        };

        match StudySession::start(&deck) {
            Ok(session) => {
                self.session = Some(session);
                self.abandon_pending = false;
                self.screen = Screen::Study;
            }
            Err(e) => self.set_status(e.to_string()),
        }
    }

    pub fn flip(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.flip();
        }
    }

    /// Grade the current card. Ignored until the card has been flipped.
    pub fn answer(&mut self, kind: AnswerKind) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.is_flipped() {
            return;
        }

        let update = match kind {
            AnswerKind::Hit => session.hit(),
            AnswerKind::Miss => session.miss(),
        };
        let finished = session.is_finished();

        if let Some(update) = update {
            if let Err(e) = update.apply(&mut self.storage) {
                log::warn!("Could not record {} for card {}: {}", kind.name(), update.card_id, e);
                self.set_status(format!("Stats not saved: {}", e));
            }
        }

        if finished {
            self.player_name = self.config.player_name.clone();
            self.screen = Screen::Finished;
        }
    }

    pub fn abandon_study(&mut self) {
        if let Some(session) = self.session.take() {
            session.abandon();
        }
        self.abandon_pending = false;
        self.refresh_deck_list();
        self.screen = Screen::DeckSelect;
    }

    /// Record the finished game under the typed name.
    pub fn save_game(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let game = session.finalize(&self.player_name);

        if let Err(e) = self.games.record_game(&game) {
            log::error!("Could not record game: {}", e);
            self.set_status(format!("Save failed: {}", e));
            self.session = Some(session);
            return;
        }

        let name = self.player_name.trim();
        if !name.is_empty() && name != self.config.player_name {
            self.config.player_name = name.to_string();
            if let Err(e) = self.config.save_to(&self.config_path) {
                log::warn!("Could not remember player name: {}", e);
            }
        }

        self.set_status(format!("Saved {} points for {}", game.score, game.player_name));
        self.refresh_deck_list();
        self.screen = Screen::DeckSelect;
    }

    pub fn discard_game(&mut self) {
        self.session = None;
        self.set_status("Game discarded".to_string());
        self.refresh_deck_list();
        self.screen = Screen::DeckSelect;
    }

    // ══════════════════════════════════════════════════════════════════════
    // Ranking & Summary
    // ══════════════════════════════════════════════════════════════════════

    pub fn open_ranking(&mut self) {
        self.game_delete_pending = false;
        self.reload_ranking();
        self.screen = Screen::Ranking;
    }

    fn reload_ranking(&mut self) {
        self.ranking = self
            .games
            .ranking(self.ranking_filter.as_deref())
            .unwrap_or_else(|e| {
                log::warn!("Could not load games: {}", e);
                Vec::new()
            });
        let selected = match self.ranking_state.selected() {
            _ if self.ranking.is_empty() => None,
            Some(i) => Some(i.min(self.ranking.len() - 1)),
            None => Some(0),
        };
        self.ranking_state.select(selected);
    }

    /// Step the ranking filter through all decks, then back to every deck.
    pub fn cycle_ranking_filter(&mut self) {
        let next = match &self.ranking_filter {
            None => self.deck_list.first(),
            Some(current) => self
                .deck_list
                .iter()
                .position(|d| &d.id == current)
                .and_then(|i| self.deck_list.get(i + 1)),
        };
        self.ranking_filter = next.map(|d| d.id.clone());
        self.ranking_state.select(None);
        self.reload_ranking();
    }

    pub fn delete_selected_game(&mut self) {
        let Some(game_id) = self
            .ranking_state
            .selected()
            .and_then(|i| self.ranking.get(i))
            .map(|g| g.id.clone())
        else {
            return;
        };
        match self.games.delete_game(&game_id) {
            Ok(true) => self.set_status("Game deleted".to_string()),
            Ok(false) => {}
            Err(e) => self.set_status(format!("Delete failed: {}", e)),
        }
        self.reload_ranking();
    }

    pub fn open_summary(&mut self) {
        let Some(deck_id) = self.selected_deck().map(|d| d.id.clone()) else {
            return;
        };
        match self.storage.load_deck(&deck_id) {
            Ok(Some(deck)) => {
                self.summary = difficulty::summarize(&deck);
                self.summary_deck_name = deck.name;
                let selected = if self.summary.is_empty() { None } else { Some(0) };
                self.summary_state = TableState::default().with_selected(selected);
                self.screen = Screen::Summary;
            }
            Ok(None) => self.set_status(format!("Deck not found: {}", deck_id)),
            Err(e) => self.set_status(format!("Could not load deck: {}", e)),
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Event Handling
    // ══════════════════════════════════════════════════════════════════════

    pub fn handle_events(&mut self) -> anyhow::Result<()> {
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    return Ok(());
                }
                self.handle_key(key.code);
            }
        }
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyCode) {
        match self.screen {
            Screen::DeckSelect => self.handle_deck_select_keys(key),
            Screen::DeckForm => self.handle_deck_form_keys(key),
            Screen::CardBrowser => self.handle_card_browser_keys(key),
            Screen::AddCard => self.handle_add_card_keys(key),
            Screen::Study => self.handle_study_keys(key),
            Screen::Finished => self.handle_finished_keys(key),
            Screen::Ranking => self.handle_ranking_keys(key),
            Screen::Summary => self.handle_summary_keys(key),
        }
    }

    fn handle_deck_select_keys(&mut self, key: KeyCode) {
        if key != KeyCode::Char('d') {
            self.deck_delete_pending = false;
        }

        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('t') => self.cycle_theme(),
            KeyCode::Char('d') => {
                if self.deck_delete_pending {
                    self.deck_delete_pending = false;
                    self.delete_selected_deck();
                } else if let Some(name) = self.selected_deck().map(|d| d.name.clone()) {
                    self.deck_delete_pending = true;
                    self.set_status(format!("Press d again to delete '{}'", name));
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                select_previous(&mut self.deck_list_state, self.deck_list.len())
            }
            KeyCode::Down | KeyCode::Char('j') => {
                select_next(&mut self.deck_list_state, self.deck_list.len())
            }
            KeyCode::Enter => {
                if let Some(deck_id) = self.selected_deck().map(|d| d.id.clone()) {
                    self.start_study(&deck_id);
                }
            }
            KeyCode::Char('n') => self.open_deck_form(false),
            KeyCode::Char('e') => self.open_deck_form(true),
            KeyCode::Char('b') => self.browse_selected_deck(),
            KeyCode::Char('r') => self.open_ranking(),
            KeyCode::Char('s') => self.open_summary(),
            KeyCode::Char('x') => self.export_backup(),
            _ => {}
        }
    }

    fn handle_deck_form_keys(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.editing_deck_id = None;
                self.screen = Screen::DeckSelect;
            }
            KeyCode::Enter if self.deck_form.focus == 0 => self.deck_form.focus = 1,
            KeyCode::Enter => self.save_deck_form(),
            _ => self.deck_form.edit(key),
        }
    }

    fn handle_add_card_keys(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => self.enter_card_browser(),
            KeyCode::Enter if self.card_form.focus == 0 => self.card_form.focus = 1,
            KeyCode::Enter => self.add_card(),
            _ => self.card_form.edit(key),
        }
    }

    fn handle_card_browser_keys(&mut self, key: KeyCode) {
        if let Some(form) = self.card_edit.as_mut() {
            match key {
                KeyCode::Esc => self.card_edit = None,
                KeyCode::Enter => self.save_card_edit(),
                _ => form.edit(key),
            }
            return;
        }

        if key != KeyCode::Char('d') {
            self.card_delete_pending = false;
        }

        let len = self.current_deck.as_ref().map_or(0, |d| d.cards.len());
        match key {
            KeyCode::Esc | KeyCode::Char('q') => self.leave_card_browser(),
            KeyCode::Up | KeyCode::Char('k') => select_previous(&mut self.card_list_state, len),
            KeyCode::Down | KeyCode::Char('j') => select_next(&mut self.card_list_state, len),
            KeyCode::Char('e') => self.start_edit_card(),
            KeyCode::Char('a') => self.open_add_card(),
            KeyCode::Char('t') => self.cycle_theme(),
            KeyCode::Char('d') => {
                if self.card_delete_pending {
                    self.delete_selected_card();
                } else if self.selected_card().is_some() {
                    self.card_delete_pending = true;
                    self.set_status("Press d again to delete this card".to_string());
                }
            }
            _ => {}
        }
    }

    fn handle_study_keys(&mut self, key: KeyCode) {
        if !matches!(key, KeyCode::Esc | KeyCode::Char('q')) {
            self.abandon_pending = false;
        }

        match key {
            KeyCode::Esc | KeyCode::Char('q') => {
                if self.abandon_pending {
                    self.abandon_study();
                } else {
                    self.abandon_pending = true;
                    self.set_status("Press Esc or q again to abandon this game".to_string());
                }
            }
            KeyCode::Char('t') => self.cycle_theme(),
            KeyCode::Char(' ') | KeyCode::Enter => self.flip(),
            KeyCode::Char('y') | KeyCode::Right => self.answer(AnswerKind::Hit),
            KeyCode::Char('n') | KeyCode::Left => self.answer(AnswerKind::Miss),
            _ => {}
        }
    }

    fn handle_finished_keys(&mut self, key: KeyCode) {
        match key {
            KeyCode::Enter => self.save_game(),
            KeyCode::Esc => self.discard_game(),
            KeyCode::Backspace => {
                self.player_name.pop();
            }
            KeyCode::Char(c) => {
                if self.player_name.chars().count() < MAX_NAME_LEN {
                    self.player_name.push(c);
                }
            }
            _ => {}
        }
    }

    fn handle_ranking_keys(&mut self, key: KeyCode) {
        if key != KeyCode::Char('d') {
            self.game_delete_pending = false;
        }

        match key {
            KeyCode::Esc | KeyCode::Char('q') => self.screen = Screen::DeckSelect,
            KeyCode::Char('t') => self.cycle_theme(),
            KeyCode::Char('f') => self.cycle_ranking_filter(),
            KeyCode::Up | KeyCode::Char('k') => {
                select_previous_row(&mut self.ranking_state, self.ranking.len())
            }
            KeyCode::Down | KeyCode::Char('j') => {
                select_next_row(&mut self.ranking_state, self.ranking.len())
            }
            KeyCode::Char('d') => {
                if self.game_delete_pending {
                    self.game_delete_pending = false;
                    self.delete_selected_game();
                } else if self.ranking_state.selected().is_some() {
                    self.game_delete_pending = true;
                    self.set_status("Press d again to delete this game".to_string());
                }
            }
            _ => {}
        }
    }

    fn handle_summary_keys(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::Char('q') => self.screen = Screen::DeckSelect,
            KeyCode::Char('t') => self.cycle_theme(),
            KeyCode::Up | KeyCode::Char('k') => {
                select_previous_row(&mut self.summary_state, self.summary.len())
            }
            KeyCode::Down | KeyCode::Char('j') => {
                select_next_row(&mut self.summary_state, self.summary.len())
            }
            _ => {}
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Rendering
    // ══════════════════════════════════════════════════════════════════════

    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();

        // Clear with background
        frame.render_widget(Clear, area);
        frame.render_widget(
            Block::default().style(Style::default().bg(self.theme.colors.bg_dark)),
            area,
        );

        match self.screen {
            Screen::DeckSelect => self.render_deck_select(frame, area),
            Screen::DeckForm => self.render_deck_form(frame, area),
            Screen::CardBrowser => self.render_card_browser(frame, area),
            Screen::AddCard => self.render_add_card(frame, area),
            Screen::Study => self.render_study(frame, area),
            Screen::Finished => self.render_finished(frame, area),
            Screen::Ranking => self.render_ranking(frame, area),
            Screen::Summary => self.render_summary(frame, area),
        }
    }

    fn render_deck_select(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::vertical([
            Constraint::Length(2),   // Top padding
            Constraint::Length(9),   // Logo
            Constraint::Length(1),   // Spacing
            Constraint::Min(5),      // Deck list
            Constraint::Length(3),   // Help
        ])
        .split(area);

        Logo::render_to(&self.theme, chunks[1], frame.buffer_mut());

        let list_area = centered_rect(60, 100, chunks[3]);

        let items: Vec<ListItem> = self
            .deck_list
            .iter()
            .map(|deck| {
                let mut spans = vec![
                    Span::styled(&deck.name, Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(
                        format!(" ({} cards)", deck.card_count),
                        Style::default().fg(self.theme.colors.text_muted),
                    ),
                ];
                if !deck.description.is_empty() {
                    spans.push(Span::styled(
                        format!("  {}", deck.description),
                        Style::default().fg(self.theme.colors.text_dim),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(self.theme.colors.primary))
                    .title(" Decks ")
                    .title_style(self.theme.highlight()),
            )
            .highlight_style(self.theme.selected())
            .highlight_symbol("> ");

        frame.render_stateful_widget(list, list_area, &mut self.deck_list_state);

        let theme_hint = format!("[{}]", self.theme.name.display_name());
        let hints_data: [(&str, &str); 11] = [
            ("j/k", "nav"),
            ("Enter", "study"),
            ("n", "new"),
            ("e", "edit"),
            ("b", "cards"),
            ("r", "ranking"),
            ("s", "summary"),
            ("d", "del"),
            ("x", "export"),
            ("t", &theme_hint),
            ("q", "quit"),
        ];
        frame.render_widget(KeyHints::new(&hints_data, &self.theme), chunks[4]);

        self.render_status(frame, chunks[4]);
    }

    fn render_deck_form(&mut self, frame: &mut Frame, area: Rect) {
        let title = if self.editing_deck_id.is_some() {
            " Edit Deck "
        } else {
            " New Deck "
        };
        let hints = [("Tab", "switch"), ("Enter", "next/save"), ("Esc", "cancel")];
        self.render_form(frame, area, title, ["Name", "Description"], &hints);
    }

    fn render_add_card(&mut self, frame: &mut Frame, area: Rect) {
        let deck_name = self.current_deck.as_ref().map_or("", |d| d.name.as_str());
        let title = format!(" Add Card to {} ", deck_name);
        let hints = [("Tab", "switch"), ("Enter", "next/add"), ("Esc", "done")];
        self.render_form(frame, area, &title, ["Question", "Answer"], &hints);
    }

    fn render_form(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: &str,
        labels: [&str; 2],
        hints: &[(&str, &str)],
    ) {
        let form = match self.screen {
            Screen::AddCard => &self.card_form,
            _ => &self.deck_form,
        };

        let chunks = Layout::vertical([
            Constraint::Length(3),   // Title
            Constraint::Length(1),   // Spacing
            Constraint::Length(3),   // First field
            Constraint::Length(1),   // Spacing
            Constraint::Length(3),   // Second field
            Constraint::Min(1),      // Filler
            Constraint::Length(2),   // Hints
        ])
        .split(area);

        let header = Paragraph::new(Line::from(Span::styled(title, self.theme.title())))
            .alignment(Alignment::Center);
        frame.render_widget(header, chunks[0]);

        for (i, slot) in [chunks[2], chunks[4]].into_iter().enumerate() {
            let field_area = centered_rect(70, 100, slot);
            self.render_input(frame, field_area, labels[i], &form.fields[i], form.focus == i);
        }

        frame.render_widget(KeyHints::new(hints, &self.theme), chunks[6]);
        self.render_status(frame, chunks[6]);
    }

    /// One bordered input line. The focused input shows the cursor after its text.
    fn render_input(&self, frame: &mut Frame, area: Rect, label: &str, value: &str, focused: bool) {
        let border = if focused {
            self.theme.colors.accent
        } else {
            self.theme.colors.text_dim
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border))
            .title(format!(" {} ", label));
        let inner = block.inner(area);

        let visible = tail_to_width(value, (inner.width as usize).saturating_sub(1));
        frame.render_widget(Paragraph::new(visible).block(block), area);

        if focused {
            let x = inner.x + visible.width() as u16;
            frame.set_cursor_position((x, inner.y));
        }
    }

    fn render_card_browser(&mut self, frame: &mut Frame, area: Rect) {
        let Some(deck) = &self.current_deck else {
            return;
        };

        let chunks = Layout::vertical([
            Constraint::Length(3),   // Title
            Constraint::Min(5),      // Content
            Constraint::Length(2),   // Hints
        ])
        .split(area);

        let title = Paragraph::new(Line::from(vec![
            Span::styled(deck.name.as_str(), self.theme.title()),
            Span::styled(
                format!("  ({} cards)", deck.cards.len()),
                Style::default().fg(self.theme.colors.text_muted),
            ),
        ]))
        .alignment(Alignment::Center);
        frame.render_widget(title, chunks[0]);

        let content = Layout::horizontal([
            Constraint::Percentage(35),
            Constraint::Percentage(65),
        ])
        .split(chunks[1]);

        let items: Vec<ListItem> = deck
            .cards
            .iter()
            .map(|card| {
                let preview: String = card.question.chars().take(30).collect();
                ListItem::new(Line::from(vec![
                    Span::raw(preview),
                    Span::styled(
                        format!(" ✓{} ✗{}", card.stats.hits, card.stats.misses),
                        Style::default().fg(self.theme.colors.text_dim),
                    ),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(self.theme.colors.primary))
                    .title(" Cards ")
                    .title_style(self.theme.highlight()),
            )
            .highlight_style(self.theme.selected())
            .highlight_symbol("> ");

        let selected = self
            .card_list_state
            .selected()
            .and_then(|i| deck.cards.get(i))
            .cloned();
        let details_area = content[1];
        frame.render_stateful_widget(list, content[0], &mut self.card_list_state);

        let Some(card) = selected else {
            let empty = Paragraph::new("No cards yet. Press a to add one.")
                .alignment(Alignment::Center)
                .style(Style::default().fg(self.theme.colors.text_muted));
            frame.render_widget(empty, centered_rect(90, 20, details_area));
            self.render_card_browser_hints(frame, chunks[2]);
            return;
        };

        let details = Layout::vertical([
            Constraint::Percentage(40),   // Question
            Constraint::Percentage(40),   // Answer
            Constraint::Min(5),           // Stats
        ])
        .split(details_area);

        if let Some(form) = &self.card_edit {
            let question_area = centered_rect(100, 60, details[0]);
            let answer_area = centered_rect(100, 60, details[1]);
            self.render_input(frame, question_area, "Question", &form.fields[0], form.focus == 0);
            self.render_input(frame, answer_area, "Answer", &form.fields[1], form.focus == 1);
        } else {
            let faces = [
                (" Question ", card.question.as_str(), self.theme.colors.accent),
                (" Answer ", card.answer.as_str(), self.theme.colors.success),
            ];
            for (i, (label, text, color)) in faces.into_iter().enumerate() {
                let face = Paragraph::new(text)
                    .wrap(Wrap { trim: false })
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .border_type(BorderType::Rounded)
                            .border_style(Style::default().fg(color))
                            .title(label),
                    );
                frame.render_widget(face, details[i]);
            }
        }

        let accuracy = card
            .stats
            .accuracy()
            .map_or("n/a".to_string(), |pct| format!("{}%", pct));
        let stats = Paragraph::new(vec![
            Line::from(vec![
                Span::styled("Hits: ", self.theme.highlight()),
                Span::raw(card.stats.hits.to_string()),
                Span::styled("   Misses: ", self.theme.highlight()),
                Span::raw(card.stats.misses.to_string()),
                Span::styled("   Accuracy: ", self.theme.highlight()),
                Span::raw(accuracy),
            ]),
            Line::from(vec![
                Span::styled("Created: ", self.theme.highlight()),
                Span::raw(card.created_at.format("%Y-%m-%d").to_string()),
            ]),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(self.theme.colors.text_dim))
                .title(" Stats "),
        );
        frame.render_widget(stats, details[2]);

        self.render_card_browser_hints(frame, chunks[2]);
    }

    fn render_card_browser_hints(&self, frame: &mut Frame, area: Rect) {
        let hints = if self.card_edit.is_some() {
            KeyHints::new(
                &[("Tab", "switch"), ("Enter", "save"), ("Esc", "cancel")],
                &self.theme,
            )
        } else {
            KeyHints::new(
                &[
                    ("j/k", "nav"),
                    ("a", "add"),
                    ("e", "edit"),
                    ("d", "del"),
                    ("Esc", "back"),
                ],
                &self.theme,
            )
        };
        frame.render_widget(hints, area);
        self.render_status(frame, area);
    }

    fn render_study(&mut self, frame: &mut Frame, area: Rect) {
        let Some(session) = &self.session else {
            return;
        };

        let chunks = Layout::vertical([
            Constraint::Length(3),   // Header
            Constraint::Length(1),   // Score
            Constraint::Length(1),   // Gauge
            Constraint::Length(1),   // Levels
            Constraint::Length(1),   // Separator
            Constraint::Min(10),     // Card
            Constraint::Length(1),   // Separator
            Constraint::Length(5),   // Buttons
            Constraint::Length(2),   // Hints
        ])
        .split(area);

        let progress = session.progress();
        let current = session.current_card();

        let header = Paragraph::new(Line::from(Span::styled(
            session.deck_name(),
            self.theme.title(),
        )))
        .alignment(Alignment::Center);
        frame.render_widget(header, chunks[0]);

        frame.render_widget(
            ScoreBar::new(session.score(), &progress, session.round(), &self.theme),
            chunks[1],
        );

        let gauge = Gauge::default()
            .gauge_style(
                Style::default()
                    .fg(self.theme.colors.success)
                    .bg(self.theme.colors.bg_highlight),
            )
            .ratio(f64::from(progress.percent_complete) / 100.0)
            .label(format!(
                "{}% mastered, {} to go",
                progress.percent_complete,
                progress.pending()
            ));
        frame.render_widget(gauge, centered_rect(60, 100, chunks[2]));

        frame.render_widget(
            LevelBar::new(&progress, current.map(|c| c.level), &self.theme),
            chunks[3],
        );

        if let Some(card) = current {
            let widget = if session.is_flipped() {
                FlashcardWidget::answer(&card.answer, &self.theme)
            } else {
                FlashcardWidget::question(&card.question, card.level, &self.theme)
            };
            frame.render_widget(widget, centered_rect(80, 100, chunks[5]));
        }

        frame.render_widget(
            AnswerButtons::new(session.is_flipped(), &self.theme),
            centered_rect(90, 100, chunks[7]),
        );

        let hints = if session.is_flipped() {
            KeyHints::new(
                &[("y/→", "hit"), ("n/←", "miss"), ("Esc", "abandon")],
                &self.theme,
            )
        } else {
            KeyHints::new(
                &[("Space", "show answer"), ("t", "theme"), ("Esc", "abandon")],
                &self.theme,
            )
        };
        frame.render_widget(hints, chunks[8]);

        self.render_status(frame, chunks[8]);
    }

    fn render_finished(&mut self, frame: &mut Frame, area: Rect) {
        let Some(session) = &self.session else {
            return;
        };
        let card_area = centered_rect(60, 60, area);
        frame.render_widget(
            FinishedScreen::new(
                session.deck_name(),
                session.score(),
                session.progress().mastered,
                &self.player_name,
                &self.theme,
            ),
            card_area,
        );

        let status_area = Rect {
            y: (card_area.y + card_area.height).min(area.height.saturating_sub(1)),
            height: 1,
            ..card_area
        };
        self.render_status(frame, status_area);
    }

    fn render_ranking(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::vertical([
            Constraint::Length(3),   // Title
            Constraint::Min(5),      // Table
            Constraint::Length(3),   // Help
        ])
        .split(area);

        let deck_names: HashMap<&str, &str> = self
            .deck_list
            .iter()
            .map(|d| (d.id.as_str(), d.name.as_str()))
            .collect();

        let filter_name = match &self.ranking_filter {
            Some(id) => deck_names.get(id.as_str()).copied().unwrap_or(id.as_str()),
            None => "All decks",
        };
        let title = Paragraph::new(Line::from(vec![
            Span::styled("Ranking", self.theme.title()),
            Span::styled(format!("  ·  {}", filter_name), self.theme.muted()),
        ]))
        .alignment(Alignment::Center);
        frame.render_widget(title, chunks[0]);

        let table_area = centered_rect(80, 100, chunks[1]);
        if self.ranking.is_empty() {
            let empty = Paragraph::new("No games recorded yet")
                .alignment(Alignment::Center)
                .style(self.theme.muted());
            frame.render_widget(empty, table_area);
        } else {
            let rows: Vec<Row> = self
                .ranking
                .iter()
                .enumerate()
                .map(|(i, game)| {
                    let deck_name = deck_names
                        .get(game.deck_id.as_str())
                        .copied()
                        .unwrap_or("(deleted deck)");
                    Row::new(vec![
                        Cell::from(format!("{}", i + 1)),
                        Cell::from(game.player_name.clone()),
                        Cell::from(deck_name.to_string()),
                        Cell::from(game.date.to_string()),
                        Cell::from(Span::styled(
                            game.score.to_string(),
                            self.theme.score(game.score),
                        )),
                    ])
                    .style(Style::default().fg(self.theme.colors.text))
                })
                .collect();

            let table = Table::new(
                rows,
                [
                    Constraint::Length(4),
                    Constraint::Percentage(30),
                    Constraint::Percentage(35),
                    Constraint::Length(12),
                    Constraint::Length(8),
                ],
            )
            .header(
                Row::new(vec!["#", "Player", "Deck", "Date", "Score"])
                    .style(self.theme.highlight()),
            )
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(self.theme.colors.primary)),
            )
            .highlight_style(self.theme.selected())
            .highlight_symbol("> ");

            frame.render_stateful_widget(table, table_area, &mut self.ranking_state);
        }

        let hints = KeyHints::new(
            &[("j/k", "nav"), ("f", "filter deck"), ("d", "delete"), ("Esc", "back")],
            &self.theme,
        );
        frame.render_widget(hints, chunks[2]);

        self.render_status(frame, chunks[2]);
    }

    fn render_summary(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::vertical([
            Constraint::Length(3),   // Title
            Constraint::Min(5),      // Table
            Constraint::Length(3),   // Help
        ])
        .split(area);

        let title = Paragraph::new(Line::from(vec![
            Span::styled("Difficulty", self.theme.title()),
            Span::styled(format!("  ·  {}", self.summary_deck_name), self.theme.muted()),
        ]))
        .alignment(Alignment::Center);
        frame.render_widget(title, chunks[0]);

        let rows: Vec<Row> = self
            .summary
            .iter()
            .map(|row| {
                Row::new(vec![
                    Cell::from(Span::styled(row.label.name(), self.theme.difficulty(row.label))),
                    Cell::from(format!("{}%", row.miss_percent)),
                    Cell::from(Span::styled(
                        row.hits.to_string(),
                        Style::default().fg(self.theme.colors.hit),
                    )),
                    Cell::from(Span::styled(
                        row.misses.to_string(),
                        Style::default().fg(self.theme.colors.miss),
                    )),
                    Cell::from(row.question.clone()),
                    Cell::from(row.answer.clone()),
                ])
                .style(Style::default().fg(self.theme.colors.text))
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(9),
                Constraint::Length(6),
                Constraint::Length(6),
                Constraint::Length(6),
                Constraint::Percentage(45),
                Constraint::Percentage(30),
            ],
        )
        .header(
            Row::new(vec!["Level", "Miss", "Hits", "Misses", "Question", "Answer"])
                .style(self.theme.highlight()),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(self.theme.colors.primary)),
        )
        .highlight_style(self.theme.selected());

        let table_area = centered_rect(90, 100, chunks[1]);
        frame.render_stateful_widget(table, table_area, &mut self.summary_state);

        let hints = KeyHints::new(&[("j/k", "nav"), ("Esc", "back")], &self.theme);
        frame.render_widget(hints, chunks[2]);
    }

    /// Show the status message, if recent, on the line above `area`.
    fn render_status(&self, frame: &mut Frame, area: Rect) {
        if let Some((ref msg, time)) = self.status_message {
            if time.elapsed().as_secs() < 5 {
                let status = Paragraph::new(msg.as_str())
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(self.theme.colors.warning));
                let status_area = Rect {
                    x: area.x,
                    y: area.y.saturating_sub(1),
                    width: area.width,
                    height: 1,
                };
                frame.render_widget(status, status_area);
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Helper Functions
// ══════════════════════════════════════════════════════════════════════════

/// Create a centered rectangle.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .split(r);

    Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .split(popup_layout[1])[1]
}

fn wrap_previous(selected: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match selected {
        Some(0) | None => len - 1,
        Some(i) => i - 1,
    })
}

fn wrap_next(selected: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match selected {
        Some(i) if i + 1 < len => i + 1,
        _ => 0,
    })
}

fn select_previous(state: &mut ListState, len: usize) {
    state.select(wrap_previous(state.selected(), len));
}

fn select_next(state: &mut ListState, len: usize) {
    state.select(wrap_next(state.selected(), len));
}

fn select_previous_row(state: &mut TableState, len: usize) {
    state.select(wrap_previous(state.selected(), len));
}

fn select_next_row(state: &mut TableState, len: usize) {
    state.select(wrap_next(state.selected(), len));
}

#[cfg(test)]
mod tests {
    use super::*;
    use levelcards::models::CardStats;
    use tempfile::TempDir;

    fn create_test_app() -> (App, TempDir) {
        let temp = TempDir::new().unwrap();
        let storage = DeckStorage::new(temp.path().join("decks")).unwrap();
        let games = GameStorage::new(temp.path().join("games.json"));
        let mut app = App::new(storage, games, Config::default());
        app.config_path = temp.path().join("config.toml");
        (app, temp)
    }

    fn save_single_card_deck(app: &mut App) -> String {
        let mut deck = Deck::new("Solo".to_string());
        deck.add_card("2 + 2".to_string(), "4".to_string());
        app.storage.save_deck(&deck).unwrap();
        app.refresh_deck_list();
        deck.id
    }

    #[test]
    fn test_answer_requires_flip() {
        let (mut app, _temp) = create_test_app();
        let deck_id = save_single_card_deck(&mut app);
        app.start_study(&deck_id);
        assert_eq!(app.screen, Screen::Study);

        app.handle_key(KeyCode::Char('y'));
        let session = app.session.as_ref().unwrap();
        assert_eq!(session.score(), 0.0);
        assert_eq!(session.cards()[0].hits, 0);
    }

    #[test]
    fn test_full_game_is_recorded() {
        let (mut app, _temp) = create_test_app();
        let deck_id = save_single_card_deck(&mut app);
        app.start_study(&deck_id);

        app.handle_key(KeyCode::Char(' '));
        app.handle_key(KeyCode::Char('n'));
        for _ in 0..6 {
            app.handle_key(KeyCode::Char(' '));
            app.handle_key(KeyCode::Char('y'));
        }
        assert_eq!(app.screen, Screen::Finished);

        let deck = app.storage.load_deck(&deck_id).unwrap().unwrap();
        assert_eq!(deck.cards[0].stats.hits, 6);
        assert_eq!(deck.cards[0].stats.misses, 1);

        for c in "Ana".chars() {
            app.handle_key(KeyCode::Char(c));
        }
        app.handle_key(KeyCode::Enter);

        assert_eq!(app.screen, Screen::DeckSelect);
        assert!(app.session.is_none());
        let games: Vec<GameResult> = app.games.list_games().unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].player_name, "Ana");
        assert_eq!(games[0].score, 4.5);
        assert_eq!(app.config.player_name, "Ana");
        assert_eq!(Config::load_from(&app.config_path).unwrap().player_name, "Ana");
    }

    #[test]
    fn test_abandon_needs_second_press() {
        let (mut app, _temp) = create_test_app();
        let deck_id = save_single_card_deck(&mut app);
        app.start_study(&deck_id);

        app.handle_key(KeyCode::Esc);
        assert_eq!(app.screen, Screen::Study);
        app.handle_key(KeyCode::Char(' '));
        app.handle_key(KeyCode::Esc);
        assert_eq!(app.screen, Screen::Study);
        app.handle_key(KeyCode::Esc);
        assert_eq!(app.screen, Screen::DeckSelect);
        assert!(app.session.is_none());
        assert!(app.games.list_games().unwrap().is_empty());
    }

    #[test]
    fn test_q_twice_abandons() {
        let (mut app, _temp) = create_test_app();
        let deck_id = save_single_card_deck(&mut app);
        app.start_study(&deck_id);

        app.handle_key(KeyCode::Char('q'));
        assert_eq!(app.screen, Screen::Study);
        app.handle_key(KeyCode::Char('q'));
        assert_eq!(app.screen, Screen::DeckSelect);
        assert!(app.session.is_none());
    }

    fn select_deck(app: &mut App, deck_id: &str) {
        let index = app.deck_list.iter().position(|d| d.id == deck_id).unwrap();
        app.deck_list_state.select(Some(index));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(KeyCode::Char(c));
        }
    }

    #[test]
    fn test_new_deck_card_can_be_studied() {
        let (mut app, _temp) = create_test_app();
        app.handle_key(KeyCode::Char('n'));
        assert_eq!(app.screen, Screen::DeckForm);
        type_text(&mut app, "Verbs");
        app.handle_key(KeyCode::Enter);
        type_text(&mut app, "Spanish");
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.screen, Screen::AddCard);

        type_text(&mut app, " hablar ");
        app.handle_key(KeyCode::Enter);
        type_text(&mut app, "to speak");
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.screen, Screen::AddCard);
        assert!(app.card_form.fields.iter().all(String::is_empty));

        let deck_id = app.current_deck.as_ref().unwrap().id.clone();
        let deck = app.storage.load_deck(&deck_id).unwrap().unwrap();
        assert_eq!(deck.name, "Verbs");
        assert_eq!(deck.description, "Spanish");
        assert_eq!(deck.cards.len(), 1);
        assert_eq!(deck.cards[0].question, "hablar");
        assert_eq!(deck.cards[0].stats, CardStats::default());

        app.handle_key(KeyCode::Esc);
        assert_eq!(app.screen, Screen::CardBrowser);
        app.handle_key(KeyCode::Esc);
        assert_eq!(app.screen, Screen::DeckSelect);
        assert!(app.deck_list.iter().any(|d| d.id == deck_id && d.card_count == 1));

        select_deck(&mut app, &deck_id);
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.screen, Screen::Study);
        let session = app.session.as_ref().unwrap();
        assert_eq!(session.current_card().unwrap().question, "hablar");
    }

    #[test]
    fn test_add_card_requires_both_sides() {
        let (mut app, _temp) = create_test_app();
        let deck_id = save_single_card_deck(&mut app);
        select_deck(&mut app, &deck_id);
        app.handle_key(KeyCode::Char('b'));
        app.handle_key(KeyCode::Char('a'));
        assert_eq!(app.screen, Screen::AddCard);

        type_text(&mut app, "Lonely question");
        app.handle_key(KeyCode::Enter);
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.current_deck.as_ref().unwrap().cards.len(), 1);
        assert_eq!(app.card_form.fields[0], "Lonely question");
    }

    #[test]
    fn test_edit_and_delete_card_in_browser() {
        let (mut app, _temp) = create_test_app();
        let mut deck = Deck::new("Math".to_string());
        deck.add_card("2 + 2".to_string(), "4".to_string());
        deck.add_card("3 * 3".to_string(), "9".to_string());
        deck.cards[0].stats.hits = 2;
        app.storage.save_deck(&deck).unwrap();
        app.refresh_deck_list();
        select_deck(&mut app, &deck.id);

        app.handle_key(KeyCode::Char('b'));
        assert_eq!(app.screen, Screen::CardBrowser);
        assert_eq!(app.card_list_state.selected(), Some(0));

        app.handle_key(KeyCode::Char('e'));
        for _ in 0..5 {
            app.handle_key(KeyCode::Backspace);
        }
        type_text(&mut app, "2 + 3");
        app.handle_key(KeyCode::Tab);
        app.handle_key(KeyCode::Backspace);
        type_text(&mut app, "5");
        app.handle_key(KeyCode::Enter);
        assert!(app.card_edit.is_none());

        let saved = app.storage.load_deck(&deck.id).unwrap().unwrap();
        assert_eq!(saved.cards[0].id, deck.cards[0].id);
        assert_eq!(saved.cards[0].question, "2 + 3");
        assert_eq!(saved.cards[0].answer, "5");
        assert_eq!(saved.cards[0].stats.hits, 2);

        app.handle_key(KeyCode::Char('j'));
        app.handle_key(KeyCode::Char('d'));
        assert_eq!(app.current_deck.as_ref().unwrap().cards.len(), 2);
        app.handle_key(KeyCode::Char('d'));

        let saved = app.storage.load_deck(&deck.id).unwrap().unwrap();
        assert_eq!(saved.cards.len(), 1);
        assert_eq!(saved.cards[0].question, "2 + 3");
        assert_eq!(app.card_list_state.selected(), Some(0));
    }

    #[test]
    fn test_deck_form_requires_name_and_edits_in_place() {
        let (mut app, _temp) = create_test_app();
        let deck_id = save_single_card_deck(&mut app);
        let deck_count = app.deck_list.len();

        app.handle_key(KeyCode::Char('n'));
        app.handle_key(KeyCode::Enter);
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.screen, Screen::DeckForm);
        assert_eq!(app.deck_list.len(), deck_count);
        app.handle_key(KeyCode::Esc);

        select_deck(&mut app, &deck_id);
        app.handle_key(KeyCode::Char('e'));
        assert_eq!(app.deck_form.fields[0], "Solo");
        type_text(&mut app, " Deck");
        app.handle_key(KeyCode::Enter);
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.screen, Screen::DeckSelect);

        let saved = app.storage.load_deck(&deck_id).unwrap().unwrap();
        assert_eq!(saved.name, "Solo Deck");
        assert_eq!(saved.cards.len(), 1);
        assert_eq!(app.deck_list.len(), deck_count);
    }

    #[test]
    fn test_empty_deck_stays_on_deck_list() {
        let (mut app, _temp) = create_test_app();
        let deck = Deck::new("Empty".to_string());
        app.storage.save_deck(&deck).unwrap();

        app.start_study(&deck.id);
        assert_eq!(app.screen, Screen::DeckSelect);
        assert!(app.session.is_none());
        assert!(app.status_message.is_some());
    }

    #[test]
    fn test_ranking_filter_cycles_back_to_all() {
        let (mut app, _temp) = create_test_app();
        save_single_card_deck(&mut app);
        assert_eq!(app.deck_list.len(), 2);

        app.open_ranking();
        assert_eq!(app.ranking_filter, None);
        app.cycle_ranking_filter();
        assert_eq!(app.ranking_filter.as_deref(), Some(app.deck_list[0].id.as_str()));
        app.cycle_ranking_filter();
        assert_eq!(app.ranking_filter.as_deref(), Some(app.deck_list[1].id.as_str()));
        app.cycle_ranking_filter();
        assert_eq!(app.ranking_filter, None);
    }

    #[test]
    fn test_theme_choice_is_saved() {
        let (mut app, _temp) = create_test_app();
        let before = app.config.theme.clone();
        app.handle_key(KeyCode::Char('t'));
        assert_ne!(app.config.theme, before);
        assert_eq!(Config::load_from(&app.config_path).unwrap().theme, app.config.theme);
    }

    #[test]
    fn test_wrapping_selection() {
        assert_eq!(wrap_next(Some(2), 3), Some(0));
        assert_eq!(wrap_next(None, 3), Some(0));
        assert_eq!(wrap_previous(Some(0), 3), Some(2));
        assert_eq!(wrap_previous(Some(1), 3), Some(0));
        assert_eq!(wrap_next(Some(0), 0), None);
    }
}
