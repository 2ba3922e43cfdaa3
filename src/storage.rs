//! Storage module for saving and loading decks.

use anyhow::{anyhow, bail, Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::games::GameStorage;
use crate::models::{AnswerKind, CardStats, Deck, GameResult};
use crate::study::DeckStore;

/// Bundled deck: World Capitals
const BUNDLED_CAPITALS: &str = include_str!("../bundled_decks/world-capitals.json");

/// Root directory for decks and recorded games.
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("levelcards")
}

/// Handles deck persistence, one JSON file per deck.
pub struct DeckStorage {
    decks_dir: PathBuf,
}

impl DeckStorage {
    pub fn new(decks_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&decks_dir)
            .with_context(|| format!("Failed to create decks directory: {:?}", decks_dir))?;

        let storage = Self { decks_dir };
        storage.install_bundled_decks();
        Ok(storage)
    }

    /// Install the starter deck when the directory holds no decks yet.
    fn install_bundled_decks(&self) {
        if let Ok(entries) = fs::read_dir(&self.decks_dir) {
            if entries
                .filter_map(|e| e.ok())
                .any(|e| e.path().extension().map_or(false, |ext| ext == "json"))
            {
                return;
            }
        }

        match serde_json::from_str::<Deck>(BUNDLED_CAPITALS) {
            Ok(mut deck) => {
                for card in &mut deck.cards {
                    card.stats = CardStats::default();
                }
                match self.save_deck(&deck) {
                    Ok(_) => log::info!("Installed starter deck '{}'", deck.name),
                    Err(e) => log::warn!("Could not install starter deck: {}", e),
                }
            }
            Err(e) => log::warn!("Bundled deck is invalid: {}", e),
        }
    }

    fn deck_path(&self, deck_id: &str) -> PathBuf {
        self.decks_dir.join(format!("{}.json", deck_id))
    }

    /// Save a deck to disk.
    pub fn save_deck(&self, deck: &Deck) -> Result<PathBuf> {
        let path = self.deck_path(&deck.id);
        let json = serde_json::to_string_pretty(deck)?;
        fs::write(&path, json).with_context(|| format!("Failed to write deck: {:?}", path))?;
        Ok(path)
    }

    /// Load a deck from disk.
    pub fn load_deck(&self, deck_id: &str) -> Result<Option<Deck>> {
        let path = self.deck_path(deck_id);
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read deck: {:?}", path))?;
        let deck: Deck = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse deck: {:?}", path))?;
        Ok(Some(deck))
    }

    /// Delete a deck file.
    pub fn delete_deck(&self, deck_id: &str) -> Result<bool> {
        let path = self.deck_path(deck_id);
        if path.exists() {
            fs::remove_file(&path)?;
            log::info!("Deleted deck {}", deck_id);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// List all available decks.
    pub fn list_decks(&self) -> Result<Vec<DeckInfo>> {
        let mut decks = Vec::new();

        for entry in fs::read_dir(&self.decks_dir)? {
            let path = entry?.path();
            if path.extension().map_or(false, |e| e == "json") {
                match fs::read_to_string(&path)
                    .map_err(anyhow::Error::from)
                    .and_then(|json| Ok(serde_json::from_str::<Deck>(&json)?))
                {
                    Ok(deck) => decks.push(DeckInfo {
                        id: deck.id,
                        name: deck.name,
                        card_count: deck.cards.len(),
                        description: deck.description,
                    }),
                    Err(e) => log::warn!("Skipping unreadable deck {:?}: {}", path, e),
                }
            }
        }

        decks.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(decks)
    }

    /// Import cards from a CSV file with `question` and `answer` columns.
    pub fn import_csv(&self, csv_path: &Path, deck_name: &str) -> Result<Deck> {
        let content = fs::read_to_string(csv_path)
            .with_context(|| format!("Failed to read CSV file: {:?}", csv_path))?;
        parse_csv_deck(&content, deck_name)
    }
}

impl DeckStore for DeckStorage {
    fn increment_card_stat(
        &mut self,
        deck_id: &str,
        card_id: &str,
        kind: AnswerKind,
    ) -> Result<()> {
        let mut deck = self
            .load_deck(deck_id)?
            .ok_or_else(|| anyhow!("Deck not found: {}", deck_id))?;
        deck.increment_card_stat(deck_id, card_id, kind)?;
        self.save_deck(&deck)?;
        Ok(())
    }
}

/// Build a deck from CSV text.
///
/// The header must name `question` and `answer` columns in any position. The
/// separator is `;` when the header contains one, otherwise `,`. Rows missing
/// either side are skipped.
pub fn parse_csv_deck(content: &str, deck_name: &str) -> Result<Deck> {
    let header = content
        .lines()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| anyhow!("CSV file is empty"))?;
    let delimiter = if header.contains(';') { b';' } else { b',' };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim_matches('"').eq_ignore_ascii_case(name))
    };
    let (question_col, answer_col) = match (column("question"), column("answer")) {
        (Some(q), Some(a)) => (q, a),
        _ => bail!("CSV header must contain \"question\" and \"answer\" columns"),
    };

    let mut deck = Deck::new(deck_name.to_string());
    deck.description = "Imported from CSV".to_string();

    for record in reader.records() {
        let record = record?;
        let question = record.get(question_col).unwrap_or_default().trim();
        let answer = record.get(answer_col).unwrap_or_default().trim();
        if !question.is_empty() && !answer.is_empty() {
            deck.add_card(question.to_string(), answer.to_string());
        }
    }

    if deck.cards.is_empty() {
        bail!("No valid cards found in CSV");
    }
    Ok(deck)
}

/// Summary info for a deck.
#[derive(Debug, Clone)]
pub struct DeckInfo {
    pub id: String,
    pub name: String,
    pub card_count: usize,
    pub description: String,
}

/// Backup format containing all decks and recorded games.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Backup {
    pub version: u32,
    pub created_at: chrono::DateTime<chrono::Local>,
    pub decks: Vec<Deck>,
    #[serde(default)]
    pub games: Vec<GameResult>,
}

impl DeckStorage {
    /// Export all decks and games to a backup file.
    pub fn export_backup(&self, games: &GameStorage, path: &Path) -> Result<usize> {
        let mut decks = Vec::new();
        for info in self.list_decks()? {
            if let Some(deck) = self.load_deck(&info.id)? {
                decks.push(deck);
            }
        }

        let backup = Backup {
            version: 1,
            created_at: chrono::Local::now(),
            decks,
            games: games.list_games()?,
        };

        let json = serde_json::to_string_pretty(&backup)?;
        fs::write(path, json).with_context(|| format!("Failed to write backup: {:?}", path))?;

        log::info!("Exported {} decks to {:?}", backup.decks.len(), path);
        Ok(backup.decks.len())
    }

    /// Import decks and games from a backup file, keeping existing entries.
    /// Returns (imported_count, skipped_count) for decks.
    pub fn import_backup(&self, games: &GameStorage, path: &Path) -> Result<(usize, usize)> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read backup: {:?}", path))?;
        let backup: Backup = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse backup: {:?}", path))?;

        let existing_ids: HashSet<String> =
            self.list_decks()?.into_iter().map(|d| d.id).collect();

        let mut imported = 0;
        let mut skipped = 0;
        for deck in backup.decks {
            if existing_ids.contains(&deck.id) {
                skipped += 1;
            } else {
                self.save_deck(&deck)?;
                imported += 1;
            }
        }

        let added_games = games.merge_games(backup.games)?;
        log::info!(
            "Restored {} decks ({} skipped) and {} games from {:?}",
            imported,
            skipped,
            added_games,
            path
        );
        Ok((imported, skipped))
    }

    /// Get default backup path.
    pub fn default_backup_path() -> PathBuf {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(format!("levelcards_backup_{}.json", timestamp))
    }
}
