//! Recorded games and the score ranking built from them.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use crate::models::GameResult;
use crate::study::SessionRecorder;

/// Keeps every finished game in a single JSON file.
pub struct GameStorage {
    path: PathBuf,
}

impl GameStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn list_games(&self) -> Result<Vec<GameResult>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read games file: {:?}", self.path))?;
        let games = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse games file: {:?}", self.path))?;
        Ok(games)
    }

    fn save_games(&self, games: &[GameResult]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory: {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(games)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write games file: {:?}", self.path))?;
        Ok(())
    }

    pub fn add_game(&self, game: &GameResult) -> Result<()> {
        let mut games = self.list_games()?;
        games.push(game.clone());
        self.save_games(&games)?;
        log::info!(
            "Recorded game {} for '{}' with score {}",
            game.id,
            game.player_name,
            game.score
        );
        Ok(())
    }

    /// Add games whose ids are not recorded yet. Returns how many were added.
    pub fn merge_games(&self, incoming: Vec<GameResult>) -> Result<usize> {
        let mut games = self.list_games()?;
        let known: HashSet<String> = games.iter().map(|g| g.id.clone()).collect();
        let before = games.len();
        games.extend(incoming.into_iter().filter(|g| !known.contains(&g.id)));
        let added = games.len() - before;
        if added > 0 {
            self.save_games(&games)?;
        }
        Ok(added)
    }

    pub fn delete_game(&self, game_id: &str) -> Result<bool> {
        let mut games = self.list_games()?;
        let before = games.len();
        games.retain(|g| g.id != game_id);
        if games.len() == before {
            return Ok(false);
        }
        self.save_games(&games)?;
        log::info!("Deleted game {}", game_id);
        Ok(true)
    }

    /// Games ordered by score, best first, optionally for one deck only.
    pub fn ranking(&self, deck_id: Option<&str>) -> Result<Vec<GameResult>> {
        Ok(rank_games(self.list_games()?, deck_id))
    }
}

impl SessionRecorder for GameStorage {
    fn record_game(&mut self, game: &GameResult) -> Result<()> {
        self.add_game(game)
    }
}

pub fn rank_games(mut games: Vec<GameResult>, deck_id: Option<&str>) -> Vec<GameResult> {
    if let Some(deck_id) = deck_id {
        games.retain(|g| g.deck_id == deck_id);
    }
    games.sort_by(|a, b| b.score.total_cmp(&a.score));
    games
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn game(deck_id: &str, player: &str, score: f64) -> GameResult {
        GameResult::new(
            deck_id.to_string(),
            player.to_string(),
            NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            score,
            Vec::new(),
        )
    }

    fn create_test_storage() -> (GameStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = GameStorage::new(temp_dir.path().join("data").join("games.json"));
        (storage, temp_dir)
    }

    #[test]
    fn test_missing_file_is_empty() {
        let (storage, _temp) = create_test_storage();
        assert!(storage.list_games().unwrap().is_empty());
        assert!(!storage.delete_game("nothing").unwrap());
    }

    #[test]
    fn test_record_through_trait() {
        let (mut storage, _temp) = create_test_storage();
        let first = game("d1", "Ana", 3.0);
        storage.record_game(&first).unwrap();
        storage.record_game(&game("d1", "Luis", -1.5)).unwrap();

        let games = storage.list_games().unwrap();
        assert_eq!(games.len(), 2);
        assert_eq!(games[0], first);
    }

    #[test]
    fn test_ranking_sorts_and_filters() {
        let (storage, _temp) = create_test_storage();
        storage.add_game(&game("d1", "low", -2.5)).unwrap();
        storage.add_game(&game("d2", "other", 50.0)).unwrap();
        storage.add_game(&game("d1", "high", 12.0)).unwrap();
        storage.add_game(&game("d1", "mid", 0.5)).unwrap();

        let players: Vec<String> = storage
            .ranking(Some("d1"))
            .unwrap()
            .into_iter()
            .map(|g| g.player_name)
            .collect();
        assert_eq!(players, vec!["high", "mid", "low"]);

        let all = storage.ranking(None).unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].player_name, "other");
    }

    #[test]
    fn test_delete_and_merge() {
        let (storage, _temp) = create_test_storage();
        let kept = game("d1", "kept", 1.0);
        let removed = game("d1", "removed", 2.0);
        storage.add_game(&kept).unwrap();
        storage.add_game(&removed).unwrap();

        assert!(storage.delete_game(&removed.id).unwrap());
        assert_eq!(storage.list_games().unwrap(), vec![kept.clone()]);

        let added = storage.merge_games(vec![kept.clone(), removed.clone()]).unwrap();
        assert_eq!(added, 1);
        assert_eq!(storage.list_games().unwrap().len(), 2);
    }
}
