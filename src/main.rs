//! levelcards - leveled-queue flashcard study TUI
//!
//! Study a deck round after round until every card is mastered, then record
//! the score.

mod ui;

use std::io;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;

use levelcards::config::Config;
use levelcards::difficulty;
use levelcards::games::GameStorage;
use levelcards::storage::DeckStorage;
use ui::App;

// ══════════════════════════════════════════════════════════════════════════
// CLI Arguments
// ══════════════════════════════════════════════════════════════════════════

#[derive(Parser, Debug)]
#[command(name = "levelcards")]
#[command(author, version, about = "Leveled-queue flashcard study TUI", long_about = None)]
struct Args {
    /// Directory containing decks and recorded games
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Import cards from a CSV file with question/answer columns
    #[arg(short, long)]
    import: Option<PathBuf>,

    /// Name for imported deck
    #[arg(long, default_value = "Imported Deck")]
    import_name: String,

    /// Print the score ranking and exit
    #[arg(short, long)]
    ranking: bool,

    /// Restrict the ranking to one deck id
    #[arg(long, requires = "ranking")]
    deck: Option<String>,

    /// Print the difficulty summary of a deck id and exit
    #[arg(short, long)]
    summary: Option<String>,

    /// Export all decks and games to a backup file
    #[arg(long)]
    export: Option<PathBuf>,

    /// Restore decks and games from a backup file
    #[arg(long)]
    restore: Option<PathBuf>,
}

// ══════════════════════════════════════════════════════════════════════════
// Main Entry Point
// ══════════════════════════════════════════════════════════════════════════

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = Config::load().unwrap_or_else(|e| {
        log::warn!("Using default config: {}", e);
        Config::default()
    });

    let data_dir = config.resolve_data_dir(args.data_dir.clone());
    let storage = DeckStorage::new(data_dir.join("decks"))?;
    let games = GameStorage::new(data_dir.join("games.json"));

    if let Some(csv_path) = args.import {
        let deck = storage.import_csv(&csv_path, &args.import_name)?;
        storage.save_deck(&deck)?;
        println!("✓ Imported {} cards into '{}'", deck.cards.len(), deck.name);
        return Ok(());
    }

    if let Some(path) = args.export {
        let count = storage.export_backup(&games, &path)?;
        println!("✓ Exported {} decks to {}", count, path.display());
        return Ok(());
    }

    if let Some(path) = args.restore {
        let (imported, skipped) = storage.import_backup(&games, &path)?;
        println!("✓ Restored {} decks ({} already present)", imported, skipped);
        return Ok(());
    }

    if args.ranking {
        return print_ranking(&storage, &games, args.deck.as_deref());
    }

    if let Some(deck_id) = args.summary {
        return print_summary(&storage, &deck_id);
    }

    run_tui(storage, games, config)
}

fn print_ranking(storage: &DeckStorage, games: &GameStorage, deck_id: Option<&str>) -> Result<()> {
    let ranking = games.ranking(deck_id)?;
    if ranking.is_empty() {
        println!("No games recorded yet.");
        return Ok(());
    }

    println!("{:>3}  {:<20} {:<24} {:<10} {:>8}", "#", "Player", "Deck", "Date", "Score");
    for (i, game) in ranking.iter().enumerate() {
        let deck_name = storage
            .load_deck(&game.deck_id)?
            .map(|d| d.name)
            .unwrap_or_else(|| "(deleted)".to_string());
        println!(
            "{:>3}  {:<20} {:<24} {:<10} {:>8}",
            i + 1,
            game.player_name,
            deck_name,
            game.date,
            game.score
        );
    }
    Ok(())
}

fn print_summary(storage: &DeckStorage, deck_id: &str) -> Result<()> {
    let deck = storage
        .load_deck(deck_id)?
        .ok_or_else(|| anyhow!("Deck not found: {}", deck_id))?;

    println!("{}", deck.name);
    for row in difficulty::summarize(&deck) {
        println!(
            "  {:<8} {:>3}%  {:>4}✓ {:>4}✗  {} → {}",
            row.label.name(),
            row.miss_percent,
            row.hits,
            row.misses,
            row.question,
            row.answer
        );
    }
    Ok(())
}

fn run_tui(storage: DeckStorage, games: GameStorage, config: Config) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(storage, games, config);
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        return Err(err);
    }

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    while app.running {
        terminal.draw(|frame| app.render(frame))?;
        app.handle_events()?;
    }
    Ok(())
}
