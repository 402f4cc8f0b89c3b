//! Print the top winners from the result store

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use gridlock_core::{LeaderboardEntry, ResultStore};

use super::open_store;
use crate::config::ConfigLoader;

#[derive(Debug, Args)]
pub struct LeaderboardArgs {
    /// Number of players to show
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Read from this database file instead of the configured store
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: LeaderboardArgs) -> Result<()> {
    let mut config = ConfigLoader::load()?;
    if let Some(database) = &args.database {
        config.storage.database = database.to_string_lossy().into_owned();
        config.storage.remote_url = None;
    }

    let store = open_store(&config.storage).await?;
    let limit = args.limit.unwrap_or(config.game.leaderboard_limit);
    let entries = store.top_winners(limit).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        println!("No games won yet.");
    } else {
        println!("{}", render(&entries));
    }
    Ok(())
}

fn render(entries: &[LeaderboardEntry]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("#").fg(Color::Cyan),
        Cell::new("Player").fg(Color::Cyan),
        Cell::new("Wins").fg(Color::Cyan),
    ]);

    for (rank, entry) in entries.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(&entry.username),
            Cell::new(entry.wins),
        ]);
    }
    table
}
