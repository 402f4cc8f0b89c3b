//! Print recently finished games

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use gridlock_core::GameRecord;

use super::open_store;
use crate::config::ConfigLoader;

const DEFAULT_HISTORY_LIMIT: usize = 20;

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Number of games to show
    #[arg(short, long, default_value_t = DEFAULT_HISTORY_LIMIT)]
    pub limit: usize,

    /// Read from this database file instead of the configured store
    #[arg(long)]
    pub database: Option<PathBuf>,
}

pub async fn run(args: HistoryArgs) -> Result<()> {
    let mut config = ConfigLoader::load()?;
    if let Some(database) = &args.database {
        config.storage.database = database.to_string_lossy().into_owned();
        config.storage.remote_url = None;
    }

    let store = open_store(&config.storage).await?;
    let records = store.recent_results(args.limit).await?;

    if records.is_empty() {
        println!("No finished games.");
    } else {
        println!("{}", render(&records));
    }
    Ok(())
}

fn render(records: &[GameRecord]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Finished").fg(Color::Cyan),
        Cell::new("Players").fg(Color::Cyan),
        Cell::new("Winner").fg(Color::Cyan),
        Cell::new("Reason").fg(Color::Cyan),
        Cell::new("Duration").fg(Color::Cyan),
    ]);

    for record in records {
        table.add_row(vec![
            Cell::new(record.finished_at.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(format!("{} vs {}", record.player1, record.player2)),
            Cell::new(&record.winner),
            Cell::new(record.reason),
            Cell::new(format!("{:.1}s", record.duration_seconds)),
        ]);
    }
    table
}
