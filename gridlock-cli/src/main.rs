use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "gridlock", about = "Real-time connect-four matchmaking server")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the game server
    Serve(commands::serve::ServeArgs),
    /// Show the players with the most wins
    Leaderboard(commands::leaderboard::LeaderboardArgs),
    /// Show recently finished games
    History(commands::history::HistoryArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve(args) => commands::serve::run(args).await,
        Commands::Leaderboard(args) => commands::leaderboard::run(args).await,
        Commands::History(args) => commands::history::run(args).await,
        Commands::Config(args) => commands::config::run(args),
    }
}
