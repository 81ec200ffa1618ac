use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cricket_scorer::aggregate::StatsAggregator;
use cricket_scorer::calculate::{self, InningsProgress, InningsStatus};
use cricket_scorer::config::{AppConfig, StoreBackend};
use cricket_scorer::models::{InningsData, MatchRecord, PlayerStatsView};
use cricket_scorer::storage::{DocumentStore, JsonlStore, MemoryStore, StorageConfig};

#[derive(Parser)]
#[command(name = "cricket-scorer")]
#[command(about = "Cricket match results and career statistics")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./cricket.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the result and scoreboard of a match document
    Result {
        /// Match document (JSON)
        #[arg(long)]
        match_file: PathBuf,
    },

    /// Apply a finished match to career statistics
    Aggregate {
        /// Match document (JSON)
        #[arg(long)]
        match_file: PathBuf,

        /// Owner of the statistics
        #[arg(long)]
        owner: Option<String>,
    },

    /// List career statistics, most runs first
    Stats {
        /// Owner of the statistics
        #[arg(long)]
        owner: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Rewrite the stats collection file with one line per player
    Compact,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    let log_level = cli.log_level.unwrap_or_else(|| config.log_level.clone());

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting cricket-scorer v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Result { match_file } => {
            let record = read_match(&match_file)?;
            print_scoreboard(&record);
        }
        Commands::Aggregate { match_file, owner } => {
            let record = read_match(&match_file)?;
            let aggregator =
                StatsAggregator::new(open_store(&config), config.store.aggregator_options());

            let summary = aggregator
                .aggregate_match_stats(&record, owner.as_deref())
                .await?;

            if summary.is_skipped() {
                eprintln!("No owner given; statistics were not updated.");
            } else {
                println!("\n=== Aggregation Results ===");
                println!("Players updated:   {}", summary.updated.len());
                println!("Already applied:   {}", summary.already_applied.len());
            }
        }
        Commands::Stats { owner, json } => {
            let aggregator =
                StatsAggregator::new(open_store(&config), config.store.aggregator_options());
            let views = aggregator.list_player_stats(owner.as_deref()).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&views)?);
            } else {
                print_stats_table(&views);
            }
        }
        Commands::Compact => {
            let store = JsonlStore::new(StorageConfig::new(config.data_dir.clone()));
            let kept = store.compact(&config.store.stats_collection).await?;
            println!("Compacted {} to {} records", config.store.stats_collection, kept);
        }
    }

    Ok(())
}

fn open_store(config: &AppConfig) -> Arc<dyn DocumentStore> {
    match config.store.backend {
        StoreBackend::Jsonl => Arc::new(JsonlStore::new(StorageConfig::new(
            config.data_dir.clone(),
        ))),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; statistics will not persist");
            Arc::new(MemoryStore::new())
        }
    }
}

fn read_match(path: &Path) -> Result<MatchRecord> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read match file {:?}", path))?;
    let record = MatchRecord::from_json(&json)
        .with_context(|| format!("Failed to load match file {:?}", path))?;
    Ok(record)
}

fn innings_line(record: &MatchRecord, label: &str, innings: &InningsData) -> String {
    let team = innings
        .batting_team
        .map(|side| record.team_name(side))
        .unwrap_or("?");
    format!(
        "{}: {} {}/{} ({} ov)",
        label,
        team,
        innings.runs,
        innings.wickets,
        calculate::format_overs(innings.overs, innings.balls)
    )
}

fn print_scoreboard(record: &MatchRecord) {
    println!("\n=== {} v {} ===", record.team1_name, record.team2_name);
    if let Some(innings) = &record.innings1_data {
        println!("{}", innings_line(record, "Innings 1", innings));
    }
    if let Some(innings) = &record.innings2_data {
        println!("{}", innings_line(record, "Innings 2", innings));
    }

    let result = record.result();
    if !result.is_empty() {
        println!("\nResult: {}", result);
        return;
    }

    let Some(total_overs) = record.total_overs else {
        println!("\nResult: not yet decided");
        return;
    };
    let batting = record.batting_team;
    let status = InningsStatus::evaluate(
        InningsProgress {
            innings: record.current_innings,
            runs: record.runs,
            wickets: record.wickets,
            overs: record.overs,
            balls: record.balls,
        },
        total_overs,
        record.target,
        &record.roster(batting).names(),
    );

    println!(
        "\nNow batting: {} {}/{} ({} ov)",
        record.team_name(batting),
        record.runs,
        record.wickets,
        calculate::format_overs(record.overs, record.balls)
    );
    println!("Wickets left:  {}", status.wickets_remaining);
    println!("Balls left:    {}", status.balls_remaining);
    if let Some(target) = record.target {
        println!("Target:        {}", target);
    }
    if status.is_complete() {
        println!("Innings complete");
    }
}

fn print_stats_table(views: &[PlayerStatsView]) {
    if views.is_empty() {
        println!("No player statistics found.");
        return;
    }

    println!(
        "{:<20} {:>3} {:>4} {:>6} {:>4} {:>7} {:>7} {:>5} {:>7} {:>7} {:>6}",
        "Player", "M", "Inn", "Runs", "HS", "Avg", "SR", "Wkts", "BAvg", "Econ", "Overs"
    );
    for v in views {
        let s = &v.stats;
        println!(
            "{:<20} {:>3} {:>4} {:>6} {:>4} {:>7} {:>7} {:>5} {:>7} {:>7} {:>6}",
            s.player_name,
            s.total_matches,
            s.total_innings,
            s.total_runs,
            s.high_score,
            v.batting_avg,
            v.strike_rate,
            s.wickets,
            v.bowling_avg,
            v.economy,
            calculate::balls_to_overs(s.balls_bowled)
        );
    }
}
