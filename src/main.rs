//! Command line entry point for the Ranked Wordle rating engine
//!
//! Loads configuration, opens the data file and runs one command against
//! the shared `RatingEngine`.

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand};
use ranked_wordle::config::AppConfig;
use ranked_wordle::metrics::MetricsCollector;
use ranked_wordle::report::{render_daily, render_weekly};
use ranked_wordle::service::{RatingEngine, WEEK_SPAN};
use ranked_wordle::types::PuzzleId;
use ranked_wordle::utils::{puzzle_for_date, todays_puzzle};
use std::fmt::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Ranked Wordle - Elo and OpenSkill ratings for daily Wordle results
#[derive(Parser)]
#[command(
    name = "ranked-wordle",
    version,
    about = "Competitive ratings for daily Wordle results",
    long_about = "Ranked Wordle stores shared Wordle results, rates each hard-mode puzzle day \
                 with a pairwise Elo round and a Weng-Lin (OpenSkill) skill update, and explains \
                 every rating change comparison by comparison."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Data file override
    #[arg(long, value_name = "FILE", help = "Override the JSON data file")]
    data_file: Option<PathBuf>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Print metrics after the command
    #[arg(long, help = "Print Prometheus metrics after the command finishes")]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

/// Puzzle selection shared by several commands
#[derive(ClapArgs, Debug, Clone)]
struct PuzzleSelector {
    /// Puzzle number
    #[arg(short, long)]
    puzzle: Option<u32>,

    /// Date the puzzle was played (YYYY-MM-DD)
    #[arg(long, conflicts_with = "puzzle")]
    date: Option<NaiveDate>,
}

impl PuzzleSelector {
    /// Selected puzzle, today's when nothing was given
    fn resolve(&self) -> PuzzleId {
        match (self.puzzle, self.date) {
            (Some(puzzle), _) => PuzzleId(puzzle),
            (None, Some(date)) => puzzle_for_date(date),
            (None, None) => todays_puzzle(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a player
    Register {
        player_id: String,
        name: String,
        #[arg(long, default_value = "cli")]
        platform: String,
    },
    /// Submit a shared result, e.g. "Wordle 1,234 4/6*"
    Submit { player_id: String, text: String },
    /// Rate a puzzle day, or an ascending range of days
    Compute {
        #[command(flatten)]
        selector: PuzzleSelector,
        /// First puzzle of a range
        #[arg(long, requires = "to", conflicts_with_all = ["puzzle", "date"])]
        from: Option<u32>,
        /// Last puzzle of a range (inclusive)
        #[arg(long, requires = "from")]
        to: Option<u32>,
    },
    /// Explain a player's Elo change for a puzzle
    Explain {
        player_id: String,
        #[command(flatten)]
        selector: PuzzleSelector,
    },
    /// Leaderboard for a puzzle (all modes)
    Rank {
        #[command(flatten)]
        selector: PuzzleSelector,
    },
    /// Rated standings for one puzzle
    Daily {
        #[command(flatten)]
        selector: PuzzleSelector,
    },
    /// Rated standings for the week ending at a puzzle
    Weekly {
        #[command(flatten)]
        selector: PuzzleSelector,
    },
    /// List players by ordinal
    Players,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from file or environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(data_file) = &args.data_file {
        config.service.data_file = data_file.clone();
    }

    ranked_wordle::config::validate_config(&config)?;
    Ok(config)
}

/// Run one command and return what should be printed
fn run_command(engine: &RatingEngine, command: Command) -> Result<String> {
    match command {
        Command::Register {
            player_id,
            name,
            platform,
        } => {
            let player = engine.register_player(player_id, name, platform)?;
            Ok(format!(
                "Registered {} ({}) with Elo {:.3}",
                player.name, player.id, player.rating.elo
            ))
        }
        Command::Submit { player_id, text } => {
            let submission = engine.submit_score(player_id, &text)?;
            Ok(format!(
                "Recorded {} for Wordle #{}{}",
                submission.attempts,
                submission.puzzle,
                if submission.hard_mode {
                    " (hard mode)"
                } else {
                    ""
                }
            ))
        }
        Command::Compute { selector, from, to } => {
            let puzzles: Vec<PuzzleId> = match (from, to) {
                (Some(from), Some(to)) => (from..=to).map(PuzzleId).collect(),
                _ => vec![selector.resolve()],
            };

            // Later days read what earlier days committed, so keep the order
            let mut out = String::new();
            for puzzle in puzzles {
                let status = engine.compute_daily_ratings(puzzle)?;
                let _ = writeln!(out, "Wordle #{}: {}", puzzle, status);
            }
            Ok(out.trim_end().to_string())
        }
        Command::Explain {
            player_id,
            selector,
        } => engine.explain_player(&player_id, selector.resolve()),
        Command::Rank { selector } => {
            let puzzle = selector.resolve();
            let entries = engine.rank_puzzle(puzzle)?;

            let mut out = String::new();
            let _ = write!(out, "Wordle #{} leaderboard", puzzle);
            if entries.is_empty() {
                let _ = write!(out, "\nNo submissions.");
            }
            for entry in entries {
                let _ = write!(
                    out,
                    "\n{:>2}. {:<20} score {}{}",
                    entry.rank,
                    entry.player_id,
                    entry.calculated_score,
                    if entry.hard_mode { " *" } else { "" }
                );
            }
            Ok(out)
        }
        Command::Daily { selector } => {
            let puzzle = selector.resolve();
            let rows = engine.daily_summary(puzzle)?;
            Ok(render_daily(puzzle, &rows))
        }
        Command::Weekly { selector } => {
            let end = selector.resolve();
            let rows = engine.weekly_summary(end)?;
            Ok(render_weekly(end.saturating_sub(WEEK_SPAN), end, &rows))
        }
        Command::Players => {
            let players = engine.players()?;

            let mut out = String::new();
            let _ = write!(out, "{} players", players.len());
            for player in players {
                let _ = write!(
                    out,
                    "\n{:<20} {:<20} {:<12} elo {:>9.3}  ordinal {:>7.3}",
                    player.id,
                    player.name,
                    player.platform,
                    player.rating.elo,
                    player.rating.ordinal
                );
            }
            Ok(out)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration (CLI args can override environment/config file)
    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    // Initialize logging early (before any other operations)
    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    debug!("Service: {} v{}", config.service.name, ranked_wordle::VERSION);
    debug!("Data file: {}", config.service.data_file.display());
    debug!(
        "Elo: k {} scale {} initial {}",
        config.rating.k_factor, config.rating.elo_scale, config.rating.initial_elo
    );

    let metrics = if args.metrics {
        Some(Arc::new(MetricsCollector::new()?))
    } else {
        None
    };

    let mut engine = match RatingEngine::from_config(&config) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Failed to initialize rating engine: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(metrics) = &metrics {
        engine = engine.with_metrics(metrics.clone());
    }
    let engine = Arc::new(engine);

    // The engine does blocking file I/O
    let command = args.command;
    let result = tokio::task::spawn_blocking(move || run_command(&engine, command))
        .await
        .map_err(|e| anyhow::anyhow!("Command task failed: {}", e))?;

    match result {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    if let Some(metrics) = metrics {
        print!("{}", metrics.render()?);
    }

    info!("{} finished", config.service.name);
    Ok(())
}
