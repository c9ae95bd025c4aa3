//! `openings` - practice an opening repertoire kept as PGN studies.
//!
//! Chapters are read from a PGN export (one game per chapter). Attempts and
//! stored explorer data live under the data directory, see [`config`] for
//! the environment variables that tune it.

mod commands;
mod config;
mod persistence;

use clap::{Parser, Subcommand};
use engine::EngineConfig;
use repertoire::EvaluationCache;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::PathBuf;

use commands::practice::PracticeOptions;
use persistence::{AttemptStore, ExplorerStore};

#[derive(Parser)]
#[command(name = "openings", about = "Opening repertoire trainer", version)]
struct Cli {
    /// Where attempts and explorer data are stored.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the chapters of a study.
    Chapters { pgn: PathBuf },
    /// List every line of the selected chapters.
    Lines {
        pgn: PathBuf,
        /// Restrict to a chapter; repeatable.
        #[arg(short, long = "chapter")]
        chapters: Vec<String>,
    },
    /// Locate a position in the study.
    Find { pgn: PathBuf, fen: String },
    /// Practice lines chosen by the review scheduler.
    Practice {
        pgn: PathBuf,
        #[arg(short, long = "chapter")]
        chapters: Vec<String>,
        /// Seed for a reproducible line order.
        #[arg(long)]
        seed: Option<u64>,
        /// Stop after this many lines.
        #[arg(short, long)]
        rounds: Option<usize>,
    },
    /// Show attempt history in scheduling order.
    History {
        pgn: PathBuf,
        #[arg(short, long = "chapter")]
        chapters: Vec<String>,
    },
    /// Evaluate a position, or the final position of every line.
    Eval {
        #[arg(long, conflicts_with = "pgn", required_unless_present = "pgn")]
        fen: Option<String>,
        #[arg(long)]
        pgn: Option<PathBuf>,
        #[arg(short, long = "chapter")]
        chapters: Vec<String>,
        #[arg(short, long)]
        depth: Option<u32>,
    },
    /// Stored opening explorer statistics.
    Explorer {
        #[command(subcommand)]
        action: ExplorerAction,
    },
}

#[derive(Subcommand)]
enum ExplorerAction {
    /// Show statistics for a position, marking repertoire moves.
    Show {
        fen: String,
        #[arg(long)]
        pgn: Option<PathBuf>,
    },
    /// Store statistics saved from the Lichess explorer API.
    Import { fen: String, file: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let data_dir = cli.data_dir.unwrap_or_else(config::get_data_dir);
    tracing::debug!("Using data directory: {}", data_dir.display());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Chapters { pgn } => {
            let chapters = commands::load_chapters(&pgn)?;
            commands::study::chapters(&chapters, &mut out)?;
        }
        Commands::Lines { pgn, chapters } => {
            let loaded = commands::load_chapters(&pgn)?;
            commands::study::lines(&loaded, &selection(chapters), &mut out)?;
        }
        Commands::Find { pgn, fen } => {
            let chapters = commands::load_chapters(&pgn)?;
            if !commands::study::find(&chapters, &fen, &mut out)? {
                out.flush()?;
                std::process::exit(1);
            }
        }
        Commands::Practice {
            pgn,
            chapters,
            seed,
            rounds,
        } => {
            let options = PracticeOptions {
                pgn,
                chapters: selection(chapters),
                seed: seed.or_else(config::get_seed),
                rounds,
            };
            let store = AttemptStore::new(&data_dir);
            let stdin = std::io::stdin();
            commands::practice::run(&options, &store, &mut stdin.lock(), &mut out)?;
        }
        Commands::History { pgn, chapters } => {
            let loaded = commands::load_chapters(&pgn)?;
            let history = AttemptStore::new(&data_dir).load_history()?;
            commands::study::history(&loaded, &selection(chapters), &history, &mut out)?;
        }
        Commands::Eval {
            fen,
            pgn,
            chapters,
            depth,
        } => {
            let targets = match (fen, pgn) {
                (Some(fen), _) => vec![commands::eval::fen_target(&fen)?],
                (None, Some(pgn)) => {
                    let loaded = commands::load_chapters(&pgn)?;
                    commands::eval::line_targets(&loaded, &selection(chapters))
                }
                (None, None) => anyhow::bail!("either --fen or --pgn is required"),
            };
            let engine_config = EngineConfig {
                path: config::get_stockfish_path(),
                ..Default::default()
            };
            let mut cache = EvaluationCache::with_capacity(config::get_cache_capacity());
            let depth = depth.unwrap_or_else(config::get_eval_depth);
            commands::eval::run(&targets, depth, engine_config, &mut cache, &mut out).await?;
        }
        Commands::Explorer { action } => {
            let store = ExplorerStore::new(&data_dir);
            match action {
                ExplorerAction::Show { fen, pgn } => {
                    let chapters = match pgn {
                        Some(pgn) => commands::load_chapters(&pgn)?,
                        None => Vec::new(),
                    };
                    commands::explorer::show(&store, &fen, &chapters, &mut out)?;
                }
                ExplorerAction::Import { fen, file } => {
                    let record = commands::explorer::import(&store, &fen, &file)?;
                    writeln!(out, "Stored {} moves for {}", record.data.moves.len(), record.fen)?;
                }
            }
        }
    }

    Ok(())
}

fn selection(chapters: Vec<String>) -> BTreeSet<String> {
    chapters.into_iter().collect()
}
