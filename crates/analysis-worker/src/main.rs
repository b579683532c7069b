//! Game analysis worker
//!
//! Looks a game up in the local warehouse (or reads a PGN file), runs the
//! move-quality analysis against a local Stockfish and prints the result.
//!
//! Usage:
//!   analysis-worker --game-url <url> [--username <name>] [--json]
//!   analysis-worker --latest [--username <name>] [--json]
//!   analysis-worker --recent <n> [--username <name>] [--json]
//!   analysis-worker --pgn-file <path> [--color white|black | --username <name>] [--json]

use std::path::PathBuf;
use std::sync::Arc;

use analysis_worker::store::GameStore;
use analysis_worker::{AnalysisResult, GameAnalyzer, QualityTier, WorkerConfig, WorkerError};
use anyhow::{anyhow, bail, Context};
use chess_core::{pgn, GameRecord, PlayerColor};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

#[derive(Debug)]
enum Mode {
    GameUrl(String),
    Latest,
    Recent(usize),
    PgnFile {
        path: PathBuf,
        color: Option<PlayerColor>,
    },
}

#[derive(Debug)]
struct Args {
    mode: Mode,
    username: Option<String>,
    json: bool,
}

fn parse_args(args: &[String]) -> anyhow::Result<Args> {
    let mut mode = None;
    let mut username = None;
    let mut color = None;
    let mut pgn_file = None;
    let mut json = false;

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1);
        match args[i].as_str() {
            "--game-url" => {
                mode = Some(Mode::GameUrl(value.context("--game-url needs a URL")?.clone()));
                i += 2;
            }
            "--latest" => {
                mode = Some(Mode::Latest);
                i += 1;
            }
            "--recent" => {
                let n: usize = value
                    .context("--recent needs a count")?
                    .parse()
                    .context("--recent needs a positive count")?;
                if n == 0 {
                    bail!("--recent needs a positive count");
                }
                mode = Some(Mode::Recent(n));
                i += 2;
            }
            "--pgn-file" => {
                pgn_file = Some(PathBuf::from(value.context("--pgn-file needs a path")?));
                i += 2;
            }
            "--color" => {
                let raw = value.context("--color needs white or black")?;
                color = Some(raw.parse::<PlayerColor>().map_err(|e| anyhow!(e))?);
                i += 2;
            }
            "--username" => {
                username = Some(value.context("--username needs a name")?.clone());
                i += 2;
            }
            "--json" => {
                json = true;
                i += 1;
            }
            other => bail!("unknown argument '{other}'"),
        }
    }

    if let Some(path) = pgn_file {
        mode = Some(Mode::PgnFile { path, color });
    }

    let mode = mode.context("nothing to analyze: pass --game-url, --latest, --recent or --pgn-file")?;
    Ok(Args { mode, username, json })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let argv: Vec<String> = std::env::args().collect();
    let args = parse_args(&argv)?;
    let config = WorkerConfig::load()?;

    // Dropping `run` on ctrl-c drops every engine handle, which kills the
    // engine processes.
    tokio::select! {
        result = run(args, config) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, cancelling analysis");
            bail!("analysis interrupted")
        }
    }
}

async fn run(args: Args, config: WorkerConfig) -> anyhow::Result<()> {
    let analyzer = GameAnalyzer::new(config.engine.clone());
    let username = args.username.clone().or_else(|| config.username.clone());

    match args.mode {
        Mode::PgnFile { path, color } => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let color = match (color, username.as_deref()) {
                (Some(color), _) => color,
                (None, Some(user)) => pgn::color_for_player(&text, user)
                    .with_context(|| format!("{user} does not appear in the White/Black headers"))?,
                (None, None) => bail!("--pgn-file needs --color or --username"),
            };
            let result = analyzer.analyze(&text, color).await?;
            let meta = pgn::parse_headers(&text);
            let label = format!("{} vs {} ({color})", meta.white, meta.black);
            report(&label, &result, args.json)?;
        }
        Mode::GameUrl(url) => {
            let store = open_store(&config, username.as_deref())?;
            let record = store.find_by_url(&url)?;
            let result = analyzer.analyze_record(record).await?;
            report(&record.game_id, &result, args.json)?;
        }
        Mode::Latest => {
            let store = open_store(&config, username.as_deref())?;
            let record = store.latest().context("the game store is empty")?;
            let result = analyzer.analyze_record(record).await?;
            report(&record.game_id, &result, args.json)?;
        }
        Mode::Recent(n) => {
            let store = open_store(&config, username.as_deref())?;
            let records: Vec<GameRecord> = store.recent(n).into_iter().cloned().collect();
            analyze_batch(analyzer, records, config.max_parallel_games, args.json).await?;
        }
    }

    Ok(())
}

fn open_store(config: &WorkerConfig, username: Option<&str>) -> Result<GameStore, WorkerError> {
    let username = username.ok_or_else(|| {
        WorkerError::Config("no username: pass --username or set CHESS_USERNAME".to_string())
    })?;
    let store = GameStore::open(&config.warehouse_dir, username)?;
    info!(path = %store.path().display(), games = store.len(), "Game store opened");
    Ok(store)
}

/// Analyze several games at once, one engine process per game, at most
/// `max_parallel` engines alive at a time.
async fn analyze_batch(
    analyzer: GameAnalyzer,
    records: Vec<GameRecord>,
    max_parallel: usize,
    json: bool,
) -> anyhow::Result<()> {
    let semaphore = Arc::new(Semaphore::new(max_parallel));
    let analyzer = Arc::new(analyzer);
    let mut tasks = JoinSet::new();

    info!(games = records.len(), max_parallel, "Starting batch analysis");

    for (index, record) in records.into_iter().enumerate() {
        let permit = semaphore.clone().acquire_owned().await?;
        let analyzer = analyzer.clone();
        tasks.spawn(async move {
            let _permit = permit; // Hold until done
            let result = analyzer.analyze_record(&record).await;
            (index, record, result)
        });
    }

    let mut finished = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        finished.push(joined?);
    }
    finished.sort_by_key(|(index, _, _)| *index);

    let mut failed = 0usize;
    for (_, record, result) in &finished {
        match result {
            Ok(result) => report(&record.game_id, result, json)?,
            Err(e) => {
                error!(game_id = %record.game_id, error = %e, "Analysis failed");
                failed += 1;
            }
        }
    }

    info!(total = finished.len(), failed, "Batch analysis finished");
    batch_outcome(finished.len(), failed)
}

fn batch_outcome(total: usize, failed: usize) -> anyhow::Result<()> {
    if failed > 0 {
        bail!("{failed} of {total} games failed to analyze");
    }
    Ok(())
}

fn report(label: &str, result: &AnalysisResult, json: bool) -> anyhow::Result<()> {
    if json {
        let out = serde_json::json!({ "game": label, "analysis": result });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("\nAnalyzed game: {label}");
    println!("Move Classification:");
    for tier in QualityTier::ALL {
        println!("  {:<11} {}", tier.label(), result.tiers.get(tier));
    }
    println!("Accuracy Score: {:.2}", result.accuracy);
    println!("Estimated Game Strength Rating: {}", result.rating_estimate);
    println!("Total Moves Analyzed: {}", result.plies.len());
    Ok(())
}
