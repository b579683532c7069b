//! Worker configuration from environment variables

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use crate::error::WorkerError;

pub const DEFAULT_STOCKFISH_PATH: &str = "/usr/local/bin/stockfish";
pub const DEFAULT_SEARCH_DEPTH: u32 = 18;
pub const DEFAULT_EVAL_TIMEOUT_SECS: u64 = 30;

/// Score assigned to a forced mate, in centipawns (100.00 pawns).
/// Mate scores saturate here so deltas stay finite.
pub const DEFAULT_MATE_SCORE_CP: i32 = 10_000;

/// Everything needed to start and drive one engine process.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Path to the UCI engine binary
    pub engine_path: String,

    /// Extra command-line arguments for the engine
    pub engine_args: Vec<String>,

    /// Fixed search depth for every position of a run
    pub search_depth: u32,

    /// Longest we wait for any single engine response
    pub eval_timeout: Duration,

    pub threads: u32,

    pub hash_mb: u32,

    pub mate_score_cp: i32,
}

impl EngineConfig {
    pub fn new(engine_path: impl Into<String>) -> Self {
        Self {
            engine_path: engine_path.into(),
            ..Self::default()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            engine_path: DEFAULT_STOCKFISH_PATH.to_string(),
            engine_args: Vec::new(),
            search_depth: DEFAULT_SEARCH_DEPTH,
            eval_timeout: Duration::from_secs(DEFAULT_EVAL_TIMEOUT_SECS),
            threads: 1,
            hash_mb: 256,
            mate_score_cp: DEFAULT_MATE_SCORE_CP,
        }
    }
}

#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub engine: EngineConfig,

    /// Root of the per-user game warehouse
    pub warehouse_dir: PathBuf,

    /// Default user whose games are looked up
    pub username: Option<String>,

    /// Games analyzed concurrently in batch mode (one engine each)
    pub max_parallel_games: usize,
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, WorkerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, WorkerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let engine_path =
            lookup("STOCKFISH_PATH").unwrap_or_else(|| DEFAULT_STOCKFISH_PATH.to_string());

        let search_depth = parse_positive(&lookup, "SEARCH_DEPTH", DEFAULT_SEARCH_DEPTH)?;
        let eval_timeout_secs =
            parse_positive(&lookup, "EVAL_TIMEOUT_SECS", DEFAULT_EVAL_TIMEOUT_SECS)?;
        let threads = parse_positive(&lookup, "ENGINE_THREADS", 1u32)?;
        let hash_mb = parse_positive(&lookup, "ENGINE_HASH_MB", 256u32)?;
        let mate_score_cp = parse_positive(&lookup, "MATE_SCORE_CP", DEFAULT_MATE_SCORE_CP)?;
        let max_parallel_games =
            parse_positive(&lookup, "MAX_PARALLEL_GAMES", num_cpus::get().max(1))?;

        let warehouse_dir = lookup("WAREHOUSE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data/warehouse"));

        let username = lookup("CHESS_USERNAME").filter(|u| !u.trim().is_empty());

        let config = Self {
            engine: EngineConfig {
                engine_path,
                engine_args: Vec::new(),
                search_depth,
                eval_timeout: Duration::from_secs(eval_timeout_secs),
                threads,
                hash_mb,
                mate_score_cp,
            },
            warehouse_dir,
            username,
            max_parallel_games,
        };

        info!(
            engine_path = %config.engine.engine_path,
            depth = config.engine.search_depth,
            warehouse = %config.warehouse_dir.display(),
            "Worker config loaded"
        );

        Ok(config)
    }
}

fn parse_positive<F, T>(lookup: &F, key: &str, default: T) -> Result<T, WorkerError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialOrd + Default,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<T>() {
        Ok(v) if v > T::default() => Ok(v),
        _ => Err(WorkerError::Config(format!(
            "{key} must be a positive integer, got '{raw}'"
        ))),
    }
}
