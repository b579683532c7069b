//! Worker error types

use std::path::PathBuf;
use std::time::Duration;

use chess_core::ReplayError;
use thiserror::Error;

/// Reasons a single game analysis can fail. No variant carries a partial
/// result.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Illegal move {san} at ply {ply}: {reason}")]
    IllegalMove {
        ply: usize,
        san: String,
        reason: String,
    },

    #[error("Invalid PGN: {0}")]
    InvalidPgn(String),

    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Evaluation timed out after {timeout:?} (depth {depth})")]
    EvaluationTimeout { depth: u32, timeout: Duration },

    #[error("Engine error: {0}")]
    Engine(String),
}

impl From<ReplayError> for AnalysisError {
    fn from(e: ReplayError) -> Self {
        match e {
            ReplayError::IllegalMove { ply, san, reason } => {
                AnalysisError::IllegalMove { ply, san, reason }
            }
            ReplayError::InvalidPgn(msg) => AnalysisError::InvalidPgn(msg),
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Games file not found at {0}")]
    Missing(PathBuf),

    #[error("Game not found in local store: {0}")]
    GameNotFound(String),

    #[error("Bad row on line {line}: {source}")]
    Row {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
