//! Move-quality analysis for a single player's games.
//!
//! - [`stockfish::StockfishEngine`] talks UCI to a local engine process
//! - [`classify::classify`] maps an evaluation delta to a [`classify::QualityTier`]
//! - [`analyzer::GameAnalyzer`] replays a game and evaluates the tracked player's moves
//! - [`accuracy::aggregate`] reduces the moves to accuracy and a rating estimate

pub mod accuracy;
pub mod analyzer;
pub mod classify;
pub mod config;
pub mod error;
pub mod stockfish;
pub mod store;

pub use analyzer::{analyze_with, AnalysisResult, GameAnalyzer, PlyEvaluation};
pub use classify::{classify, QualityTier, TierCounts};
pub use config::{EngineConfig, WorkerConfig};
pub use error::{AnalysisError, StoreError, WorkerError};
pub use stockfish::{PositionEvaluator, StockfishEngine};
