//! Core game analysis logic
//!
//! Replays a game, asks the engine for the tracked player's evaluation
//! before and after every ply, and classifies the tracked player's moves.
//! Opponent plies are evaluated too so the before/after chain stays
//! continuous, but they produce no record.

use chess_core::{DecodedGame, GameRecord, PlayerColor, PlyStep};
use serde::{Deserialize, Serialize};
use shakmaty::Color;
use tracing::info;

use crate::accuracy;
use crate::classify::{classify, QualityTier, TierCounts};
use crate::config::EngineConfig;
use crate::error::AnalysisError;
use crate::stockfish::{PositionEvaluator, StockfishEngine};

/// Evaluation of one move made by the tracked player. Values are pawns from
/// the tracked player's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlyEvaluation {
    pub ply: usize,
    pub move_number: u32,
    pub san: String,
    pub evaluation_before: f64,
    pub evaluation_after: f64,
    pub evaluation_delta: f64,
    pub quality_tier: QualityTier,
}

/// Everything one analysis run produces. Owned by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub tracked: PlayerColor,
    pub plies: Vec<PlyEvaluation>,
    pub accuracy: f64,
    pub rating_estimate: i32,
    pub tiers: TierCounts,
}

impl AnalysisResult {
    pub fn from_plies(tracked: PlayerColor, plies: Vec<PlyEvaluation>) -> Self {
        let summary = accuracy::aggregate(&plies);
        let tiers = plies.iter().map(|p| p.quality_tier).collect();
        Self {
            tracked,
            plies,
            accuracy: summary.accuracy,
            rating_estimate: summary.rating_estimate,
            tiers,
        }
    }
}

/// Analyzes games with a fresh engine process per run.
#[derive(Debug, Clone)]
pub struct GameAnalyzer {
    config: EngineConfig,
}

impl GameAnalyzer {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Analyze `pgn` for the player who had `tracked`.
    ///
    /// The move list is validated before the engine starts, so an illegal
    /// move fails the run without any evaluation. The engine is shut down on
    /// every path; if this future is dropped mid-run the engine is killed.
    pub async fn analyze(
        &self,
        pgn: &str,
        tracked: PlayerColor,
    ) -> Result<AnalysisResult, AnalysisError> {
        let (game, steps) = replay_all(pgn)?;

        let tracked_plies = game.plies_by(Color::from(tracked));
        if tracked_plies == 0 {
            info!(%tracked, plies = steps.len(), "Tracked player made no moves");
            return Ok(AnalysisResult::from_plies(tracked, Vec::new()));
        }

        info!(%tracked, plies = steps.len(), depth = self.config.search_depth, "Starting analysis");

        let mut engine = StockfishEngine::start(&self.config).await?;
        let outcome = evaluate_steps(&mut engine, &steps, tracked, tracked_plies).await;
        engine.quit().await;

        let result = outcome?;
        info!(
            %tracked,
            moves = result.plies.len(),
            accuracy = result.accuracy,
            rating = result.rating_estimate,
            "Analysis complete"
        );
        Ok(result)
    }

    /// Analyze a stored game for the side the user played.
    pub async fn analyze_record(&self, record: &GameRecord) -> Result<AnalysisResult, AnalysisError> {
        info!(game_id = %record.game_id, "Analyzing stored game");
        self.analyze(&record.pgn, record.color).await
    }
}

/// Run the analysis against any evaluator. The evaluator's lifetime is the
/// caller's business.
pub async fn analyze_with<E: PositionEvaluator>(
    evaluator: &mut E,
    pgn: &str,
    tracked: PlayerColor,
) -> Result<AnalysisResult, AnalysisError> {
    let (game, steps) = replay_all(pgn)?;
    let tracked_plies = game.plies_by(Color::from(tracked));
    evaluate_steps(evaluator, &steps, tracked, tracked_plies).await
}

/// Decode and replay the whole mainline. Fails on the first illegal move.
fn replay_all(pgn: &str) -> Result<(DecodedGame, Vec<PlyStep>), AnalysisError> {
    let game = DecodedGame::from_pgn(pgn)?;
    let steps = game.replay().collect::<Result<Vec<_>, _>>()?;
    Ok((game, steps))
}

async fn evaluate_steps<E: PositionEvaluator>(
    evaluator: &mut E,
    steps: &[PlyStep],
    tracked: PlayerColor,
    tracked_plies: usize,
) -> Result<AnalysisResult, AnalysisError> {
    let pov = Color::from(tracked);
    let mut plies = Vec::with_capacity(tracked_plies);

    for step in steps {
        let before = evaluator.evaluate(&step.before, pov).await?;
        let after = evaluator.evaluate(&step.after, pov).await?;

        if step.mover != pov {
            continue;
        }

        let delta = to_centipawn_grid(after - before);
        plies.push(PlyEvaluation {
            ply: step.ply,
            move_number: step.move_number,
            san: step.san.clone(),
            evaluation_before: before,
            evaluation_after: after,
            evaluation_delta: delta,
            quality_tier: classify(delta),
        });
    }

    Ok(AnalysisResult::from_plies(tracked, plies))
}

/// Engine scores are whole centipawns; snap the difference back onto that
/// grid so 0.10 - 0.40 is exactly -0.30 and lands on the inclusive bound.
fn to_centipawn_grid(pawns: f64) -> f64 {
    (pawns * 100.0).round() / 100.0
}
