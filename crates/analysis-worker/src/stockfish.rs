//! Stockfish engine wrapper using UCI protocol (async I/O)
//!
//! One [`StockfishEngine`] owns one engine process. The process is killed
//! when the handle is dropped, after a timeout, or after any protocol
//! failure, so a dead session never hangs a caller.

use std::future::Future;
use std::process::Stdio;

use shakmaty::fen::Fen;
use shakmaty::{Chess, Color, EnPassantMode, Position};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::AnalysisError;

/// Score line reported by the engine, from the side to move's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineScore {
    Centipawns(i32),
    /// Mate in N moves (positive = side to move mates, 0 or negative = gets mated)
    Mate(i32),
}

impl EngineScore {
    /// Finite centipawn value. Mates saturate at `mate_score_cp`, shortened by
    /// the distance to mate so a faster mate still scores higher.
    pub fn to_centipawns(self, mate_score_cp: i32) -> i32 {
        match self {
            EngineScore::Centipawns(cp) => cp,
            EngineScore::Mate(n) if n > 0 => mate_score_cp - n,
            EngineScore::Mate(n) => -mate_score_cp - n,
        }
    }

    /// Pawn value from `pov`'s point of view (positive = good for `pov`).
    pub fn pov_pawns(self, side_to_move: Color, pov: Color, mate_score_cp: i32) -> f64 {
        let cp = self.to_centipawns(mate_score_cp);
        let cp = if side_to_move == pov { cp } else { -cp };
        f64::from(cp) / 100.0
    }
}

/// Anything that can score a position for the analyzer.
pub trait PositionEvaluator {
    /// Evaluate `position` from `pov`'s point of view, in pawns.
    fn evaluate(
        &mut self,
        position: &Chess,
        pov: Color,
    ) -> impl Future<Output = Result<f64, AnalysisError>> + Send;
}

/// Stockfish engine instance
pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    config: EngineConfig,
    name: String,
    alive: bool,
}

impl StockfishEngine {
    /// Spawn the engine process and complete the UCI handshake.
    pub async fn start(config: &EngineConfig) -> Result<Self, AnalysisError> {
        let mut process = Command::new(&config.engine_path)
            .args(&config.engine_args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                AnalysisError::EngineUnavailable(format!(
                    "failed to spawn {}: {e}",
                    config.engine_path
                ))
            })?;

        let stdin = process.stdin.take().ok_or_else(|| {
            AnalysisError::EngineUnavailable("engine stdin was not captured".into())
        })?;
        let stdout = process.stdout.take().ok_or_else(|| {
            AnalysisError::EngineUnavailable("engine stdout was not captured".into())
        })?;

        let mut engine = Self {
            process,
            stdin,
            stdout: BufReader::new(stdout),
            config: config.clone(),
            name: String::new(),
            alive: true,
        };

        match timeout(config.eval_timeout, engine.handshake()).await {
            Ok(Ok(())) => {
                debug!(engine = %engine.name, "Engine ready");
                Ok(engine)
            }
            Ok(Err(e)) => {
                engine.kill();
                Err(AnalysisError::EngineUnavailable(format!("UCI handshake failed: {e}")))
            }
            Err(_) => {
                engine.kill();
                Err(AnalysisError::EngineUnavailable(format!(
                    "no uciok/readyok within {:?}",
                    config.eval_timeout
                )))
            }
        }
    }

    async fn handshake(&mut self) -> Result<(), AnalysisError> {
        self.send("uci").await?;
        loop {
            let line = self.read_line().await?;
            if let Some(name) = line.strip_prefix("id name ") {
                self.name = name.to_string();
            } else if line == "uciok" {
                break;
            }
        }

        self.send(&format!("setoption name Threads value {}", self.config.threads))
            .await?;
        self.send(&format!("setoption name Hash value {}", self.config.hash_mb))
            .await?;
        self.send("isready").await?;
        self.wait_for("readyok").await
    }

    /// Engine name reported during the handshake.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Send a command to Stockfish
    async fn send(&mut self, cmd: &str) -> Result<(), AnalysisError> {
        debug!(cmd, "SF <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| AnalysisError::Engine(format!("Failed to write to engine: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| AnalysisError::Engine(format!("Failed to flush stdin: {e}")))?;
        Ok(())
    }

    async fn read_line(&mut self) -> Result<String, AnalysisError> {
        let mut line = String::new();
        let bytes = self
            .stdout
            .read_line(&mut line)
            .await
            .map_err(|e| AnalysisError::Engine(format!("Failed to read from engine: {e}")))?;
        if bytes == 0 {
            return Err(AnalysisError::Engine("engine closed its output".into()));
        }
        let trimmed = line.trim().to_string();
        debug!(line = %trimmed, "SF >");
        Ok(trimmed)
    }

    /// Wait for a specific response line
    async fn wait_for(&mut self, expected: &str) -> Result<(), AnalysisError> {
        loop {
            if self.read_line().await? == expected {
                return Ok(());
            }
        }
    }

    /// Search `fen` to the configured depth and return the final score.
    pub async fn evaluate_fen(&mut self, fen: &str) -> Result<EngineScore, AnalysisError> {
        if !self.alive {
            return Err(AnalysisError::Engine("engine session already terminated".into()));
        }

        let depth = self.config.search_depth;
        let budget = self.config.eval_timeout;

        let exchange = async {
            self.send(&format!("position fen {fen}")).await?;
            self.send(&format!("go depth {depth}")).await?;
            self.read_search_result().await
        };

        let outcome = timeout(budget, exchange).await;
        match outcome {
            Ok(Ok(score)) => Ok(score),
            Ok(Err(e)) => {
                self.kill();
                Err(e)
            }
            Err(_) => {
                warn!(fen, depth, ?budget, "Evaluation timed out, killing engine");
                self.kill();
                Err(AnalysisError::EvaluationTimeout {
                    depth,
                    timeout: budget,
                })
            }
        }
    }

    /// Read `info` lines until `bestmove`, keeping the last exact score.
    async fn read_search_result(&mut self) -> Result<EngineScore, AnalysisError> {
        let mut score = None;
        loop {
            let line = self.read_line().await?;
            if line.starts_with("info") {
                if let Some(s) = parse_score(&line) {
                    score = Some(s);
                }
            } else if let Some(best) = parse_bestmove(&line) {
                debug!(best, "Search finished");
                return score.ok_or_else(|| {
                    AnalysisError::Engine(format!("'{line}' arrived without a score"))
                });
            }
        }
    }

    /// Terminate the process now. Any in-flight read fails with EOF.
    pub fn kill(&mut self) {
        if self.alive {
            let _ = self.process.start_kill();
            self.alive = false;
        }
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(mut self) {
        if !self.alive {
            return;
        }
        let _ = self.send("quit").await;
        match timeout(self.config.eval_timeout, self.process.wait()).await {
            Ok(_) => self.alive = false,
            Err(_) => {
                warn!(engine = %self.name, "Engine ignored quit, killing it");
                self.kill();
            }
        }
    }
}

impl PositionEvaluator for StockfishEngine {
    async fn evaluate(&mut self, position: &Chess, pov: Color) -> Result<f64, AnalysisError> {
        let fen = Fen::from_position(position, EnPassantMode::Legal).to_string();
        let side_to_move = position.turn();
        let score = self.evaluate_fen(&fen).await?;
        Ok(score.pov_pawns(side_to_move, pov, self.config.mate_score_cp))
    }
}

impl Drop for StockfishEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}

/// Parse the score from an info line. Bound scores (`lowerbound`,
/// `upperbound`) are skipped; they are not final values.
pub fn parse_score(line: &str) -> Option<EngineScore> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let i = parts.iter().position(|p| *p == "score")?;
    let kind = *parts.get(i + 1)?;
    let value: i32 = parts.get(i + 2)?.parse().ok()?;
    if matches!(parts.get(i + 3), Some(&"lowerbound") | Some(&"upperbound")) {
        return None;
    }
    match kind {
        "cp" => Some(EngineScore::Centipawns(value)),
        "mate" => Some(EngineScore::Mate(value)),
        _ => None,
    }
}

/// Parse the move from a `bestmove` line ("(none)" in terminal positions).
pub fn parse_bestmove(line: &str) -> Option<&str> {
    let mut parts = line.split_whitespace();
    match parts.next() {
        Some("bestmove") => parts.next(),
        _ => None,
    }
}
