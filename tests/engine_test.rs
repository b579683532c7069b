//! Engine protocol and end-to-end analysis against a scripted UCI engine.
//!
//! The fake engine is a small `/bin/sh` script, so these tests need a unix
//! shell but no Stockfish install.

#![cfg(unix)]

mod common;

use std::time::Duration;

use analysis_worker::stockfish::EngineScore;
use analysis_worker::{
    AnalysisError, EngineConfig, GameAnalyzer, PositionEvaluator, QualityTier, StockfishEngine,
};
use chess_core::PlayerColor;
use common::{fake_engine, flat_scores, scripted_engine, ITALIAN_PGN};
use shakmaty::{Chess, Color};

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
const RELAXED: Duration = Duration::from_secs(5);
const TIGHT: Duration = Duration::from_millis(300);

// ---------------------------------------------------------------------------
// Evaluation client
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_handshake_and_scores() {
    let config = fake_engine(scripted_engine(&["cp 35", "mate -2"]), RELAXED);
    let mut engine = StockfishEngine::start(&config).await.expect("fake engine starts");
    assert_eq!(engine.name(), "FakeFish 1.0");

    assert_eq!(engine.evaluate_fen(START_FEN).await.unwrap(), EngineScore::Centipawns(35));
    assert_eq!(engine.evaluate_fen(START_FEN).await.unwrap(), EngineScore::Mate(-2));
    engine.quit().await;
}

#[tokio::test]
async fn test_scores_are_from_requested_point_of_view() {
    let config = fake_engine(scripted_engine(&["cp 50", "cp 50"]), RELAXED);
    let mut engine = StockfishEngine::start(&config).await.unwrap();

    let start = Chess::default();
    assert_eq!(engine.evaluate(&start, Color::White).await.unwrap(), 0.5);
    assert_eq!(engine.evaluate(&start, Color::Black).await.unwrap(), -0.5);
    engine.quit().await;
}

#[tokio::test]
async fn test_engine_that_exits_is_unavailable() {
    let config = fake_engine("exit 1".to_string(), RELAXED);
    let result = StockfishEngine::start(&config).await;
    assert!(matches!(result, Err(AnalysisError::EngineUnavailable(_))));
}

#[tokio::test]
async fn test_silent_engine_is_unavailable() {
    let config = fake_engine("while read -r line; do :; done".to_string(), TIGHT);
    let result = StockfishEngine::start(&config).await;
    assert!(matches!(result, Err(AnalysisError::EngineUnavailable(_))));
}

#[tokio::test]
async fn test_search_timeout_kills_session() {
    let config = fake_engine(scripted_engine(&[]), TIGHT);
    let mut engine = StockfishEngine::start(&config).await.unwrap();

    match engine.evaluate_fen(START_FEN).await {
        Err(AnalysisError::EvaluationTimeout { depth, timeout }) => {
            assert_eq!(depth, 1);
            assert_eq!(timeout, TIGHT);
        }
        other => panic!("expected EvaluationTimeout, got {other:?}"),
    }
    assert!(!engine.is_alive());

    // A dead session fails immediately instead of waiting out another timeout.
    let started = std::time::Instant::now();
    assert!(matches!(
        engine.evaluate_fen(START_FEN).await,
        Err(AnalysisError::Engine(_))
    ));
    assert!(started.elapsed() < TIGHT);
}

#[tokio::test]
async fn test_engine_crash_mid_search() {
    let script = r#"while IFS= read -r line; do
  case "$line" in
    uci) echo "uciok" ;;
    isready) echo "readyok" ;;
    go*) exit 3 ;;
  esac
done"#;
    let config = fake_engine(script.to_string(), RELAXED);
    let mut engine = StockfishEngine::start(&config).await.unwrap();
    assert!(matches!(
        engine.evaluate_fen(START_FEN).await,
        Err(AnalysisError::Engine(_))
    ));
}

// ---------------------------------------------------------------------------
// Game analyzer
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_single_blunder_game() {
    // Before 1. e4 White is +0.30; afterwards Black to move reports +0.10,
    // i.e. -0.10 for White: a -0.40 swing.
    let analyzer = GameAnalyzer::new(fake_engine(scripted_engine(&["cp 30", "cp 10"]), RELAXED));
    let result = analyzer.analyze("1. e4", PlayerColor::White).await.unwrap();

    assert_eq!(result.plies.len(), 1);
    let e4 = &result.plies[0];
    assert_eq!(e4.evaluation_before, 0.3);
    assert_eq!(e4.evaluation_after, -0.1);
    assert_eq!(e4.evaluation_delta, -0.4);
    assert_eq!(e4.quality_tier, QualityTier::Blunder);
    assert_eq!(result.accuracy, 94.0);
    assert_eq!(result.rating_estimate, 2080);
    assert_eq!(result.tiers.blunder, 1);
}

#[tokio::test]
async fn test_one_record_per_tracked_move_in_order() {
    for (color, expected) in [
        (PlayerColor::White, vec!["e4", "Nf3", "Bc4", "c3", "d4"]),
        (PlayerColor::Black, vec!["e5", "Nc6", "Bc5", "Nf6"]),
    ] {
        let analyzer = GameAnalyzer::new(fake_engine(scripted_engine(&flat_scores(18)), RELAXED));
        let result = analyzer.analyze(ITALIAN_PGN, color).await.unwrap();

        let sans: Vec<&str> = result.plies.iter().map(|p| p.san.as_str()).collect();
        assert_eq!(sans, expected);
        assert!(result.plies.windows(2).all(|w| w[0].ply + 2 == w[1].ply));
        assert!(result.plies.iter().all(|p| p.quality_tier == QualityTier::Good));
        assert_eq!(result.accuracy, 100.0);
    }
}

#[tokio::test]
async fn test_timeout_on_third_move_discards_everything() {
    // White's 3rd move (Bc4) is ply 4; its "before" evaluation is the 9th
    // request, which the engine never answers.
    let analyzer = GameAnalyzer::new(fake_engine(scripted_engine(&flat_scores(8)), TIGHT));
    let result = analyzer.analyze(ITALIAN_PGN, PlayerColor::White).await;

    assert!(matches!(result, Err(AnalysisError::EvaluationTimeout { .. })));
}

#[tokio::test]
async fn test_illegal_move_aborts_before_engine_starts() {
    // The engine path does not exist, so reaching the engine would be
    // EngineUnavailable instead.
    let analyzer = GameAnalyzer::new(EngineConfig::new("/nonexistent/stockfish"));

    let err = analyzer
        .analyze("1. e4 e5 2. Nf3 Nc6 3. Ke3", PlayerColor::White)
        .await
        .unwrap_err();
    match err {
        AnalysisError::IllegalMove { ply, san, .. } => {
            assert_eq!(ply, 4);
            assert_eq!(san, "Ke3");
        }
        other => panic!("expected IllegalMove, got {other:?}"),
    }

    let immediate = analyzer.analyze("1. Ke3", PlayerColor::White).await.unwrap_err();
    assert!(matches!(immediate, AnalysisError::IllegalMove { ply: 0, .. }));
}

#[tokio::test]
async fn test_checkmate_saturates_at_mate_score() {
    let mut scores = flat_scores(12);
    scores.push("mate 1"); // before 4. Qxf7#, White to move
    scores.push("mate 0"); // after it, Black to move and mated
    let analyzer = GameAnalyzer::new(fake_engine(scripted_engine(&scores), RELAXED));

    let result = analyzer
        .analyze("1. e4 e5 2. Qh5 Nc6 3. Bc4 Nf6 4. Qxf7#", PlayerColor::White)
        .await
        .unwrap();

    let mate = result.plies.last().unwrap();
    assert_eq!(mate.san, "Qxf7#");
    assert_eq!(mate.evaluation_before, 99.99);
    assert_eq!(mate.evaluation_after, 100.0);
    assert_eq!(mate.quality_tier, QualityTier::Good);
}

/// True while `pid` is a live (non-zombie) process.
#[cfg(target_os = "linux")]
fn process_running(pid: &str) -> bool {
    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        Err(_) => false,
        Ok(stat) => stat
            .rsplit_once(')')
            .and_then(|(_, rest)| rest.split_whitespace().next())
            .is_some_and(|state| state != "Z" && state != "X"),
    }
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_dropping_analysis_kills_engine() {
    let pid_file = std::env::temp_dir().join(format!("chess-insights-engine-{}.pid", std::process::id()));
    let _ = std::fs::remove_file(&pid_file);

    // Records its pid, then never answers a search.
    let script = format!("echo $$ > {}\n{}", pid_file.display(), scripted_engine(&[]));
    let analyzer = GameAnalyzer::new(fake_engine(script, Duration::from_secs(60)));

    let run = analyzer.analyze(ITALIAN_PGN, PlayerColor::White);
    let cancelled = tokio::time::timeout(Duration::from_millis(500), run).await;
    assert!(cancelled.is_err(), "analysis finished against a silent engine");

    let pid = std::fs::read_to_string(&pid_file).unwrap();
    let pid = pid.trim();
    assert!(!pid.is_empty());

    let mut gone = false;
    for _ in 0..40 {
        if !process_running(pid) {
            gone = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    let _ = std::fs::remove_file(&pid_file);
    assert!(gone, "engine process {pid} outlived the cancelled analysis");
}
