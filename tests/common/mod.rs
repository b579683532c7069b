use std::time::Duration;

use analysis_worker::EngineConfig;

/// White plays five moves, Black four.
pub const ITALIAN_PGN: &str = r#"[Event "Live Chess"]
[White "tracked"]
[Black "opponent"]
[Result "*"]

1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5 4. c3 Nf6 5. d4 *"#;

/// Build a fake UCI engine as a `/bin/sh` script. The Nth `go` command is
/// answered with `scores[N-1]` (e.g. "cp 30" or "mate 2"); any `go` past the
/// end of the list is never answered.
#[allow(dead_code)]
pub fn scripted_engine(scores: &[&str]) -> String {
    let mut arms = String::new();
    for (i, score) in scores.iter().enumerate() {
        arms.push_str(&format!(
            "        {}) echo \"info depth 1 score {score} nodes 1 pv a2a3\"; echo \"bestmove a2a3\" ;;\n",
            i + 1
        ));
    }

    format!(
        r#"n=0
while IFS= read -r line; do
  case "$line" in
    uci) echo "id name FakeFish 1.0"; echo "uciok" ;;
    isready) echo "readyok" ;;
    go*)
      n=$((n+1))
      case $n in
{arms}        *) ;;
      esac
      ;;
    quit) exit 0 ;;
  esac
done
"#
    )
}

/// Engine config that runs `script` through `/bin/sh -c`.
#[allow(dead_code)]
pub fn fake_engine(script: String, timeout: Duration) -> EngineConfig {
    EngineConfig {
        engine_path: "/bin/sh".to_string(),
        engine_args: vec!["-c".to_string(), script],
        search_depth: 1,
        eval_timeout: timeout,
        ..EngineConfig::default()
    }
}

/// A score list that answers every one of `count` evaluations with "cp 0".
#[allow(dead_code)]
pub fn flat_scores(count: usize) -> Vec<&'static str> {
    vec!["cp 0"; count]
}
