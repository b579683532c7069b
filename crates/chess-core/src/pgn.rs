//! PGN header helpers (lightweight regex-based parsing)
//!
//! Movetext is decoded by [`crate::replay`]; these helpers only look at the
//! `[Tag "value"]` section.

use std::sync::LazyLock;

use regex::Regex;

use crate::game_data::{GameMetadata, PlayerColor};

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[(\w+)\s+"([^"]*)"\]"#).expect("header regex"));

/// Collect the headers we care about into a [`GameMetadata`].
/// Missing player names become "Unknown" and a missing result becomes "*".
pub fn parse_headers(pgn: &str) -> GameMetadata {
    let mut metadata = GameMetadata {
        white: "Unknown".to_string(),
        black: "Unknown".to_string(),
        result: "*".to_string(),
        ..GameMetadata::default()
    };

    for cap in HEADER_RE.captures_iter(pgn) {
        let value = cap[2].to_string();
        match &cap[1] {
            "White" => metadata.white = value,
            "Black" => metadata.black = value,
            "Result" => metadata.result = value,
            "Date" => metadata.date = Some(value),
            "TimeControl" => metadata.time_control = Some(value),
            "ECO" => metadata.eco = Some(value),
            "Link" => metadata.link = Some(value),
            "FEN" => metadata.fen = Some(value),
            _ => {}
        }
    }

    metadata
}

/// Extract a string value from a PGN header (e.g. WhiteTitle, BlackTitle).
pub fn extract_header(pgn: &str, header_name: &str) -> Option<String> {
    let pattern = format!(r#"\[{}\s+"([^"]*)"\]"#, regex::escape(header_name));
    let re = Regex::new(&pattern).ok()?;
    let value = re.captures(pgn)?.get(1)?.as_str().to_string();
    if value.is_empty() { None } else { Some(value) }
}

/// Which side `username` played, according to the White/Black headers.
/// Comparison ignores case, as usernames do on Chess.com.
pub fn color_for_player(pgn: &str, username: &str) -> Option<PlayerColor> {
    let username = username.trim();
    if extract_header(pgn, "White").is_some_and(|w| w.eq_ignore_ascii_case(username)) {
        Some(PlayerColor::White)
    } else if extract_header(pgn, "Black").is_some_and(|b| b.eq_ignore_ascii_case(username)) {
        Some(PlayerColor::Black)
    } else {
        None
    }
}
