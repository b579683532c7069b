use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Side played by the tracked user in a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    White,
    Black,
}

impl PlayerColor {
    pub fn is_white(self) -> bool {
        self == PlayerColor::White
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlayerColor::White => "white",
            PlayerColor::Black => "black",
        }
    }
}

impl fmt::Display for PlayerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlayerColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" | "w" => Ok(PlayerColor::White),
            "black" | "b" => Ok(PlayerColor::Black),
            other => Err(format!("unknown color '{other}' (expected white or black)")),
        }
    }
}

impl From<PlayerColor> for shakmaty::Color {
    fn from(color: PlayerColor) -> Self {
        match color {
            PlayerColor::White => shakmaty::Color::White,
            PlayerColor::Black => shakmaty::Color::Black,
        }
    }
}

impl From<shakmaty::Color> for PlayerColor {
    fn from(color: shakmaty::Color) -> Self {
        match color {
            shakmaty::Color::White => PlayerColor::White,
            shakmaty::Color::Black => PlayerColor::Black,
        }
    }
}

/// Headers read from a PGN string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameMetadata {
    pub white: String,
    pub black: String,
    pub result: String, // "1-0", "0-1", "1/2-1/2", "*"
    pub date: Option<String>,
    pub time_control: Option<String>,
    pub eco: Option<String>,
    pub link: Option<String>,
    pub fen: Option<String>,
}

/// One game row from the local warehouse, keyed by its game URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    pub game_id: String,
    pub pgn: String,
    pub color: PlayerColor,
    #[serde(default)]
    pub end_time: Option<i64>,
    #[serde(default)]
    pub time_control: Option<String>,
    #[serde(default)]
    pub time_class: Option<String>,
    #[serde(default)]
    pub rated: Option<bool>,
    #[serde(default)]
    pub result_for_me: Option<String>, // "win", "loss", "draw", "other"
    #[serde(default)]
    pub my_rating: Option<i32>,
    #[serde(default)]
    pub opponent_rating: Option<i32>,
    #[serde(default)]
    pub opponent_username: Option<String>,
}
