//! Local game warehouse lookups
//!
//! Games live in `<warehouse>/<username>/games.ndjson`, one `GameRecord` per
//! line, written by the fetch/flatten stages. This module only reads.

use std::fs;
use std::path::{Path, PathBuf};

use chess_core::GameRecord;
use tracing::debug;

use crate::error::StoreError;

pub const GAMES_FILE: &str = "games.ndjson";

#[derive(Debug)]
pub struct GameStore {
    path: PathBuf,
    games: Vec<GameRecord>,
}

impl GameStore {
    /// Load every game stored for `username` (case-insensitive).
    pub fn open(warehouse_dir: &Path, username: &str) -> Result<Self, StoreError> {
        let path = warehouse_dir
            .join(username.trim().to_lowercase())
            .join(GAMES_FILE);
        Self::from_file(path)
    }

    pub fn from_file(path: PathBuf) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::Missing(path));
        }
        let contents = fs::read_to_string(&path)?;
        let games = parse_rows(&contents)?;
        debug!(path = %path.display(), games = games.len(), "Loaded game store");
        Ok(Self { path, games })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Find a game by URL. Only the trailing game id is compared, so
    /// `.../game/live/123`, `.../game/123/` and `123` all match.
    pub fn find_by_url(&self, url: &str) -> Result<&GameRecord, StoreError> {
        let wanted = game_id_from_url(url)
            .ok_or_else(|| StoreError::GameNotFound(url.to_string()))?;
        self.games
            .iter()
            .find(|g| game_id_from_url(&g.game_id) == Some(wanted))
            .ok_or_else(|| StoreError::GameNotFound(url.to_string()))
    }

    /// Most recently finished game.
    pub fn latest(&self) -> Option<&GameRecord> {
        self.recent(1).into_iter().next()
    }

    /// The `n` most recently finished games, newest first. Games without an
    /// end time sort last.
    pub fn recent(&self, n: usize) -> Vec<&GameRecord> {
        let mut games: Vec<&GameRecord> = self.games.iter().collect();
        games.sort_by(|a, b| b.end_time.cmp(&a.end_time));
        games.truncate(n);
        games
    }
}

fn parse_rows(contents: &str) -> Result<Vec<GameRecord>, StoreError> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|source| StoreError::Row { line: i + 1, source })
        })
        .collect()
}

/// Last non-empty path segment of a game URL, without query or fragment.
pub fn game_id_from_url(url: &str) -> Option<&str> {
    let url = url.trim();
    let url = url.split(['?', '#']).next().unwrap_or(url);
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
}
