//! Ply-by-ply replay of a PGN mainline.
//!
//! [`DecodedGame`] holds the start position and the SAN tokens read by
//! `pgn-reader`. Legality is only checked while replaying, one ply at a time,
//! so an illegal move surfaces exactly at the ply where it occurs.

use std::ops::ControlFlow;

use pgn_reader::{RawTag, Reader, SanPlus, Skip, Visitor};
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Position};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    #[error("Illegal move {san} at ply {ply}: {reason}")]
    IllegalMove {
        ply: usize,
        san: String,
        reason: String,
    },

    #[error("Invalid PGN: {0}")]
    InvalidPgn(String),
}

/// A game's start position plus its mainline moves, not yet validated.
#[derive(Debug, Clone)]
pub struct DecodedGame {
    start: Chess,
    sans: Vec<SanPlus>,
}

/// Position before and after one ply.
#[derive(Debug, Clone)]
pub struct PlyStep {
    /// 0-based half-move index
    pub ply: usize,
    /// Full-move number shown in PGN ("12." for both 12. e4 and 12... e5)
    pub move_number: u32,
    pub mover: Color,
    pub san: String,
    pub before: Chess,
    pub after: Chess,
}

impl PlyStep {
    pub fn fen_before(&self) -> String {
        Fen::from_position(&self.before, EnPassantMode::Legal).to_string()
    }

    pub fn fen_after(&self) -> String {
        Fen::from_position(&self.after, EnPassantMode::Legal).to_string()
    }
}

impl DecodedGame {
    /// Decode the first game in `pgn`. Text with no movetext at all is an
    /// empty game, not an error.
    pub fn from_pgn(pgn: &str) -> Result<Self, ReplayError> {
        let mut reader = Reader::new(pgn.as_bytes());
        let mut collector = MovetextCollector;

        match reader.read_game(&mut collector) {
            Ok(Some(decoded)) => decoded,
            Ok(None) => Ok(Self::from_sans(Chess::default(), Vec::new())),
            Err(e) => Err(ReplayError::InvalidPgn(e.to_string())),
        }
    }

    pub fn from_sans(start: Chess, sans: Vec<SanPlus>) -> Self {
        Self { start, sans }
    }

    pub fn start(&self) -> &Chess {
        &self.start
    }

    pub fn len(&self) -> usize {
        self.sans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sans.is_empty()
    }

    /// Number of plies `color` makes, assuming the moves alternate from the
    /// start position's side to move.
    pub fn plies_by(&self, color: Color) -> usize {
        let first = self.start.turn();
        (0..self.sans.len())
            .filter(|i| if i % 2 == 0 { first == color } else { !first == color })
            .count()
    }

    /// Start a fresh replay from the start position.
    pub fn replay(&self) -> Replayer<'_> {
        Replayer {
            sans: self.sans.iter(),
            position: self.start.clone(),
            ply: 0,
            failed: false,
        }
    }
}

/// Lazy iterator over the plies of a [`DecodedGame`]. Fused after the first
/// error.
pub struct Replayer<'a> {
    sans: std::slice::Iter<'a, SanPlus>,
    position: Chess,
    ply: usize,
    failed: bool,
}

impl Replayer<'_> {
    fn fail(&mut self, san: &SanPlus, reason: String) -> Option<Result<PlyStep, ReplayError>> {
        self.failed = true;
        Some(Err(ReplayError::IllegalMove {
            ply: self.ply,
            san: san.to_string(),
            reason,
        }))
    }
}

impl Iterator for Replayer<'_> {
    type Item = Result<PlyStep, ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let san_plus = self.sans.next()?;

        let before = self.position.clone();
        let mv = match san_plus.san.to_move(&before) {
            Ok(mv) => mv,
            Err(e) => return self.fail(san_plus, e.to_string()),
        };
        let after = match before.clone().play(mv) {
            Ok(after) => after,
            Err(_) => return self.fail(san_plus, "move rejected by position".to_string()),
        };

        let step = PlyStep {
            ply: self.ply,
            move_number: before.fullmoves().get(),
            mover: before.turn(),
            san: san_plus.to_string(),
            before,
            after: after.clone(),
        };

        self.position = after;
        self.ply += 1;
        Some(Ok(step))
    }
}

/// Visitor that keeps the FEN tag and the mainline SAN tokens.
struct MovetextCollector;

impl Visitor for MovetextCollector {
    type Tags = Option<String>;
    type Movetext = DecodedGame;
    type Output = Result<DecodedGame, ReplayError>;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Option<String>> {
        ControlFlow::Continue(None)
    }

    fn tag(
        &mut self,
        fen: &mut Option<String>,
        name: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        if name == b"FEN" {
            *fen = Some(value.decode_utf8_lossy().into_owned());
        }
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, fen: Option<String>) -> ControlFlow<Self::Output, DecodedGame> {
        let start = match fen {
            None => Chess::default(),
            Some(fen) => match parse_start_position(&fen) {
                Ok(pos) => pos,
                Err(e) => return ControlFlow::Break(Err(e)),
            },
        };
        ControlFlow::Continue(DecodedGame::from_sans(start, Vec::new()))
    }

    fn san(&mut self, game: &mut DecodedGame, san_plus: SanPlus) -> ControlFlow<Self::Output> {
        game.sans.push(san_plus);
        ControlFlow::Continue(())
    }

    fn begin_variation(&mut self, _game: &mut DecodedGame) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true)) // mainline only
    }

    fn end_game(&mut self, game: DecodedGame) -> Self::Output {
        Ok(game)
    }
}

fn parse_start_position(fen: &str) -> Result<Chess, ReplayError> {
    let fen: Fen = fen
        .trim()
        .parse()
        .map_err(|e| ReplayError::InvalidPgn(format!("bad FEN tag '{fen}': {e}")))?;
    fen.into_position(CastlingMode::Standard)
        .map_err(|e| ReplayError::InvalidPgn(format!("illegal start position: {e}")))
}
