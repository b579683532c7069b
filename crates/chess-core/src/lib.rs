pub mod game_data;
pub mod pgn;
pub mod replay;

pub use game_data::{GameMetadata, GameRecord, PlayerColor};
pub use replay::{DecodedGame, PlyStep, ReplayError, Replayer};
