//! Accuracy score and rough rating estimate for one player's moves.

use serde::{Deserialize, Serialize};

use crate::analyzer::PlyEvaluation;

/// Accuracy points lost per pawn of average loss.
pub const LOSS_WEIGHT: f64 = 15.0;
pub const RATING_SCALE: f64 = 20.0;
pub const RATING_BASE: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Accuracy {
    /// 0..=100
    pub accuracy: f64,
    /// Linear mapping of accuracy, not a calibrated rating.
    pub rating_estimate: i32,
}

/// Mean magnitude of the negative deltas. Non-negative deltas are the
/// opponent's errors and never count, in either direction.
pub fn average_loss<I>(deltas: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = deltas
        .into_iter()
        .filter(|d| *d < 0.0)
        .fold((0.0, 0usize), |(sum, count), d| (sum + d.abs(), count + 1));

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

pub fn accuracy_from_loss(average_loss: f64) -> f64 {
    (100.0 - average_loss * LOSS_WEIGHT).clamp(0.0, 100.0)
}

pub fn rating_from_accuracy(accuracy: f64) -> i32 {
    (accuracy * RATING_SCALE + RATING_BASE).round() as i32
}

/// Reduce a game's ply evaluations to accuracy and a rating estimate.
/// No moves (or no losing moves) gives accuracy 100.
pub fn aggregate(plies: &[PlyEvaluation]) -> Accuracy {
    let loss = average_loss(plies.iter().map(|p| p.evaluation_delta));
    let accuracy = accuracy_from_loss(loss);
    Accuracy {
        accuracy,
        rating_estimate: rating_from_accuracy(accuracy),
    }
}
