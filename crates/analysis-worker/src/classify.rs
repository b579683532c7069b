//! Move quality tiers. Pure functions only.
//!
//! A move is classified by its evaluation delta in pawns, measured from the
//! mover's point of view: positive means the move improved the mover's
//! position.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Quality tiers, ordered best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Brilliant,
    Great,
    Good,
    Inaccuracy,
    Mistake,
    Blunder,
}

impl QualityTier {
    pub const ALL: [QualityTier; 6] = [
        QualityTier::Brilliant,
        QualityTier::Great,
        QualityTier::Good,
        QualityTier::Inaccuracy,
        QualityTier::Mistake,
        QualityTier::Blunder,
    ];

    pub fn label(self) -> &'static str {
        match self {
            QualityTier::Brilliant => "brilliant",
            QualityTier::Great => "great",
            QualityTier::Good => "good",
            QualityTier::Inaccuracy => "inaccuracy",
            QualityTier::Mistake => "mistake",
            QualityTier::Blunder => "blunder",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Inclusive lower bounds in pawns, checked top-down. Anything below the
/// last bound is a blunder.
pub const TIER_THRESHOLDS: [(f64, QualityTier); 5] = [
    (0.30, QualityTier::Brilliant),
    (0.10, QualityTier::Great),
    (-0.05, QualityTier::Good),
    (-0.15, QualityTier::Inaccuracy),
    (-0.30, QualityTier::Mistake),
];

/// Classify an evaluation delta (pawns). Total: NaN falls through to
/// `Blunder` because it compares false against every bound.
pub fn classify(delta: f64) -> QualityTier {
    TIER_THRESHOLDS
        .iter()
        .find(|(lower, _)| delta >= *lower)
        .map(|(_, tier)| *tier)
        .unwrap_or(QualityTier::Blunder)
}

/// How many moves landed in each tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub brilliant: u32,
    pub great: u32,
    pub good: u32,
    pub inaccuracy: u32,
    pub mistake: u32,
    pub blunder: u32,
}

impl TierCounts {
    pub fn add(&mut self, tier: QualityTier) {
        *self.slot(tier) += 1;
    }

    pub fn get(&self, tier: QualityTier) -> u32 {
        match tier {
            QualityTier::Brilliant => self.brilliant,
            QualityTier::Great => self.great,
            QualityTier::Good => self.good,
            QualityTier::Inaccuracy => self.inaccuracy,
            QualityTier::Mistake => self.mistake,
            QualityTier::Blunder => self.blunder,
        }
    }

    pub fn total(&self) -> u32 {
        QualityTier::ALL.iter().map(|t| self.get(*t)).sum()
    }

    fn slot(&mut self, tier: QualityTier) -> &mut u32 {
        match tier {
            QualityTier::Brilliant => &mut self.brilliant,
            QualityTier::Great => &mut self.great,
            QualityTier::Good => &mut self.good,
            QualityTier::Inaccuracy => &mut self.inaccuracy,
            QualityTier::Mistake => &mut self.mistake,
            QualityTier::Blunder => &mut self.blunder,
        }
    }
}

impl FromIterator<QualityTier> for TierCounts {
    fn from_iter<I: IntoIterator<Item = QualityTier>>(iter: I) -> Self {
        let mut counts = TierCounts::default();
        for tier in iter {
            counts.add(tier);
        }
        counts
    }
}
