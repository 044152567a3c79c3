//! Priority definitions
//!
//! A priority is derived once per event and never changes afterwards.
//! Scores live on a [0, 10] scale with two-decimal precision; they are held
//! as integer hundredths so ordering and equality are exact.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::NetworkStatus;

/// Urgency score in hundredths, 0..=1000
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Score(u16);

impl Score {
    pub const MIN: Score = Score(0);
    pub const MAX: Score = Score(1000);

    /// Build from hundredths, saturating at `MAX`
    #[inline]
    pub fn from_hundredths(hundredths: u16) -> Self {
        Score(hundredths.min(Self::MAX.0))
    }

    /// Round a real value to two decimals. Values outside [0, 10] saturate;
    /// NaN maps to zero.
    #[inline]
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            return Score::MIN;
        }
        let hundredths = (value.clamp(0.0, 10.0) * 100.0).round();
        Score(hundredths as u16)
    }

    #[inline]
    pub fn hundredths(self) -> u16 {
        self.0
    }

    #[inline]
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Debug for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Score({}.{:02})", self.0 / 100, self.0 % 100)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Score {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        f64::deserialize(deserializer).map(Score::from_f64)
    }
}

/// Lower bound (inclusive) of the critical level
pub const CRITICAL_LEVEL_MIN: Score = Score(800);
/// Lower bound (inclusive) of the high level
pub const HIGH_LEVEL_MIN: Score = Score(600);
/// Lower bound (inclusive) of the medium level
pub const MEDIUM_LEVEL_MIN: Score = Score(400);

/// Coarse urgency bucket. Ordered from least to most urgent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl PriorityLevel {
    /// Most urgent first
    pub const ALL: [PriorityLevel; 4] = [
        PriorityLevel::Critical,
        PriorityLevel::High,
        PriorityLevel::Medium,
        PriorityLevel::Low,
    ];

    /// Bucket a score. Bounds are inclusive below; every score maps to exactly one level.
    pub fn from_score(score: Score) -> Self {
        if score >= CRITICAL_LEVEL_MIN {
            PriorityLevel::Critical
        } else if score >= HIGH_LEVEL_MIN {
            PriorityLevel::High
        } else if score >= MEDIUM_LEVEL_MIN {
            PriorityLevel::Medium
        } else {
            PriorityLevel::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PriorityLevel::Critical => "critical",
            PriorityLevel::High => "high",
            PriorityLevel::Medium => "medium",
            PriorityLevel::Low => "low",
        }
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One weighted input to the score
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FactorBreakdown {
    /// Value as reported by the node
    pub raw: f64,
    /// Value on the [0, 10] scale after clamping
    pub normalized: f64,
    /// Contribution to the score, rounded to two decimals
    pub weighted: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkBreakdown {
    pub status: NetworkStatus,
    pub normalized: f64,
    pub weighted: f64,
}

/// Per-factor contributions to a score
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub importance: FactorBreakdown,
    pub battery: FactorBreakdown,
    pub network: NetworkBreakdown,
}

/// Derived urgency of a single event
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Priority {
    pub score: Score,
    pub level: PriorityLevel,
    pub computed_at: DateTime<Utc>,
    pub breakdown: ScoreBreakdown,
}

/// Anything that can be ordered by urgency
pub trait Scored {
    fn score(&self) -> Score;
}

impl Scored for Priority {
    fn score(&self) -> Score {
        self.score
    }
}

impl Scored for Score {
    fn score(&self) -> Score {
        *self
    }
}

impl<T: Scored + ?Sized> Scored for &T {
    fn score(&self) -> Score {
        (**self).score()
    }
}

impl<T: Scored + ?Sized> Scored for std::sync::Arc<T> {
    fn score(&self) -> Score {
        (**self).score()
    }
}
