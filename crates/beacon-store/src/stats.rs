//! Store statistics

use serde::Serialize;

use beacon_core::{PriorityLevel, Score};

/// Record count per level
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LevelCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl LevelCounts {
    pub fn record(&mut self, level: PriorityLevel) {
        match level {
            PriorityLevel::Critical => self.critical += 1,
            PriorityLevel::High => self.high += 1,
            PriorityLevel::Medium => self.medium += 1,
            PriorityLevel::Low => self.low += 1,
        }
    }

    pub fn get(&self, level: PriorityLevel) -> usize {
        match level {
            PriorityLevel::Critical => self.critical,
            PriorityLevel::High => self.high,
            PriorityLevel::Medium => self.medium,
            PriorityLevel::Low => self.low,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low
    }
}

/// Percentage of records per level
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct LevelShares {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl LevelShares {
    fn from_counts(counts: &LevelCounts) -> Self {
        let total = counts.total();
        if total == 0 {
            return LevelShares::default();
        }
        let pct = |n: usize| n as f64 * 100.0 / total as f64;
        LevelShares {
            critical: pct(counts.critical),
            high: pct(counts.high),
            medium: pct(counts.medium),
            low: pct(counts.low),
        }
    }

    pub fn get(&self, level: PriorityLevel) -> f64 {
        match level {
            PriorityLevel::Critical => self.critical,
            PriorityLevel::High => self.high,
            PriorityLevel::Medium => self.medium,
            PriorityLevel::Low => self.low,
        }
    }
}

/// Aggregate view of the store
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityStats {
    pub total: usize,
    pub by_level: LevelCounts,
    pub average_score: f64,
    pub top_score: Option<Score>,
    pub distribution: LevelShares,
}

impl PriorityStats {
    /// Accumulate over records already in priority order
    pub(crate) fn collect<I>(scores: I) -> Self
    where
        I: IntoIterator<Item = (Score, PriorityLevel)>,
    {
        let mut by_level = LevelCounts::default();
        let mut top_score = None;
        let mut sum: u64 = 0;

        for (score, level) in scores {
            by_level.record(level);
            top_score = top_score.max(Some(score));
            sum += score.hundredths() as u64;
        }

        let total = by_level.total();
        let average_score = if total == 0 {
            0.0
        } else {
            sum as f64 / total as f64 / 100.0
        };

        PriorityStats {
            total,
            by_level,
            average_score,
            top_score,
            distribution: LevelShares::from_counts(&by_level),
        }
    }
}
