//! Priority scorer

use chrono::{DateTime, Utc};

use beacon_core::{
    Event, FactorBreakdown, NetworkBreakdown, NetworkStatus, Priority, PriorityLevel, Score,
    ScoreBreakdown,
};

/// Weight of caller-declared importance
pub const IMPORTANCE_WEIGHT: f64 = 0.5;
/// Weight of battery depletion
pub const BATTERY_WEIGHT: f64 = 0.3;
/// Weight of network quality
pub const NETWORK_WEIGHT: f64 = 0.2;

/// Upper bound of the importance domain
pub const IMPORTANCE_MAX: f64 = 10.0;
/// Upper bound of the battery domain (percent)
pub const BATTERY_MAX: f64 = 100.0;

/// Network quality on the [0, 10] scale
pub fn network_factor(status: NetworkStatus) -> f64 {
    match status {
        NetworkStatus::Excellent => 10.0,
        NetworkStatus::Good => 8.0,
        NetworkStatus::Fair => 5.0,
        NetworkStatus::Poor => 2.0,
        NetworkStatus::Critical => 0.0,
        NetworkStatus::Unknown => 5.0,
    }
}

/// Clamp into [0, max]; NaN goes to the lower bound
#[inline]
fn clamp_domain(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, max)
    }
}

#[inline]
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Score an event, stamping the result with the current time
pub fn score_event(event: &Event) -> Priority {
    score_event_at(event, Utc::now())
}

/// Score an event with an explicit computation time
pub fn score_event_at(event: &Event, computed_at: DateTime<Utc>) -> Priority {
    let importance = clamp_domain(event.importance, IMPORTANCE_MAX);
    // Depleted batteries are more urgent
    let battery = (BATTERY_MAX - clamp_domain(event.battery, BATTERY_MAX)) / 10.0;
    let network = network_factor(event.network_status);

    let weighted_importance = IMPORTANCE_WEIGHT * importance;
    let weighted_battery = BATTERY_WEIGHT * battery;
    let weighted_network = NETWORK_WEIGHT * network;

    let score = Score::from_f64(weighted_importance + weighted_battery + weighted_network);

    Priority {
        score,
        level: PriorityLevel::from_score(score),
        computed_at,
        breakdown: ScoreBreakdown {
            importance: FactorBreakdown {
                raw: event.importance,
                normalized: importance,
                weighted: round2(weighted_importance),
            },
            battery: FactorBreakdown {
                raw: event.battery,
                normalized: battery,
                weighted: round2(weighted_battery),
            },
            network: NetworkBreakdown {
                status: event.network_status,
                normalized: network,
                weighted: round2(weighted_network),
            },
        },
    }
}

/// Score a set of events inline, preserving input order
pub fn score_all<'a, I>(events: I) -> Vec<(Event, Priority)>
where
    I: IntoIterator<Item = &'a Event>,
{
    let now = Utc::now();
    events
        .into_iter()
        .map(|event| (event.clone(), score_event_at(event, now)))
        .collect()
}
