//! Weight-driven program signals: consolidation length and target reached.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Days of consolidation recommended per kilogram lost.
pub const CONSOLIDATION_DAYS_PER_KG: f64 = 10.0;

/// Minimum spacing between the two readings that confirm a target.
pub const TARGET_CONFIRMATION_GAP_DAYS: i64 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightObservation {
    pub subject_id: String,
    pub date: NaiveDate,
    pub weight_kg: f64,
}

/// `ceil(max(0, start - current) * 10)`.
///
/// Weight gained or non-finite inputs give 0.
pub fn estimate_consolidation_days(start_weight_kg: f64, current_weight_kg: f64) -> u32 {
    let lost = start_weight_kg - current_weight_kg;
    if !lost.is_finite() || lost <= 0.0 {
        return 0;
    }
    // 0.3 * 10.0 is 3.0000000000000004 in f64; trim that before the ceiling.
    let scaled = (lost * CONSOLIDATION_DAYS_PER_KG * 1e6).round() / 1e6;
    scaled.ceil().min(f64::from(u32::MAX)) as u32
}

/// True when the two most recent readings are both at or under `target_kg`
/// and were taken at least two days apart.
pub fn is_target_reached(observations: &[WeightObservation], target_kg: Option<f64>) -> bool {
    let Some(target) = target_kg.filter(|t| t.is_finite()) else {
        return false;
    };

    let mut latest: Vec<&WeightObservation> = observations.iter().collect();
    latest.sort_by(|a, b| b.date.cmp(&a.date));
    let [newest, previous, ..] = latest.as_slice() else {
        return false;
    };

    let both_under = newest.weight_kg <= target && previous.weight_kg <= target;
    let gap = (newest.date - previous.date).num_days().abs();
    both_under && gap >= TARGET_CONFIRMATION_GAP_DAYS
}
