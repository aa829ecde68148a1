//! Phase-dependent exercise mix policies.
//!
//! A [`MixPolicy`] splits the catalog into a primary (cardio / low-impact)
//! and a secondary (strength / recovery) bucket and says, as a function of
//! whole weeks spent in the phase, how likely the primary bucket is. Picking
//! a bucket from a draw is pure; the catalog query lives in
//! [`super::recommender`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::{ActivityType, ExerciseEntry, Intensity};
use crate::error::ValidationError;
use crate::program::PhaseType;

/// Which side of the split a draw landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Primary,
    Secondary,
}

/// No intensity constraint.
const ANY_INTENSITY: [Intensity; 0] = [];

/// Activity-type and intensity constraint of one bucket.
///
/// An empty `intensities` set admits every intensity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketFilter {
    pub activity_types: BTreeSet<ActivityType>,
    #[serde(default)]
    pub intensities: BTreeSet<Intensity>,
}

impl BucketFilter {
    pub fn new(
        activity_types: impl IntoIterator<Item = ActivityType>,
        intensities: impl IntoIterator<Item = Intensity>,
    ) -> Self {
        Self {
            activity_types: activity_types.into_iter().collect(),
            intensities: intensities.into_iter().collect(),
        }
    }

    pub fn matches(&self, entry: &ExerciseEntry) -> bool {
        self.activity_types.contains(&entry.activity_type)
            && (self.intensities.is_empty() || self.intensities.contains(&entry.intensity))
    }
}

/// Probability of the primary bucket over time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MixSchedule {
    /// Same split for the whole phase.
    Constant { primary_probability: f64 },
    /// `early` before `week`, `late` from `week` on.
    Threshold {
        week: u32,
        early_primary_probability: f64,
        late_primary_probability: f64,
    },
}

impl MixSchedule {
    pub fn primary_probability(&self, weeks_elapsed: u32) -> f64 {
        match *self {
            MixSchedule::Constant {
                primary_probability,
            } => primary_probability,
            MixSchedule::Threshold {
                week,
                early_primary_probability,
                late_primary_probability,
            } => {
                if weeks_elapsed < week {
                    early_primary_probability
                } else {
                    late_primary_probability
                }
            }
        }
    }

    fn probabilities(&self) -> Vec<(&'static str, f64)> {
        match *self {
            MixSchedule::Constant {
                primary_probability,
            } => vec![("primary_probability", primary_probability)],
            MixSchedule::Threshold {
                early_primary_probability,
                late_primary_probability,
                ..
            } => vec![
                ("early_primary_probability", early_primary_probability),
                ("late_primary_probability", late_primary_probability),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixPolicy {
    pub primary: BucketFilter,
    pub secondary: BucketFilter,
    pub schedule: MixSchedule,
    /// Hard ceiling applied to every candidate, fallback included.
    #[serde(default)]
    pub max_intensity: Option<Intensity>,
}

impl MixPolicy {
    pub fn primary_probability(&self, weeks_elapsed: u32) -> f64 {
        self.schedule.primary_probability(weeks_elapsed).clamp(0.0, 1.0)
    }

    /// `Primary` when `r < p`, otherwise `Secondary`.
    pub fn pick_bucket(&self, r: f64, weeks_elapsed: u32) -> Bucket {
        if r < self.primary_probability(weeks_elapsed) {
            Bucket::Primary
        } else {
            Bucket::Secondary
        }
    }

    pub fn bucket_filter(&self, bucket: Bucket) -> &BucketFilter {
        match bucket {
            Bucket::Primary => &self.primary,
            Bucket::Secondary => &self.secondary,
        }
    }

    pub fn within_cap(&self, entry: &ExerciseEntry) -> bool {
        self.max_intensity.is_none_or(|cap| entry.intensity <= cap)
    }

    /// Re-spread the part of the draw that selected `bucket` over `[0, 1)`,
    /// so the same sample can also pick an entry inside the bucket.
    pub fn rescale(&self, r: f64, weeks_elapsed: u32, bucket: Bucket) -> f64 {
        let p = self.primary_probability(weeks_elapsed);
        let u = match bucket {
            Bucket::Primary if p > 0.0 => r / p,
            Bucket::Secondary if p < 1.0 => (r - p) / (1.0 - p),
            _ => r,
        };
        u.clamp(0.0, 1.0 - f64::EPSILON)
    }

    /// # Errors
    /// Rejects probabilities outside `[0, 1]`.
    pub fn validate(&self, phase: PhaseType) -> Result<(), ValidationError> {
        for (field, value) in self.schedule.probabilities() {
            if !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::ProbabilityOutOfRange {
                    field: format!("{}.{}", phase, field),
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Phase -> policy lookup table.
#[derive(Debug, Clone, PartialEq)]
pub struct MixPolicyTable {
    policies: BTreeMap<PhaseType, MixPolicy>,
}

impl Default for MixPolicyTable {
    fn default() -> Self {
        use ActivityType::*;
        use Intensity::*;

        let low_impact_recovery = || BucketFilter::new([Mobility, Recovery], [Low]);

        let mut policies = BTreeMap::new();
        policies.insert(
            PhaseType::Detox,
            MixPolicy {
                primary: BucketFilter::new([Cardio], [Low]),
                secondary: low_impact_recovery(),
                schedule: MixSchedule::Constant {
                    primary_probability: 0.7,
                },
                max_intensity: Some(Moderate),
            },
        );
        policies.insert(
            PhaseType::DetoxPlus,
            MixPolicy {
                primary: BucketFilter::new([Cardio], [Low, Moderate]),
                secondary: low_impact_recovery(),
                schedule: MixSchedule::Constant {
                    primary_probability: 0.7,
                },
                max_intensity: Some(Moderate),
            },
        );
        policies.insert(
            PhaseType::Attack,
            MixPolicy {
                primary: BucketFilter::new([Cardio, Hiit], ANY_INTENSITY),
                secondary: BucketFilter::new([Strength], ANY_INTENSITY),
                schedule: MixSchedule::Threshold {
                    week: 2,
                    early_primary_probability: 0.7,
                    late_primary_probability: 0.3,
                },
                max_intensity: None,
            },
        );
        policies.insert(
            PhaseType::Balance,
            MixPolicy {
                primary: BucketFilter::new([Cardio], [Low, Moderate]),
                secondary: BucketFilter::new([Strength, Hiit], [Moderate, High]),
                schedule: MixSchedule::Threshold {
                    week: 4,
                    early_primary_probability: 0.6,
                    late_primary_probability: 0.4,
                },
                max_intensity: None,
            },
        );
        policies.insert(
            PhaseType::Consolidation,
            MixPolicy {
                primary: BucketFilter::new([Cardio, Mobility], [Low, Moderate]),
                secondary: BucketFilter::new([Strength], [Low, Moderate]),
                schedule: MixSchedule::Constant {
                    primary_probability: 0.5,
                },
                max_intensity: None,
            },
        );
        policies.insert(
            PhaseType::Maintenance,
            MixPolicy {
                primary: BucketFilter::new([Cardio], ANY_INTENSITY),
                secondary: BucketFilter::new([Strength], ANY_INTENSITY),
                schedule: MixSchedule::Constant {
                    primary_probability: 0.5,
                },
                max_intensity: None,
            },
        );
        Self { policies }
    }
}

impl MixPolicyTable {
    pub fn empty() -> Self {
        Self {
            policies: BTreeMap::new(),
        }
    }

    pub fn get(&self, phase: PhaseType) -> Option<&MixPolicy> {
        self.policies.get(&phase)
    }

    /// Replace one phase's policy.
    pub fn with_policy(mut self, phase: PhaseType, policy: MixPolicy) -> Result<Self, ValidationError> {
        policy.validate(phase)?;
        self.policies.insert(phase, policy);
        Ok(self)
    }

    /// Defaults with configured overrides applied on top.
    pub fn with_overrides(
        overrides: &BTreeMap<PhaseType, MixPolicy>,
    ) -> Result<Self, ValidationError> {
        overrides
            .iter()
            .try_fold(Self::default(), |table, (phase, policy)| {
                table.with_policy(*phase, policy.clone())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(activity_type: ActivityType, intensity: Intensity) -> ExerciseEntry {
        ExerciseEntry {
            id: "x".into(),
            name: "x".into(),
            activity_type,
            intensity,
            gender_scope: Default::default(),
            allowed_phases: PhaseType::ALL.into_iter().collect(),
            met_value: 4.0,
        }
    }

    #[test]
    fn detox_split_is_seventy_thirty_without_time_dependency() {
        let table = MixPolicyTable::default();
        let detox = table.get(PhaseType::Detox).unwrap();
        for weeks in [0, 1, 5, 52] {
            assert_eq!(detox.pick_bucket(0.69, weeks), Bucket::Primary);
            assert_eq!(detox.pick_bucket(0.70, weeks), Bucket::Secondary);
        }
    }

    #[test]
    fn balance_inverts_at_week_four() {
        let table = MixPolicyTable::default();
        let balance = table.get(PhaseType::Balance).unwrap();
        assert_eq!(balance.pick_bucket(0.5, 3), Bucket::Primary);
        assert_eq!(balance.pick_bucket(0.5, 4), Bucket::Secondary);
        assert!((balance.primary_probability(0) - 0.6).abs() < 1e-12);
        assert!((balance.primary_probability(10) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn attack_inverts_at_week_two() {
        let table = MixPolicyTable::default();
        let attack = table.get(PhaseType::Attack).unwrap();
        assert_eq!(attack.pick_bucket(0.5, 1), Bucket::Primary);
        assert_eq!(attack.pick_bucket(0.5, 2), Bucket::Secondary);
    }

    #[test]
    fn detox_cap_excludes_high_intensity() {
        let table = MixPolicyTable::default();
        let detox = table.get(PhaseType::Detox).unwrap();
        assert!(detox.within_cap(&entry(ActivityType::Cardio, Intensity::Low)));
        assert!(detox.within_cap(&entry(ActivityType::Cardio, Intensity::Moderate)));
        assert!(!detox.within_cap(&entry(ActivityType::Hiit, Intensity::High)));
    }

    #[test]
    fn only_detox_phases_carry_a_cap() {
        let table = MixPolicyTable::default();
        for phase in PhaseType::ALL {
            let cap = table.get(phase).unwrap().max_intensity;
            match phase {
                PhaseType::Detox | PhaseType::DetoxPlus => assert_eq!(cap, Some(Intensity::Moderate)),
                _ => assert_eq!(cap, None, "{phase}"),
            }
        }
    }

    #[test]
    fn bucket_filter_with_no_intensities_admits_all() {
        let filter = BucketFilter::new([ActivityType::Strength], ANY_INTENSITY);
        assert!(filter.matches(&entry(ActivityType::Strength, Intensity::High)));
        assert!(!filter.matches(&entry(ActivityType::Cardio, Intensity::Low)));
    }

    #[test]
    fn rescale_spreads_each_bucket_over_unit_interval() {
        let table = MixPolicyTable::default();
        let detox = table.get(PhaseType::Detox).unwrap();
        assert!((detox.rescale(0.35, 0, Bucket::Primary) - 0.5).abs() < 1e-9);
        assert!((detox.rescale(0.85, 0, Bucket::Secondary) - 0.5).abs() < 1e-9);
        assert!(detox.rescale(0.6999999, 0, Bucket::Primary) < 1.0);
    }

    #[test]
    fn out_of_range_probability_is_rejected() {
        let mut policy = MixPolicyTable::default()
            .get(PhaseType::Maintenance)
            .cloned()
            .unwrap();
        policy.schedule = MixSchedule::Constant {
            primary_probability: 1.5,
        };
        let result = MixPolicyTable::default().with_policy(PhaseType::Maintenance, policy);
        assert!(matches!(
            result,
            Err(ValidationError::ProbabilityOutOfRange { .. })
        ));
    }
}
