//! Daily workout recommendation.
//!
//! One uniform draw decides the bucket (via the phase's [`MixPolicy`]) and,
//! rescaled, the entry inside the first non-empty candidate set. Candidate
//! sets come from an ordered filter chain: base + bucket first, then base
//! alone, so a phase with any eligible entry always gets a result.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::mix::{Bucket, MixPolicy, MixPolicyTable};
use super::{ExerciseEntry, GenderScope};
use crate::program::{PhaseSession, PhaseType};
use crate::subject::Gender;

/// One step of the fallback chain.
pub struct CandidateFilter<'a> {
    pub label: &'static str,
    /// Draw used to index into this filter's candidates.
    pub draw: f64,
    pub bucket: Option<Bucket>,
    predicate: Box<dyn Fn(&ExerciseEntry) -> bool + 'a>,
}

impl<'a> CandidateFilter<'a> {
    pub fn new(
        label: &'static str,
        draw: f64,
        bucket: Option<Bucket>,
        predicate: impl Fn(&ExerciseEntry) -> bool + 'a,
    ) -> Self {
        Self {
            label,
            draw,
            bucket,
            predicate: Box::new(predicate),
        }
    }

    pub fn matches(&self, entry: &ExerciseEntry) -> bool {
        (self.predicate)(entry)
    }
}

/// Walk `chain` in order; return the first filter with candidates and the
/// entry its draw selects.
pub fn first_match<'e>(
    catalog: &'e [ExerciseEntry],
    chain: &[CandidateFilter<'_>],
) -> Option<(usize, &'e ExerciseEntry)> {
    let mut ordered: Vec<&ExerciseEntry> = catalog.iter().collect();
    ordered.sort_by(|a, b| a.id.cmp(&b.id));

    chain.iter().enumerate().find_map(|(step, filter)| {
        let candidates: Vec<&ExerciseEntry> =
            ordered.iter().copied().filter(|e| filter.matches(e)).collect();
        if candidates.is_empty() {
            return None;
        }
        let index = ((filter.draw * candidates.len() as f64) as usize).min(candidates.len() - 1);
        Some((step, candidates[index]))
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub entry: ExerciseEntry,
    pub phase_type: PhaseType,
    pub weeks_elapsed: u32,
    /// Bucket the draw selected; `None` when the phase has no mix policy.
    pub bucket: Option<Bucket>,
    /// True when the bucket was empty and the base filter answered.
    pub fell_back: bool,
    pub draw: f64,
}

pub struct WorkoutRecommender<'a> {
    policies: &'a MixPolicyTable,
}

impl<'a> WorkoutRecommender<'a> {
    pub fn new(policies: &'a MixPolicyTable) -> Self {
        Self { policies }
    }

    /// Build the filter chain for a phase, gender and draw.
    pub fn filter_chain<'p>(
        policy: Option<&'p MixPolicy>,
        phase: PhaseType,
        gender: Option<Gender>,
        weeks_elapsed: u32,
        r: f64,
    ) -> Vec<CandidateFilter<'p>> {
        let base = move |e: &ExerciseEntry| {
            gender.map_or(e.gender_scope == GenderScope::All, |g| e.gender_scope.admits(g))
                && e.allows(phase)
                && policy.is_none_or(|p| p.within_cap(e))
        };

        match policy {
            Some(policy) => {
                let bucket = policy.pick_bucket(r, weeks_elapsed);
                let bucket_filter = policy.bucket_filter(bucket);
                vec![
                    CandidateFilter::new(
                        "bucket",
                        policy.rescale(r, weeks_elapsed, bucket),
                        Some(bucket),
                        move |e| base(e) && bucket_filter.matches(e),
                    ),
                    CandidateFilter::new("base", r, Some(bucket), base),
                ]
            }
            None => vec![CandidateFilter::new("base", r, None, base)],
        }
    }

    /// Pick today's workout for a subject in `session`.
    ///
    /// Without a known gender only `ALL`-scoped entries qualify. Returns
    /// `None` only when no catalog entry is eligible for the phase.
    pub fn choose(
        &self,
        catalog: &[ExerciseEntry],
        session: &PhaseSession,
        gender: Option<Gender>,
        today: NaiveDate,
        r: f64,
    ) -> Option<Recommendation> {
        let weeks_elapsed = session.weeks_elapsed(today);
        let policy = self.policies.get(session.phase_type);
        let chain = Self::filter_chain(policy, session.phase_type, gender, weeks_elapsed, r);

        let (step, entry) = first_match(catalog, &chain)?;
        let filter = &chain[step];
        let fell_back = policy.is_some() && step > 0;

        tracing::debug!(
            phase = %session.phase_type,
            weeks_elapsed,
            draw = r,
            filter = filter.label,
            exercise = %entry.id,
            "recommended workout"
        );

        Some(Recommendation {
            entry: entry.clone(),
            phase_type: session.phase_type,
            weeks_elapsed,
            bucket: filter.bucket,
            fell_back,
            draw: r,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{PcgRandom, RandomSource};
    use crate::program::SessionStatus;
    use crate::workout::{ActivityType, GenderScope, Intensity};
    use chrono::Duration;

    fn entry(
        id: &str,
        activity_type: ActivityType,
        intensity: Intensity,
        phases: &[PhaseType],
    ) -> ExerciseEntry {
        ExerciseEntry {
            id: id.into(),
            name: id.into(),
            activity_type,
            intensity,
            gender_scope: GenderScope::All,
            allowed_phases: phases.iter().copied().collect(),
            met_value: 5.0,
        }
    }

    fn session(phase: PhaseType, start: NaiveDate) -> PhaseSession {
        PhaseSession {
            id: "s".into(),
            subject_id: "alice".into(),
            session_number: 1,
            phase_type: phase,
            start_date: start,
            end_date: start + Duration::days(70),
            status: SessionStatus::Active,
        }
    }

    fn catalog() -> Vec<ExerciseEntry> {
        use ActivityType::*;
        use Intensity::*;
        let all = PhaseType::ALL;
        vec![
            entry("walk", Cardio, Low, &all),
            entry("swim", Cardio, Moderate, &all),
            entry("stretch", Mobility, Low, &all),
            entry("yoga", Recovery, Low, &all),
            entry("sprints", Hiit, High, &all),
            entry("deadlift", Strength, High, &all),
            entry("goblet", Strength, Moderate, &all),
        ]
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn detox_never_recommends_high_intensity() {
        let table = MixPolicyTable::default();
        let recommender = WorkoutRecommender::new(&table);
        let start = date(2026, 1, 1);
        let detox = session(PhaseType::Detox, start);
        let catalog = catalog();
        let mut rng = PcgRandom::new(Some(7));

        for day in 0..1000 {
            let today = start + Duration::days(day % 7);
            let rec = recommender
                .choose(&catalog, &detox, Some(Gender::Female), today, rng.next_f64())
                .unwrap();
            assert_ne!(rec.entry.intensity, Intensity::High, "draw {}", rec.draw);
            assert_eq!(rec.entry.intensity, Intensity::Low);
        }
    }

    #[test]
    fn low_draw_picks_primary_bucket() {
        let table = MixPolicyTable::default();
        let recommender = WorkoutRecommender::new(&table);
        let start = date(2026, 1, 1);
        let rec = recommender
            .choose(&catalog(), &session(PhaseType::Detox, start), Some(Gender::Male), start, 0.1)
            .unwrap();
        assert_eq!(rec.bucket, Some(Bucket::Primary));
        assert_eq!(rec.entry.id, "walk");
        assert!(!rec.fell_back);
    }

    #[test]
    fn high_draw_picks_secondary_bucket() {
        let table = MixPolicyTable::default();
        let recommender = WorkoutRecommender::new(&table);
        let start = date(2026, 1, 1);
        let rec = recommender
            .choose(&catalog(), &session(PhaseType::Detox, start), Some(Gender::Male), start, 0.95)
            .unwrap();
        assert_eq!(rec.bucket, Some(Bucket::Secondary));
        assert!(matches!(
            rec.entry.activity_type,
            ActivityType::Mobility | ActivityType::Recovery
        ));
    }

    #[test]
    fn balance_split_depends_on_weeks_elapsed() {
        let table = MixPolicyTable::default();
        let recommender = WorkoutRecommender::new(&table);
        let start = date(2026, 1, 1);
        let balance = session(PhaseType::Balance, start);

        let early = recommender
            .choose(&catalog(), &balance, Some(Gender::Male), start, 0.5)
            .unwrap();
        assert_eq!(early.bucket, Some(Bucket::Primary));
        assert_eq!(early.entry.activity_type, ActivityType::Cardio);

        let late = recommender
            .choose(&catalog(), &balance, Some(Gender::Male), start + Duration::days(28), 0.5)
            .unwrap();
        assert_eq!(late.weeks_elapsed, 4);
        assert_eq!(late.bucket, Some(Bucket::Secondary));
        assert!(matches!(
            late.entry.activity_type,
            ActivityType::Strength | ActivityType::Hiit
        ));
    }

    #[test]
    fn empty_bucket_falls_back_to_base_filter() {
        let table = MixPolicyTable::default();
        let recommender = WorkoutRecommender::new(&table);
        let start = date(2026, 1, 1);
        let only_cardio = vec![entry(
            "walk",
            ActivityType::Cardio,
            Intensity::Low,
            &[PhaseType::Detox],
        )];
        let rec = recommender
            .choose(&only_cardio, &session(PhaseType::Detox, start), Some(Gender::Male), start, 0.9)
            .unwrap();
        assert_eq!(rec.bucket, Some(Bucket::Secondary));
        assert!(rec.fell_back);
        assert_eq!(rec.entry.id, "walk");
    }

    #[test]
    fn sole_moderate_entry_is_returned_in_detox() {
        let table = MixPolicyTable::default();
        let recommender = WorkoutRecommender::new(&table);
        let start = date(2026, 1, 1);
        let only = vec![entry("bike", ActivityType::Cardio, Intensity::Moderate, &[PhaseType::Detox])];
        let rec = recommender
            .choose(&only, &session(PhaseType::Detox, start), Some(Gender::Female), start, 0.1)
            .unwrap();
        assert_eq!(rec.entry.id, "bike");
        assert!(rec.fell_back);
    }

    #[test]
    fn sole_high_entry_is_returned_in_consolidation() {
        let table = MixPolicyTable::default();
        let recommender = WorkoutRecommender::new(&table);
        let start = date(2026, 1, 1);
        let only = vec![entry(
            "deadlift",
            ActivityType::Strength,
            Intensity::High,
            &[PhaseType::Consolidation],
        )];
        let rec = recommender
            .choose(&only, &session(PhaseType::Consolidation, start), Some(Gender::Male), start, 0.9)
            .unwrap();
        assert_eq!(rec.entry.id, "deadlift");
        assert!(rec.fell_back);
    }

    #[test]
    fn detox_with_only_high_intensity_entries_has_no_result() {
        let table = MixPolicyTable::default();
        let recommender = WorkoutRecommender::new(&table);
        let start = date(2026, 1, 1);
        let only = vec![entry("sprints", ActivityType::Hiit, Intensity::High, &[PhaseType::Detox])];
        assert!(recommender
            .choose(&only, &session(PhaseType::Detox, start), Some(Gender::Male), start, 0.5)
            .is_none());
    }

    #[test]
    fn gender_scope_and_allowed_phases_are_enforced() {
        let table = MixPolicyTable::default();
        let recommender = WorkoutRecommender::new(&table);
        let start = date(2026, 1, 1);
        let mut male_only = entry("pushups", ActivityType::Cardio, Intensity::Low, &[PhaseType::Detox]);
        male_only.gender_scope = GenderScope::Male;
        let wrong_phase = entry("row", ActivityType::Cardio, Intensity::Low, &[PhaseType::Balance]);
        let catalog = vec![male_only, wrong_phase];

        let detox = session(PhaseType::Detox, start);
        assert!(recommender
            .choose(&catalog, &detox, Some(Gender::Female), start, 0.2)
            .is_none());
        let rec = recommender
            .choose(&catalog, &detox, Some(Gender::Male), start, 0.2)
            .unwrap();
        assert_eq!(rec.entry.id, "pushups");
    }

    #[test]
    fn unknown_gender_only_sees_unscoped_entries() {
        let table = MixPolicyTable::default();
        let recommender = WorkoutRecommender::new(&table);
        let start = date(2026, 1, 1);
        let mut female_only = entry("dance", ActivityType::Cardio, Intensity::Low, &[PhaseType::Detox]);
        female_only.gender_scope = GenderScope::Female;
        let open = entry("walk", ActivityType::Cardio, Intensity::Low, &[PhaseType::Detox]);
        let catalog = vec![female_only, open];
        for r in [0.0, 0.3, 0.69] {
            let rec = recommender
                .choose(&catalog, &session(PhaseType::Detox, start), None, start, r)
                .unwrap();
            assert_eq!(rec.entry.id, "walk");
        }
    }

    #[test]
    fn same_draw_gives_same_entry() {
        let table = MixPolicyTable::default();
        let recommender = WorkoutRecommender::new(&table);
        let start = date(2026, 1, 1);
        let mut shuffled = catalog();
        shuffled.reverse();
        let a = recommender
            .choose(&catalog(), &session(PhaseType::Maintenance, start), Some(Gender::Male), start, 0.77)
            .unwrap();
        let b = recommender
            .choose(&shuffled, &session(PhaseType::Maintenance, start), Some(Gender::Male), start, 0.77)
            .unwrap();
        assert_eq!(a.entry.id, b.entry.id);
    }

    #[test]
    fn phase_without_policy_uses_base_filter() {
        let table = MixPolicyTable::empty();
        let recommender = WorkoutRecommender::new(&table);
        let start = date(2026, 1, 1);
        let rec = recommender
            .choose(&catalog(), &session(PhaseType::Detox, start), Some(Gender::Male), start, 0.99)
            .unwrap();
        assert_eq!(rec.bucket, None);
        assert!(!rec.fell_back);
    }
}
