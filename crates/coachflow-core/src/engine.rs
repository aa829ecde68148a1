//! Engine facade.
//!
//! [`ProgramEngine`] wires the calendar generator, phase resolver, workout
//! recommender, weight checks and notification gate to one store, one clock
//! and one random source. Every "today" is the clock's instant shifted by the
//! configured UTC offset.

use chrono::NaiveDate;

use crate::clock::{local_date, Clock, PcgRandom, RandomSource, SystemClock};
use crate::error::{Result, ValidationError};
use crate::notify::{
    Category, GateOutcome, GatePolicy, NotificationGate, PhaseTransitionNotifier, Priority,
    TransitionReport,
};
use crate::program::{CalendarGenerator, PhaseCatalog, PhaseResolver, PhaseSession, PhaseType, SubscriptionTier};
use crate::storage::{EngineConfig, ProgramStore};
use crate::weight::{self, WeightObservation};
use crate::workout::{self, ExerciseEntry, MixPolicyTable, Recommendation, WorkoutRecommender};

pub struct ProgramEngine<S: ProgramStore, C: Clock = SystemClock, R: RandomSource = PcgRandom> {
    store: S,
    clock: C,
    rng: R,
    catalog: PhaseCatalog,
    policies: MixPolicyTable,
    gate_policy: GatePolicy,
    horizon_days: u32,
}

impl<S: ProgramStore, C: Clock, R: RandomSource> ProgramEngine<S, C, R> {
    /// # Errors
    /// [`crate::CoreError::Validation`] if the configured catalog or mix
    /// policies are invalid.
    pub fn new(store: S, clock: C, rng: R, config: &EngineConfig) -> Result<Self> {
        Ok(Self {
            store,
            clock,
            rng,
            catalog: config.phase_catalog()?,
            policies: config.mix_policies()?,
            gate_policy: config.gate_policy(),
            horizon_days: config.program.approaching_horizon_days,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn catalog(&self) -> &PhaseCatalog {
        &self.catalog
    }

    /// Subject-local date.
    pub fn today(&self) -> NaiveDate {
        local_date(self.clock.now(), self.gate_policy.utc_offset_minutes)
    }

    fn gate(&self) -> NotificationGate<'_, S> {
        NotificationGate::new(&self.store, self.gate_policy)
    }

    // === Program lifecycle ===

    /// Build and atomically install a subject's schedule for `tier`.
    pub fn generate_calendar(
        &self,
        subject_id: &str,
        tier: SubscriptionTier,
        start: NaiveDate,
    ) -> Result<Vec<PhaseSession>> {
        CalendarGenerator::new(&self.catalog).generate(&self.store, subject_id, tier, start, self.today())
    }

    pub fn resolve_active_phase(&self, subject_id: &str) -> Result<Option<PhaseSession>> {
        PhaseResolver::new(&self.store).resolve_active(subject_id, self.today())
    }

    pub fn resolve_starting_today(&self, subject_id: &str) -> Result<Option<PhaseSession>> {
        PhaseResolver::new(&self.store).resolve_starting_today(subject_id, self.today())
    }

    pub fn resolve_ending_today(&self, subject_id: &str) -> Result<Option<PhaseSession>> {
        PhaseResolver::new(&self.store).resolve_ending_today(subject_id, self.today())
    }

    /// Session starting `approaching_horizon_days` from today.
    pub fn resolve_approaching(&self, subject_id: &str) -> Result<Option<PhaseSession>> {
        PhaseResolver::new(&self.store).resolve_approaching(subject_id, self.today(), self.horizon_days)
    }

    /// Coach override of one session's phase. Dates are unchanged.
    ///
    /// # Errors
    /// [`ValidationError::SessionNotFound`] if the subject has no such session.
    pub fn override_phase(&self, subject_id: &str, session_number: u32, phase_type: PhaseType) -> Result<()> {
        if !self.store.override_phase_type(subject_id, session_number, phase_type)? {
            return Err(ValidationError::SessionNotFound {
                subject_id: subject_id.to_string(),
                session_number,
            }
            .into());
        }
        tracing::info!(subject_id, session_number, phase = %phase_type, "phase overridden");
        Ok(())
    }

    // === Workouts ===

    /// Today's workout for the subject's active phase.
    pub fn recommend_workout(&mut self, subject_id: &str) -> Result<Option<ExerciseEntry>> {
        Ok(self.recommend_workout_detailed(subject_id)?.map(|rec| rec.entry))
    }

    /// Like [`Self::recommend_workout`], with the bucket and draw that led to it.
    ///
    /// Draws exactly once when the subject has an active phase, never otherwise.
    pub fn recommend_workout_detailed(&mut self, subject_id: &str) -> Result<Option<Recommendation>> {
        let today = self.today();
        let Some(session) = PhaseResolver::new(&self.store).resolve_active(subject_id, today)? else {
            return Ok(None);
        };
        let gender = self.store.profile(subject_id)?.map(|p| p.gender);
        let catalog = self.store.exercises()?;

        let r = self.rng.next_f64();
        Ok(WorkoutRecommender::new(&self.policies).choose(&catalog, &session, gender, today, r))
    }

    /// Calories for `minutes` of `exercise` using the subject's profile weight.
    pub fn estimate_calories(&self, subject_id: &str, exercise: &ExerciseEntry, minutes: u32) -> Result<u32> {
        let profile = self.store.profile(subject_id)?;
        let latest = self.store.latest_weights(subject_id, 1)?;
        let weight = latest
            .first()
            .map(|o| o.weight_kg)
            .or_else(|| profile.as_ref().and_then(|p| p.weight_kg));
        Ok(workout::estimate_calories(
            Some(exercise.met_value),
            weight,
            Some(minutes),
            profile.map(|p| p.gender),
        ))
    }

    // === Weight ===

    pub fn estimate_consolidation_days(&self, start_weight_kg: f64, current_weight_kg: f64) -> u32 {
        weight::estimate_consolidation_days(start_weight_kg, current_weight_kg)
    }

    /// Consolidation length from the profile's start weight and the most
    /// recent reading (profile weight when no reading exists).
    pub fn consolidation_days_for(&self, subject_id: &str) -> Result<Option<u32>> {
        let Some(profile) = self.store.profile(subject_id)? else {
            return Ok(None);
        };
        let current = self
            .store
            .latest_weights(subject_id, 1)?
            .first()
            .map(|o| o.weight_kg)
            .or(profile.weight_kg);
        Ok(profile
            .start_weight_kg
            .zip(current)
            .map(|(start, current)| weight::estimate_consolidation_days(start, current)))
    }

    pub fn is_target_reached(&self, subject_id: &str) -> Result<bool> {
        let target = self.store.profile(subject_id)?.and_then(|p| p.target_weight_kg);
        let latest = self.store.latest_weights(subject_id, 2)?;
        Ok(weight::is_target_reached(&latest, target))
    }

    /// Record a reading dated subject-local today.
    pub fn record_weight(&self, subject_id: &str, weight_kg: f64) -> Result<WeightObservation> {
        if !weight_kg.is_finite() || weight_kg <= 0.0 {
            return Err(ValidationError::InvalidValue {
                field: "weight_kg".to_string(),
                message: format!("must be a positive number, got {weight_kg}"),
            }
            .into());
        }
        let observation = WeightObservation {
            subject_id: subject_id.to_string(),
            date: self.today(),
            weight_kg,
        };
        self.store.record_weight(&observation)?;
        Ok(observation)
    }

    // === Notifications ===

    pub fn submit_notification(
        &self,
        subject_id: &str,
        title: &str,
        message: &str,
        category: Category,
        priority: Priority,
    ) -> Result<GateOutcome> {
        self.gate()
            .submit(subject_id, title, message, category, priority, self.clock.now())
    }

    pub fn submit_batch(
        &self,
        subject_ids: &[String],
        title: &str,
        message: &str,
        category: Category,
        priority: Priority,
    ) -> Result<Vec<(String, GateOutcome)>> {
        self.gate()
            .submit_batch(subject_ids, title, message, category, priority, self.clock.now())
    }

    pub fn run_phase_transition_check(&self, subject_id: &str) -> Result<TransitionReport> {
        PhaseTransitionNotifier::new(
            &self.store,
            self.gate(),
            self.horizon_days,
            self.gate_policy.utc_offset_minutes,
        )
        .run_check(subject_id, self.clock.now())
    }
}
