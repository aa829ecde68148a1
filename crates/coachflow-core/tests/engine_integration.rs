//! End-to-end tests through `ProgramEngine`: a subject buys a tier, moves
//! through phases, gets workouts and notifications, and reaches target.

use chrono::{Duration, NaiveDate, NaiveTime};

use coachflow_core::{
    ActivityType, Category, EngineConfig, ExerciseEntry, FixedClock, Gender, GenderScope,
    Intensity, NotificationPreferences, PhaseType, Priority, ProgramEngine, ProgramStore,
    QuietHours, RejectReason, SequenceRandom, SqliteStore, SubjectProfile, SubscriptionTier,
};

type TestEngine = ProgramEngine<SqliteStore, FixedClock, SequenceRandom>;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn engine_with(config: &EngineConfig, today: NaiveDate, hour: u32, draws: Vec<f64>) -> TestEngine {
    ProgramEngine::new(
        SqliteStore::open_memory().unwrap(),
        FixedClock::at(today, hour, 0),
        SequenceRandom::new(draws),
        config,
    )
    .unwrap()
}

fn exercise(id: &str, activity_type: ActivityType, intensity: Intensity) -> ExerciseEntry {
    ExerciseEntry {
        id: id.into(),
        name: id.into(),
        activity_type,
        intensity,
        gender_scope: GenderScope::All,
        allowed_phases: PhaseType::ALL.into_iter().collect(),
        met_value: 5.0,
    }
}

fn seed(engine: &TestEngine) {
    let store = engine.store();
    for entry in [
        exercise("a-walk", ActivityType::Cardio, Intensity::Low),
        exercise("b-swim", ActivityType::Cardio, Intensity::Moderate),
        exercise("c-stretch", ActivityType::Mobility, Intensity::Low),
        exercise("d-sprints", ActivityType::Hiit, Intensity::High),
        exercise("e-deadlift", ActivityType::Strength, Intensity::High),
        exercise("f-goblet", ActivityType::Strength, Intensity::Moderate),
    ] {
        store.insert_exercise(&entry).unwrap();
    }
    store
        .save_profile(&SubjectProfile::new("alice", Gender::Female))
        .unwrap();
}

#[test]
fn program_journey_from_purchase_to_balance() {
    let start = date(2026, 3, 2);
    let mut engine = engine_with(&EngineConfig::default(), start, 9, vec![0.05, 0.95, 0.5]);
    seed(&engine);

    let sessions = engine
        .generate_calendar("alice", SubscriptionTier::Essential, start)
        .unwrap();
    assert_eq!(sessions.len(), 3);

    let active = engine.resolve_active_phase("alice").unwrap().unwrap();
    assert_eq!(active.phase_type, PhaseType::Detox);
    assert_eq!(
        engine.resolve_starting_today("alice").unwrap().map(|s| s.session_number),
        Some(1)
    );

    for _ in 0..3 {
        let entry = engine.recommend_workout("alice").unwrap().unwrap();
        assert_eq!(entry.intensity, Intensity::Low);
    }

    // Two days before BALANCE starts on Mar 9.
    engine.clock().set(
        date(2026, 3, 7)
            .and_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap())
            .and_utc(),
    );
    assert_eq!(
        engine.resolve_approaching("alice").unwrap().map(|s| s.phase_type),
        Some(PhaseType::Balance)
    );
    let report = engine.run_phase_transition_check("alice").unwrap();
    assert!(report.starting.is_none());
    assert!(report.approaching.unwrap().is_delivered());

    engine.clock().advance(Duration::days(1));
    assert_eq!(
        engine.resolve_ending_today("alice").unwrap().map(|s| s.phase_type),
        Some(PhaseType::Detox)
    );

    engine.clock().advance(Duration::days(1));
    let report = engine.run_phase_transition_check("alice").unwrap();
    assert!(report.starting.unwrap().is_delivered());
    assert_eq!(
        engine.resolve_active_phase("alice").unwrap().map(|s| s.phase_type),
        Some(PhaseType::Balance)
    );

    let titles: Vec<String> = engine
        .store()
        .notifications("alice", 10)
        .unwrap()
        .into_iter()
        .map(|n| n.title)
        .collect();
    assert_eq!(
        titles,
        vec!["New phase starts today".to_string(), "Prepare for your next phase".to_string()]
    );
}

#[test]
fn coach_override_changes_the_recommendation_pool() {
    let start = date(2026, 3, 2);
    let mut engine = engine_with(&EngineConfig::default(), start, 9, vec![0.99]);
    seed(&engine);
    engine
        .generate_calendar("alice", SubscriptionTier::Discovery, start)
        .unwrap();

    // DETOX secondary bucket at r = 0.99.
    let detox = engine.recommend_workout("alice").unwrap().unwrap();
    assert_eq!(detox.id, "c-stretch");

    engine.override_phase("alice", 1, PhaseType::Maintenance).unwrap();
    let maintenance = engine.recommend_workout("alice").unwrap().unwrap();
    assert_eq!(maintenance.activity_type, ActivityType::Strength);
}

#[test]
fn gate_scenarios_through_the_engine() {
    let today = date(2026, 6, 1);
    let engine = engine_with(&EngineConfig::default(), today, 23, vec![]);
    let store = engine.store();

    let mut prefs = NotificationPreferences::defaults_for("alice");
    prefs.enable_lifestyle = false;
    prefs.quiet_hours_enabled = true;
    prefs.quiet_hours = QuietHours::new(
        NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
    );
    store.save_preferences(&prefs).unwrap();

    let disabled = engine
        .submit_notification("alice", "Tip", "Eat greens", Category::Lifestyle, Priority::High)
        .unwrap();
    assert_eq!(disabled.rejection(), Some(RejectReason::CategoryDisabled));

    let quiet = engine
        .submit_notification("alice", "Weigh in", "Step on", Category::WeighIn, Priority::Medium)
        .unwrap();
    assert_eq!(quiet.rejection(), Some(RejectReason::QuietHours));

    let urgent = engine
        .submit_notification("alice", "Weigh in", "Step on", Category::WeighIn, Priority::High)
        .unwrap();
    assert!(urgent.is_delivered());

    assert_eq!(store.notifications("alice", 10).unwrap().len(), 1);
}

#[test]
fn daily_cap_counts_every_priority() {
    let today = date(2026, 6, 1);
    let engine = engine_with(&EngineConfig::default(), today, 8, vec![]);

    for _ in 0..6 {
        assert!(engine
            .submit_notification("alice", "Coach", "Hi", Category::Coach, Priority::High)
            .unwrap()
            .is_delivered());
        engine.clock().advance(Duration::minutes(10));
    }
    for _ in 0..2 {
        assert!(engine
            .submit_notification("alice", "Nudge", "Walk", Category::Wellness, Priority::Gentle)
            .unwrap()
            .is_delivered());
    }
    let ninth = engine
        .submit_notification("alice", "Nudge", "Walk", Category::Wellness, Priority::Low)
        .unwrap();
    assert_eq!(ninth.rejection(), Some(RejectReason::DailyLimitExceeded));

    // Medium is never capped.
    assert!(engine
        .submit_notification("alice", "Plan", "Week ahead", Category::Program, Priority::Medium)
        .unwrap()
        .is_delivered());
}

#[test]
fn configured_limit_and_offset_apply() {
    let mut config = EngineConfig::default();
    config.notifications.daily_limit = 2;
    config.program.utc_offset_minutes = -300;
    // 03:00 UTC is 22:00 the previous day at UTC-5.
    let engine = engine_with(&config, date(2026, 6, 2), 3, vec![]);
    assert_eq!(engine.today(), date(2026, 6, 1));

    for _ in 0..2 {
        assert!(engine
            .submit_notification("alice", "n", "m", Category::Wellness, Priority::Low)
            .unwrap()
            .is_delivered());
    }
    let third = engine
        .submit_notification("alice", "n", "m", Category::Wellness, Priority::Low)
        .unwrap();
    assert_eq!(third.rejection(), Some(RejectReason::DailyLimitExceeded));
}

#[test]
fn batch_fan_out_reports_per_subject() {
    let engine = engine_with(&EngineConfig::default(), date(2026, 6, 1), 12, vec![]);
    let mut muted = NotificationPreferences::defaults_for("carol");
    muted.enable_coach = false;
    engine.store().save_preferences(&muted).unwrap();

    let subjects: Vec<String> = ["alice", "bob", "carol"].iter().map(|s| s.to_string()).collect();
    let outcomes = engine
        .submit_batch(&subjects, "Live Q&A", "Tonight at 7", Category::Coach, Priority::Medium)
        .unwrap();

    let delivered: Vec<&str> = outcomes
        .iter()
        .filter(|(_, o)| o.is_delivered())
        .map(|(s, _)| s.as_str())
        .collect();
    assert_eq!(delivered, vec!["alice", "bob"]);
    assert_eq!(
        outcomes[2].1.rejection(),
        Some(RejectReason::CategoryDisabled)
    );
}

#[test]
fn target_weight_needs_two_spaced_readings() {
    let today = date(2026, 9, 1);
    let engine = engine_with(&EngineConfig::default(), today, 7, vec![]);
    let mut profile = SubjectProfile::new("alice", Gender::Female);
    profile.target_weight_kg = Some(65.0);
    profile.start_weight_kg = Some(72.0);
    engine.store().save_profile(&profile).unwrap();

    engine.record_weight("alice", 64.8).unwrap();
    assert!(!engine.is_target_reached("alice").unwrap());

    engine.record_weight("alice", 64.5).unwrap();
    assert!(!engine.is_target_reached("alice").unwrap(), "same-day readings");

    engine.clock().advance(Duration::days(2));
    engine.record_weight("alice", 64.9).unwrap();
    assert!(engine.is_target_reached("alice").unwrap());
    assert_eq!(engine.consolidation_days_for("alice").unwrap(), Some(71));
    assert_eq!(engine.estimate_consolidation_days(70.0, 75.0), 0);
    assert_eq!(engine.estimate_consolidation_days(75.0, 70.0), 50);
}
