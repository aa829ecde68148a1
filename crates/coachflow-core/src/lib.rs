//! coachflow-core: program lifecycle and notification engine.
//!
//! Turns a subscription purchase into a dated sequence of coaching phases,
//! tells callers which phase a subject is in, recommends a daily workout
//! from the phase's mix policy, answers weight-progress questions, and gates
//! every outbound notification through category toggles, quiet hours and a
//! rolling anti-spam cap.
//!
//! All state lives behind the [`storage::ProgramStore`] trait; time and
//! randomness are injected through [`clock::Clock`] and
//! [`clock::RandomSource`]. [`engine::ProgramEngine`] ties them together.

pub mod clock;
pub mod engine;
pub mod error;
pub mod notify;
pub mod program;
pub mod storage;
pub mod subject;
pub mod weight;
pub mod workout;

pub use clock::{Clock, FixedClock, PcgRandom, RandomSource, SequenceRandom, SystemClock};
pub use engine::ProgramEngine;
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use notify::{
    Category, GateOutcome, GatePolicy, Notification, NotificationGate, NotificationPreferences,
    PhaseTransitionNotifier, Priority, QuietHours, RejectReason, TransitionReport,
};
pub use program::{
    CalendarGenerator, PhaseCatalog, PhaseResolver, PhaseSegment, PhaseSession, PhaseType,
    SegmentSpec, SessionStatus, SubscriptionTier,
};
pub use storage::{EngineConfig, ProgramStore, SqliteStore};
pub use subject::{Gender, SubjectProfile};
pub use weight::{estimate_consolidation_days, is_target_reached, WeightObservation};
pub use workout::{
    estimate_calories, ActivityType, ExerciseEntry, GenderScope, Intensity, MixPolicy,
    MixPolicyTable, Recommendation, WorkoutRecommender,
};
