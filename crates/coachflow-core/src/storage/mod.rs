mod config;
pub mod migrations;
pub mod sqlite;

pub use config::{
    CatalogConfig, EngineConfig, NotificationsConfig, ProgramConfig, RecommenderConfig,
};
pub use sqlite::SqliteStore;

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::error::DatabaseError;
use crate::notify::{NewNotification, Notification, NotificationCap, NotificationPreferences};
use crate::program::{PhaseSession, PhaseType};
use crate::subject::SubjectProfile;
use crate::weight::WeightObservation;
use crate::workout::ExerciseEntry;

/// Record store the engine reads and writes through.
///
/// `replace_sessions` and `insert_notifications` must be atomic: a reader
/// sees all of the write or none of it.
pub trait ProgramStore {
    /// Delete every session for `subject_id` and insert `sessions`.
    fn replace_sessions(&self, subject_id: &str, sessions: &[PhaseSession]) -> Result<(), DatabaseError>;

    /// Sessions ordered by session number.
    fn sessions(&self, subject_id: &str) -> Result<Vec<PhaseSession>, DatabaseError>;

    /// Returns false when no such session exists.
    fn override_phase_type(
        &self,
        subject_id: &str,
        session_number: u32,
        phase_type: PhaseType,
    ) -> Result<bool, DatabaseError>;

    fn exercises(&self) -> Result<Vec<ExerciseEntry>, DatabaseError>;
    fn insert_exercise(&self, entry: &ExerciseEntry) -> Result<(), DatabaseError>;

    fn preferences(&self, subject_id: &str) -> Result<Option<NotificationPreferences>, DatabaseError>;
    fn save_preferences(&self, prefs: &NotificationPreferences) -> Result<(), DatabaseError>;

    fn insert_notification(&self, notification: &NewNotification) -> Result<Notification, DatabaseError>;

    /// Insert all or none; results come back in input order.
    ///
    /// With a `cap`, each row's subject is counted (any category and
    /// priority) in the same transaction as the writes, and a row over the
    /// cap comes back as `None` instead of being written.
    fn insert_notifications(
        &self,
        batch: &[NewNotification],
        cap: Option<NotificationCap>,
    ) -> Result<Vec<Option<Notification>>, DatabaseError>;

    /// Notifications of any category created at or after `since`.
    fn count_notifications_since(&self, subject_id: &str, since: DateTime<Utc>) -> Result<u32, DatabaseError>;

    /// Newest first.
    fn notifications(&self, subject_id: &str, limit: usize) -> Result<Vec<Notification>, DatabaseError>;

    /// Newest first.
    fn latest_weights(&self, subject_id: &str, limit: usize) -> Result<Vec<WeightObservation>, DatabaseError>;
    fn record_weight(&self, observation: &WeightObservation) -> Result<(), DatabaseError>;

    fn profile(&self, subject_id: &str) -> Result<Option<SubjectProfile>, DatabaseError>;
    fn save_profile(&self, profile: &SubjectProfile) -> Result<(), DatabaseError>;
}

/// Returns the data directory.
///
/// `COACHFLOW_DATA_DIR` wins when set. Otherwise `~/.config/coachflow[-dev]/`
/// based on `COACHFLOW_ENV` (set it to `dev` for the development directory).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("COACHFLOW_DATA_DIR") {
        Some(explicit) if !explicit.is_empty() => PathBuf::from(explicit),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("COACHFLOW_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("coachflow-dev")
            } else {
                base_dir.join("coachflow")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
