//! SQLite-backed [`ProgramStore`].

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

use super::{data_dir, migrations, ProgramStore};
use crate::error::DatabaseError;
use crate::notify::{NewNotification, Notification, NotificationCap, NotificationPreferences, QuietHours};
use crate::program::{PhaseSession, PhaseType};
use crate::subject::SubjectProfile;
use crate::weight::WeightObservation;
use crate::workout::ExerciseEntry;

// === Helper Functions ===

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Read a text column and parse it, surfacing bad values as conversion errors.
fn parse_column<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

fn parse_date(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_time(row: &Row, idx: usize) -> rusqlite::Result<NaiveTime> {
    let raw: String = row.get(idx)?;
    NaiveTime::parse_from_str(&raw, TIME_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_datetime(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Fixed-width UTC timestamps so that text comparison orders by time.
fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn row_to_session(row: &Row) -> rusqlite::Result<PhaseSession> {
    Ok(PhaseSession {
        id: row.get(0)?,
        subject_id: row.get(1)?,
        session_number: row.get(2)?,
        phase_type: parse_column(row, 3)?,
        start_date: parse_date(row, 4)?,
        end_date: parse_date(row, 5)?,
        status: parse_column(row, 6)?,
    })
}

fn row_to_exercise(row: &Row) -> rusqlite::Result<ExerciseEntry> {
    let phases_json: String = row.get(5)?;
    let allowed_phases = serde_json::from_str(&phases_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;
    Ok(ExerciseEntry {
        id: row.get(0)?,
        name: row.get(1)?,
        activity_type: parse_column(row, 2)?,
        intensity: parse_column(row, 3)?,
        gender_scope: parse_column(row, 4)?,
        allowed_phases,
        met_value: row.get(6)?,
    })
}

fn row_to_notification(row: &Row) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: row.get(0)?,
        subject_id: row.get(1)?,
        title: row.get(2)?,
        message: row.get(3)?,
        category: parse_column(row, 4)?,
        priority: parse_column(row, 5)?,
        created_at: parse_datetime(row, 6)?,
        is_read: row.get(7)?,
    })
}

const SESSION_COLUMNS: &str =
    "id, subject_id, session_number, phase_type, start_date, end_date, status";
const NOTIFICATION_COLUMNS: &str =
    "id, subject_id, title, message, category, priority, created_at, is_read";

/// SQLite store for schedules, the exercise catalog, preferences,
/// notifications, weights and profiles.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open the store at `<data_dir>/coachflow.db`.
    ///
    /// Creates tables if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, DatabaseError> {
        let dir = data_dir().map_err(|e| {
            tracing::warn!(error = %e, "data directory unavailable");
            DatabaseError::QueryFailed(format!("data directory unavailable: {e}"))
        })?;
        Self::open_at(&dir.join("coachflow.db"))
    }

    /// Open (or create) the store at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        // Other processes may hold the write lock; wait rather than fail.
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory store.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS phase_sessions (
                id              TEXT PRIMARY KEY,
                subject_id      TEXT NOT NULL,
                session_number  INTEGER NOT NULL,
                phase_type      TEXT NOT NULL,
                start_date      TEXT NOT NULL,
                end_date        TEXT NOT NULL,
                status          TEXT NOT NULL DEFAULT 'SCHEDULED',
                UNIQUE (subject_id, session_number)
            );

            CREATE TABLE IF NOT EXISTS exercises (
                id              TEXT PRIMARY KEY,
                name            TEXT NOT NULL,
                activity_type   TEXT NOT NULL,
                intensity       TEXT NOT NULL,
                gender_scope    TEXT NOT NULL DEFAULT 'ALL',
                allowed_phases  TEXT NOT NULL DEFAULT '[]',
                met_value       REAL NOT NULL
            );

            CREATE TABLE IF NOT EXISTS notification_preferences (
                subject_id          TEXT PRIMARY KEY,
                enable_program      INTEGER NOT NULL DEFAULT 1,
                enable_weigh_in     INTEGER NOT NULL DEFAULT 1,
                enable_lifestyle    INTEGER NOT NULL DEFAULT 1,
                enable_wellness     INTEGER NOT NULL DEFAULT 1,
                enable_coach        INTEGER NOT NULL DEFAULT 1,
                quiet_hours_enabled INTEGER NOT NULL DEFAULT 0,
                quiet_hours_start   TEXT NOT NULL DEFAULT '22:00:00',
                quiet_hours_end     TEXT NOT NULL DEFAULT '08:00:00'
            );

            CREATE TABLE IF NOT EXISTS notifications (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                subject_id  TEXT NOT NULL,
                title       TEXT NOT NULL,
                message     TEXT NOT NULL,
                category    TEXT NOT NULL,
                priority    TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                is_read     INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS weight_observations (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                subject_id  TEXT NOT NULL,
                observed_on TEXT NOT NULL,
                weight_kg   REAL NOT NULL
            );

            CREATE TABLE IF NOT EXISTS subject_profiles (
                subject_id        TEXT PRIMARY KEY,
                gender            TEXT NOT NULL,
                weight_kg         REAL,
                target_weight_kg  REAL,
                start_weight_kg   REAL
            );",
        )?;

        migrations::migrate(&self.conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    /// Run `f` inside `BEGIN IMMEDIATE`, committing on success.
    ///
    /// The transaction rolls back when dropped uncommitted, so an error from
    /// `f` or a failed `COMMIT` never leaves the connection inside it.
    fn in_transaction<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, rusqlite::Error>,
    ) -> Result<T, DatabaseError> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    fn count_since(conn: &Connection, subject_id: &str, since: DateTime<Utc>) -> Result<u32, rusqlite::Error> {
        conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE subject_id = ?1 AND created_at >= ?2",
            params![subject_id, format_datetime(since)],
            |row| row.get(0),
        )
    }

    fn insert_notification_row(
        conn: &Connection,
        n: &NewNotification,
    ) -> Result<Notification, rusqlite::Error> {
        conn.execute(
            "INSERT INTO notifications (subject_id, title, message, category, priority, created_at, is_read)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)",
            params![
                n.subject_id,
                n.title,
                n.message,
                n.category.as_str(),
                n.priority.as_str(),
                format_datetime(n.created_at),
            ],
        )?;
        Ok(Notification {
            id: conn.last_insert_rowid(),
            subject_id: n.subject_id.clone(),
            title: n.title.clone(),
            message: n.message.clone(),
            category: n.category,
            priority: n.priority,
            created_at: n.created_at,
            is_read: false,
        })
    }

    /// Mark a notification read. Returns false if it does not exist.
    pub fn mark_read(&self, notification_id: i64) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE id = ?1",
            [notification_id],
        )?;
        Ok(changed > 0)
    }

    pub fn schema_version(&self) -> i32 {
        migrations::get_schema_version(&self.conn)
    }
}

impl ProgramStore for SqliteStore {
    fn replace_sessions(&self, subject_id: &str, sessions: &[PhaseSession]) -> Result<(), DatabaseError> {
        self.in_transaction(|conn| {
            conn.execute("DELETE FROM phase_sessions WHERE subject_id = ?1", [subject_id])?;
            let mut stmt = conn.prepare(
                "INSERT INTO phase_sessions (id, subject_id, session_number, phase_type, start_date, end_date, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for s in sessions {
                stmt.execute(params![
                    s.id,
                    subject_id,
                    s.session_number,
                    s.phase_type.as_str(),
                    format_date(s.start_date),
                    format_date(s.end_date),
                    s.status.to_string(),
                ])?;
            }
            Ok(())
        })
    }

    fn sessions(&self, subject_id: &str) -> Result<Vec<PhaseSession>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SESSION_COLUMNS} FROM phase_sessions
             WHERE subject_id = ?1 ORDER BY session_number"
        ))?;
        let rows = stmt.query_map([subject_id], row_to_session)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn override_phase_type(
        &self,
        subject_id: &str,
        session_number: u32,
        phase_type: PhaseType,
    ) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE phase_sessions SET phase_type = ?1
             WHERE subject_id = ?2 AND session_number = ?3",
            params![phase_type.as_str(), subject_id, session_number],
        )?;
        Ok(changed > 0)
    }

    fn exercises(&self) -> Result<Vec<ExerciseEntry>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, activity_type, intensity, gender_scope, allowed_phases, met_value
             FROM exercises ORDER BY id",
        )?;
        let rows = stmt.query_map([], row_to_exercise)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn insert_exercise(&self, entry: &ExerciseEntry) -> Result<(), DatabaseError> {
        let phases_json = serde_json::to_string(&entry.allowed_phases)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        self.conn.execute(
            "INSERT OR REPLACE INTO exercises (id, name, activity_type, intensity, gender_scope, allowed_phases, met_value)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entry.id,
                entry.name,
                entry.activity_type.as_str(),
                entry.intensity.as_str(),
                entry.gender_scope.as_str(),
                phases_json,
                entry.met_value,
            ],
        )?;
        Ok(())
    }

    fn preferences(&self, subject_id: &str) -> Result<Option<NotificationPreferences>, DatabaseError> {
        let prefs = self
            .conn
            .query_row(
                "SELECT subject_id, enable_program, enable_weigh_in, enable_lifestyle, enable_wellness,
                        enable_coach, quiet_hours_enabled, quiet_hours_start, quiet_hours_end
                 FROM notification_preferences WHERE subject_id = ?1",
                [subject_id],
                |row| {
                    Ok(NotificationPreferences {
                        subject_id: row.get(0)?,
                        enable_program: row.get(1)?,
                        enable_weigh_in: row.get(2)?,
                        enable_lifestyle: row.get(3)?,
                        enable_wellness: row.get(4)?,
                        enable_coach: row.get(5)?,
                        quiet_hours_enabled: row.get(6)?,
                        quiet_hours: QuietHours::new(parse_time(row, 7)?, parse_time(row, 8)?),
                    })
                },
            )
            .optional()?;
        Ok(prefs)
    }

    fn save_preferences(&self, prefs: &NotificationPreferences) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO notification_preferences
                (subject_id, enable_program, enable_weigh_in, enable_lifestyle, enable_wellness,
                 enable_coach, quiet_hours_enabled, quiet_hours_start, quiet_hours_end)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                prefs.subject_id,
                prefs.enable_program,
                prefs.enable_weigh_in,
                prefs.enable_lifestyle,
                prefs.enable_wellness,
                prefs.enable_coach,
                prefs.quiet_hours_enabled,
                format_time(prefs.quiet_hours.start),
                format_time(prefs.quiet_hours.end),
            ],
        )?;
        Ok(())
    }

    fn insert_notification(&self, notification: &NewNotification) -> Result<Notification, DatabaseError> {
        Ok(Self::insert_notification_row(&self.conn, notification)?)
    }

    fn insert_notifications(
        &self,
        batch: &[NewNotification],
        cap: Option<NotificationCap>,
    ) -> Result<Vec<Option<Notification>>, DatabaseError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        self.in_transaction(|conn| {
            batch
                .iter()
                .map(|n| {
                    if let Some(cap) = cap {
                        if !cap.admits(Self::count_since(conn, &n.subject_id, cap.since)?) {
                            return Ok(None);
                        }
                    }
                    Self::insert_notification_row(conn, n).map(Some)
                })
                .collect()
        })
    }

    fn count_notifications_since(&self, subject_id: &str, since: DateTime<Utc>) -> Result<u32, DatabaseError> {
        Ok(Self::count_since(&self.conn, subject_id, since)?)
    }

    fn notifications(&self, subject_id: &str, limit: usize) -> Result<Vec<Notification>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications
             WHERE subject_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2"
        ))?;
        let rows = stmt.query_map(params![subject_id, limit as i64], row_to_notification)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn latest_weights(&self, subject_id: &str, limit: usize) -> Result<Vec<WeightObservation>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT subject_id, observed_on, weight_kg FROM weight_observations
             WHERE subject_id = ?1 ORDER BY observed_on DESC, id DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![subject_id, limit as i64], |row| {
            Ok(WeightObservation {
                subject_id: row.get(0)?,
                date: parse_date(row, 1)?,
                weight_kg: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn record_weight(&self, observation: &WeightObservation) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO weight_observations (subject_id, observed_on, weight_kg) VALUES (?1, ?2, ?3)",
            params![
                observation.subject_id,
                format_date(observation.date),
                observation.weight_kg,
            ],
        )?;
        Ok(())
    }

    fn profile(&self, subject_id: &str) -> Result<Option<SubjectProfile>, DatabaseError> {
        let profile = self
            .conn
            .query_row(
                "SELECT subject_id, gender, weight_kg, target_weight_kg, start_weight_kg
                 FROM subject_profiles WHERE subject_id = ?1",
                [subject_id],
                |row| {
                    Ok(SubjectProfile {
                        subject_id: row.get(0)?,
                        gender: parse_column(row, 1)?,
                        weight_kg: row.get(2)?,
                        target_weight_kg: row.get(3)?,
                        start_weight_kg: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(profile)
    }

    fn save_profile(&self, profile: &SubjectProfile) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO subject_profiles
                (subject_id, gender, weight_kg, target_weight_kg, start_weight_kg)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                profile.subject_id,
                profile.gender.as_str(),
                profile.weight_kg,
                profile.target_weight_kg,
                profile.start_weight_kg,
            ],
        )?;
        Ok(())
    }
}
