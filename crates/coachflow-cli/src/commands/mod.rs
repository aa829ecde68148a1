pub mod calendar;
pub mod config;
pub mod exercise;
pub mod notify;
pub mod phase;
pub mod profile;
pub mod weight;
pub mod workout;

use chrono::{DateTime, Utc};
use coachflow_core::{EngineConfig, FixedClock, PcgRandom, ProgramEngine, SqliteStore};

pub type CliEngine = ProgramEngine<SqliteStore, FixedClock, PcgRandom>;

/// Per-invocation settings shared by every command.
pub struct Context {
    now: DateTime<Utc>,
}

impl Context {
    pub fn new(now: Option<DateTime<Utc>>) -> Self {
        Self {
            now: now.unwrap_or_else(Utc::now),
        }
    }

    /// Engine over the on-disk store, pinned to this invocation's instant.
    pub fn engine(&self) -> Result<CliEngine, Box<dyn std::error::Error>> {
        let config = EngineConfig::load()?;
        let store = SqliteStore::open()?;
        tracing::debug!(now = %self.now, seed = ?config.recommender.seed, "engine opened");
        let engine = ProgramEngine::new(
            store,
            FixedClock::new(self.now),
            PcgRandom::new(config.recommender.seed),
            &config,
        )?;
        Ok(engine)
    }
}

/// Print any serializable value as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
