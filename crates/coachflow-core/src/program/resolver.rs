//! Phase resolution from dates.
//!
//! Stored statuses are ignored here: the active session is whichever one
//! satisfies `start_date <= today < end_date`. Because schedules are only
//! ever swapped atomically, a reader sees the old or the new schedule, never
//! a mix.

use chrono::{Days, NaiveDate};

use super::PhaseSession;
use crate::error::Result;
use crate::storage::ProgramStore;

/// Session covering `today`, if any.
pub fn active_on(sessions: &[PhaseSession], today: NaiveDate) -> Option<&PhaseSession> {
    sessions.iter().find(|s| s.contains(today))
}

/// Session whose first day is `day`, if any.
pub fn starting_on(sessions: &[PhaseSession], day: NaiveDate) -> Option<&PhaseSession> {
    sessions.iter().find(|s| s.start_date == day)
}

/// Session whose last day is `day` (its exclusive end is the day after).
pub fn ending_on(sessions: &[PhaseSession], day: NaiveDate) -> Option<&PhaseSession> {
    sessions
        .iter()
        .find(|s| s.end_date.pred_opt() == Some(day))
}

/// Session starting exactly `horizon_days` after `today`.
///
/// A horizon past the last representable date matches nothing.
pub fn approaching(
    sessions: &[PhaseSession],
    today: NaiveDate,
    horizon_days: u32,
) -> Option<&PhaseSession> {
    let day = today.checked_add_days(Days::new(u64::from(horizon_days)))?;
    starting_on(sessions, day)
}

/// Store-backed resolver for one subject-local "today".
pub struct PhaseResolver<'a, S: ProgramStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ProgramStore + ?Sized> PhaseResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn resolve_active(&self, subject_id: &str, today: NaiveDate) -> Result<Option<PhaseSession>> {
        let sessions = self.store.sessions(subject_id)?;
        Ok(active_on(&sessions, today).cloned())
    }

    pub fn resolve_starting_today(
        &self,
        subject_id: &str,
        today: NaiveDate,
    ) -> Result<Option<PhaseSession>> {
        let sessions = self.store.sessions(subject_id)?;
        Ok(starting_on(&sessions, today).cloned())
    }

    pub fn resolve_ending_today(
        &self,
        subject_id: &str,
        today: NaiveDate,
    ) -> Result<Option<PhaseSession>> {
        let sessions = self.store.sessions(subject_id)?;
        Ok(ending_on(&sessions, today).cloned())
    }

    pub fn resolve_approaching(
        &self,
        subject_id: &str,
        today: NaiveDate,
        horizon_days: u32,
    ) -> Result<Option<PhaseSession>> {
        let sessions = self.store.sessions(subject_id)?;
        Ok(approaching(&sessions, today, horizon_days).cloned())
    }
}
