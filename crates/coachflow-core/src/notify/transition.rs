//! Phase transition notices, run on a periodic tick per subject.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::gate::{GateOutcome, NotificationGate};
use super::{Category, Priority};
use crate::clock::local_date;
use crate::error::Result;
use crate::program::{PhaseResolver, PhaseSession};
use crate::storage::ProgramStore;

pub const STARTING_TITLE: &str = "New phase starts today";
pub const APPROACHING_TITLE: &str = "Prepare for your next phase";

/// What one tick submitted. `None` means no session matched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionReport {
    pub starting: Option<GateOutcome>,
    pub approaching: Option<GateOutcome>,
}

pub struct PhaseTransitionNotifier<'a, S: ProgramStore + ?Sized> {
    store: &'a S,
    gate: NotificationGate<'a, S>,
    horizon_days: u32,
    utc_offset_minutes: i32,
}

impl<'a, S: ProgramStore + ?Sized> PhaseTransitionNotifier<'a, S> {
    pub fn new(store: &'a S, gate: NotificationGate<'a, S>, horizon_days: u32, utc_offset_minutes: i32) -> Self {
        Self {
            store,
            gate,
            horizon_days,
            utc_offset_minutes,
        }
    }

    /// Submit the "starts today" and "approaching" notices that apply at `now`.
    ///
    /// The two checks are independent. Repeated ticks on the same day submit
    /// again; the gate does not deduplicate by content.
    pub fn run_check(&self, subject_id: &str, now: DateTime<Utc>) -> Result<TransitionReport> {
        let today = local_date(now, self.utc_offset_minutes);
        let resolver = PhaseResolver::new(self.store);

        let starting = match resolver.resolve_starting_today(subject_id, today)? {
            Some(session) => Some(self.gate.submit(
                subject_id,
                STARTING_TITLE,
                &starting_message(&session),
                Category::Program,
                Priority::High,
                now,
            )?),
            None => None,
        };

        let approaching = match resolver.resolve_approaching(subject_id, today, self.horizon_days)? {
            Some(session) => Some(self.gate.submit(
                subject_id,
                APPROACHING_TITLE,
                &approaching_message(&session, self.horizon_days),
                Category::Program,
                Priority::High,
                now,
            )?),
            None => None,
        };

        Ok(TransitionReport {
            starting,
            approaching,
        })
    }
}

fn starting_message(session: &PhaseSession) -> String {
    format!(
        "Your {} phase begins today and runs for {} days.",
        session.phase_type.label(),
        session.duration_days()
    )
}

fn approaching_message(session: &PhaseSession, horizon_days: u32) -> String {
    let when = match horizon_days {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        n => format!("in {n} days"),
    };
    format!("Your {} phase starts {when}.", session.phase_type.label())
}
