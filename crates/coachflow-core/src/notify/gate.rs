//! Notification gate.
//!
//! Every producer (program engine, weigh-in reminders, coach messaging)
//! submits here. The pipeline stops at the first failing check:
//!
//! 1. category toggle
//! 2. quiet hours (skipped for `HIGH` priority and `COACH` category)
//! 3. rolling daily cap (only `LOW` / `GENTLE`)
//!
//! then persists. A rejection is a normal outcome, not an error.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    Category, NewNotification, Notification, NotificationCap, NotificationPreferences, Priority,
};
use crate::clock::local_datetime;
use crate::error::{DatabaseError, Result};
use crate::storage::ProgramStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    CategoryDisabled,
    QuietHours,
    DailyLimitExceeded,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CategoryDisabled => write!(f, "category disabled"),
            Self::QuietHours => write!(f, "quiet hours"),
            Self::DailyLimitExceeded => write!(f, "daily limit exceeded"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GateOutcome {
    Delivered { notification: Notification },
    Rejected { reason: RejectReason },
}

impl GateOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, GateOutcome::Delivered { .. })
    }

    pub fn rejection(&self) -> Option<RejectReason> {
        match self {
            GateOutcome::Rejected { reason } => Some(*reason),
            GateOutcome::Delivered { .. } => None,
        }
    }

    pub fn notification(&self) -> Option<&Notification> {
        match self {
            GateOutcome::Delivered { notification } => Some(notification),
            GateOutcome::Rejected { .. } => None,
        }
    }
}

/// Anti-spam and local-time settings for the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatePolicy {
    /// Rate-limited submissions are rejected once this many notifications
    /// already exist in the window.
    pub daily_limit: u32,
    pub window_hours: u32,
    pub utc_offset_minutes: i32,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            daily_limit: 8,
            window_hours: 24,
            utc_offset_minutes: 0,
        }
    }
}

/// Preference checks (steps 1-2). Pure.
pub fn check_preferences(
    prefs: &NotificationPreferences,
    category: Category,
    priority: Priority,
    local_time: NaiveTime,
) -> Option<RejectReason> {
    if !prefs.allows(category) {
        return Some(RejectReason::CategoryDisabled);
    }
    let bypasses_quiet = priority == Priority::High || category == Category::Coach;
    if !bypasses_quiet
        && prefs
            .active_quiet_hours()
            .is_some_and(|quiet| quiet.contains(local_time))
    {
        return Some(RejectReason::QuietHours);
    }
    None
}

pub struct NotificationGate<'a, S: ProgramStore + ?Sized> {
    store: &'a S,
    policy: GatePolicy,
}

impl<'a, S: ProgramStore + ?Sized> NotificationGate<'a, S> {
    pub fn new(store: &'a S, policy: GatePolicy) -> Self {
        Self { store, policy }
    }

    /// Category and quiet-hour checks for one subject. Reads only.
    fn preference_rejection(
        &self,
        subject_id: &str,
        category: Category,
        priority: Priority,
        now: DateTime<Utc>,
    ) -> Result<Option<RejectReason>> {
        let prefs = self
            .store
            .preferences(subject_id)?
            .unwrap_or_else(|| NotificationPreferences::defaults_for(subject_id));

        let local_time = local_datetime(now, self.policy.utc_offset_minutes).time();
        Ok(check_preferences(&prefs, category, priority, local_time))
    }

    /// Rolling cap for `priority`, or `None` when it is not rate limited.
    pub fn cap_for(&self, priority: Priority, now: DateTime<Utc>) -> Option<NotificationCap> {
        priority.is_rate_limited().then(|| NotificationCap {
            since: now
                .checked_sub_signed(Duration::hours(i64::from(self.policy.window_hours)))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            limit: self.policy.daily_limit,
        })
    }

    /// Check and, if accepted, persist a notification.
    ///
    /// The rolling cap is counted in the same store transaction as the
    /// write, so concurrent writers cannot both slip under it.
    ///
    /// # Errors
    /// Only store failures; rejections come back as [`GateOutcome::Rejected`].
    pub fn submit(
        &self,
        subject_id: &str,
        title: &str,
        message: &str,
        category: Category,
        priority: Priority,
        now: DateTime<Utc>,
    ) -> Result<GateOutcome> {
        let ids = [subject_id.to_string()];
        let mut outcomes = self.submit_batch(&ids, title, message, category, priority, now)?;
        match outcomes.pop() {
            Some((_, outcome)) => Ok(outcome),
            None => Err(DatabaseError::QueryFailed("notification submit returned no outcome".into()).into()),
        }
    }

    /// Fan one notification out to many subjects.
    ///
    /// Each subject is gated individually; all accepted notifications are
    /// written in one transaction, so either every accepted row lands or
    /// none does. Duplicate subject ids are submitted once.
    pub fn submit_batch(
        &self,
        subject_ids: &[String],
        title: &str,
        message: &str,
        category: Category,
        priority: Priority,
        now: DateTime<Utc>,
    ) -> Result<Vec<(String, GateOutcome)>> {
        let mut seen = std::collections::HashSet::new();
        let mut decisions = Vec::new();
        let mut pending = Vec::new();

        for subject_id in subject_ids {
            if !seen.insert(subject_id.as_str()) {
                continue;
            }
            let reason = self.preference_rejection(subject_id, category, priority, now)?;
            if reason.is_none() {
                pending.push(NewNotification {
                    subject_id: subject_id.clone(),
                    title: title.to_string(),
                    message: message.to_string(),
                    category,
                    priority,
                    created_at: now,
                });
            }
            decisions.push((subject_id.clone(), reason));
        }

        let mut written = self
            .store
            .insert_notifications(&pending, self.cap_for(priority, now))?
            .into_iter();

        let outcomes = decisions
            .into_iter()
            .map(|(subject_id, reason)| {
                let outcome = match reason {
                    Some(reason) => GateOutcome::Rejected { reason },
                    None => match written.next() {
                        Some(Some(notification)) => GateOutcome::Delivered { notification },
                        Some(None) => GateOutcome::Rejected {
                            reason: RejectReason::DailyLimitExceeded,
                        },
                        None => {
                            return Err(DatabaseError::QueryFailed(
                                "batch insert returned fewer rows than submitted".into(),
                            )
                            .into())
                        }
                    },
                };
                Ok((subject_id, outcome))
            })
            .collect::<Result<Vec<_>>>()?;

        for (subject_id, outcome) in &outcomes {
            match outcome {
                GateOutcome::Delivered { notification } => tracing::info!(
                    subject_id = %subject_id,
                    id = notification.id,
                    %category,
                    %priority,
                    "notification delivered"
                ),
                GateOutcome::Rejected { reason } => tracing::debug!(
                    subject_id = %subject_id,
                    %category,
                    %priority,
                    %reason,
                    "notification rejected"
                ),
            }
        }
        Ok(outcomes)
    }
}
