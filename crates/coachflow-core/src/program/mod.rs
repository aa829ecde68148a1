//! Program lifecycle: tiers, phases and dated phase sessions.
//!
//! A subscription tier maps to an ordered list of [`PhaseSegment`]s through
//! the injected [`PhaseCatalog`]. The [`calendar`] module lays those segments
//! out as contiguous [`PhaseSession`]s starting on a purchase date, and the
//! [`resolver`] module answers "which phase is this subject in" from dates
//! alone.

pub mod calendar;
pub mod catalog;
pub mod resolver;

pub use calendar::{build_sessions, CalendarGenerator};
pub use catalog::{PhaseCatalog, PhaseSegment, SegmentSpec};
pub use resolver::PhaseResolver;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Subscription product purchased by a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionTier {
    Discovery,
    Essential,
    Premium,
    /// Legacy product with the early-progressive attack phase.
    Classic,
}

impl SubscriptionTier {
    pub const ALL: [SubscriptionTier; 4] = [
        SubscriptionTier::Discovery,
        SubscriptionTier::Essential,
        SubscriptionTier::Premium,
        SubscriptionTier::Classic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionTier::Discovery => "DISCOVERY",
            SubscriptionTier::Essential => "ESSENTIAL",
            SubscriptionTier::Premium => "PREMIUM",
            SubscriptionTier::Classic => "CLASSIC",
        }
    }
}

impl std::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubscriptionTier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DISCOVERY" => Ok(Self::Discovery),
            "ESSENTIAL" => Ok(Self::Essential),
            "PREMIUM" => Ok(Self::Premium),
            "CLASSIC" => Ok(Self::Classic),
            _ => Err(CoreError::UnknownTier(s.to_string())),
        }
    }
}

/// Program phase. Governs diet and workout rules for its dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseType {
    Detox,
    DetoxPlus,
    /// Early-progressive phase of the legacy tier.
    Attack,
    Balance,
    Consolidation,
    Maintenance,
}

impl PhaseType {
    pub const ALL: [PhaseType; 6] = [
        PhaseType::Detox,
        PhaseType::DetoxPlus,
        PhaseType::Attack,
        PhaseType::Balance,
        PhaseType::Consolidation,
        PhaseType::Maintenance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PhaseType::Detox => "DETOX",
            PhaseType::DetoxPlus => "DETOX_PLUS",
            PhaseType::Attack => "ATTACK",
            PhaseType::Balance => "BALANCE",
            PhaseType::Consolidation => "CONSOLIDATION",
            PhaseType::Maintenance => "MAINTENANCE",
        }
    }

    /// Human label used in notification copy.
    pub fn label(self) -> &'static str {
        match self {
            PhaseType::Detox => "Detox",
            PhaseType::DetoxPlus => "Detox+",
            PhaseType::Attack => "Attack",
            PhaseType::Balance => "Balance",
            PhaseType::Consolidation => "Consolidation",
            PhaseType::Maintenance => "Maintenance",
        }
    }
}

impl std::fmt::Display for PhaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PhaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PhaseType::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown phase type: {}", s))
    }
}

/// Advisory status stamped on a session when it is written.
///
/// Readers never trust it; [`PhaseSession::status_on`] recomputes from dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[derive(Default)]
pub enum SessionStatus {
    #[default]
    Scheduled,
    Active,
    Completed,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scheduled => write!(f, "SCHEDULED"),
            Self::Active => write!(f, "ACTIVE"),
            Self::Completed => write!(f, "COMPLETED"),
        }
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SCHEDULED" => Ok(Self::Scheduled),
            "ACTIVE" => Ok(Self::Active),
            "COMPLETED" => Ok(Self::Completed),
            _ => Err(format!("Unknown session status: {}", s)),
        }
    }
}

/// One dated phase of a subject's program.
///
/// `end_date` is exclusive: the session covers `start_date <= d < end_date`,
/// and the next session starts on this session's `end_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSession {
    pub id: String,
    pub subject_id: String,
    pub session_number: u32,
    pub phase_type: PhaseType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: SessionStatus,
}

impl PhaseSession {
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day < self.end_date
    }

    pub fn status_on(&self, day: NaiveDate) -> SessionStatus {
        if day < self.start_date {
            SessionStatus::Scheduled
        } else if day < self.end_date {
            SessionStatus::Active
        } else {
            SessionStatus::Completed
        }
    }

    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    /// Whole weeks since the session started, zero before it starts.
    pub fn weeks_elapsed(&self, day: NaiveDate) -> u32 {
        let days = (day - self.start_date).num_days().max(0);
        (days / 7) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(start: NaiveDate, days: i64) -> PhaseSession {
        PhaseSession {
            id: "s1".into(),
            subject_id: "alice".into(),
            session_number: 1,
            phase_type: PhaseType::Balance,
            start_date: start,
            end_date: start + chrono::Duration::days(days),
            status: SessionStatus::Scheduled,
        }
    }

    #[test]
    fn tier_parse_is_case_insensitive() {
        assert_eq!("premium".parse::<SubscriptionTier>().unwrap(), SubscriptionTier::Premium);
        assert!(matches!(
            "gold".parse::<SubscriptionTier>(),
            Err(CoreError::UnknownTier(t)) if t == "gold"
        ));
    }

    #[test]
    fn phase_type_round_trips_through_str() {
        for phase in PhaseType::ALL {
            assert_eq!(phase.as_str().parse::<PhaseType>().unwrap(), phase);
        }
    }

    #[test]
    fn session_interval_is_closed_open() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let s = session(start, 7);
        assert!(s.contains(start));
        assert!(s.contains(start + chrono::Duration::days(6)));
        assert!(!s.contains(s.end_date));
        assert_eq!(s.status_on(s.end_date), SessionStatus::Completed);
        assert_eq!(s.status_on(start - chrono::Duration::days(1)), SessionStatus::Scheduled);
    }

    #[test]
    fn weeks_elapsed_floors() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let s = session(start, 70);
        assert_eq!(s.weeks_elapsed(start), 0);
        assert_eq!(s.weeks_elapsed(start + chrono::Duration::days(6)), 0);
        assert_eq!(s.weeks_elapsed(start + chrono::Duration::days(7)), 1);
        assert_eq!(s.weeks_elapsed(start - chrono::Duration::days(3)), 0);
    }
}
