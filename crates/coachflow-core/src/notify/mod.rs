//! Notifications: categories, priorities, per-subject preferences, and the
//! gate every outbound alert goes through.

pub mod gate;
pub mod transition;

pub use gate::{GateOutcome, GatePolicy, NotificationGate, RejectReason};
pub use transition::{PhaseTransitionNotifier, TransitionReport};

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Program,
    WeighIn,
    Lifestyle,
    Wellness,
    /// Human-originated messages from a coach.
    Coach,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Program,
        Category::WeighIn,
        Category::Lifestyle,
        Category::Wellness,
        Category::Coach,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Program => "PROGRAM",
            Category::WeighIn => "WEIGH_IN",
            Category::Lifestyle => "LIFESTYLE",
            Category::Wellness => "WELLNESS",
            Category::Coach => "COACH",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown notification category: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    High,
    Medium,
    Low,
    Gentle,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
            Priority::Gentle => "GENTLE",
        }
    }

    /// Priorities subject to the rolling daily cap.
    pub fn is_rate_limited(self) -> bool {
        matches!(self, Priority::Low | Priority::Gentle)
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HIGH" => Ok(Priority::High),
            "MEDIUM" => Ok(Priority::Medium),
            "LOW" => Ok(Priority::Low),
            "GENTLE" => Ok(Priority::Gentle),
            _ => Err(format!("Unknown notification priority: {}", s)),
        }
    }
}

/// Daily do-not-disturb window, `[start, end)` in subject-local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl QuietHours {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// `start > end` wraps past midnight; `start == end` is an empty window.
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= time && time < self.end
        } else {
            time >= self.start || time < self.end
        }
    }
}

impl Default for QuietHours {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(22, 0, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

/// Per-subject delivery preferences. Absent record = everything on, no
/// quiet hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub subject_id: String,
    pub enable_program: bool,
    pub enable_weigh_in: bool,
    pub enable_lifestyle: bool,
    pub enable_wellness: bool,
    pub enable_coach: bool,
    pub quiet_hours_enabled: bool,
    pub quiet_hours: QuietHours,
}

impl NotificationPreferences {
    pub fn defaults_for(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            enable_program: true,
            enable_weigh_in: true,
            enable_lifestyle: true,
            enable_wellness: true,
            enable_coach: true,
            quiet_hours_enabled: false,
            quiet_hours: QuietHours::default(),
        }
    }

    pub fn allows(&self, category: Category) -> bool {
        match category {
            Category::Program => self.enable_program,
            Category::WeighIn => self.enable_weigh_in,
            Category::Lifestyle => self.enable_lifestyle,
            Category::Wellness => self.enable_wellness,
            Category::Coach => self.enable_coach,
        }
    }

    pub fn set_category(&mut self, category: Category, enabled: bool) {
        match category {
            Category::Program => self.enable_program = enabled,
            Category::WeighIn => self.enable_weigh_in = enabled,
            Category::Lifestyle => self.enable_lifestyle = enabled,
            Category::Wellness => self.enable_wellness = enabled,
            Category::Coach => self.enable_coach = enabled,
        }
    }

    /// Quiet window if enabled.
    pub fn active_quiet_hours(&self) -> Option<QuietHours> {
        self.quiet_hours_enabled.then_some(self.quiet_hours)
    }
}

/// Notification about to be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNotification {
    pub subject_id: String,
    pub title: String,
    pub message: String,
    pub category: Category,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
}

/// Rolling cap enforced at write time: a row is refused when its subject
/// already has `limit` notifications created at or after `since`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationCap {
    pub since: DateTime<Utc>,
    pub limit: u32,
}

impl NotificationCap {
    /// Whether one more row fits when `recent` already exist in the window.
    pub fn admits(&self, recent: u32) -> bool {
        recent < self.limit
    }
}

/// Persisted, append-only notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub subject_id: String,
    pub title: String,
    pub message: String,
    pub category: Category,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn same_day_window() {
        let q = QuietHours::new(t(13, 0), t(15, 0));
        assert!(q.contains(t(13, 0)));
        assert!(q.contains(t(14, 59)));
        assert!(!q.contains(t(15, 0)));
        assert!(!q.contains(t(12, 59)));
    }

    #[test]
    fn window_wrapping_midnight() {
        let q = QuietHours::new(t(22, 0), t(8, 0));
        assert!(q.contains(t(23, 30)));
        assert!(q.contains(t(0, 0)));
        assert!(q.contains(t(7, 59)));
        assert!(!q.contains(t(8, 0)));
        assert!(!q.contains(t(21, 59)));
    }

    #[test]
    fn equal_bounds_is_empty() {
        let q = QuietHours::new(t(22, 0), t(22, 0));
        assert!(!q.contains(t(22, 0)));
        assert!(!q.contains(t(3, 0)));
    }

    #[test]
    fn default_preferences_allow_everything() {
        let prefs = NotificationPreferences::defaults_for("alice");
        assert!(Category::ALL.into_iter().all(|c| prefs.allows(c)));
        assert!(prefs.active_quiet_hours().is_none());
    }

    #[test]
    fn category_toggle() {
        let mut prefs = NotificationPreferences::defaults_for("alice");
        prefs.set_category(Category::Lifestyle, false);
        assert!(!prefs.allows(Category::Lifestyle));
        assert!(prefs.allows(Category::Wellness));
    }
}
