//! Calendar generation: tier + start date -> contiguous phase sessions.

use chrono::{Days, NaiveDate};
use uuid::Uuid;

use super::{PhaseCatalog, PhaseSession, SubscriptionTier};
use crate::error::{Result, ValidationError};
use crate::storage::ProgramStore;

/// Lay out a tier's segments from `start`.
///
/// Each session starts where the previous one ended, so the schedule is
/// contiguous by construction. Advisory statuses are stamped relative to
/// `today`.
///
/// # Errors
/// [`crate::CoreError::UnknownTier`] if the catalog has no entry for `tier`;
/// [`ValidationError::InvalidValue`] if the schedule runs past the last
/// representable date.
pub fn build_sessions(
    catalog: &PhaseCatalog,
    subject_id: &str,
    tier: SubscriptionTier,
    start: NaiveDate,
    today: NaiveDate,
) -> Result<Vec<PhaseSession>> {
    let segments = catalog.segments(tier)?;

    let mut cursor = start;
    let mut sessions = Vec::with_capacity(segments.len());
    for (i, segment) in segments.iter().enumerate() {
        let end = cursor
            .checked_add_days(Days::new(u64::from(segment.duration_days)))
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "start".to_string(),
                message: format!("{start} leaves no room for a {tier} program"),
            })?;
        let mut session = PhaseSession {
            id: Uuid::new_v4().to_string(),
            subject_id: subject_id.to_string(),
            session_number: i as u32 + 1,
            phase_type: segment.phase_type,
            start_date: cursor,
            end_date: end,
            status: Default::default(),
        };
        session.status = session.status_on(today);
        sessions.push(session);
        cursor = end;
    }
    Ok(sessions)
}

/// Writes a freshly built schedule for a subject, replacing any previous one.
pub struct CalendarGenerator<'a> {
    catalog: &'a PhaseCatalog,
}

impl<'a> CalendarGenerator<'a> {
    pub fn new(catalog: &'a PhaseCatalog) -> Self {
        Self { catalog }
    }

    /// Build and persist a subject's schedule.
    ///
    /// The old schedule is deleted and the new one inserted in one store
    /// transaction; nothing is written if the tier is unknown.
    pub fn generate<S: ProgramStore + ?Sized>(
        &self,
        store: &S,
        subject_id: &str,
        tier: SubscriptionTier,
        start: NaiveDate,
        today: NaiveDate,
    ) -> Result<Vec<PhaseSession>> {
        let sessions = build_sessions(self.catalog, subject_id, tier, start, today)?;
        store.replace_sessions(subject_id, &sessions)?;

        tracing::info!(
            subject_id,
            tier = %tier,
            start = %start,
            sessions = sessions.len(),
            "generated program calendar"
        );
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{PhaseType, SessionStatus};
    use crate::storage::SqliteStore;
    use crate::CoreError;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn sessions_are_contiguous_and_start_on_start_date() {
        let catalog = PhaseCatalog::default();
        for tier in SubscriptionTier::ALL {
            let start = date(2026, 2, 27);
            let sessions = build_sessions(&catalog, "alice", tier, start, start).unwrap();
            assert_eq!(sessions[0].start_date, start);
            for pair in sessions.windows(2) {
                assert_eq!(pair[0].end_date, pair[1].start_date);
            }
            let total: i64 = sessions.iter().map(PhaseSession::duration_days).sum();
            assert_eq!(total, i64::from(catalog.total_days(tier).unwrap()));
        }
    }

    #[test]
    fn classic_tier_layout() {
        let catalog = PhaseCatalog::default();
        let start = date(2026, 1, 1);
        let sessions =
            build_sessions(&catalog, "bob", SubscriptionTier::Classic, start, start).unwrap();

        let phases: Vec<PhaseType> = sessions.iter().map(|s| s.phase_type).collect();
        assert_eq!(
            phases,
            vec![
                PhaseType::Detox,
                PhaseType::Attack,
                PhaseType::Balance,
                PhaseType::Consolidation
            ]
        );
        assert_eq!(sessions[1].start_date, date(2026, 1, 8));
        assert_eq!(sessions[3].end_date, date(2026, 3, 26));
        assert_eq!(
            sessions.iter().map(|s| s.session_number).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
    }

    #[test]
    fn statuses_are_stamped_relative_to_today() {
        let catalog = PhaseCatalog::default();
        let start = date(2026, 1, 1);
        let today = date(2026, 1, 10);
        let sessions =
            build_sessions(&catalog, "carol", SubscriptionTier::Essential, start, today).unwrap();
        assert_eq!(sessions[0].status, SessionStatus::Completed);
        assert_eq!(sessions[1].status, SessionStatus::Active);
        assert_eq!(sessions[2].status, SessionStatus::Scheduled);
    }

    #[test]
    fn start_near_max_date_is_rejected() {
        let catalog = PhaseCatalog::default();
        let start = NaiveDate::MAX - chrono::Duration::days(10);
        let err = build_sessions(&catalog, "alice", SubscriptionTier::Premium, start, start)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn regeneration_replaces_previous_schedule() {
        let store = SqliteStore::open_memory().unwrap();
        let catalog = PhaseCatalog::default();
        let generator = CalendarGenerator::new(&catalog);
        let start = date(2026, 1, 1);

        generator
            .generate(&store, "dave", SubscriptionTier::Premium, start, start)
            .unwrap();
        assert_eq!(store.sessions("dave").unwrap().len(), 4);

        let restart = date(2026, 5, 1);
        generator
            .generate(&store, "dave", SubscriptionTier::Discovery, restart, restart)
            .unwrap();
        let sessions = store.sessions("dave").unwrap();
        assert_eq!(sessions.len(), 2);
        assert!(sessions.iter().all(|s| s.start_date >= restart));
    }

    #[test]
    fn unknown_tier_leaves_existing_schedule_untouched() {
        let store = SqliteStore::open_memory().unwrap();
        let full = PhaseCatalog::default();
        let start = date(2026, 1, 1);
        CalendarGenerator::new(&full)
            .generate(&store, "erin", SubscriptionTier::Essential, start, start)
            .unwrap();

        let empty = PhaseCatalog::empty();
        let err = CalendarGenerator::new(&empty)
            .generate(&store, "erin", SubscriptionTier::Essential, start, start)
            .unwrap_err();
        assert!(matches!(err, CoreError::UnknownTier(_)));
        assert_eq!(store.sessions("erin").unwrap().len(), 3);
    }
}
