use chrono::{DateTime, Utc};
use uuid::Uuid;

use cadence_core::types::ClassStatus;
use cadence_db::db::ScheduleRepository;
use cadence_db::model::Class;
use cadence_rfc::rfc::recur::end_of_day;

use crate::error::{ServiceError, ServiceResult};
use crate::schedule::boundary::{BoundaryMode, sync_class_boundaries};
use crate::schedule::end_series_at;

/// ## Summary
/// Moves a class to `new_status`.
///
/// Entering a terminal status ends every event of the class at 23:59:59Z on
/// the day of `now` and re-derives the class boundaries from the stamped
/// rules. Sessions added by the events' overrides past the stamp are ended
/// too, so forward-from replacements and late single-instance moves stop with
/// the base series.
///
/// The stamp never extends a series. A rule whose UNTIL or COUNT already ends
/// before the stamp keeps that earlier end (a COUNT is rewritten as the
/// equivalent UNTIL), so an already-finished series reports its real last
/// session rather than the status-change day.
///
/// ## Errors
/// Returns `InvalidState` if the class is already completed or cancelled,
/// and an error if the class or its events cannot be read or written.
#[tracing::instrument(skip(repo))]
pub fn transition_class_status<R>(
    repo: &mut R,
    class_id: Uuid,
    new_status: ClassStatus,
    now: DateTime<Utc>,
) -> ServiceResult<Class>
where
    R: ScheduleRepository + ?Sized,
{
    let class = repo.class(class_id)?;
    if class.status.is_terminal() {
        return Err(ServiceError::InvalidState(format!(
            "class {class_id} is already {}",
            class.status
        )));
    }
    if class.status == new_status {
        return Ok(class);
    }

    let mut class = if new_status.is_terminal() {
        let stamp = end_of_day(now.date_naive());
        for event in repo.events_for_class(class_id)? {
            end_series_at(repo, &event, stamp)?;
        }
        sync_class_boundaries(repo, class_id, BoundaryMode::Rederive)?
    } else {
        class
    };

    let old_status = class.status;
    class.status = new_status;
    repo.update_class(class.clone())?;

    tracing::info!(%class_id, %old_status, %new_status, "Class status changed");
    Ok(class)
}

#[cfg(test)]
mod tests {
    use cadence_rfc::rfc::recur::Window;

    use super::*;
    use crate::schedule::resolve_stored;
    use crate::test_fixtures::{Fixture, at};

    fn year() -> Window {
        Window::new(at(2024, 1, 1, 0, 0), at(2025, 1, 1, 0, 0))
    }

    #[test_log::test]
    fn completing_stamps_open_series() {
        let mut f = Fixture::utc();
        let event = f.add_event(
            f.class_id,
            "DTSTART:20240101T090000Z\nRRULE:FREQ=DAILY",
            60,
            None,
        );

        let class = transition_class_status(
            &mut f.state,
            f.class_id,
            ClassStatus::Completed,
            at(2024, 1, 10, 15, 30),
        )
        .unwrap();

        assert_eq!(class.status, ClassStatus::Completed);
        assert_eq!(
            f.state.event(event.id).unwrap().recurrence_rule,
            "DTSTART:20240101T090000Z\nRRULE:FREQ=DAILY;UNTIL=20240110T235959Z"
        );
        assert_eq!(class.end_dt, Some(end_of_day(at(2024, 1, 10, 0, 0).date_naive())));
    }

    #[test_log::test]
    fn stamping_keeps_an_earlier_end() {
        let mut f = Fixture::utc();
        let rule = "DTSTART:20240101T090000Z\nRRULE:FREQ=DAILY;UNTIL=20240105T235959Z";
        let event = f.add_event(f.class_id, rule, 60, None);

        transition_class_status(
            &mut f.state,
            f.class_id,
            ClassStatus::Cancelled,
            at(2024, 2, 1, 12, 0),
        )
        .unwrap();

        assert_eq!(f.state.event(event.id).unwrap().recurrence_rule, rule);
    }

    #[test_log::test]
    fn completing_ends_forward_override_sessions() {
        let mut f = Fixture::utc();
        let event = f.add_event(
            f.class_id,
            "DTSTART:20240101T090000Z\nRRULE:FREQ=DAILY",
            60,
            None,
        );
        let forward =
            f.add_forward_override(&event, "DTSTART:20240105T090000Z\nRRULE:FREQ=DAILY", 90);

        let class = transition_class_status(
            &mut f.state,
            f.class_id,
            ClassStatus::Completed,
            at(2024, 1, 10, 15, 0),
        )
        .unwrap();

        let sessions = resolve_stored(&f.state, &event, &year()).unwrap();
        assert_eq!(sessions.len(), 10);
        assert_eq!(sessions.last().unwrap().start_time, at(2024, 1, 10, 9, 0));
        assert_eq!(sessions.last().unwrap().override_id, Some(forward.id));
        assert_eq!(
            f.state.override_by_id(forward.id).unwrap().override_rule,
            "DTSTART:20240105T090000Z\nRRULE:FREQ=DAILY;UNTIL=20240110T235959Z"
        );
        assert_eq!(class.end_dt, Some(end_of_day(at(2024, 1, 10, 0, 0).date_naive())));
    }

    #[test_log::test]
    fn cancelling_drops_moved_sessions_after_the_stamp() {
        let mut f = Fixture::utc();
        let event = f.add_event(
            f.class_id,
            "DTSTART:20240101T090000Z\nRRULE:FREQ=DAILY",
            60,
            None,
        );
        let early_rule = "DTSTART:20240103T110000Z\nRRULE:FREQ=DAILY;COUNT=1";
        let early = f.add_override(&event, early_rule, false, None);
        let late = f.add_override(
            &event,
            "DTSTART:20240120T110000Z\nRRULE:FREQ=DAILY;COUNT=1",
            false,
            None,
        );

        let class = transition_class_status(
            &mut f.state,
            f.class_id,
            ClassStatus::Cancelled,
            at(2024, 1, 10, 15, 0),
        )
        .unwrap();

        assert_eq!(f.state.override_by_id(early.id).unwrap().override_rule, early_rule);
        let sessions = resolve_stored(&f.state, &event, &year()).unwrap();
        assert!(sessions.iter().all(|s| s.start_time < at(2024, 1, 11, 0, 0)));
        assert!(sessions.iter().all(|s| s.override_id != Some(late.id)));
        assert!(sessions.iter().any(|s| s.override_id == Some(early.id)));
        assert_eq!(class.end_dt, Some(end_of_day(at(2024, 1, 10, 0, 0).date_naive())));
    }

    #[test_log::test]
    fn terminal_class_cannot_transition_again() {
        let mut f = Fixture::utc();
        let now = at(2024, 2, 1, 12, 0);
        transition_class_status(&mut f.state, f.class_id, ClassStatus::Completed, now).unwrap();

        assert!(matches!(
            transition_class_status(&mut f.state, f.class_id, ClassStatus::Active, now),
            Err(ServiceError::InvalidState(_))
        ));
    }

    #[test_log::test]
    fn pausing_leaves_rules_alone() {
        let mut f = Fixture::utc();
        let rule = "DTSTART:20240101T090000Z\nRRULE:FREQ=DAILY";
        let event = f.add_event(f.class_id, rule, 60, None);

        let class = transition_class_status(
            &mut f.state,
            f.class_id,
            ClassStatus::Paused,
            at(2024, 2, 1, 12, 0),
        )
        .unwrap();

        assert_eq!(class.status, ClassStatus::Paused);
        assert_eq!(f.state.event(event.id).unwrap().recurrence_rule, rule);
    }
}
