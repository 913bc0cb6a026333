//! Event series write paths.

use chrono::TimeDelta;
use uuid::Uuid;

use cadence_db::db::ScheduleRepository;
use cadence_db::model::{Class, Event};
use cadence_rfc::rfc::recur::{RecurrenceRule, format_rule, parse_rule};

use super::boundary::{BoundaryMode, sync_class_boundaries};
use super::conflict::find_conflicts;
use super::{end_series_at, ensure_positive};
use crate::class::ensure_mutable;
use crate::error::{ServiceError, ServiceResult};

/// The caller-supplied shape of a series.
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub recurrence_rule: String,
    pub duration: TimeDelta,
    pub room_id: Option<Uuid>,
}

impl EventDraft {
    fn validate(&self) -> ServiceResult<RecurrenceRule> {
        ensure_positive(self.duration)?;
        Ok(self.recurrence_rule.parse()?)
    }
}

fn ensure_room_free<R>(
    repo: &R,
    class: &Class,
    draft: &EventDraft,
    rule: &RecurrenceRule,
    exclude_event_id: Option<Uuid>,
) -> ServiceResult<()>
where
    R: ScheduleRepository + ?Sized,
{
    let Some(room_id) = draft.room_id else {
        return Ok(());
    };
    let conflicts = find_conflicts(
        repo,
        class.facility_id,
        room_id,
        rule,
        draft.duration,
        exclude_event_id,
    )?;
    if conflicts.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::RoomConflict(conflicts))
    }
}

/// Loads an event and checks it belongs to `class_id`.
pub(crate) fn owned_event<R>(repo: &R, class_id: Uuid, event_id: Uuid) -> ServiceResult<Event>
where
    R: ScheduleRepository + ?Sized,
{
    let event = repo.event(event_id)?;
    if event.class_id != class_id {
        return Err(ServiceError::NotFound(format!(
            "event {event_id} in class {class_id}"
        )));
    }
    Ok(event)
}

/// ## Summary
/// Adds a new series to a class.
///
/// The rule is stored in its canonical text form. When a room is given the
/// whole series is checked against the room's bookings first.
///
/// ## Errors
/// Returns `InvalidState` for a terminal class, `InvalidRule` or
/// `ValidationError` for a bad draft, and `RoomConflict` when the room is
/// taken.
#[tracing::instrument(skip(repo, draft), fields(rule = %draft.recurrence_rule))]
pub fn create_event<R>(repo: &mut R, class_id: Uuid, draft: &EventDraft) -> ServiceResult<Event>
where
    R: ScheduleRepository + ?Sized,
{
    let class = repo.class(class_id)?;
    ensure_mutable(&class)?;
    let rule = draft.validate()?;
    ensure_room_free(repo, &class, draft, &rule, None)?;

    let event = Event {
        id: Uuid::new_v4(),
        class_id,
        duration: draft.duration,
        room_id: draft.room_id,
        recurrence_rule: format_rule(&rule),
    };
    repo.insert_event(event.clone())?;
    sync_class_boundaries(repo, class_id, BoundaryMode::Extend)?;

    tracing::info!(event_id = %event.id, %class_id, "Created event");
    Ok(event)
}

/// ## Summary
/// Replaces a series from the new rule's start onward.
///
/// The old event is ended one second before the new series begins. Its
/// overrides that start from that point on are dropped, and those that began
/// earlier are ended at the same instant so none of them adds sessions to the
/// old event past the cut. The new series is stored as a fresh event. Class
/// boundaries are re-derived.
///
/// ## Errors
/// Returns `NotFound` if the event is not part of the class, and the errors
/// of [`create_event`].
#[tracing::instrument(skip(repo, draft), fields(rule = %draft.recurrence_rule))]
pub fn reschedule_event_series<R>(
    repo: &mut R,
    class_id: Uuid,
    event_id: Uuid,
    draft: &EventDraft,
) -> ServiceResult<Event>
where
    R: ScheduleRepository + ?Sized,
{
    let class = repo.class(class_id)?;
    ensure_mutable(&class)?;
    let old = owned_event(repo, class_id, event_id)?;
    let rule = draft.validate()?;
    ensure_room_free(repo, &class, draft, &rule, Some(old.id))?;

    let cut = rule.start_instant();
    parse_rule(&old.recurrence_rule)?;

    for record in repo.overrides_for_event(old.id)? {
        let starts_after_cut = parse_rule(&record.override_rule)
            .is_ok_and(|override_rule| override_rule.start_instant() >= cut);
        if starts_after_cut {
            repo.delete_override(record.id)?;
        }
    }
    // Overrides that began before the cut may still run past it.
    end_series_at(repo, &old, cut - TimeDelta::seconds(1))?;

    let event = Event {
        id: Uuid::new_v4(),
        class_id,
        duration: draft.duration,
        room_id: draft.room_id,
        recurrence_rule: format_rule(&rule),
    };
    repo.insert_event(event.clone())?;
    sync_class_boundaries(repo, class_id, BoundaryMode::Rederive)?;

    tracing::info!(old_event_id = %old.id, new_event_id = %event.id, %class_id, at = %cut, "Rescheduled event series");
    Ok(event)
}

/// ## Summary
/// Deletes a series with its overrides and attendance, then re-derives the
/// class boundaries.
///
/// ## Errors
/// Returns `InvalidState` for a terminal class and `NotFound` if the event
/// is not part of the class.
#[tracing::instrument(skip(repo))]
pub fn delete_event<R>(repo: &mut R, class_id: Uuid, event_id: Uuid) -> ServiceResult<Event>
where
    R: ScheduleRepository + ?Sized,
{
    ensure_mutable(&repo.class(class_id)?)?;
    owned_event(repo, class_id, event_id)?;
    let event = repo.delete_event(event_id)?;
    sync_class_boundaries(repo, class_id, BoundaryMode::Rederive)?;
    tracing::info!(%event_id, %class_id, "Deleted event");
    Ok(event)
}

#[cfg(test)]
mod tests {
    use cadence_core::types::ClassStatus;

    use super::*;
    use crate::schedule::resolve_stored;
    use crate::test_fixtures::{Fixture, at};
    use cadence_rfc::rfc::recur::Window;

    fn draft(rule: &str, minutes: i64, room_id: Option<Uuid>) -> EventDraft {
        EventDraft {
            recurrence_rule: rule.into(),
            duration: TimeDelta::minutes(minutes),
            room_id,
        }
    }

    fn year() -> Window {
        Window::new(at(2024, 1, 1, 0, 0), at(2025, 1, 1, 0, 0))
    }

    #[test_log::test]
    fn create_stores_canonical_rule_and_extends_class() {
        let mut f = Fixture::utc();
        let event = create_event(
            &mut f.state,
            f.class_id,
            &draft(
                " dtstart:20240102T090000Z \r\n rrule:freq=weekly;interval=1;count=3 ",
                60,
                Some(f.room_id),
            ),
        )
        .unwrap();

        assert_eq!(
            event.recurrence_rule,
            "DTSTART:20240102T090000Z\nRRULE:FREQ=WEEKLY;COUNT=3"
        );
        let class = f.state.class(f.class_id).unwrap();
        assert_eq!(class.end_dt, Some(at(2024, 1, 16, 10, 0)));
    }

    #[test_log::test]
    fn create_rejects_double_booking_without_writing() {
        let mut f = Fixture::utc();
        let other_class = f.add_class(ClassStatus::Active);
        let rule = "DTSTART:20240102T090000Z\nRRULE:FREQ=WEEKLY;COUNT=3";
        create_event(&mut f.state, other_class, &draft(rule, 120, Some(f.room_id))).unwrap();

        let result = create_event(&mut f.state, f.class_id, &draft(rule, 30, Some(f.room_id)));

        match result {
            Err(ServiceError::RoomConflict(conflicts)) => assert_eq!(conflicts.len(), 3),
            other => panic!("expected a room conflict, got {other:?}"),
        }
        assert!(f.state.events_for_class(f.class_id).unwrap().is_empty());
    }

    #[test_log::test]
    fn create_on_terminal_class_is_invalid_state() {
        let mut f = Fixture::utc();
        let done = f.add_class(ClassStatus::Completed);
        let result = create_event(
            &mut f.state,
            done,
            &draft("DTSTART:20240102T090000Z\nRRULE:FREQ=DAILY", 60, None),
        );
        assert!(matches!(result, Err(ServiceError::InvalidState(_))));
    }

    #[test_log::test]
    fn create_rejects_bad_drafts() {
        let mut f = Fixture::utc();
        let zero = create_event(
            &mut f.state,
            f.class_id,
            &draft("DTSTART:20240102T090000Z\nRRULE:FREQ=DAILY", 0, None),
        );
        assert!(matches!(zero, Err(ServiceError::ValidationError(_))));

        let bad_rule = create_event(
            &mut f.state,
            f.class_id,
            &draft("DTSTART:20240102T090000Z\nRRULE:FREQ=HOURLY", 60, None),
        );
        assert!(matches!(bad_rule, Err(ServiceError::RfcError(_))));
    }

    #[test_log::test]
    fn reschedule_closes_old_series() {
        let mut f = Fixture::utc();
        let old = create_event(
            &mut f.state,
            f.class_id,
            &draft(
                "DTSTART:20240101T090000Z\nRRULE:FREQ=DAILY;COUNT=10",
                60,
                Some(f.room_id),
            ),
        )
        .unwrap();
        // A session moved to a date that the new series replaces.
        f.add_override(
            &old,
            "DTSTART:20240108T150000Z\nRRULE:FREQ=DAILY;COUNT=1",
            false,
            None,
        );

        // Same room, same time: only the old event's own sessions overlap.
        let new = reschedule_event_series(
            &mut f.state,
            f.class_id,
            old.id,
            &draft(
                "DTSTART:20240106T090000Z\nRRULE:FREQ=DAILY;COUNT=5",
                90,
                Some(f.room_id),
            ),
        )
        .unwrap();

        let old = f.state.event(old.id).unwrap();
        assert_eq!(
            old.recurrence_rule,
            "DTSTART:20240101T090000Z\nRRULE:FREQ=DAILY;UNTIL=20240106T085959Z"
        );
        assert!(f.state.overrides_for_event(old.id).unwrap().is_empty());
        assert_eq!(resolve_stored(&f.state, &old, &year()).unwrap().len(), 5);
        assert_eq!(resolve_stored(&f.state, &new, &year()).unwrap().len(), 5);

        let class = f.state.class(f.class_id).unwrap();
        assert_eq!(class.end_dt, Some(at(2024, 1, 10, 10, 30)));
    }

    #[test_log::test]
    fn reschedule_before_start_empties_old_series() {
        let mut f = Fixture::utc();
        let old = create_event(
            &mut f.state,
            f.class_id,
            &draft("DTSTART:20240110T090000Z\nRRULE:FREQ=DAILY;COUNT=3", 60, None),
        )
        .unwrap();

        reschedule_event_series(
            &mut f.state,
            f.class_id,
            old.id,
            &draft("DTSTART:20240105T090000Z\nRRULE:FREQ=DAILY;COUNT=3", 60, None),
        )
        .unwrap();

        let old = f.state.event(old.id).unwrap();
        assert!(old.recurrence_rule.ends_with("COUNT=0"));
    }

    #[test_log::test]
    fn reschedule_ends_forward_override_at_the_cut() {
        let mut f = Fixture::utc();
        let old = f.add_event(
            f.class_id,
            "DTSTART:20240101T090000Z\nRRULE:FREQ=DAILY",
            60,
            None,
        );
        let forward =
            f.add_forward_override(&old, "DTSTART:20240105T090000Z\nRRULE:FREQ=DAILY", 90);
        let moved_rule = "DTSTART:20240115T160000Z\nRRULE:FREQ=DAILY;COUNT=1";
        let moved = f.add_override(&old, moved_rule, false, None);

        let new = reschedule_event_series(
            &mut f.state,
            f.class_id,
            old.id,
            &draft("DTSTART:20240201T140000Z\nRRULE:FREQ=DAILY;COUNT=5", 60, None),
        )
        .unwrap();

        assert_eq!(
            f.state.override_by_id(forward.id).unwrap().override_rule,
            "DTSTART:20240105T090000Z\nRRULE:FREQ=DAILY;UNTIL=20240201T135959Z"
        );
        assert_eq!(f.state.override_by_id(moved.id).unwrap().override_rule, moved_rule);

        let old = f.state.event(old.id).unwrap();
        let sessions = resolve_stored(&f.state, &old, &year()).unwrap();
        // Feb 1 09:00 precedes the 14:00 cut and stays with the old series.
        assert_eq!(sessions.len(), 33);
        let last = sessions.last().unwrap();
        assert_eq!(last.start_time, at(2024, 2, 1, 9, 0));
        assert_eq!(last.override_id, Some(forward.id));
        assert!(sessions.iter().all(|s| s.start_time < at(2024, 2, 1, 14, 0)));
        assert!(sessions.iter().any(|s| s.override_id == Some(moved.id)));
        assert_eq!(resolve_stored(&f.state, &new, &year()).unwrap().len(), 5);
        assert_eq!(
            f.state.class(f.class_id).unwrap().end_dt,
            Some(at(2024, 2, 5, 15, 0))
        );
    }

    #[test_log::test]
    fn event_of_another_class_is_not_found() {
        let mut f = Fixture::utc();
        let other_class = f.add_class(ClassStatus::Active);
        let event = f.add_event(
            other_class,
            "DTSTART:20240110T090000Z\nRRULE:FREQ=DAILY;COUNT=3",
            60,
            None,
        );

        assert!(matches!(
            delete_event(&mut f.state, f.class_id, event.id),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test_log::test]
    fn delete_rederives_end() {
        let mut f = Fixture::utc();
        create_event(
            &mut f.state,
            f.class_id,
            &draft("DTSTART:20240101T090000Z\nRRULE:FREQ=DAILY;COUNT=3", 60, None),
        )
        .unwrap();
        let long = create_event(
            &mut f.state,
            f.class_id,
            &draft("DTSTART:20240101T090000Z\nRRULE:FREQ=DAILY;COUNT=30", 60, None),
        )
        .unwrap();
        assert_eq!(
            f.state.class(f.class_id).unwrap().end_dt,
            Some(at(2024, 1, 30, 10, 0))
        );

        delete_event(&mut f.state, f.class_id, long.id).unwrap();

        assert_eq!(
            f.state.class(f.class_id).unwrap().end_dt,
            Some(at(2024, 1, 3, 10, 0))
        );
    }
}
