use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use uuid::Uuid;

use cadence_core::types::OverrideKind;
use cadence_db::model::{Event, Override};
use cadence_rfc::rfc::recur::Window;

use super::resolve_event;

fn at(month: u32, day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, month, day, hour, min, 0).unwrap()
}

fn january() -> Window {
    Window::new(at(1, 1, 0, 0), at(2, 1, 0, 0))
}

fn event(rule: &str) -> Event {
    Event {
        id: Uuid::new_v4(),
        class_id: Uuid::new_v4(),
        duration: TimeDelta::hours(1),
        room_id: Some(Uuid::new_v4()),
        recurrence_rule: rule.to_string(),
    }
}

fn cancel(event: &Event, kind: OverrideKind, rule: &str) -> Override {
    Override {
        id: Uuid::new_v4(),
        event_id: event.id,
        class_id: event.class_id,
        kind,
        override_rule: rule.to_string(),
        is_cancelled: true,
        duration: None,
        room_id: None,
        reason: Some("cancelled".into()),
        linked_override_id: None,
    }
}

fn replace(event: &Event, kind: OverrideKind, rule: &str, duration: TimeDelta) -> Override {
    Override {
        is_cancelled: false,
        duration: Some(duration),
        reason: Some("rescheduled".into()),
        ..cancel(event, kind, rule)
    }
}

fn starts(instances: &[super::EventInstance]) -> Vec<DateTime<Utc>> {
    instances.iter().map(|i| i.start_time).collect()
}

#[test_log::test]
fn weekly_without_overrides() {
    let e = event("DTSTART:20240102T100000Z\nRRULE:FREQ=WEEKLY;COUNT=5");
    let instances = resolve_event(&e, &[], &january());

    assert_eq!(
        starts(&instances),
        vec![
            at(1, 2, 10, 0),
            at(1, 9, 10, 0),
            at(1, 16, 10, 0),
            at(1, 23, 10, 0),
            at(1, 30, 10, 0),
        ]
    );
    assert!(instances.iter().all(|i| !i.is_override()));
    assert!(instances.iter().all(|i| i.duration == TimeDelta::hours(1)));
}

#[test_log::test]
fn single_cancellation_removes_one_day() {
    let e = event("DTSTART:20240101T090000Z\nRRULE:FREQ=DAILY;COUNT=7");
    let overrides = [cancel(
        &e,
        OverrideKind::SingleInstance,
        "DTSTART:20240104T090000Z\nRRULE:FREQ=DAILY;COUNT=1",
    )];

    let instances = resolve_event(&e, &overrides, &january());

    assert_eq!(instances.len(), 6);
    assert!(!starts(&instances).contains(&at(1, 4, 9, 0)));
}

#[test_log::test]
fn forward_override_changes_remaining_durations() {
    let e = event("DTSTART:20240102T100000Z\nRRULE:FREQ=WEEKLY;COUNT=4");
    let overrides = [replace(
        &e,
        OverrideKind::ForwardFromDate,
        "DTSTART:20240116T100000Z\nRRULE:FREQ=WEEKLY;COUNT=2",
        TimeDelta::hours(2),
    )];

    let instances = resolve_event(&e, &overrides, &january());

    assert_eq!(
        starts(&instances),
        vec![at(1, 2, 10, 0), at(1, 9, 10, 0), at(1, 16, 10, 0), at(1, 23, 10, 0)]
    );
    let durations: Vec<_> = instances.iter().map(|i| i.duration).collect();
    assert_eq!(
        durations,
        vec![
            TimeDelta::hours(1),
            TimeDelta::hours(1),
            TimeDelta::hours(2),
            TimeDelta::hours(2),
        ]
    );
    assert!(!instances[1].is_override());
    assert_eq!(instances[2].override_id, Some(overrides[0].id));
}

#[test_log::test]
fn cancellation_and_modification_combine() {
    let e = event("DTSTART:20240101T090000Z\nRRULE:FREQ=DAILY;COUNT=7");
    let overrides = [
        cancel(
            &e,
            OverrideKind::SingleInstance,
            "DTSTART:20240103T090000Z\nRRULE:FREQ=DAILY;COUNT=1",
        ),
        replace(
            &e,
            OverrideKind::ForwardFromDate,
            "DTSTART:20240105T090000Z\nRRULE:FREQ=DAILY;COUNT=3",
            TimeDelta::minutes(90),
        ),
    ];

    let instances = resolve_event(&e, &overrides, &january());

    assert_eq!(
        starts(&instances),
        vec![
            at(1, 1, 9, 0),
            at(1, 2, 9, 0),
            at(1, 4, 9, 0),
            at(1, 5, 9, 0),
            at(1, 6, 9, 0),
            at(1, 7, 9, 0),
        ]
    );
    let durations: Vec<_> = instances.iter().map(|i| i.duration.num_minutes()).collect();
    assert_eq!(durations, vec![60, 60, 60, 90, 90, 90]);
}

#[test_log::test]
fn rule_outside_window_is_empty() {
    let e = event("DTSTART:20240601T090000Z\nRRULE:FREQ=DAILY;COUNT=7");
    assert!(resolve_event(&e, &[], &january()).is_empty());
}

#[test_log::test]
fn unparseable_base_rule_is_empty() {
    let e = event("every tuesday, probably");
    let overrides = [replace(
        &e,
        OverrideKind::SingleInstance,
        "DTSTART:20240104T090000Z\nRRULE:FREQ=DAILY;COUNT=1",
        TimeDelta::hours(1),
    )];
    assert!(resolve_event(&e, &overrides, &january()).is_empty());
}

#[test_log::test]
fn invalid_override_is_skipped() {
    let e = event("DTSTART:20240101T090000Z\nRRULE:FREQ=DAILY;COUNT=3");
    let overrides = [
        cancel(&e, OverrideKind::SingleInstance, "RRULE:FREQ=DAILY;COUNT=1"),
        cancel(
            &e,
            OverrideKind::SingleInstance,
            "DTSTART:20240102T090000Z\nRRULE:FREQ=DAILY;COUNT=1",
        ),
    ];

    let instances = resolve_event(&e, &overrides, &january());

    assert_eq!(starts(&instances), vec![at(1, 1, 9, 0), at(1, 3, 9, 0)]);
}

#[test_log::test]
fn later_override_wins_a_shared_slot() {
    let e = event("DTSTART:20240101T090000Z\nRRULE:FREQ=DAILY;COUNT=3");
    let slot = "DTSTART:20240102T090000Z\nRRULE:FREQ=DAILY;COUNT=1";
    let overrides = [
        replace(&e, OverrideKind::SingleInstance, slot, TimeDelta::minutes(30)),
        replace(&e, OverrideKind::SingleInstance, slot, TimeDelta::minutes(45)),
    ];

    let instances = resolve_event(&e, &overrides, &january());

    assert_eq!(instances.len(), 3);
    assert_eq!(instances[1].duration, TimeDelta::minutes(45));
    assert_eq!(instances[1].override_id, Some(overrides[1].id));
}

#[test_log::test]
fn rescheduled_session_can_itself_be_cancelled() {
    let e = event("DTSTART:20240101T090000Z\nRRULE:FREQ=DAILY;COUNT=3");
    let overrides = [
        cancel(
            &e,
            OverrideKind::SingleInstance,
            "DTSTART:20240102T090000Z\nRRULE:FREQ=DAILY;COUNT=1",
        ),
        replace(
            &e,
            OverrideKind::SingleInstance,
            "DTSTART:20240102T150000Z\nRRULE:FREQ=DAILY;COUNT=1",
            TimeDelta::hours(1),
        ),
        cancel(
            &e,
            OverrideKind::SingleInstance,
            "DTSTART:20240102T150000Z\nRRULE:FREQ=DAILY;COUNT=1",
        ),
    ];

    let instances = resolve_event(&e, &overrides, &january());

    assert_eq!(starts(&instances), vec![at(1, 1, 9, 0), at(1, 3, 9, 0)]);
}

#[test_log::test]
fn moved_session_keeps_replacement_room() {
    let e = event("DTSTART:20240101T090000Z\nRRULE:FREQ=DAILY;COUNT=2");
    let other_room = Uuid::new_v4();
    let mut moved = replace(
        &e,
        OverrideKind::SingleInstance,
        "DTSTART:20240102T090000Z\nRRULE:FREQ=DAILY;COUNT=1",
        TimeDelta::hours(1),
    );
    moved.room_id = Some(other_room);
    moved.duration = None;

    let instances = resolve_event(&e, &[moved], &january());

    assert_eq!(instances[0].room_id, e.room_id);
    assert_eq!(instances[1].room_id, Some(other_room));
    assert_eq!(instances[1].duration, e.duration);
}

#[test_log::test]
fn cancel_remaining_drops_everything_from_anchor() {
    let e = event("DTSTART:20240101T090000Z\nRRULE:FREQ=DAILY;COUNT=7");
    let overrides = [cancel(
        &e,
        OverrideKind::CancelRemaining,
        "DTSTART:20240104T000000Z\nRRULE:FREQ=WEEKLY;BYDAY=MO,TU,WE,TH,FR,SA,SU",
    )];

    let instances = resolve_event(&e, &overrides, &january());

    assert_eq!(
        starts(&instances),
        vec![at(1, 1, 9, 0), at(1, 2, 9, 0), at(1, 3, 9, 0)]
    );
}

#[test_log::test]
fn cancel_remaining_respects_its_until() {
    let e = event("DTSTART:20240101T090000Z\nRRULE:FREQ=DAILY;COUNT=7");
    let overrides = [cancel(
        &e,
        OverrideKind::CancelRemaining,
        "DTSTART:20240103T000000Z\nRRULE:FREQ=WEEKLY;BYDAY=MO,TU,WE,TH,FR,SA,SU;UNTIL=20240104T235959Z",
    )];

    let instances = resolve_event(&e, &overrides, &january());

    assert_eq!(instances.len(), 5);
    assert!(!starts(&instances).contains(&at(1, 3, 9, 0)));
    assert!(!starts(&instances).contains(&at(1, 4, 9, 0)));
}

#[test_log::test]
fn override_after_cancel_remaining_still_materializes() {
    let e = event("DTSTART:20240101T090000Z\nRRULE:FREQ=DAILY;COUNT=7");
    let overrides = [
        cancel(
            &e,
            OverrideKind::CancelRemaining,
            "DTSTART:20240104T000000Z\nRRULE:FREQ=WEEKLY;BYDAY=MO,TU,WE,TH,FR,SA,SU",
        ),
        replace(
            &e,
            OverrideKind::SingleInstance,
            "DTSTART:20240110T090000Z\nRRULE:FREQ=DAILY;COUNT=1",
            TimeDelta::hours(1),
        ),
    ];

    let instances = resolve_event(&e, &overrides, &january());

    assert_eq!(
        starts(&instances),
        vec![at(1, 1, 9, 0), at(1, 2, 9, 0), at(1, 3, 9, 0), at(1, 10, 9, 0)]
    );
}

#[test_log::test]
fn off_pattern_cancellation_has_no_effect() {
    let e = event("DTSTART:20240101T090000Z\nRRULE:FREQ=DAILY;COUNT=3");
    let overrides = [cancel(
        &e,
        OverrideKind::SingleInstance,
        "DTSTART:20240102T130000Z\nRRULE:FREQ=DAILY;COUNT=1",
    )];

    let instances = resolve_event(&e, &overrides, &january());

    assert_eq!(instances.len(), 3);
}

#[test_log::test]
fn resolution_is_deterministic_and_windowed() {
    let e = event("DTSTART:20240101T090000Z\nRRULE:FREQ=DAILY");
    let overrides = [cancel(
        &e,
        OverrideKind::SingleInstance,
        "DTSTART:20240103T090000Z\nRRULE:FREQ=DAILY;COUNT=1",
    )];
    let window = Window::new(at(1, 2, 9, 0), at(1, 5, 9, 0));

    let first = resolve_event(&e, &overrides, &window);
    let second = resolve_event(&e, &overrides, &window);

    assert_eq!(first, second);
    assert_eq!(starts(&first), vec![at(1, 2, 9, 0), at(1, 4, 9, 0)]);
}
