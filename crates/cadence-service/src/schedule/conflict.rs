//! Room double-booking detection.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use uuid::Uuid;

use cadence_db::db::ScheduleRepository;
use cadence_rfc::rfc::recur::{RecurrenceRule, Window, expand, last_occurrence, lookahead_end};

use super::instance::RoomBooking;
use super::{ensure_positive, resolve_stored};
use crate::error::{ServiceError, ServiceResult};

/// Conflicts reported for one check; a caller only needs enough to show why.
const MAX_CONFLICTS: usize = 50;

/// A conflict-check request for a candidate series.
#[derive(Debug, Clone)]
pub struct ConflictCheck {
    pub facility_id: Uuid,
    pub room_id: Uuid,
    pub recurrence_rule: String,
    pub duration: TimeDelta,
    /// An event whose own bookings are ignored, e.g. the one being edited.
    pub exclude_event_id: Option<Uuid>,
}

/// An existing booking that overlaps a candidate session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomConflict {
    pub conflicting_event_id: Uuid,
    pub conflicting_class_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl From<&RoomBooking> for RoomConflict {
    fn from(booking: &RoomBooking) -> Self {
        Self {
            conflicting_event_id: booking.event_id,
            conflicting_class_id: booking.class_id,
            start_time: booking.start_time,
            end_time: booking.end_time,
        }
    }
}

/// ## Summary
/// Parses the candidate rule and reports the bookings it would collide with.
///
/// ## Errors
/// Returns `InvalidRule` for a bad rule text and see [`find_conflicts`].
pub fn check_conflicts<R>(repo: &R, check: &ConflictCheck) -> ServiceResult<Vec<RoomConflict>>
where
    R: ScheduleRepository + ?Sized,
{
    let rule: RecurrenceRule = check.recurrence_rule.parse()?;
    find_conflicts(
        repo,
        check.facility_id,
        check.room_id,
        &rule,
        check.duration,
        check.exclude_event_id,
    )
}

/// ## Summary
/// Expands a candidate series and returns, for each of its sessions, the
/// first existing booking of `room_id` it overlaps.
///
/// Sessions that merely touch (`end == start`) do not conflict. Bookings
/// follow override resolution, so a session moved into the room counts and
/// one moved out of it does not.
///
/// ## Errors
/// Returns `ValidationError` for a non-positive duration or a room outside
/// `facility_id`, `NotFound` for an unknown room, and an error if the store
/// cannot be read or the candidate cannot be expanded.
#[tracing::instrument(skip(repo, rule), fields(rule = %rule))]
pub fn find_conflicts<R>(
    repo: &R,
    facility_id: Uuid,
    room_id: Uuid,
    rule: &RecurrenceRule,
    duration: TimeDelta,
    exclude_event_id: Option<Uuid>,
) -> ServiceResult<Vec<RoomConflict>>
where
    R: ScheduleRepository + ?Sized,
{
    ensure_positive(duration)?;

    let room = repo.room(room_id)?;
    if room.facility_id != facility_id {
        return Err(ServiceError::ValidationError(format!(
            "room {room_id} does not belong to facility {facility_id}"
        )));
    }

    let scan = scan_window(rule, duration)?;
    let candidates = expand(rule, &scan)?;
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let bookings = room_bookings(repo, room_id, &scan, exclude_event_id)?;

    let mut conflicts = Vec::new();
    for start in candidates {
        let session = Window::new(start, start + duration);
        // Bookings are sorted by start; only those starting before the
        // session ends can overlap it.
        let reachable = bookings.partition_point(|b| b.start_time < session.end);
        if let Some(hit) = bookings[..reachable]
            .iter()
            .find(|b| b.end_time > session.start)
        {
            conflicts.push(RoomConflict::from(hit));
            if conflicts.len() >= MAX_CONFLICTS {
                break;
            }
        }
    }

    if !conflicts.is_empty() {
        tracing::debug!(%room_id, conflicts = conflicts.len(), "Room conflicts found");
    }
    Ok(conflicts)
}

/// `[start, end of the last session)`. An open-ended rule scans to the
/// lookahead horizon plus one session, since a session starting just inside
/// the horizon can run past it.
fn scan_window(rule: &RecurrenceRule, duration: TimeDelta) -> ServiceResult<Window> {
    let start = rule.start_instant();
    let end = if rule.is_open_ended() {
        lookahead_end(start) + duration
    } else if let Some(until) = rule.until() {
        until + duration
    } else {
        last_occurrence(rule)?.map_or(start, |last| last + duration)
    };
    Ok(Window::new(start, end))
}

/// Resolved bookings of `room_id` that may touch `scan`, sorted by start.
fn room_bookings<R>(
    repo: &R,
    room_id: Uuid,
    scan: &Window,
    exclude_event_id: Option<Uuid>,
) -> ServiceResult<Vec<RoomBooking>>
where
    R: ScheduleRepository + ?Sized,
{
    let mut bookings = Vec::new();
    for event in repo.events_booking_room(room_id)? {
        if exclude_event_id == Some(event.id) {
            continue;
        }
        // Sessions that started before the scan can still run into it.
        let longest = repo
            .overrides_for_event(event.id)?
            .iter()
            .filter_map(|o| o.duration)
            .fold(event.duration, TimeDelta::max);
        let window = Window::new(scan.start - longest, scan.end);

        bookings.extend(
            resolve_stored(repo, &event, &window)?
                .iter()
                .filter_map(RoomBooking::from_instance)
                .filter(|booking| booking.room_id == room_id),
        );
    }
    bookings.sort_by_key(|booking| booking.start_time);
    Ok(bookings)
}

#[cfg(test)]
#[path = "conflict_tests.rs"]
mod conflict_tests;
