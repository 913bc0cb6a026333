//! Event schedules: override resolution, room conflicts, class boundaries
//! and the write paths that tie them together.

use std::collections::BTreeSet;

use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use cadence_db::db::ScheduleRepository;
use cadence_db::model::Event;
use cadence_rfc::rfc::recur::{
    RecurrenceRule, Window, format_rule, last_occurrence, local_date, local_day_window,
    parse_rule, parse_timezone, truncate,
};

use crate::error::{ServiceError, ServiceResult};

pub mod boundary;
pub mod calendar;
pub mod conflict;
pub mod events;
pub mod instance;
pub mod override_kind;
pub mod overrides;
pub mod resolve;

pub use instance::{EventInstance, RoomBooking};
pub use resolve::resolve_event;

/// ## Summary
/// Zone of the facility that owns a class.
///
/// ## Errors
/// Returns `NotFound` for an unknown facility and `UnknownTimezone` if the
/// facility carries a zone name outside the tz database.
pub(crate) fn facility_timezone<R>(repo: &R, facility_id: Uuid) -> ServiceResult<Tz>
where
    R: ScheduleRepository + ?Sized,
{
    let facility = repo.facility(facility_id)?;
    Ok(parse_timezone(&facility.timezone)?)
}

pub(crate) fn ensure_positive(duration: TimeDelta) -> ServiceResult<()> {
    if duration <= TimeDelta::zero() {
        return Err(ServiceError::ValidationError(format!(
            "duration must be positive, got {}s",
            duration.num_seconds()
        )));
    }
    Ok(())
}

/// ## Summary
/// Resolves a stored event with its stored overrides.
///
/// ## Errors
/// Returns an error if the overrides cannot be read.
pub(crate) fn resolve_stored<R>(
    repo: &R,
    event: &Event,
    window: &Window,
) -> ServiceResult<Vec<EventInstance>>
where
    R: ScheduleRepository + ?Sized,
{
    let overrides = repo.overrides_for_event(event.id)?;
    Ok(resolve_event(event, &overrides, window))
}

/// ## Summary
/// Ends `event` at `at`, together with every session its non-cancelled
/// overrides would add after that instant.
///
/// Bounds are only ever pulled in: a rule that already ends by `at` is left
/// as written. Rules that fail to parse are left alone and logged.
///
/// ## Errors
/// Returns an error if a bounded rule cannot be expanded or the store cannot
/// be written.
pub(crate) fn end_series_at<R>(
    repo: &mut R,
    event: &Event,
    at: DateTime<Utc>,
) -> ServiceResult<()>
where
    R: ScheduleRepository + ?Sized,
{
    match parse_rule(&event.recurrence_rule) {
        Ok(rule) => {
            let ended = format_rule(&truncate(&rule, at)?);
            if ended != event.recurrence_rule {
                repo.update_event_rule(event.id, ended)?;
            }
        }
        Err(e) => {
            tracing::warn!(event_id = %event.id, error = %e, "Leaving event with invalid rule unstamped");
        }
    }

    for record in repo.overrides_for_event(event.id)? {
        if record.is_cancelled {
            continue;
        }
        let rule = match parse_rule(&record.override_rule) {
            Ok(rule) => rule,
            Err(e) => {
                tracing::warn!(override_id = %record.id, error = %e, "Leaving override with invalid rule unstamped");
                continue;
            }
        };
        let runs_past =
            rule.is_open_ended() || last_occurrence(&rule)?.is_some_and(|last| last > at);
        if runs_past {
            repo.update_override_rule(record.id, format_rule(&truncate(&rule, at)?))?;
            tracing::debug!(override_id = %record.id, %at, "Ended override sessions");
        }
    }
    Ok(())
}

/// ## Summary
/// Span of instants a rule can touch: its start through its UNTIL, or
/// through the end of its last occurrence's day.
///
/// ## Errors
/// Returns an error if the rule cannot be expanded.
pub(crate) fn rule_span(rule: &RecurrenceRule) -> ServiceResult<Window> {
    let start = rule.start_instant();
    let end = match rule.until() {
        Some(until) => until + TimeDelta::seconds(1),
        None => last_occurrence(rule)?.map_or(start, |last| last + TimeDelta::days(1)),
    };
    Ok(Window::new(start, end.max(start)))
}

/// ## Summary
/// Deletes attendance recorded on facility-local dates inside `span` on
/// which `event` no longer holds a session.
///
/// Returns the number of records removed.
///
/// ## Errors
/// Returns an error if the store cannot be read or written.
pub(crate) fn purge_orphaned_attendance<R>(
    repo: &mut R,
    event: &Event,
    span: Window,
    tz: Tz,
) -> ServiceResult<usize>
where
    R: ScheduleRepository + ?Sized,
{
    if span.is_empty() {
        return Ok(0);
    }

    let first = local_date(span.start, tz);
    let last = local_date(span.end - TimeDelta::seconds(1), tz);
    // Widen to whole local days so a session late on the last day still counts.
    let days = Window::new(local_day_window(first, tz).start, local_day_window(last, tz).end);

    let held: BTreeSet<_> = resolve_stored(repo, event, &days)?
        .iter()
        .map(|instance| local_date(instance.start_time, tz))
        .collect();

    let mut removed = 0;
    for date in first.iter_days().take_while(|date| *date <= last) {
        if !held.contains(&date) {
            removed += repo.delete_attendance_on(event.id, date)?;
        }
    }

    if removed > 0 {
        tracing::info!(event_id = %event.id, removed, "Removed attendance for sessions that no longer exist");
    }
    Ok(removed)
}
