//! Override write paths: cancelling, modifying and restoring sessions.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use uuid::Uuid;

use cadence_core::types::OverrideKind;
use cadence_db::db::ScheduleRepository;
use cadence_db::model::{Class, Event, Override};
use cadence_rfc::rfc::recur::{
    Frequency, RecurrenceRule, RuleBound, RuleStart, RuleZone, format_rule, local_day_window,
    parse_rule,
};

use super::boundary::{BoundaryMode, sync_class_boundaries};
use super::conflict::find_conflicts;
use super::events::owned_event;
use super::override_kind::{
    cancel_remaining_rule, forward_from_rule, single_instance_rule, validate_override_kind,
};
use super::{ensure_positive, facility_timezone, purge_orphaned_attendance, rule_span};
use crate::class::ensure_mutable;
use crate::error::{ServiceError, ServiceResult};

/// Where an override's rule comes from.
#[derive(Debug, Clone)]
pub enum OverrideRuleSpec {
    /// Caller-supplied rule text.
    Text(String),
    /// Built from the parent event's rule and the override kind.
    Built {
        date: Option<NaiveDate>,
        until: Option<NaiveDate>,
    },
}

#[derive(Debug, Clone)]
pub struct NewOverride {
    pub kind: OverrideKind,
    pub rule: OverrideRuleSpec,
    pub is_cancelled: bool,
    pub duration: Option<TimeDelta>,
    pub room_id: Option<Uuid>,
    pub reason: Option<String>,
    pub linked_override_id: Option<Uuid>,
}

/// Moves one session to another time, optionally with a new room/duration.
#[derive(Debug, Clone)]
pub struct SessionMove {
    pub date: NaiveDate,
    pub new_start: DateTime<Utc>,
    pub duration: Option<TimeDelta>,
    pub room_id: Option<Uuid>,
    pub reason: Option<String>,
}

fn require_date(date: Option<NaiveDate>, kind: OverrideKind) -> ServiceResult<NaiveDate> {
    date.ok_or_else(|| ServiceError::ValidationError(format!("{kind} override requires a date")))
}

fn build_rule<R>(
    repo: &R,
    class: &Class,
    event_rule: &RecurrenceRule,
    request: &NewOverride,
    now: DateTime<Utc>,
) -> ServiceResult<RecurrenceRule>
where
    R: ScheduleRepository + ?Sized,
{
    let (date, until) = match &request.rule {
        OverrideRuleSpec::Text(text) => return Ok(parse_rule(text)?),
        OverrideRuleSpec::Built { date, until } => (*date, *until),
    };
    match request.kind {
        OverrideKind::SingleInstance => {
            single_instance_rule(event_rule, require_date(date, request.kind)?)
        }
        OverrideKind::ForwardFromDate => {
            forward_from_rule(event_rule, require_date(date, request.kind)?, until)
        }
        OverrideKind::CancelRemaining => {
            let from = match date {
                Some(date) => {
                    let tz = facility_timezone(repo, class.facility_id)?;
                    local_day_window(date, tz).start
                }
                None => now,
            };
            cancel_remaining_rule(event_rule, from)
        }
    }
}

/// Validates a request and turns it into a record ready to insert.
fn prepare<R>(
    repo: &R,
    class: &Class,
    event: &Event,
    request: &NewOverride,
    now: DateTime<Utc>,
) -> ServiceResult<(Override, RecurrenceRule)>
where
    R: ScheduleRepository + ?Sized,
{
    if let Some(duration) = request.duration {
        ensure_positive(duration)?;
    }

    let event_rule = parse_rule(&event.recurrence_rule)?;
    let rule = build_rule(repo, class, &event_rule, request, now)?;
    validate_override_kind(request.kind, request.is_cancelled, &rule, &event_rule)?;

    if !request.is_cancelled
        && let Some(room_id) = request.room_id.or(event.room_id)
    {
        let duration = request.duration.unwrap_or(event.duration);
        let conflicts =
            find_conflicts(repo, class.facility_id, room_id, &rule, duration, Some(event.id))?;
        if !conflicts.is_empty() {
            return Err(ServiceError::RoomConflict(conflicts));
        }
    }

    if let Some(linked_id) = request.linked_override_id {
        let linked = repo.override_by_id(linked_id)?;
        if linked.event_id != event.id {
            return Err(ServiceError::ValidationError(format!(
                "linked override {linked_id} belongs to another event"
            )));
        }
    }

    let record = Override {
        id: Uuid::new_v4(),
        event_id: event.id,
        class_id: class.id,
        kind: request.kind,
        override_rule: format_rule(&rule),
        is_cancelled: request.is_cancelled,
        duration: request.duration,
        room_id: request.room_id,
        reason: request.reason.clone(),
        linked_override_id: request.linked_override_id,
    };
    Ok((record, rule))
}

/// Drops attendance on dates the changed rules touched and that lost their
/// session, then extends the class boundaries.
fn settle<R>(
    repo: &mut R,
    class: &Class,
    event: &Event,
    touched: &[RecurrenceRule],
) -> ServiceResult<()>
where
    R: ScheduleRepository + ?Sized,
{
    let tz = facility_timezone(repo, class.facility_id)?;
    for rule in touched {
        purge_orphaned_attendance(repo, event, rule_span(rule)?, tz)?;
    }
    sync_class_boundaries(repo, class.id, BoundaryMode::Extend)?;
    Ok(())
}

/// ## Summary
/// Adds an override to an event.
///
/// Non-cancelling overrides are conflict-checked against the effective
/// room. Attendance recorded on dates that no longer hold a session is
/// removed. Class boundaries are extended, never shrunk.
///
/// ## Errors
/// Returns `InvalidState` for a terminal class, `NotFound` for an unknown
/// event or linked override, `InvalidRule`/`ValidationError` for a
/// malformed override and `RoomConflict` when the room is taken.
#[tracing::instrument(skip(repo, request), fields(kind = %request.kind, cancelled = request.is_cancelled))]
pub fn create_override<R>(
    repo: &mut R,
    class_id: Uuid,
    event_id: Uuid,
    request: &NewOverride,
    now: DateTime<Utc>,
) -> ServiceResult<Override>
where
    R: ScheduleRepository + ?Sized,
{
    let class = repo.class(class_id)?;
    ensure_mutable(&class)?;
    let event = owned_event(repo, class_id, event_id)?;

    let (record, rule) = prepare(repo, &class, &event, request, now)?;
    repo.insert_override(record.clone())?;
    settle(repo, &class, &event, &[rule])?;

    tracing::info!(override_id = %record.id, %event_id, "Created override");
    Ok(record)
}

/// ## Summary
/// Moves the session on `date` to `new_start`: a cancellation of the old
/// slot plus a linked single-session replacement.
///
/// Returns `(cancellation, replacement)`.
///
/// ## Errors
/// Same as [`create_override`].
#[tracing::instrument(skip(repo, change), fields(date = %change.date, new_start = %change.new_start))]
pub fn reschedule_session<R>(
    repo: &mut R,
    class_id: Uuid,
    event_id: Uuid,
    change: &SessionMove,
    now: DateTime<Utc>,
) -> ServiceResult<(Override, Override)>
where
    R: ScheduleRepository + ?Sized,
{
    let class = repo.class(class_id)?;
    ensure_mutable(&class)?;
    let event = owned_event(repo, class_id, event_id)?;

    let cancel_request = NewOverride {
        kind: OverrideKind::SingleInstance,
        rule: OverrideRuleSpec::Built {
            date: Some(change.date),
            until: None,
        },
        is_cancelled: true,
        duration: None,
        room_id: None,
        reason: change.reason.clone(),
        linked_override_id: None,
    };
    let (cancellation, cancel_rule) = prepare(repo, &class, &event, &cancel_request, now)?;
    repo.insert_override(cancellation.clone())?;

    // The replacement keeps the event's zone so it reads like its siblings.
    let event_rule = parse_rule(&event.recurrence_rule)?;
    let start = match event_rule.start.zone() {
        RuleZone::Utc => Some(RuleStart::utc(change.new_start)),
        RuleZone::Named(tz) => {
            RuleStart::zoned(change.new_start.with_timezone(&tz).naive_local(), tz)
        }
    }
    .unwrap_or_else(|| RuleStart::utc(change.new_start));
    let replacement_rule =
        RecurrenceRule::new(start, Frequency::Daily).with_bound(Some(RuleBound::Count(1)));

    let replace_request = NewOverride {
        kind: OverrideKind::SingleInstance,
        rule: OverrideRuleSpec::Text(format_rule(&replacement_rule)),
        is_cancelled: false,
        duration: change.duration,
        room_id: change.room_id,
        reason: change.reason.clone(),
        linked_override_id: Some(cancellation.id),
    };
    let (replacement, replace_rule) = prepare(repo, &class, &event, &replace_request, now)?;
    repo.insert_override(replacement.clone())?;

    settle(repo, &class, &event, &[cancel_rule, replace_rule])?;

    tracing::info!(
        cancellation_id = %cancellation.id,
        replacement_id = %replacement.id,
        %event_id,
        "Rescheduled session"
    );
    Ok((cancellation, replacement))
}

/// ## Summary
/// Deletes an override, restoring what it changed. Overrides linked to it
/// in either direction are deleted too, so a moved session is restored as
/// a whole.
///
/// Returns the removed overrides.
///
/// ## Errors
/// Returns `InvalidState` for a terminal class and `NotFound` if the
/// override is not part of the class.
#[tracing::instrument(skip(repo))]
pub fn delete_override<R>(
    repo: &mut R,
    class_id: Uuid,
    override_id: Uuid,
) -> ServiceResult<Vec<Override>>
where
    R: ScheduleRepository + ?Sized,
{
    let class = repo.class(class_id)?;
    ensure_mutable(&class)?;
    let record = repo.override_by_id(override_id)?;
    if record.class_id != class_id {
        return Err(ServiceError::NotFound(format!(
            "override {override_id} in class {class_id}"
        )));
    }
    let event = repo.event(record.event_id)?;

    let mut doomed: Vec<Uuid> = repo
        .overrides_for_event(event.id)?
        .into_iter()
        .filter(|other| {
            other.id == record.id
                || Some(other.id) == record.linked_override_id
                || other.linked_override_id == Some(record.id)
        })
        .map(|other| other.id)
        .collect();
    doomed.dedup();

    let mut removed = Vec::with_capacity(doomed.len());
    for id in doomed {
        removed.push(repo.delete_override(id)?);
    }

    let touched: Vec<RecurrenceRule> = removed
        .iter()
        .filter_map(|r| parse_rule(&r.override_rule).ok())
        .collect();
    settle(repo, &class, &event, &touched)?;

    tracing::info!(%override_id, removed = removed.len(), "Deleted override");
    Ok(removed)
}

#[cfg(test)]
#[path = "overrides_tests.rs"]
mod overrides_tests;
