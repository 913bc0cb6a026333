//! Keeping a class's start/end dates in step with its resolved sessions.

use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use cadence_db::db::ScheduleRepository;
use cadence_db::model::{Class, Event, Override};
use cadence_rfc::rfc::recur::{
    RecurrenceRule, RuleBound, Window, last_occurrence, lookahead_end, parse_rule,
};

use super::resolve_event;
use crate::error::ServiceResult;

/// How a recompute may move `end_dt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryMode {
    /// Creation paths: the end only moves later.
    Extend,
    /// Explicit rule changes (end-bound stamping, series rescheduling): the
    /// end is re-derived and may move earlier.
    Rederive,
}

/// First session start and last session end (or explicit UNTIL) of one event.
#[derive(Debug, Default, Clone, Copy)]
struct Extent {
    first: Option<DateTime<Utc>>,
    last: Option<DateTime<Utc>>,
}

impl Extent {
    fn merge(self, other: Self) -> Self {
        Self {
            first: min_opt(self.first, other.first),
            last: max_opt(self.last, other.last),
        }
    }
}

fn min_opt(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn max_opt(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

/// Furthest instant a rule can produce a session at, plus one second.
fn reach(rule: &RecurrenceRule) -> ServiceResult<DateTime<Utc>> {
    let start = rule.start_instant();
    Ok(match rule.bound {
        Some(RuleBound::Until(until)) => until + TimeDelta::seconds(1),
        Some(RuleBound::Count(_)) => {
            last_occurrence(rule)?.map_or(start, |last| last + TimeDelta::seconds(1))
        }
        None => lookahead_end(start),
    })
}

fn event_extent(event: &Event, overrides: &[Override]) -> ServiceResult<Extent> {
    let rule = match parse_rule(&event.recurrence_rule) {
        Ok(rule) => rule,
        Err(e) => {
            tracing::warn!(event_id = %event.id, error = %e, "Ignoring event with invalid rule in boundary sync");
            return Ok(Extent::default());
        }
    };

    let mut window = Window::new(rule.start_instant(), reach(&rule)?);
    for record in overrides {
        // Unparseable overrides are skipped here as they are in resolution.
        if let Ok(override_rule) = parse_rule(&record.override_rule) {
            window.start = window.start.min(override_rule.start_instant());
            window.end = window.end.max(reach(&override_rule)?);
        }
    }

    let instances = resolve_event(event, overrides, &window);
    let resolved = Extent {
        first: instances.first().map(|i| i.start_time),
        last: instances.iter().map(super::EventInstance::end_time).max(),
    };
    Ok(resolved.merge(Extent {
        first: None,
        last: rule.until(),
    }))
}

/// ## Summary
/// Recomputes `start_dt`/`end_dt` of a class from all of its events and
/// writes the class back if either changed.
///
/// `start_dt` only ever moves earlier. In [`BoundaryMode::Extend`] the end
/// is the later of the stored end and the derived one; in
/// [`BoundaryMode::Rederive`] the derived end replaces the stored one
/// whenever the class still has sessions.
///
/// ## Errors
/// Returns an error if the class or its events cannot be read or written.
#[tracing::instrument(skip(repo))]
pub fn sync_class_boundaries<R>(
    repo: &mut R,
    class_id: Uuid,
    mode: BoundaryMode,
) -> ServiceResult<Class>
where
    R: ScheduleRepository + ?Sized,
{
    let mut class = repo.class(class_id)?;

    let mut extent = Extent::default();
    for event in repo.events_for_class(class_id)? {
        let overrides = repo.overrides_for_event(event.id)?;
        extent = extent.merge(event_extent(&event, &overrides)?);
    }

    let start_dt = min_opt(Some(class.start_dt), extent.first).unwrap_or(class.start_dt);
    let end_dt = match mode {
        BoundaryMode::Extend => max_opt(class.end_dt, extent.last),
        BoundaryMode::Rederive => extent.last.or(class.end_dt),
    };

    if start_dt != class.start_dt || end_dt != class.end_dt {
        tracing::info!(
            %class_id,
            ?mode,
            old_start = %class.start_dt,
            new_start = %start_dt,
            old_end = ?class.end_dt,
            new_end = ?end_dt,
            "Updating class boundaries"
        );
        class.start_dt = start_dt;
        class.end_dt = end_dt;
        repo.update_class(class.clone())?;
    }

    Ok(class)
}
