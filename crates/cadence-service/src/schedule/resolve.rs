//! Resolution of an event's base rule and overrides into concrete sessions.
//!
//! Resolution is two passes. The first walks the overrides in creation
//! order and records, per start instant, whether that slot is cancelled or
//! replaced (later overrides overwrite earlier decisions for the same slot),
//! plus any whole-range cancellations. The second pass filters the base
//! occurrences through those decisions and merges in the replacements.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};

use cadence_core::types::OverrideKind;
use cadence_db::model::{Event, Override};
use cadence_rfc::rfc::recur::{RecurrenceRule, Window, expand, parse_rule};

use super::instance::EventInstance;

/// What the overrides decided for one start instant.
#[derive(Debug)]
enum Slot {
    Cancelled,
    Replaced(EventInstance),
}

/// `[from, through]`; an open `through` runs to the end of the window.
#[derive(Debug, Clone, Copy)]
struct CancelledRange {
    from: DateTime<Utc>,
    through: Option<DateTime<Utc>>,
}

impl CancelledRange {
    fn contains(self, instant: DateTime<Utc>) -> bool {
        instant >= self.from && self.through.is_none_or(|through| instant <= through)
    }
}

#[derive(Debug, Default)]
struct Decisions {
    slots: BTreeMap<DateTime<Utc>, Slot>,
    ranges: Vec<CancelledRange>,
}

impl Decisions {
    fn excludes(&self, instant: DateTime<Utc>) -> bool {
        self.slots.contains_key(&instant) || self.ranges.iter().any(|r| r.contains(instant))
    }

    fn apply(&mut self, event: &Event, record: &Override, rule: &RecurrenceRule, times: Vec<DateTime<Utc>>) {
        match (record.is_cancelled, record.kind) {
            (true, OverrideKind::CancelRemaining) => {
                let range = CancelledRange {
                    from: rule.start_instant(),
                    through: rule.until(),
                };
                // Replacements made by earlier overrides inside the range go too.
                self.slots.retain(|instant, _| !range.contains(*instant));
                self.ranges.push(range);
            }
            (true, _) => {
                for instant in times {
                    self.slots.insert(instant, Slot::Cancelled);
                }
            }
            (false, _) => {
                for instant in times {
                    self.slots.insert(
                        instant,
                        Slot::Replaced(EventInstance::from_override(event, record, instant)),
                    );
                }
            }
        }
    }

    fn into_replacements(self) -> impl Iterator<Item = EventInstance> {
        self.slots.into_values().filter_map(|slot| match slot {
            Slot::Replaced(instance) => Some(instance),
            Slot::Cancelled => None,
        })
    }
}

/// ## Summary
/// Resolves `event` and its `overrides` into the ordered sessions that
/// start inside `window`.
///
/// `overrides` must be in creation order. The result is sorted by start time
/// and never contains a cancelled session. An event whose own rule cannot be
/// parsed or expanded resolves to no sessions; an override whose rule cannot
/// be parsed or expanded is skipped. Both are logged.
#[must_use]
pub fn resolve_event(event: &Event, overrides: &[Override], window: &Window) -> Vec<EventInstance> {
    if event.duration <= TimeDelta::zero() {
        tracing::warn!(event_id = %event.id, "Event has a non-positive duration, resolving to no sessions");
        return Vec::new();
    }

    let base = match parse_rule(&event.recurrence_rule) {
        Ok(rule) => match expand(&rule, window) {
            Ok(base) => base,
            Err(e) => {
                tracing::warn!(event_id = %event.id, error = %e, "Failed to expand event rule, resolving to no sessions");
                return Vec::new();
            }
        },
        Err(e) => {
            tracing::warn!(event_id = %event.id, error = %e, "Invalid event rule, resolving to no sessions");
            return Vec::new();
        }
    };

    let mut decisions = Decisions::default();
    for record in overrides {
        if record.duration.is_some_and(|d| d <= TimeDelta::zero()) {
            tracing::warn!(override_id = %record.id, "Skipping override with non-positive duration");
            continue;
        }
        let rule = match parse_rule(&record.override_rule) {
            Ok(rule) => rule,
            Err(e) => {
                tracing::warn!(override_id = %record.id, event_id = %event.id, error = %e, "Skipping override with invalid rule");
                continue;
            }
        };
        let times = match expand(&rule, window) {
            Ok(times) => times,
            Err(e) => {
                tracing::warn!(override_id = %record.id, event_id = %event.id, error = %e, "Skipping override that failed to expand");
                continue;
            }
        };
        tracing::trace!(override_id = %record.id, kind = %record.kind, cancelled = record.is_cancelled, occurrences = times.len(), "Applying override");
        decisions.apply(event, record, &rule, times);
    }

    let mut instances: Vec<EventInstance> = base
        .into_iter()
        .filter(|instant| !decisions.excludes(*instant))
        .map(|instant| EventInstance::from_base(event, instant))
        .collect();
    instances.extend(decisions.into_replacements());
    instances.sort_by_key(|instance| instance.start_time);

    tracing::debug!(event_id = %event.id, sessions = instances.len(), "Resolved event");

    instances
}

#[cfg(test)]
#[path = "resolve_tests.rs"]
mod resolve_tests;
