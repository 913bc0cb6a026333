//! Rules for the three override kinds, built from the parent event's rule.

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc, Weekday};

use cadence_core::types::OverrideKind;
use cadence_rfc::rfc::recur::{
    Frequency, RecurrenceRule, RuleBound, RuleStart, RuleZone, WeekdayNum, Window, end_of_day,
    expand, last_occurrence, local_day_window,
};

use crate::error::{ServiceError, ServiceResult};

const ALL_WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn start_on(event_rule: &RecurrenceRule, date: NaiveDate) -> ServiceResult<RuleStart> {
    event_rule.start.on_date(date).ok_or_else(|| {
        ServiceError::ValidationError(format!(
            "session time {} does not exist on {date}",
            event_rule.start.local().time()
        ))
    })
}

/// Last instant of `date` in the zone the rule is written in.
fn last_instant_of(date: NaiveDate, zone: RuleZone) -> DateTime<Utc> {
    match zone {
        RuleZone::Utc => end_of_day(date),
        RuleZone::Named(tz) => local_day_window(date, tz).end - TimeDelta::seconds(1),
    }
}

/// ## Summary
/// Exactly one session on `date`, at the event's wall-clock start time.
///
/// ## Errors
/// Returns `ValidationError` if that wall-clock time does not exist on
/// `date` in the event's zone.
pub fn single_instance_rule(
    event_rule: &RecurrenceRule,
    date: NaiveDate,
) -> ServiceResult<RecurrenceRule> {
    let start = start_on(event_rule, date)?;
    Ok(RecurrenceRule::new(start, Frequency::Daily).with_bound(Some(RuleBound::Count(1))))
}

/// ## Summary
/// The event's own pattern restated from `from`.
///
/// The end bound is `until` when given, else the parent's UNTIL. A
/// COUNT-bounded parent is restated as the number of its occurrences at or
/// after the pivot.
///
/// ## Errors
/// Returns `ValidationError` if `until` precedes `from` or the start time
/// does not exist on `from`, and an error if the parent cannot be expanded.
pub fn forward_from_rule(
    event_rule: &RecurrenceRule,
    from: NaiveDate,
    until: Option<NaiveDate>,
) -> ServiceResult<RecurrenceRule> {
    if until.is_some_and(|until| until < from) {
        return Err(ServiceError::ValidationError(
            "until must not precede the pivot date".into(),
        ));
    }

    let start = start_on(event_rule, from)?;

    // An implicit weekly day comes from the original start, not the pivot.
    let by_day = if event_rule.frequency == Frequency::Weekly && event_rule.by_day.is_empty() {
        vec![WeekdayNum::every(event_rule.start.local().weekday())]
    } else {
        event_rule.by_day.clone()
    };

    let bound = match (until, event_rule.bound) {
        (Some(until), _) => Some(RuleBound::Until(last_instant_of(until, start.zone()))),
        (None, Some(RuleBound::Until(parent_until))) => Some(RuleBound::Until(parent_until)),
        (None, Some(RuleBound::Count(_))) => {
            Some(RuleBound::Count(remaining_count(event_rule, start.instant())?))
        }
        (None, None) => None,
    };

    Ok(RecurrenceRule::new(start, event_rule.frequency)
        .with_interval(event_rule.interval)
        .with_by_day(by_day)
        .with_bound(bound))
}

fn remaining_count(event_rule: &RecurrenceRule, pivot: DateTime<Utc>) -> ServiceResult<u32> {
    let Some(last) = last_occurrence(event_rule)? else {
        return Ok(0);
    };
    let window = Window::new(pivot, last + TimeDelta::seconds(1));
    let remaining = expand(event_rule, &window)?.len();
    Ok(u32::try_from(remaining).unwrap_or(u32::MAX))
}

/// ## Summary
/// Every day from `from` through the end of the parent series.
///
/// A parent that ended before `from` yields a zero-occurrence rule, so a
/// retroactive cancellation changes nothing.
///
/// ## Errors
/// Returns an error if the end of a COUNT-bounded parent cannot be expanded.
pub fn cancel_remaining_rule(
    event_rule: &RecurrenceRule,
    from: DateTime<Utc>,
) -> ServiceResult<RecurrenceRule> {
    let start = RuleStart::utc(from);
    let series_end = match event_rule.bound {
        Some(RuleBound::Until(until)) => Some(until),
        Some(RuleBound::Count(_)) => Some(last_occurrence(event_rule)?.unwrap_or(from)),
        None => None,
    };
    let bound = series_end.map(|end| {
        if end < start.instant() {
            RuleBound::Count(0)
        } else {
            RuleBound::Until(end)
        }
    });

    Ok(RecurrenceRule::new(start, Frequency::Weekly)
        .with_by_day(ALL_WEEKDAYS.into_iter().map(WeekdayNum::every).collect())
        .with_bound(bound))
}

/// ## Summary
/// Checks that an override's rule has the shape its kind promises.
///
/// ## Errors
/// Returns `ValidationError` describing the mismatch.
pub fn validate_override_kind(
    kind: OverrideKind,
    is_cancelled: bool,
    rule: &RecurrenceRule,
    event_rule: &RecurrenceRule,
) -> ServiceResult<()> {
    let problem = match kind {
        OverrideKind::SingleInstance if rule.count() != Some(1) => {
            Some("single_instance requires COUNT=1")
        }
        OverrideKind::ForwardFromDate if rule.frequency != event_rule.frequency => {
            Some("forward_from_date must keep the event's frequency")
        }
        OverrideKind::CancelRemaining if !is_cancelled => {
            Some("cancel_remaining must be cancelled")
        }
        _ => None,
    };
    match problem {
        Some(problem) => Err(ServiceError::ValidationError(format!(
            "malformed override kind: {problem}"
        ))),
        None => Ok(()),
    }
}
