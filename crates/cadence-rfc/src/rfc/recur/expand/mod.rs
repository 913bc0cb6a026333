//! Occurrence expansion.
//!
//! Expansion runs through the `rrule` crate in the rule's own zone and the
//! results are converted back to UTC. Windows are half-open and open-ended
//! rules never run past the lookahead horizon.

mod timezone;
mod window;

pub use timezone::{local_date, local_day_window, local_time_label, parse_timezone};
pub use window::{Window, lookahead_end};

use chrono::{DateTime, Months, SubsecRound, TimeDelta, Utc};
use rrule::{NWeekday, RRule, RRuleSet, Tz, Unvalidated};

use cadence_core::constants::MAX_OCCURRENCES;

use crate::error::RfcResult;
use crate::rfc::recur::core::{Frequency, RecurrenceRule, RuleBound, RuleZone, WeekdayNum};

/// How far a COUNT-bounded rule is scanned when looking for its last occurrence.
const COUNT_SCAN_YEARS: u32 = 100;

/// ## Summary
/// Expands `rule` into the ordered occurrence starts that fall in `window`.
///
/// Zero-occurrence rules and windows outside the rule's span yield an empty
/// list. Open-ended rules are cut at the lookahead horizon measured from the
/// rule's start.
///
/// ## Errors
/// Returns an error if the `rrule` crate rejects the rule.
#[tracing::instrument(level = "trace", skip(rule), fields(rule = %rule))]
pub fn expand(rule: &RecurrenceRule, window: &Window) -> RfcResult<Vec<DateTime<Utc>>> {
    if rule.is_zero_occurrence() {
        return Ok(Vec::new());
    }

    let start = rule.start_instant();
    let bounded = if rule.is_open_ended() {
        Window::new(window.start, window.end.min(lookahead_end(start)))
    } else {
        *window
    };

    if bounded.is_empty()
        || bounded.end <= start
        || rule.until().is_some_and(|until| until < bounded.start)
    {
        return Ok(Vec::new());
    }

    let set = to_rrule_set(rule)?;
    // `after`/`before` are inclusive; widen by a second and filter below.
    let after = bounded
        .start
        .checked_sub_signed(TimeDelta::seconds(1))
        .unwrap_or(bounded.start);
    let result = set
        .after(after.with_timezone(&Tz::UTC))
        .before(bounded.end.with_timezone(&Tz::UTC))
        .all(MAX_OCCURRENCES);

    if result.limited {
        tracing::warn!(
            limit = MAX_OCCURRENCES,
            window_start = %bounded.start,
            window_end = %bounded.end,
            "Expansion hit the occurrence limit"
        );
    }

    let occurrences: Vec<DateTime<Utc>> = result
        .dates
        .into_iter()
        .map(|dt| dt.with_timezone(&Utc))
        .filter(|dt| bounded.contains(*dt))
        .collect();

    tracing::trace!(count = occurrences.len(), "Expanded rule");

    Ok(occurrences)
}

/// ## Summary
/// Start of the rule's final occurrence.
///
/// Open-ended rules report their last occurrence inside the lookahead
/// horizon.
///
/// ## Errors
/// Returns an error if expansion fails.
pub fn last_occurrence(rule: &RecurrenceRule) -> RfcResult<Option<DateTime<Utc>>> {
    let start = rule.start_instant();
    let end = match rule.bound {
        Some(RuleBound::Until(until)) => until + TimeDelta::seconds(1),
        Some(RuleBound::Count(_)) => start
            .checked_add_months(Months::new(COUNT_SCAN_YEARS * 12))
            .unwrap_or(DateTime::<Utc>::MAX_UTC),
        None => lookahead_end(start),
    };
    Ok(expand(rule, &Window::new(start, end))?.last().copied())
}

/// ## Summary
/// Ends the series at `at`, replacing any COUNT or UNTIL.
///
/// The new bound never extends the series: when the existing bound already
/// ends earlier, that end is kept (as an UNTIL). A stamp before the start
/// turns the rule into a zero-occurrence rule.
///
/// ## Errors
/// Returns an error if the last occurrence of a COUNT rule cannot be
/// expanded.
pub fn truncate(rule: &RecurrenceRule, at: DateTime<Utc>) -> RfcResult<RecurrenceRule> {
    if rule.is_zero_occurrence() {
        return Ok(rule.clone());
    }

    let existing_end = match rule.bound {
        Some(RuleBound::Until(until)) => Some(until),
        Some(RuleBound::Count(_)) => last_occurrence(rule)?,
        None => None,
    };
    let until = existing_end.map_or(at, |end| end.min(at)).trunc_subsecs(0);

    let bound = if until < rule.start_instant() {
        RuleBound::Count(0)
    } else {
        RuleBound::Until(until)
    };
    Ok(rule.clone().with_bound(Some(bound)))
}

fn to_rrule_set(rule: &RecurrenceRule) -> RfcResult<RRuleSet> {
    let tz = match rule.start.zone() {
        RuleZone::Utc => Tz::UTC,
        RuleZone::Named(tz) => Tz::Tz(tz),
    };
    let dt_start = rule.start_instant().with_timezone(&tz);

    let mut builder = RRule::<Unvalidated>::new(to_rrule_frequency(rule.frequency))
        .interval(rule.interval);
    if !rule.by_day.is_empty() {
        builder = builder.by_weekday(rule.by_day.iter().copied().map(to_nweekday).collect());
    }
    builder = match rule.bound {
        Some(RuleBound::Count(count)) => builder.count(count),
        // UNTIL must be UTC whenever the start carries a zone.
        Some(RuleBound::Until(until)) => builder.until(until.with_timezone(&Tz::UTC)),
        None => builder,
    };

    Ok(builder.build(dt_start)?)
}

const fn to_rrule_frequency(frequency: Frequency) -> rrule::Frequency {
    match frequency {
        Frequency::Daily => rrule::Frequency::Daily,
        Frequency::Weekly => rrule::Frequency::Weekly,
        Frequency::Monthly => rrule::Frequency::Monthly,
    }
}

fn to_nweekday(day: WeekdayNum) -> NWeekday {
    match day.ordinal {
        Some(n) => NWeekday::Nth(i16::from(n), day.weekday),
        None => NWeekday::Every(day.weekday),
    }
}
