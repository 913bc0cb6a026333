//! Recurrence rule serialization.
//!
//! Output is canonical: upper-case names, `INTERVAL` only when it is not 1,
//! parts in the order FREQ, INTERVAL, BYDAY, COUNT/UNTIL, and UNTIL always
//! in UTC.

use crate::rfc::recur::core::{RecurrenceRule, RuleBound, RuleZone};

const DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";

/// ## Summary
/// Serializes a rule to its two-line text form.
#[must_use]
pub fn format_rule(rule: &RecurrenceRule) -> String {
    rule.to_string()
}

impl std::fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let local = self.start.local().format(DATE_TIME_FORMAT);
        match self.start.zone() {
            RuleZone::Utc => write!(f, "DTSTART:{local}Z")?,
            RuleZone::Named(tz) => write!(f, "DTSTART;TZID={}:{local}", tz.name())?,
        }

        write!(f, "\nRRULE:FREQ={}", self.frequency)?;
        if self.interval != 1 {
            write!(f, ";INTERVAL={}", self.interval)?;
        }
        for (idx, day) in self.by_day.iter().enumerate() {
            f.write_str(if idx == 0 { ";BYDAY=" } else { "," })?;
            write!(f, "{day}")?;
        }
        match self.bound {
            Some(RuleBound::Count(count)) => write!(f, ";COUNT={count}"),
            Some(RuleBound::Until(until)) => {
                write!(f, ";UNTIL={}Z", until.format(DATE_TIME_FORMAT))
            }
            None => Ok(()),
        }
    }
}
