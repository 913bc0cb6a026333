//! Typed representation of a recurrence rule.

mod rule;
mod weekday;

pub use rule::{Frequency, RecurrenceRule, RuleBound, RuleStart, RuleZone};
pub use weekday::{WeekdayNum, weekday_code, weekday_from_code};
