//! Recurrence rules: the `DTSTART` + `RRULE` text format, its typed form,
//! and expansion into concrete occurrence instants.

pub mod build;
pub mod core;
pub mod expand;
pub mod parse;

pub use build::format_rule;
pub use self::core::{Frequency, RecurrenceRule, RuleBound, RuleStart, RuleZone, WeekdayNum};
pub use expand::{
    Window, expand, last_occurrence, local_date, local_day_window, local_time_label,
    lookahead_end, parse_timezone, truncate,
};
pub use parse::{ParseError, ParseErrorKind, end_of_day, parse_rule};
