//! Recurrence rule text parsing.
//!
//! The text is two logical lines, a start marker and a repeat pattern:
//!
//! ```text
//! DTSTART:20240102T100000Z
//! RRULE:FREQ=WEEKLY;BYDAY=TU,TH;COUNT=10
//! ```
//!
//! Line breaks may be `\n` or `\r\n`; names and values are case-insensitive
//! (zone names excepted) and blank lines and surrounding whitespace are
//! ignored.

mod error;
mod values;

pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use values::end_of_day;

use crate::rfc::recur::core::{Frequency, RecurrenceRule};

/// ## Summary
/// Parses rule text into a [`RecurrenceRule`].
///
/// ## Errors
/// Returns an error if the start or pattern line is missing or malformed,
/// if the frequency is unknown, or if ordinal weekdays appear outside a
/// monthly rule.
pub fn parse_rule(text: &str) -> ParseResult<RecurrenceRule> {
    let mut start = None;
    let mut pattern = None;

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(rest) = strip_name(trimmed, "DTSTART") {
            if start.is_some() {
                return Err(ParseError::new(ParseErrorKind::DuplicateLine, line, "DTSTART"));
            }
            start = Some(values::parse_start(rest, line)?);
        } else if let Some(rest) = strip_name(trimmed, "RRULE") {
            if pattern.is_some() {
                return Err(ParseError::new(ParseErrorKind::DuplicateLine, line, "RRULE"));
            }
            let value = rest.strip_prefix(':').ok_or_else(|| {
                ParseError::new(ParseErrorKind::UnsupportedPart, line, "RRULE parameters")
            })?;
            pattern = Some((line, values::parse_pattern(value, line)?));
        } else {
            return Err(ParseError::new(
                ParseErrorKind::UnexpectedLine,
                line,
                trimmed.to_string(),
            ));
        }
    }

    let start = start.ok_or_else(|| ParseError::missing(ParseErrorKind::MissingStart, "DTSTART"))?;
    let (line, pattern) =
        pattern.ok_or_else(|| ParseError::missing(ParseErrorKind::MissingPattern, "RRULE"))?;

    let frequency = pattern
        .frequency
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidFrequency, line, "missing FREQ"))?;

    if frequency != Frequency::Monthly && pattern.by_day.iter().any(|d| d.ordinal.is_some()) {
        return Err(ParseError::new(
            ParseErrorKind::InvalidWeekday,
            line,
            "ordinal weekdays require FREQ=MONTHLY",
        ));
    }

    Ok(RecurrenceRule::new(start, frequency)
        .with_interval(pattern.interval.unwrap_or(1))
        .with_by_day(pattern.by_day)
        .with_bound(pattern.bound))
}

/// Strips a case-insensitive line name, returning what follows it (`:` or `;...`).
fn strip_name<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let head = line.get(..name.len())?;
    if !head.eq_ignore_ascii_case(name) {
        return None;
    }
    let rest = &line[name.len()..];
    (rest.starts_with(':') || rest.starts_with(';')).then_some(rest)
}

impl std::str::FromStr for RecurrenceRule {
    type Err = crate::error::RfcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(parse_rule(s)?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc, Weekday};

    use super::*;
    use crate::rfc::recur::core::{RuleBound, RuleZone, WeekdayNum};

    #[test]
    fn parse_basic_weekly() {
        let rule = parse_rule("DTSTART:20240102T100000Z\nRRULE:FREQ=WEEKLY;BYDAY=TU,TH;COUNT=10")
            .unwrap();
        assert_eq!(
            rule.start_instant(),
            Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap()
        );
        assert_eq!(rule.frequency, Frequency::Weekly);
        assert_eq!(rule.interval, 1);
        assert_eq!(
            rule.by_day,
            vec![WeekdayNum::every(Weekday::Tue), WeekdayNum::every(Weekday::Thu)]
        );
        assert_eq!(rule.bound, Some(RuleBound::Count(10)));
    }

    #[test]
    fn parse_is_case_and_whitespace_tolerant() {
        let text = "\r\n  dtstart:20240102t100000z  \r\n\r\n rrule:freq=daily;interval=2 \r\n";
        let rule = parse_rule(text).unwrap();
        assert_eq!(rule.frequency, Frequency::Daily);
        assert_eq!(rule.interval, 2);
        assert!(rule.is_open_ended());
    }

    #[test]
    fn parse_zoned_start() {
        let rule =
            parse_rule("DTSTART;TZID=Europe/Berlin:20240102T100000\nRRULE:FREQ=DAILY;COUNT=2")
                .unwrap();
        assert_eq!(rule.start.zone(), RuleZone::Named(chrono_tz::Europe::Berlin));
        assert_eq!(
            rule.start_instant(),
            Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn missing_start_is_rejected() {
        let err = parse_rule("RRULE:FREQ=DAILY;COUNT=2").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingStart);
    }

    #[test]
    fn missing_pattern_is_rejected() {
        let err = parse_rule("DTSTART:20240102T100000Z").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingPattern);
    }

    #[test]
    fn missing_frequency_is_rejected() {
        let err = parse_rule("DTSTART:20240102T100000Z\nRRULE:COUNT=2").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidFrequency);
    }

    #[test]
    fn unknown_frequency_is_rejected() {
        let err = parse_rule("DTSTART:20240102T100000Z\nRRULE:FREQ=HOURLY").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidFrequency);
    }

    #[test]
    fn ordinal_weekday_outside_monthly_is_rejected() {
        let err = parse_rule("DTSTART:20240102T100000Z\nRRULE:FREQ=WEEKLY;BYDAY=2TU").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidWeekday);
    }

    #[test]
    fn stray_line_is_rejected() {
        let err =
            parse_rule("DTSTART:20240102T100000Z\nEXDATE:20240103T100000Z\nRRULE:FREQ=DAILY")
                .unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedLine);
        assert_eq!(err.line, 2);
    }

    #[test]
    fn duplicate_start_is_rejected() {
        let err = parse_rule(
            "DTSTART:20240102T100000Z\nDTSTART:20240103T100000Z\nRRULE:FREQ=DAILY",
        )
        .unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::DuplicateLine);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_rule("").is_err());
        assert!(parse_rule("not a rule").is_err());
        assert!("DTSTARTX:20240102T100000Z".parse::<RecurrenceRule>().is_err());
    }
}
