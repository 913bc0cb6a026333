//! Value parsers for the DTSTART and RRULE lines.
#![expect(
    clippy::map_err_ignore,
    reason = "Value parsers report the offending text instead of the numeric parse source"
)]

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::rfc::recur::core::{Frequency, RuleBound, RuleStart, WeekdayNum, weekday_from_code};

const DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";
const DATE_FORMAT: &str = "%Y%m%d";

/// Parsed RRULE parts, before being joined with the start line.
#[derive(Debug, Default)]
pub struct Pattern {
    pub frequency: Option<Frequency>,
    pub interval: Option<u16>,
    pub by_day: Vec<WeekdayNum>,
    pub bound: Option<RuleBound>,
}

/// ## Summary
/// Parses the remainder of a DTSTART line after the `DTSTART` name.
///
/// Accepts `:20240102T100000Z`, `:20240102T100000` (read as UTC) and
/// `;TZID=America/Chicago:20240102T100000`.
///
/// ## Errors
/// Returns an error for malformed values, unknown zones and local times that
/// do not exist in the named zone.
pub fn parse_start(rest: &str, line: usize) -> ParseResult<RuleStart> {
    let (params, value) = rest
        .rsplit_once(':')
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidStart, line, "expected ':'"))?;
    let value = value.trim().to_ascii_uppercase();

    let mut tzid = None;
    for param in params.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, param_value) = param.split_once('=').ok_or_else(|| {
            ParseError::new(
                ParseErrorKind::InvalidStart,
                line,
                format!("malformed parameter: {param}"),
            )
        })?;
        match key.trim().to_ascii_uppercase().as_str() {
            "TZID" => tzid = Some(param_value.trim()),
            // VALUE=DATE-TIME is the only value type a start can have
            "VALUE" if param_value.trim().eq_ignore_ascii_case("DATE-TIME") => {}
            _ => {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidStart,
                    line,
                    format!("unsupported parameter: {param}"),
                ));
            }
        }
    }

    match tzid {
        None => {
            let naive = parse_date_time(value.strip_suffix('Z').unwrap_or(&value), line)?;
            Ok(RuleStart::utc(naive.and_utc()))
        }
        Some(name) => {
            if value.ends_with('Z') {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidStart,
                    line,
                    "a zoned start must be a local time",
                ));
            }
            let tz: chrono_tz::Tz = name.parse().map_err(|_| {
                ParseError::new(ParseErrorKind::UnknownTimezone, line, name.to_string())
            })?;
            let local = parse_date_time(&value, line)?;
            RuleStart::zoned(local, tz).ok_or_else(|| {
                ParseError::new(
                    ParseErrorKind::NonExistentStart,
                    line,
                    format!("{local} in {name}"),
                )
            })
        }
    }
}

fn parse_date_time(value: &str, line: usize) -> ParseResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT)
        .map_err(|_| ParseError::invalid_value(ParseErrorKind::InvalidStart, line, "DTSTART", value))
}

/// ## Summary
/// Parses the value of an RRULE line (`FREQ=WEEKLY;BYDAY=MO,WE;COUNT=4`).
///
/// ## Errors
/// Returns an error for unknown frequencies, malformed values, COUNT and
/// UNTIL together, and rule parts the engine does not evaluate.
pub fn parse_pattern(value: &str, line: usize) -> ParseResult<Pattern> {
    let mut pattern = Pattern::default();

    for part in value.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, part_value) = part.split_once('=').ok_or_else(|| {
            ParseError::new(
                ParseErrorKind::UnsupportedPart,
                line,
                format!("malformed rule part: {part}"),
            )
        })?;
        parse_pattern_part(&mut pattern, key.trim(), part_value.trim(), line)?;
    }

    Ok(pattern)
}

fn parse_pattern_part(
    pattern: &mut Pattern,
    key: &str,
    value: &str,
    line: usize,
) -> ParseResult<()> {
    match key.to_ascii_uppercase().as_str() {
        "FREQ" => {
            pattern.frequency = Some(Frequency::parse(value).ok_or_else(|| {
                ParseError::invalid_value(ParseErrorKind::InvalidFrequency, line, key, value)
            })?);
        }
        "INTERVAL" => {
            let interval = value
                .parse::<u16>()
                .ok()
                .filter(|interval| *interval > 0)
                .ok_or_else(|| {
                    ParseError::invalid_value(ParseErrorKind::InvalidInterval, line, key, value)
                })?;
            pattern.interval = Some(interval);
        }
        "COUNT" => {
            if matches!(pattern.bound, Some(RuleBound::Until(_))) {
                return Err(ParseError::new(
                    ParseErrorKind::UntilCountConflict,
                    line,
                    value.to_string(),
                ));
            }
            let count = value.parse::<u32>().map_err(|_| {
                ParseError::invalid_value(ParseErrorKind::InvalidCount, line, key, value)
            })?;
            pattern.bound = Some(RuleBound::Count(count));
        }
        "UNTIL" => {
            if matches!(pattern.bound, Some(RuleBound::Count(_))) {
                return Err(ParseError::new(
                    ParseErrorKind::UntilCountConflict,
                    line,
                    value.to_string(),
                ));
            }
            pattern.bound = Some(RuleBound::Until(parse_until(value, line)?));
        }
        "BYDAY" => pattern.by_day = parse_byday(value, line)?,
        // Week start only matters for BYWEEKNO/BYSETPOS, which are not evaluated.
        "WKST" => {
            weekday_from_code(value).ok_or_else(|| {
                ParseError::invalid_value(ParseErrorKind::InvalidWeekday, line, key, value)
            })?;
        }
        _ => {
            return Err(ParseError::new(
                ParseErrorKind::UnsupportedPart,
                line,
                key.to_string(),
            ));
        }
    }
    Ok(())
}

/// ## Summary
/// Parses an UNTIL value.
///
/// A bare date means the end of that day (23:59:59Z); a date-time must be UTC.
///
/// ## Errors
/// Returns an error if the value is neither form.
pub fn parse_until(value: &str, line: usize) -> ParseResult<DateTime<Utc>> {
    let value = value.to_ascii_uppercase();
    let invalid = || ParseError::invalid_value(ParseErrorKind::InvalidUntil, line, "UNTIL", &value);

    if value.contains('T') {
        let naive = value
            .strip_suffix('Z')
            .ok_or_else(invalid)
            .and_then(|v| NaiveDateTime::parse_from_str(v, DATE_TIME_FORMAT).map_err(|_| invalid()))?;
        Ok(naive.and_utc())
    } else {
        let date = NaiveDate::parse_from_str(&value, DATE_FORMAT).map_err(|_| invalid())?;
        Ok(end_of_day(date))
    }
}

/// 23:59:59 UTC on `date`.
#[must_use]
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN))
        .and_utc()
}

/// Parses a comma-separated BYDAY value.
fn parse_byday(s: &str, line: usize) -> ParseResult<Vec<WeekdayNum>> {
    s.split(',')
        .map(|v| parse_weekday_num(v.trim(), line))
        .collect()
}

/// Parses a single weekday with optional ordinal (e.g., "MO", "2TU", "-1FR").
fn parse_weekday_num(s: &str, line: usize) -> ParseResult<WeekdayNum> {
    let invalid = || ParseError::invalid_value(ParseErrorKind::InvalidWeekday, line, "BYDAY", s);

    if s.len() < 2 || !s.is_ascii() {
        return Err(invalid());
    }

    let weekday_str = &s[s.len() - 2..];
    let ordinal_str = &s[..s.len() - 2];

    let weekday = weekday_from_code(weekday_str).ok_or_else(invalid)?;

    if ordinal_str.is_empty() {
        return Ok(WeekdayNum::every(weekday));
    }

    let ordinal = ordinal_str
        .strip_prefix('+')
        .unwrap_or(ordinal_str)
        .parse::<i8>()
        .ok()
        .filter(|n| *n != 0 && (-5..=5).contains(n))
        .ok_or_else(invalid)?;

    Ok(WeekdayNum::nth(ordinal, weekday))
}
