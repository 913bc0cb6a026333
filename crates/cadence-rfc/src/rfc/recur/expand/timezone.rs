//! Bucketing UTC instants into facility-local calendar dates.
//!
//! Instants are stored and compared in UTC; a zone is only consulted to
//! answer "which local date is this" and "which instants make up that date".

use chrono::{DateTime, LocalResult, NaiveDate, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

use super::window::Window;
use crate::error::{RfcError, RfcResult};

/// ## Summary
/// Resolves an IANA zone name.
///
/// ## Errors
/// Returns `UnknownTimezone` if the name is not in the tz database.
pub fn parse_timezone(name: &str) -> RfcResult<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_err| RfcError::UnknownTimezone(name.to_string()))
}

/// Local calendar date of `instant` in `tz`.
#[must_use]
pub fn local_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Local `HH:MM` of `instant` in `tz`.
#[must_use]
pub fn local_time_label(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format("%H:%M").to_string()
}

/// ## Summary
/// The UTC span covering local `date` in `tz`, from its first instant to the
/// first instant of the next day.
///
/// Days shortened or lengthened by a DST shift produce 23h or 25h windows.
#[must_use]
pub fn local_day_window(date: NaiveDate, tz: Tz) -> Window {
    let next = date.succ_opt().unwrap_or(date);
    Window::new(first_instant(date, tz), first_instant(next, tz))
}

/// First instant of a local date. Zones that skip midnight start the day at
/// the end of the gap.
fn first_instant(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let midnight = date.and_time(chrono::NaiveTime::MIN);
    for hours in 0..=3 {
        let local = midnight + TimeDelta::hours(hours);
        match tz.from_local_datetime(&local) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                return dt.with_timezone(&Utc);
            }
            LocalResult::None => {}
        }
    }
    midnight.and_utc()
}
