//! Check-in/check-out minutes and the status they imply.

use chrono::{NaiveTime, TimeDelta};

use cadence_core::types::AttendanceStatus;

use crate::error::{ServiceError, ServiceResult};

const TIME_FORMAT: &str = "%H:%M";

/// Time-tracking fields of an attendance record after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tracked {
    pub status: AttendanceStatus,
    pub check_in_at: Option<NaiveTime>,
    pub check_out_at: Option<NaiveTime>,
    pub minutes_attended: Option<i64>,
    pub scheduled_minutes: i64,
}

fn parse_clock(value: &str, field: &str) -> ServiceResult<NaiveTime> {
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .map_err(|e| ServiceError::ValidationError(format!("{field} must be in HH:MM format: {e}")))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn partial_without_minutes() -> ServiceError {
    ServiceError::ValidationError(
        "partial attendance requires check-in and check-out times".into(),
    )
}

fn derive_status(minutes: Option<i64>, checked_in: bool, scheduled: i64) -> AttendanceStatus {
    match minutes {
        None if checked_in => AttendanceStatus::Present,
        None | Some(0) => AttendanceStatus::AbsentUnexcused,
        Some(m) if m < scheduled => AttendanceStatus::Partial,
        Some(_) => AttendanceStatus::Present,
    }
}

/// ## Summary
/// Computes attended minutes and settles the status of one record.
///
/// Without times, present/partial records count the whole session. A
/// check-in alone is an attendance in progress. With both times the minutes
/// are their difference, capped at the session length. An omitted status is
/// derived from the minutes, and a present record shorter than the session
/// becomes partial.
///
/// ## Errors
/// Returns `ValidationError` for malformed or reversed times, a check-out
/// without a check-in, and a partial status without minutes.
pub fn apply_time_tracking(
    status: Option<AttendanceStatus>,
    check_in: Option<&str>,
    check_out: Option<&str>,
    scheduled: TimeDelta,
) -> ServiceResult<Tracked> {
    let mut scheduled_minutes = scheduled.num_minutes();

    let (check_in_at, check_out_at, minutes) = match (non_blank(check_in), non_blank(check_out)) {
        (None, None) => {
            let minutes = matches!(
                status,
                Some(AttendanceStatus::Present | AttendanceStatus::Partial)
            )
            .then_some(scheduled_minutes);
            (None, None, minutes)
        }
        (Some(check_in), None) => (Some(parse_clock(check_in, "check_in_at")?), None, None),
        (None, Some(_)) => {
            return Err(ServiceError::ValidationError(
                "check-in and check-out times are both required for time-based attendance".into(),
            ));
        }
        (Some(check_in), Some(check_out)) => {
            let check_in = parse_clock(check_in, "check_in_at")?;
            let check_out = parse_clock(check_out, "check_out_at")?;
            let attended = (check_out - check_in).num_minutes();
            if attended <= 0 {
                return Err(ServiceError::ValidationError(
                    "check_out_at must be after check_in_at".into(),
                ));
            }
            if scheduled_minutes <= 0 {
                scheduled_minutes = attended;
            }
            (
                Some(check_in),
                Some(check_out),
                Some(attended.min(scheduled_minutes)),
            )
        }
    };

    let status = match status {
        Some(AttendanceStatus::Partial) if matches!(minutes, None | Some(0)) => {
            return Err(partial_without_minutes());
        }
        Some(AttendanceStatus::Present)
            if minutes.is_some_and(|m| m > 0 && m < scheduled_minutes) =>
        {
            AttendanceStatus::Partial
        }
        Some(status) => status,
        None => derive_status(minutes, check_in_at.is_some(), scheduled_minutes),
    };

    Ok(Tracked {
        status,
        check_in_at,
        check_out_at,
        minutes_attended: minutes,
        scheduled_minutes,
    })
}
