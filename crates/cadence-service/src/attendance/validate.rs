use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use cadence_db::db::ScheduleRepository;
use cadence_db::model::{Class, Event};
use cadence_rfc::rfc::recur::{local_date, local_day_window};

use crate::class::ensure_mutable;
use crate::error::{ServiceError, ServiceResult};
use crate::schedule::{EventInstance, resolve_stored};

/// ## Summary
/// The first session `event` holds on facility-local `date`.
///
/// ## Errors
/// Returns `Conflict` when the date has no session, either because the
/// pattern skips it or because it was cancelled.
pub fn session_on_date<R>(
    repo: &R,
    event: &Event,
    date: NaiveDate,
    tz: Tz,
) -> ServiceResult<EventInstance>
where
    R: ScheduleRepository + ?Sized,
{
    let day = local_day_window(date, tz);
    resolve_stored(repo, event, &day)?
        .into_iter()
        .next()
        .ok_or_else(|| {
            ServiceError::Conflict(format!(
                "cannot record attendance for cancelled class date {date}"
            ))
        })
}

/// ## Summary
/// Checks that `user_id` can have attendance for `event` on `date` and
/// returns the session it applies to.
///
/// ## Errors
/// - `InvalidState` if the class is completed or cancelled
/// - `ValidationError` if `date` is after the facility-local today
/// - `Conflict` if the date holds no session
/// - `ValidationError` if the user has no enrollment covering the date
pub fn validate_attendance_date<R>(
    repo: &R,
    class: &Class,
    event: &Event,
    user_id: Uuid,
    date: NaiveDate,
    tz: Tz,
    now: DateTime<Utc>,
) -> ServiceResult<EventInstance>
where
    R: ScheduleRepository + ?Sized,
{
    ensure_mutable(class)?;

    let today = local_date(now, tz);
    if date > today {
        return Err(ServiceError::ValidationError(format!(
            "attendance date {date} is in the future"
        )));
    }

    let session = session_on_date(repo, event, date, tz)?;

    let day = local_day_window(date, tz);
    let enrolled = repo
        .enrollments_for_user(class.id, user_id)?
        .iter()
        .any(|enrollment| enrollment.covers(day.start, day.end));
    if !enrolled {
        return Err(ServiceError::ValidationError(format!(
            "user {user_id} is not enrolled in class {}",
            class.id
        )));
    }

    Ok(session)
}
