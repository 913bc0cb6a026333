//! Request parsing shared by the API handlers. Every failure here is a
//! `400 Bad Request`.

use chrono::{NaiveDate, TimeDelta};
use salvo::Request;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// ## Summary
/// Reads a UUID path parameter.
///
/// ## Errors
/// Returns `BadRequest` if the parameter is missing or not a UUID.
pub fn path_id(req: &Request, name: &str) -> AppResult<Uuid> {
    req.param::<String>(name)
        .and_then(|raw| raw.parse::<Uuid>().ok())
        .ok_or_else(|| AppError::BadRequest(format!("invalid {name}")))
}

/// ## Summary
/// Reads a required `YYYY-MM-DD` query parameter.
///
/// ## Errors
/// Returns `BadRequest` if the parameter is missing or malformed.
pub fn query_date(req: &Request, name: &str) -> AppResult<NaiveDate> {
    let raw = req
        .query::<String>(name)
        .ok_or_else(|| AppError::BadRequest(format!("missing query parameter {name}")))?;
    raw.parse::<NaiveDate>()
        .map_err(|e| AppError::BadRequest(format!("invalid {name} '{raw}': {e}")))
}

/// ## Summary
/// Parses the JSON request body.
///
/// ## Errors
/// Returns `BadRequest` if the body is missing, not JSON, or the wrong shape.
pub async fn parse_body<T>(req: &mut Request) -> AppResult<T>
where
    T: DeserializeOwned,
{
    req.parse_json::<T>().await.map_err(|e| {
        tracing::debug!(error = %e, "Failed to parse request body");
        AppError::BadRequest(format!("invalid request body: {e}"))
    })
}

/// ## Errors
/// Returns `BadRequest` if `secs` does not fit a duration.
pub fn seconds(field: &str, secs: i64) -> AppResult<TimeDelta> {
    TimeDelta::try_seconds(secs)
        .ok_or_else(|| AppError::BadRequest(format!("{field} out of range: {secs}")))
}

/// ## Errors
/// Returns `BadRequest` if `secs` is present and does not fit a duration.
pub fn optional_seconds(field: &str, secs: Option<i64>) -> AppResult<Option<TimeDelta>> {
    secs.map(|secs| seconds(field, secs)).transpose()
}
