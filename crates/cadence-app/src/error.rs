use salvo::Response;
use salvo::http::StatusCode;
use salvo::writing::Json;
use serde::Serialize;
use thiserror::Error;

use cadence_core::error::CoreError;
use cadence_db::error::DbError;
use cadence_service::error::ServiceError;
use cadence_service::schedule::conflict::RoomConflict;

/// Application-level errors (HTTP layer)
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    ServiceError(#[from] ServiceError),

    #[error(transparent)]
    DatabaseError(#[from] DbError),

    #[error(transparent)]
    RfcError(#[from] cadence_rfc::error::RfcError),

    #[error(transparent)]
    CoreError(#[from] CoreError),

    /// A path parameter, query parameter or body that could not be read.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// ## Summary
    /// The HTTP status a failed request answers with.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_)
            | Self::RfcError(_)
            | Self::CoreError(CoreError::InvalidInput(_))
            | Self::ServiceError(
                ServiceError::RfcError(_)
                | ServiceError::ValidationError(_)
                | ServiceError::InvalidState(_)
                | ServiceError::CoreError(CoreError::InvalidInput(_)),
            ) => StatusCode::BAD_REQUEST,
            Self::ServiceError(
                ServiceError::RoomConflict(_)
                | ServiceError::Conflict(_)
                | ServiceError::DatabaseError(DbError::AlreadyExists { .. }),
            )
            | Self::DatabaseError(DbError::AlreadyExists { .. }) => StatusCode::CONFLICT,
            Self::ServiceError(
                ServiceError::NotFound(_) | ServiceError::DatabaseError(DbError::NotFound { .. }),
            )
            | Self::DatabaseError(DbError::NotFound { .. }) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// ## Summary
/// Error response payload. Room conflicts carry the overlapping bookings.
#[derive(Debug, Serialize)]
pub struct ErrorResponse<'a> {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicts: Option<&'a [RoomConflict]>,
}

/// ## Summary
/// Writes `err` as a JSON error body with its mapped status.
pub fn render_error(res: &mut Response, err: &AppError) {
    let status = err.status_code();
    if status.is_server_error() {
        tracing::error!(error = %err, "Request failed");
    } else {
        tracing::debug!(error = %err, status = %status, "Request rejected");
    }

    let conflicts = match err {
        AppError::ServiceError(ServiceError::RoomConflict(conflicts)) => Some(conflicts.as_slice()),
        _ => None,
    };
    res.status_code(status);
    res.render(Json(ErrorResponse {
        error: err.to_string(),
        conflicts,
    }));
}

pub type AppResult<T> = std::result::Result<T, AppError>;
