use thiserror::Error;

use crate::schedule::conflict::RoomConflict;

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    DatabaseError(#[from] cadence_db::error::DbError),

    #[error(transparent)]
    RfcError(#[from] cadence_rfc::error::RfcError),

    #[error(transparent)]
    CoreError(#[from] cadence_core::error::CoreError),

    /// The room is already booked for at least one requested session.
    #[error("Room conflict: {} overlapping booking(s)", .0.len())]
    RoomConflict(Vec<RoomConflict>),

    /// A write against a session that does not exist (e.g. a cancelled date).
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A mutation was attempted on a completed or cancelled class.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<cadence_rfc::rfc::recur::ParseError> for ServiceError {
    fn from(err: cadence_rfc::rfc::recur::ParseError) -> Self {
        Self::RfcError(err.into())
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
