use thiserror::Error;

/// Persistence layer errors
#[derive(Error, Debug)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("Snapshot error: {0}")]
    SnapshotError(#[from] serde_json::Error),

    #[error("Snapshot I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DbError {
    pub(crate) fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn already_exists(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::AlreadyExists {
            entity,
            id: id.to_string(),
        }
    }
}

pub type DbResult<T> = std::result::Result<T, DbError>;
