use thiserror::Error;

/// Errors shared by every crate in the workspace
#[derive(Error, Debug)]
pub enum CoreError {
    /// A value that does not name any known variant, e.g. an unknown status.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Wiring that must hold at runtime did not, such as a missing depot entry.
    #[error("Invariant violation: {0}")]
    InvariantViolation(&'static str),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
