use thiserror::Error;

use crate::rfc::recur::parse::ParseError;

/// Recurrence rule parsing and expansion errors
#[derive(Error, Debug)]
pub enum RfcError {
    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(#[from] ParseError),

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("Recurrence expansion error: {0}")]
    ExpansionError(#[from] rrule::RRuleError),
}

pub type RfcResult<T> = std::result::Result<T, RfcError>;
