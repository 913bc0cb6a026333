//! Recurrence rule parse error types.

use std::fmt;

/// Result type for rule parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// An error that occurred while parsing rule text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The kind of error.
    pub kind: ParseErrorKind,
    /// Line number where the error occurred (1-based, 0 for whole-text errors).
    pub line: usize,
    /// Additional context or message.
    pub message: String,
}

impl ParseError {
    /// Creates a new parse error.
    #[must_use]
    pub fn new(kind: ParseErrorKind, line: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            message: message.into(),
        }
    }

    /// Creates a missing line error.
    #[must_use]
    pub fn missing(kind: ParseErrorKind, name: &str) -> Self {
        Self::new(kind, 0, format!("missing required line: {name}"))
    }

    /// Creates an invalid value error.
    #[must_use]
    pub fn invalid_value(kind: ParseErrorKind, line: usize, key: &str, value: &str) -> Self {
        Self::new(kind, line, format!("invalid {key} value: {value:?}"))
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "{}: {}", self.kind, self.message)
        } else {
            write!(f, "line {}: {}: {}", self.line, self.kind, self.message)
        }
    }
}

impl std::error::Error for ParseError {}

/// The kind of parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// No DTSTART line.
    MissingStart,
    /// No RRULE line.
    MissingPattern,
    /// A line appeared twice.
    DuplicateLine,
    /// A line that is neither DTSTART nor RRULE.
    UnexpectedLine,
    /// Malformed DTSTART value or parameters.
    InvalidStart,
    /// TZID names no IANA zone.
    UnknownTimezone,
    /// Local start time falls in a DST gap.
    NonExistentStart,
    /// Missing or unsupported FREQ.
    InvalidFrequency,
    /// INTERVAL is not a positive integer.
    InvalidInterval,
    /// COUNT is not a non-negative integer.
    InvalidCount,
    /// UNTIL is not a date or UTC date-time.
    InvalidUntil,
    /// Both COUNT and UNTIL were given.
    UntilCountConflict,
    /// Malformed BYDAY entry.
    InvalidWeekday,
    /// A rule part this engine does not evaluate.
    UnsupportedPart,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MissingStart => "missing start time",
            Self::MissingPattern => "missing repeat pattern",
            Self::DuplicateLine => "duplicate line",
            Self::UnexpectedLine => "unexpected line",
            Self::InvalidStart => "invalid start time",
            Self::UnknownTimezone => "unknown timezone",
            Self::NonExistentStart => "non-existent local start time",
            Self::InvalidFrequency => "invalid frequency",
            Self::InvalidInterval => "invalid interval",
            Self::InvalidCount => "invalid count",
            Self::InvalidUntil => "invalid until",
            Self::UntilCountConflict => "COUNT and UNTIL are mutually exclusive",
            Self::InvalidWeekday => "invalid weekday",
            Self::UnsupportedPart => "unsupported rule part",
        };
        f.write_str(s)
    }
}
