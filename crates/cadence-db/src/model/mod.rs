//! Persisted scheduling records.
//!
//! Durations are stored as whole seconds when serialized.

pub mod attendance;
pub mod class;
pub mod enrollment;
pub mod event;
pub mod facility;
mod seconds;

pub use attendance::Attendance;
pub use class::Class;
pub use enrollment::Enrollment;
pub use event::{Event, Override};
pub use facility::{Facility, Room};
