//! Attendance writes, gated on the resolved schedule.

pub mod record;
pub mod tracking;
pub mod validate;

pub use record::{AttendanceEntry, delete_attendance, record_attendance};
pub use tracking::{Tracked, apply_time_tracking};
pub use validate::{session_on_date, validate_attendance_date};
