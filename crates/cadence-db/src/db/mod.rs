use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::DbResult;
use crate::model::{Attendance, Class, Enrollment, Event, Facility, Override, Room};

pub mod memory;
pub mod snapshot;

/// ## Summary
/// The persistence boundary the scheduling engine reads and writes through.
///
/// Implementations are handed to the engine inside a transaction; every
/// mutation made through one handle commits or rolls back together.
pub trait ScheduleRepository {
    /// ## Errors
    /// Returns `NotFound` if no facility has this id.
    fn facility(&self, id: Uuid) -> DbResult<Facility>;

    /// ## Errors
    /// Returns `NotFound` if no room has this id.
    fn room(&self, id: Uuid) -> DbResult<Room>;

    /// ## Errors
    /// Returns `NotFound` if no class has this id.
    fn class(&self, id: Uuid) -> DbResult<Class>;

    /// ## Summary
    /// Replaces a stored class.
    ///
    /// ## Errors
    /// Returns `NotFound` if the class was never inserted.
    fn update_class(&mut self, class: Class) -> DbResult<()>;

    /// ## Errors
    /// Returns `NotFound` if no event has this id.
    fn event(&self, id: Uuid) -> DbResult<Event>;

    /// Events of a class, in insertion order.
    ///
    /// ## Errors
    /// Returns an error if the store cannot be read.
    fn events_for_class(&self, class_id: Uuid) -> DbResult<Vec<Event>>;

    /// ## Summary
    /// Events that can occupy `room_id`: booked into it directly or through
    /// one of their overrides.
    ///
    /// ## Errors
    /// Returns an error if the store cannot be read.
    fn events_booking_room(&self, room_id: Uuid) -> DbResult<Vec<Event>>;

    /// ## Errors
    /// Returns `AlreadyExists` on a duplicate id, `NotFound` for an unknown class.
    fn insert_event(&mut self, event: Event) -> DbResult<()>;

    /// ## Errors
    /// Returns `NotFound` if no event has this id.
    fn update_event_rule(&mut self, event_id: Uuid, recurrence_rule: String) -> DbResult<()>;

    /// ## Summary
    /// Deletes an event together with its overrides and attendance.
    ///
    /// ## Errors
    /// Returns `NotFound` if no event has this id.
    fn delete_event(&mut self, event_id: Uuid) -> DbResult<Event>;

    /// Overrides of an event, in creation order.
    ///
    /// ## Errors
    /// Returns an error if the store cannot be read.
    fn overrides_for_event(&self, event_id: Uuid) -> DbResult<Vec<Override>>;

    /// ## Errors
    /// Returns `NotFound` if no override has this id.
    fn override_by_id(&self, id: Uuid) -> DbResult<Override>;

    /// ## Errors
    /// Returns `AlreadyExists` on a duplicate id, `NotFound` for an unknown event.
    fn insert_override(&mut self, record: Override) -> DbResult<()>;

    /// ## Errors
    /// Returns `NotFound` if no override has this id.
    fn update_override_rule(&mut self, id: Uuid, override_rule: String) -> DbResult<()>;

    /// ## Errors
    /// Returns `NotFound` if no override has this id.
    fn delete_override(&mut self, id: Uuid) -> DbResult<Override>;

    /// ## Errors
    /// Returns an error if the store cannot be read.
    fn enrollments_for_user(&self, class_id: Uuid, user_id: Uuid) -> DbResult<Vec<Enrollment>>;

    /// ## Summary
    /// Inserts or replaces the record with the same `(event_id, user_id, date)`.
    /// A replaced record keeps its id.
    ///
    /// ## Errors
    /// Returns `NotFound` for an unknown event.
    fn upsert_attendance(&mut self, record: Attendance) -> DbResult<Attendance>;

    /// Returns whether a record was removed.
    ///
    /// ## Errors
    /// Returns an error if the store cannot be written.
    fn delete_attendance(&mut self, event_id: Uuid, user_id: Uuid, date: NaiveDate)
    -> DbResult<bool>;

    /// Removes every record of an event on `date`, returning how many were removed.
    ///
    /// ## Errors
    /// Returns an error if the store cannot be written.
    fn delete_attendance_on(&mut self, event_id: Uuid, date: NaiveDate) -> DbResult<usize>;

    /// ## Errors
    /// Returns an error if the store cannot be read.
    fn attendance_on(&self, event_id: Uuid, date: NaiveDate) -> DbResult<Vec<Attendance>>;
}
