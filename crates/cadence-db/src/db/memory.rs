//! In-memory store with whole-state transactions.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let store = MemoryStore::default();
//! store.with_transaction(|tx| {
//!     tx.insert_event(event)?;
//!     tx.update_class(class)?;
//!     Ok::<_, DbError>(())
//! })?;
//! ```
//!
//! A transaction works on a copy of the state; the copy replaces the
//! committed state only when the closure returns `Ok`.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::NaiveDate;
use uuid::Uuid;

use super::ScheduleRepository;
use crate::error::{DbError, DbResult};
use crate::model::{Attendance, Class, Enrollment, Event, Facility, Override, Room};

/// The full set of stored records. Implements [`ScheduleRepository`].
#[derive(Debug, Clone, Default)]
pub struct ScheduleState {
    facilities: HashMap<Uuid, Facility>,
    rooms: HashMap<Uuid, Room>,
    classes: HashMap<Uuid, Class>,
    events: Vec<Event>,
    overrides: Vec<Override>,
    enrollments: Vec<Enrollment>,
    attendance: HashMap<(Uuid, Uuid, NaiveDate), Attendance>,
}

impl ScheduleState {
    /// ## Errors
    /// Returns `AlreadyExists` on a duplicate id.
    pub fn insert_facility(&mut self, facility: Facility) -> DbResult<()> {
        if self.facilities.contains_key(&facility.id) {
            return Err(DbError::already_exists("facility", facility.id));
        }
        self.facilities.insert(facility.id, facility);
        Ok(())
    }

    /// ## Errors
    /// Returns `AlreadyExists` on a duplicate id, `NotFound` for an unknown facility.
    pub fn insert_room(&mut self, room: Room) -> DbResult<()> {
        if self.rooms.contains_key(&room.id) {
            return Err(DbError::already_exists("room", room.id));
        }
        self.facility(room.facility_id)?;
        self.rooms.insert(room.id, room);
        Ok(())
    }

    /// ## Errors
    /// Returns `AlreadyExists` on a duplicate id, `NotFound` for an unknown facility.
    pub fn insert_class(&mut self, class: Class) -> DbResult<()> {
        if self.classes.contains_key(&class.id) {
            return Err(DbError::already_exists("class", class.id));
        }
        self.facility(class.facility_id)?;
        self.classes.insert(class.id, class);
        Ok(())
    }

    /// ## Errors
    /// Returns `AlreadyExists` on a duplicate id, `NotFound` for an unknown class.
    pub fn insert_enrollment(&mut self, enrollment: Enrollment) -> DbResult<()> {
        if self.enrollments.iter().any(|e| e.id == enrollment.id) {
            return Err(DbError::already_exists("enrollment", enrollment.id));
        }
        self.class(enrollment.class_id)?;
        self.enrollments.push(enrollment);
        Ok(())
    }
}

impl ScheduleRepository for ScheduleState {
    fn facility(&self, id: Uuid) -> DbResult<Facility> {
        self.facilities
            .get(&id)
            .cloned()
            .ok_or_else(|| DbError::not_found("facility", id))
    }

    fn room(&self, id: Uuid) -> DbResult<Room> {
        self.rooms
            .get(&id)
            .cloned()
            .ok_or_else(|| DbError::not_found("room", id))
    }

    fn class(&self, id: Uuid) -> DbResult<Class> {
        self.classes
            .get(&id)
            .cloned()
            .ok_or_else(|| DbError::not_found("class", id))
    }

    fn update_class(&mut self, class: Class) -> DbResult<()> {
        let slot = self
            .classes
            .get_mut(&class.id)
            .ok_or_else(|| DbError::not_found("class", class.id))?;
        *slot = class;
        Ok(())
    }

    fn event(&self, id: Uuid) -> DbResult<Event> {
        self.events
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| DbError::not_found("event", id))
    }

    fn events_for_class(&self, class_id: Uuid) -> DbResult<Vec<Event>> {
        Ok(self
            .events
            .iter()
            .filter(|e| e.class_id == class_id)
            .cloned()
            .collect())
    }

    fn events_booking_room(&self, room_id: Uuid) -> DbResult<Vec<Event>> {
        Ok(self
            .events
            .iter()
            .filter(|e| {
                e.room_id == Some(room_id)
                    || self
                        .overrides
                        .iter()
                        .any(|o| o.event_id == e.id && o.room_id == Some(room_id))
            })
            .cloned()
            .collect())
    }

    fn insert_event(&mut self, event: Event) -> DbResult<()> {
        if self.events.iter().any(|e| e.id == event.id) {
            return Err(DbError::already_exists("event", event.id));
        }
        self.class(event.class_id)?;
        tracing::trace!(event_id = %event.id, class_id = %event.class_id, "Inserting event");
        self.events.push(event);
        Ok(())
    }

    fn update_event_rule(&mut self, event_id: Uuid, recurrence_rule: String) -> DbResult<()> {
        let event = self
            .events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or_else(|| DbError::not_found("event", event_id))?;
        event.recurrence_rule = recurrence_rule;
        Ok(())
    }

    fn delete_event(&mut self, event_id: Uuid) -> DbResult<Event> {
        let idx = self
            .events
            .iter()
            .position(|e| e.id == event_id)
            .ok_or_else(|| DbError::not_found("event", event_id))?;
        let event = self.events.remove(idx);
        self.overrides.retain(|o| o.event_id != event_id);
        self.attendance.retain(|(eid, _, _), _| *eid != event_id);
        Ok(event)
    }

    fn overrides_for_event(&self, event_id: Uuid) -> DbResult<Vec<Override>> {
        Ok(self
            .overrides
            .iter()
            .filter(|o| o.event_id == event_id)
            .cloned()
            .collect())
    }

    fn override_by_id(&self, id: Uuid) -> DbResult<Override> {
        self.overrides
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .ok_or_else(|| DbError::not_found("override", id))
    }

    fn insert_override(&mut self, record: Override) -> DbResult<()> {
        if self.overrides.iter().any(|o| o.id == record.id) {
            return Err(DbError::already_exists("override", record.id));
        }
        self.event(record.event_id)?;
        tracing::trace!(override_id = %record.id, event_id = %record.event_id, "Inserting override");
        self.overrides.push(record);
        Ok(())
    }

    fn update_override_rule(&mut self, id: Uuid, override_rule: String) -> DbResult<()> {
        let record = self
            .overrides
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| DbError::not_found("override", id))?;
        record.override_rule = override_rule;
        Ok(())
    }

    fn delete_override(&mut self, id: Uuid) -> DbResult<Override> {
        let idx = self
            .overrides
            .iter()
            .position(|o| o.id == id)
            .ok_or_else(|| DbError::not_found("override", id))?;
        Ok(self.overrides.remove(idx))
    }

    fn enrollments_for_user(&self, class_id: Uuid, user_id: Uuid) -> DbResult<Vec<Enrollment>> {
        Ok(self
            .enrollments
            .iter()
            .filter(|e| e.class_id == class_id && e.user_id == user_id)
            .cloned()
            .collect())
    }

    fn upsert_attendance(&mut self, mut record: Attendance) -> DbResult<Attendance> {
        self.event(record.event_id)?;
        if let Some(existing) = self.attendance.get(&record.key()) {
            record.id = existing.id;
        }
        self.attendance.insert(record.key(), record.clone());
        Ok(record)
    }

    fn delete_attendance(
        &mut self,
        event_id: Uuid,
        user_id: Uuid,
        date: NaiveDate,
    ) -> DbResult<bool> {
        Ok(self.attendance.remove(&(event_id, user_id, date)).is_some())
    }

    fn delete_attendance_on(&mut self, event_id: Uuid, date: NaiveDate) -> DbResult<usize> {
        let before = self.attendance.len();
        self.attendance
            .retain(|(eid, _, d), _| !(*eid == event_id && *d == date));
        Ok(before - self.attendance.len())
    }

    fn attendance_on(&self, event_id: Uuid, date: NaiveDate) -> DbResult<Vec<Attendance>> {
        let mut records: Vec<Attendance> = self
            .attendance
            .values()
            .filter(|a| a.event_id == event_id && a.date == date)
            .cloned()
            .collect();
        records.sort_by_key(|a| a.user_id);
        Ok(records)
    }
}

/// ## Summary
/// Thread-safe owner of the committed [`ScheduleState`].
///
/// Transactions are serialized behind a mutex, so "read bookings, decide,
/// write" sequences run atomically with respect to each other.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<ScheduleState>,
}

impl MemoryStore {
    #[must_use]
    pub fn new(state: ScheduleState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// ## Summary
    /// Runs `callback` against a working copy and commits it if the callback
    /// succeeds. On error nothing is written.
    ///
    /// ## Errors
    /// Returns the callback's error, or `LockPoisoned` if a previous holder
    /// of the lock panicked.
    pub fn with_transaction<T, E, F>(&self, callback: F) -> Result<T, E>
    where
        F: FnOnce(&mut ScheduleState) -> Result<T, E>,
        E: From<DbError>,
    {
        let mut committed = self.state.lock().map_err(|_err| DbError::LockPoisoned)?;
        let mut working = committed.clone();
        let value = callback(&mut working)?;
        *committed = working;
        Ok(value)
    }

    /// ## Summary
    /// Runs a read-only callback against the committed state.
    ///
    /// ## Errors
    /// Returns the callback's error, or `LockPoisoned`.
    pub fn read<T, E, F>(&self, callback: F) -> Result<T, E>
    where
        F: FnOnce(&ScheduleState) -> Result<T, E>,
        E: From<DbError>,
    {
        let committed = self.state.lock().map_err(|_err| DbError::LockPoisoned)?;
        callback(&committed)
    }
}
