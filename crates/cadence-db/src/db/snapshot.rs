//! JSON snapshots used to seed a store.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ScheduleRepository;
use super::memory::{MemoryStore, ScheduleState};
use crate::error::DbResult;
use crate::model::{Class, Enrollment, Event, Facility, Override, Room};

/// Reference data and schedules to preload. Records are inserted in field
/// order, so parents must appear before their children.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub facilities: Vec<Facility>,
    pub rooms: Vec<Room>,
    pub classes: Vec<Class>,
    pub enrollments: Vec<Enrollment>,
    pub events: Vec<Event>,
    pub overrides: Vec<Override>,
}

impl Snapshot {
    /// ## Summary
    /// Builds a state from the snapshot, validating references on the way.
    ///
    /// ## Errors
    /// Returns `AlreadyExists` for duplicate ids and `NotFound` for records
    /// whose parent is missing.
    pub fn into_state(self) -> DbResult<ScheduleState> {
        let mut state = ScheduleState::default();
        for facility in self.facilities {
            state.insert_facility(facility)?;
        }
        for room in self.rooms {
            state.insert_room(room)?;
        }
        for class in self.classes {
            state.insert_class(class)?;
        }
        for enrollment in self.enrollments {
            state.insert_enrollment(enrollment)?;
        }
        for event in self.events {
            state.insert_event(event)?;
        }
        for record in self.overrides {
            state.insert_override(record)?;
        }
        Ok(state)
    }
}

/// ## Summary
/// Reads a snapshot file and returns a store holding it.
///
/// ## Errors
/// Returns an error if the file cannot be read or parsed, or if its records
/// are inconsistent.
#[tracing::instrument]
pub fn load_snapshot(path: &Path) -> DbResult<MemoryStore> {
    let raw = std::fs::read_to_string(path)?;
    let snapshot: Snapshot = serde_json::from_str(&raw)?;
    tracing::info!(
        facilities = snapshot.facilities.len(),
        classes = snapshot.classes.len(),
        events = snapshot.events.len(),
        "Loaded seed snapshot"
    );
    Ok(MemoryStore::new(snapshot.into_state()?))
}
