//! A small facility with two rooms, shared by the service tests.

use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone, Utc};
use uuid::Uuid;

use cadence_core::types::{ClassStatus, EnrollmentStatus, OverrideKind};
use cadence_db::db::ScheduleRepository;
use cadence_db::db::memory::ScheduleState;
use cadence_db::model::{Class, Enrollment, Event, Facility, Override, Room};

pub fn at(year: i32, month: u32, day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, min, 0).unwrap()
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub struct Fixture {
    pub state: ScheduleState,
    pub facility_id: Uuid,
    pub room_id: Uuid,
    pub other_room_id: Uuid,
    pub class_id: Uuid,
}

impl Fixture {
    pub fn new(timezone: &str) -> Self {
        let facility_id = Uuid::new_v4();
        let room_id = Uuid::new_v4();
        let other_room_id = Uuid::new_v4();

        let mut state = ScheduleState::default();
        state
            .insert_facility(Facility {
                id: facility_id,
                name: "North".into(),
                timezone: timezone.into(),
            })
            .unwrap();
        for (id, name) in [(room_id, "Library"), (other_room_id, "Gym")] {
            state
                .insert_room(Room {
                    id,
                    facility_id,
                    name: name.into(),
                })
                .unwrap();
        }

        let mut fixture = Self {
            state,
            facility_id,
            room_id,
            other_room_id,
            class_id: Uuid::nil(),
        };
        fixture.class_id = fixture.add_class(ClassStatus::Active);
        fixture
    }

    pub fn utc() -> Self {
        Self::new("UTC")
    }

    pub fn add_class(&mut self, status: ClassStatus) -> Uuid {
        let id = Uuid::new_v4();
        self.state
            .insert_class(Class {
                id,
                facility_id: self.facility_id,
                name: "GED Prep".into(),
                status,
                start_dt: at(2024, 1, 1, 0, 0),
                end_dt: None,
            })
            .unwrap();
        id
    }

    pub fn add_event(
        &mut self,
        class_id: Uuid,
        rule: &str,
        minutes: i64,
        room_id: Option<Uuid>,
    ) -> Event {
        let event = Event {
            id: Uuid::new_v4(),
            class_id,
            duration: TimeDelta::minutes(minutes),
            room_id,
            recurrence_rule: rule.into(),
        };
        self.state.insert_event(event.clone()).unwrap();
        event
    }

    pub fn add_override(
        &mut self,
        event: &Event,
        rule: &str,
        is_cancelled: bool,
        room_id: Option<Uuid>,
    ) -> Override {
        let record = Override {
            id: Uuid::new_v4(),
            event_id: event.id,
            class_id: event.class_id,
            kind: OverrideKind::SingleInstance,
            override_rule: rule.into(),
            is_cancelled,
            duration: None,
            room_id,
            reason: None,
            linked_override_id: None,
        };
        self.state.insert_override(record.clone()).unwrap();
        record
    }

    pub fn add_forward_override(&mut self, event: &Event, rule: &str, minutes: i64) -> Override {
        let record = Override {
            id: Uuid::new_v4(),
            event_id: event.id,
            class_id: event.class_id,
            kind: OverrideKind::ForwardFromDate,
            override_rule: rule.into(),
            is_cancelled: false,
            duration: Some(TimeDelta::minutes(minutes)),
            room_id: None,
            reason: None,
            linked_override_id: None,
        };
        self.state.insert_override(record.clone()).unwrap();
        record
    }

    pub fn enroll(&mut self, class_id: Uuid, user_id: Uuid, enrolled_at: DateTime<Utc>) {
        self.state
            .insert_enrollment(Enrollment {
                id: Uuid::new_v4(),
                class_id,
                user_id,
                status: EnrollmentStatus::Enrolled,
                enrolled_at,
                ended_at: None,
            })
            .unwrap();
    }
}
