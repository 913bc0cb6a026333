use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A site whose rooms are booked. `timezone` is an IANA zone name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facility {
    pub id: Uuid,
    pub name: String,
    pub timezone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: Uuid,
    pub facility_id: Uuid,
    pub name: String,
}
