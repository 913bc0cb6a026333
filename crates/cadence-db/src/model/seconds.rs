//! Serde adapters for `TimeDelta` as whole seconds.

use chrono::TimeDelta;
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S: Serializer>(value: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_i64(value.num_seconds())
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeDelta, D::Error> {
    let secs = i64::deserialize(deserializer)?;
    TimeDelta::try_seconds(secs)
        .ok_or_else(|| serde::de::Error::custom(format!("duration out of range: {secs}")))
}

pub mod option {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serializer};

    #[expect(
        clippy::ref_option,
        reason = "serde's `with` adapters receive a reference to the field"
    )]
    pub fn serialize<S: Serializer>(
        value: &Option<TimeDelta>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&d.num_seconds()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<TimeDelta>, D::Error> {
        Option::<i64>::deserialize(deserializer)?
            .map(|secs| {
                TimeDelta::try_seconds(secs).ok_or_else(|| {
                    serde::de::Error::custom(format!("duration out of range: {secs}"))
                })
            })
            .transpose()
    }
}
