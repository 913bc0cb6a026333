use chrono::{DateTime, LocalResult, NaiveDateTime, SubsecRound, TimeZone, Utc};

use super::weekday::WeekdayNum;

/// Repeat frequency of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "DAILY" => Some(Self::Daily),
            "WEEKLY" => Some(Self::Weekly),
            "MONTHLY" => Some(Self::Monthly),
            _ => None,
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The zone a rule's wall-clock start is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleZone {
    /// `DTSTART:...Z`
    Utc,
    /// `DTSTART;TZID=...:...`, expanded in that zone so DST shifts keep the
    /// local time of day.
    Named(chrono_tz::Tz),
}

/// ## Summary
/// The explicit start of a rule: a wall-clock time in a zone plus the
/// resolved UTC instant.
///
/// Construction rejects wall-clock times that do not exist in the zone.
/// Ambiguous times resolve to the earlier instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleStart {
    local: NaiveDateTime,
    zone: RuleZone,
    instant: DateTime<Utc>,
}

impl RuleStart {
    /// Sub-second precision is dropped; the text format carries whole seconds.
    #[must_use]
    pub fn utc(instant: DateTime<Utc>) -> Self {
        let instant = instant.trunc_subsecs(0);
        Self {
            local: instant.naive_utc(),
            zone: RuleZone::Utc,
            instant,
        }
    }

    /// Returns `None` when `local` falls in a DST gap of `tz`.
    #[must_use]
    pub fn zoned(local: NaiveDateTime, tz: chrono_tz::Tz) -> Option<Self> {
        let instant = match tz.from_local_datetime(&local) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
            LocalResult::None => return None,
        };
        Some(Self {
            local,
            zone: RuleZone::Named(tz),
            instant,
        })
    }

    #[must_use]
    pub const fn local(&self) -> NaiveDateTime {
        self.local
    }

    #[must_use]
    pub const fn zone(&self) -> RuleZone {
        self.zone
    }

    #[must_use]
    pub const fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    /// ## Summary
    /// Same wall-clock time of day and zone, moved to another local date.
    ///
    /// Returns `None` when the resulting local time does not exist.
    #[must_use]
    pub fn on_date(&self, date: chrono::NaiveDate) -> Option<Self> {
        let local = date.and_time(self.local.time());
        match self.zone {
            RuleZone::Utc => Some(Self::utc(local.and_utc())),
            RuleZone::Named(tz) => Self::zoned(local, tz),
        }
    }
}

/// How a rule ends. Absent means open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleBound {
    Count(u32),
    Until(DateTime<Utc>),
}

/// ## Summary
/// A parsed recurrence rule: start time plus repeat pattern.
///
/// `parse_rule(&format_rule(&r)) == r` holds for every rule built through
/// this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub start: RuleStart,
    pub frequency: Frequency,
    pub interval: u16,
    pub by_day: Vec<WeekdayNum>,
    pub bound: Option<RuleBound>,
}

impl RecurrenceRule {
    #[must_use]
    pub const fn new(start: RuleStart, frequency: Frequency) -> Self {
        Self {
            start,
            frequency,
            interval: 1,
            by_day: Vec::new(),
            bound: None,
        }
    }

    #[must_use]
    pub const fn with_interval(mut self, interval: u16) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn with_by_day(mut self, by_day: Vec<WeekdayNum>) -> Self {
        self.by_day = by_day;
        self
    }

    #[must_use]
    pub const fn with_bound(mut self, bound: Option<RuleBound>) -> Self {
        self.bound = bound;
        self
    }

    #[must_use]
    pub const fn start_instant(&self) -> DateTime<Utc> {
        self.start.instant()
    }

    #[must_use]
    pub const fn until(&self) -> Option<DateTime<Utc>> {
        match self.bound {
            Some(RuleBound::Until(until)) => Some(until),
            _ => None,
        }
    }

    #[must_use]
    pub const fn count(&self) -> Option<u32> {
        match self.bound {
            Some(RuleBound::Count(count)) => Some(count),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_open_ended(&self) -> bool {
        self.bound.is_none()
    }

    /// `COUNT=0`, or an UNTIL that precedes the start.
    #[must_use]
    pub fn is_zero_occurrence(&self) -> bool {
        match self.bound {
            Some(RuleBound::Count(count)) => count == 0,
            Some(RuleBound::Until(until)) => until < self.start.instant(),
            None => false,
        }
    }
}
