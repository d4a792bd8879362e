//! # Weekly Schedule
//!
//! A per-user timetable: five weekdays by sixteen hourly slots
//! (07:00 through 22:00), each cell holding a free-text label.
//!
//! Cells are addressed on the wire as `"<weekday>-<HH:MM>"`, e.g.
//! `monday-07:00`. Writing a label that trims to nothing clears the cell.

use crate::primitives::{FIRST_SLOT_HOUR, LAST_SLOT_HOUR, MAX_SCHEDULE_LABEL_LENGTH};
use crate::PlannerError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// WEEKDAY
// =============================================================================

/// A teaching day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Weekday {
    pub const ALL: [Weekday; 5] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == lowered)
            .ok_or_else(|| PlannerError::InvalidSchedule(format!("unknown weekday '{s}'")))
    }
}

// =============================================================================
// TIME SLOT
// =============================================================================

/// An hourly slot on the grid. Constructed only through validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSlot(u8);

impl TimeSlot {
    /// Slot starting at `hour`, if the hour is on the grid.
    pub fn new(hour: u8) -> Result<Self, PlannerError> {
        if (FIRST_SLOT_HOUR..=LAST_SLOT_HOUR).contains(&hour) {
            Ok(Self(hour))
        } else {
            Err(PlannerError::InvalidSchedule(format!(
                "hour {hour} is outside {FIRST_SLOT_HOUR:02}:00-{LAST_SLOT_HOUR:02}:00"
            )))
        }
    }

    #[must_use]
    pub const fn hour(self) -> u8 {
        self.0
    }

    /// Every slot on the grid, in order.
    pub fn all() -> impl Iterator<Item = TimeSlot> {
        (FIRST_SLOT_HOUR..=LAST_SLOT_HOUR).map(Self)
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00", self.0)
    }
}

impl FromStr for TimeSlot {
    type Err = PlannerError;

    /// Parses `HH:MM`. Slots are hourly, so minutes must be `00`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PlannerError::InvalidSchedule(format!("invalid time '{s}'"));
        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        if minute != "00" {
            return Err(invalid());
        }
        let hour: u8 = hour.parse().map_err(|_| invalid())?;
        Self::new(hour)
    }
}

// =============================================================================
// SCHEDULE KEY
// =============================================================================

/// A cell on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScheduleKey {
    pub day: Weekday,
    pub slot: TimeSlot,
}

impl ScheduleKey {
    #[must_use]
    pub const fn new(day: Weekday, slot: TimeSlot) -> Self {
        Self { day, slot }
    }
}

impl fmt::Display for ScheduleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.day, self.slot)
    }
}

impl FromStr for ScheduleKey {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (day, slot) = s
            .split_once('-')
            .ok_or_else(|| PlannerError::InvalidSchedule(format!("invalid key '{s}'")))?;
        Ok(Self::new(day.parse()?, slot.parse()?))
    }
}

impl TryFrom<String> for ScheduleKey {
    type Error = PlannerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ScheduleKey> for String {
    fn from(key: ScheduleKey) -> Self {
        key.to_string()
    }
}

// =============================================================================
// WEEKLY SCHEDULE
// =============================================================================

/// A user's timetable. Only non-empty cells are stored.
///
/// Deserialization goes through [`WeeklySchedule::set_entry`], so stored
/// or submitted maps obey the same trimming and length rules as writes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(
    into = "BTreeMap<ScheduleKey, String>",
    try_from = "BTreeMap<ScheduleKey, String>"
)]
pub struct WeeklySchedule {
    entries: BTreeMap<ScheduleKey, String>,
}

impl TryFrom<BTreeMap<ScheduleKey, String>> for WeeklySchedule {
    type Error = PlannerError;

    fn try_from(raw: BTreeMap<ScheduleKey, String>) -> Result<Self, Self::Error> {
        let mut schedule = Self::new();
        for (key, label) in raw {
            schedule.set_entry(key, &label)?;
        }
        Ok(schedule)
    }
}

impl From<WeeklySchedule> for BTreeMap<ScheduleKey, String> {
    fn from(schedule: WeeklySchedule) -> Self {
        schedule.entries
    }
}

impl WeeklySchedule {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a cell. A label that trims to empty clears the cell;
    /// otherwise the trimmed label overwrites it.
    pub fn set_entry(&mut self, key: ScheduleKey, label: &str) -> Result<(), PlannerError> {
        let label = label.trim();
        if label.is_empty() {
            self.entries.remove(&key);
            return Ok(());
        }
        if label.chars().count() > MAX_SCHEDULE_LABEL_LENGTH {
            return Err(PlannerError::InvalidSchedule(format!(
                "label for {key} exceeds {MAX_SCHEDULE_LABEL_LENGTH} characters"
            )));
        }
        self.entries.insert(key, label.to_string());
        Ok(())
    }

    #[must_use]
    pub fn get(&self, key: &ScheduleKey) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Entries of one day, in slot order.
    pub fn day(&self, day: Weekday) -> impl Iterator<Item = (TimeSlot, &str)> {
        self.entries
            .iter()
            .filter(move |(k, _)| k.day == day)
            .map(|(k, v)| (k.slot, v.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ScheduleKey, &str)> {
        self.entries.iter().map(|(k, v)| (k, v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
