//! Validated boundary contracts for schedule and participant submissions.
//!
//! Request bodies arrive as camelCase JSON shaped by the caller; nothing here
//! is trusted until `validate` has checked every field and produced a domain
//! value. Write-side validation rejects the whole submission before any slot
//! is normalized; read-side aggregation stays skip-and-continue.

use crate::participant::Participant;
use crate::schedule::{Schedule, ValidationError};
use crate::time::{TimeSlot, SLOT_MINUTES};
use chrono::{NaiveDate, Timelike};
use chrono_tz::Tz;
use serde::Deserialize;

/// One submitted slot: a wall-clock start and, optionally, a timezone
/// overriding the submitter's.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotPayload {
    pub start_time: String,
    #[serde(default)]
    pub timezone: Option<String>,
}

/// Body of a "create schedule" request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePayload {
    #[serde(default)]
    pub organizer_name: String,
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub slots: Vec<SlotPayload>,
}

impl SchedulePayload {
    /// Checks every field and constructs the schedule, or rejects the whole
    /// submission.
    pub fn validate(self) -> Result<Schedule, ValidationError> {
        let name = required(&self.organizer_name, "organizerName")?;
        let zone = parse_zone(&self.timezone)?;
        let start_date = NaiveDate::parse_from_str(self.start_date.trim(), "%Y-%m-%d")
            .map_err(|_| ValidationError::MalformedStartDate(self.start_date.clone()))?;
        let slots = validated_slots(self.slots, zone)?;
        Ok(Schedule::new(&name, zone, start_date, slots))
    }
}

/// Body of an "add your availability" request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub selected_slots: Vec<SlotPayload>,
}

impl ParticipantPayload {
    pub fn validate(self) -> Result<Participant, ValidationError> {
        let name = required(&self.name, "name")?;
        let zone = parse_zone(&self.timezone)?;
        let slots = validated_slots(self.selected_slots, zone)?;
        Ok(Participant::new(&name, zone, slots))
    }
}

fn required(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::MissingField { field })
    } else {
        Ok(trimmed.to_string())
    }
}

fn parse_zone(raw: &str) -> Result<Tz, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField { field: "timezone" });
    }
    trimmed
        .parse()
        .map_err(|_| ValidationError::InvalidTimezone(trimmed.to_string()))
}

fn validated_slots(
    raw: Vec<SlotPayload>,
    owner_zone: Tz,
) -> Result<Vec<TimeSlot>, ValidationError> {
    raw.into_iter()
        .map(|payload| {
            let zone = match &payload.timezone {
                Some(z) => parse_zone(z)?,
                None => owner_zone,
            };
            let slot = TimeSlot {
                start_time: payload.start_time,
                timezone: zone,
            };
            let local = slot
                .local_start()
                .ok_or_else(|| ValidationError::MalformedSlot(slot.start_time.clone()))?;
            if local.minute() % SLOT_MINUTES != 0 || local.second() != 0 {
                return Err(ValidationError::UnalignedSlot(slot.start_time.clone()));
            }
            Ok(slot)
        })
        .collect()
}
