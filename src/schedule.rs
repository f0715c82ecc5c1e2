use crate::occupancy::{Role, SlotOccupancy, SlotOccupancyMap};
use crate::participant::Participant;
use crate::time::{Projected, SlotKey, TimeSlot, WeekWindow};
use chrono::NaiveDate;
use chrono_tz::Tz;
use log::debug;
#[cfg(feature = "serde")]
use serde::Serialize;
use thiserror::Error;

#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Error, Debug, Eq, PartialEq)]
pub enum ValidationError {
    #[error("Unknown timezone identifier: {0}")]
    InvalidTimezone(String),
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },
    #[error("Unparseable slot start time: {0}")]
    MalformedSlot(String),
    #[error("Slot start {0} does not fall on a 30-minute boundary")]
    UnalignedSlot(String),
    #[error("Unparseable start date: {0}")]
    MalformedStartDate(String),
    #[error("A participant named {0} already submitted availability")]
    DuplicateName(String),
}

/// A shared 7-day availability grid: the organizer's proposal plus every
/// participant submission received so far.
///
/// Identity is immutable once created; organizer slots change only through
/// full replacement, participants are appended in arrival order and never
/// removed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Schedule {
    pub organizer_name: String,
    pub organizer_timezone: Tz,
    pub start_date: NaiveDate,
    pub organizer_slots: Vec<TimeSlot>,
    pub participants: Vec<Participant>,
    /// Opaque best-effort identity tag for the organizer, same contract as
    /// `Participant::viewer_tag`.
    pub viewer_tag: Option<String>,
}

impl Schedule {
    pub fn new(
        organizer_name: &str,
        organizer_timezone: Tz,
        start_date: NaiveDate,
        organizer_slots: Vec<TimeSlot>,
    ) -> Schedule {
        Schedule {
            organizer_name: organizer_name.to_string(),
            organizer_timezone,
            start_date,
            organizer_slots,
            participants: Vec::new(),
            viewer_tag: None,
        }
    }

    /// The seven calendar dates this schedule's grid covers, anchored at the
    /// start date in the organizer's timezone.
    pub fn window(&self) -> WeekWindow {
        WeekWindow::new(self.start_date)
    }

    /// Appends a participant submission.
    ///
    /// Names identify participants within a schedule (case-sensitive), so a
    /// second submission under an existing name is rejected rather than
    /// merged or overwritten.
    pub fn push_participant(&mut self, participant: Participant) -> Result<(), ValidationError> {
        if self.participants.iter().any(|p| p.name == participant.name) {
            return Err(ValidationError::DuplicateName(participant.name));
        }
        self.participants.push(participant);
        Ok(())
    }

    /// Replaces the organizer's slot selection wholesale. Organizer slots
    /// have no incremental edit operation.
    pub fn replace_organizer_slots(&mut self, slots: Vec<TimeSlot>) {
        self.organizer_slots = slots;
    }

    /// Best-effort default display timezone for a viewer identified by an
    /// opaque tag: the organizer's zone if the tag matches the organizer,
    /// a participant's zone if it matches that participant, and the
    /// organizer's zone otherwise. A hint only, never an identity check.
    pub fn display_timezone_hint(&self, viewer_tag: Option<&str>) -> Tz {
        match viewer_tag {
            Some(tag) if self.viewer_tag.as_deref() == Some(tag) => self.organizer_timezone,
            Some(tag) => self
                .participants
                .iter()
                .find(|p| p.viewer_tag.as_deref() == Some(tag))
                .map(|p| p.timezone)
                .unwrap_or(self.organizer_timezone),
            None => self.organizer_timezone,
        }
    }

    /// Merges the organizer's and every participant's selections into a
    /// per-cell occupancy map under `display_timezone`.
    ///
    /// Each slot is resolved to the absolute instant it denotes in its
    /// owner's recorded timezone, projected into the display timezone, and
    /// accumulated under its projection key; selections from different
    /// owners that land on the same key coalesce into one cell with several
    /// occupants, and any one owner counts at most once per cell. Occupant
    /// order is stable: organizer first, then participants in arrival
    /// order.
    ///
    /// The computation is pure and recomputed in full on every call, so it
    /// can be invoked on each display-timezone switch without accumulating
    /// state. Projections falling outside the 7-day window are dropped;
    /// unreadable slot records are skipped with a warning rather than
    /// failing the call.
    ///
    /// # Errors
    /// `ValidationError::InvalidTimezone` if `display_timezone` is not a
    /// known IANA zone identifier. Per-record problems never surface here.
    ///
    /// # Examples
    /// ```
    /// use chrono::{NaiveDate, NaiveTime};
    /// use wochenplan::participant::Participant;
    /// use wochenplan::schedule::Schedule;
    /// use wochenplan::time::{SlotKey, TimeSlot};
    ///
    /// let monday = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
    /// let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
    /// let two = NaiveTime::from_hms_opt(2, 0, 0).unwrap();
    ///
    /// let mut schedule = Schedule::new(
    ///     "Admin",
    ///     chrono_tz::UTC,
    ///     monday,
    ///     vec![TimeSlot::new(monday, nine, chrono_tz::UTC)],
    /// );
    ///
    /// // Sam marks 02:00 local in Los Angeles, which is 09:00 UTC in June.
    /// schedule
    ///     .push_participant(Participant::new(
    ///         "Sam",
    ///         chrono_tz::America::Los_Angeles,
    ///         vec![TimeSlot::new(monday, two, chrono_tz::America::Los_Angeles)],
    ///     ))
    ///     .unwrap();
    ///
    /// let grid = schedule.aggregate("UTC").unwrap();
    /// let cell = &grid[&SlotKey::new(monday, nine)];
    ///
    /// assert_eq!(cell.count(), 2);
    /// assert_eq!(cell.names(), "Admin, Sam");
    /// ```
    pub fn aggregate(&self, display_timezone: &str) -> Result<SlotOccupancyMap, ValidationError> {
        let zone: Tz = display_timezone
            .parse()
            .map_err(|_| ValidationError::InvalidTimezone(display_timezone.to_string()))?;

        let window = self.window();
        let mut grid = SlotOccupancyMap::new();

        admit(
            &mut grid,
            window,
            zone,
            &self.organizer_slots,
            &self.organizer_name,
            Role::Organizer,
        );
        for participant in &self.participants {
            admit(
                &mut grid,
                window,
                zone,
                &participant.slots,
                &participant.name,
                Role::Participant,
            );
        }

        Ok(grid)
    }
}

fn admit(
    grid: &mut SlotOccupancyMap,
    window: WeekWindow,
    zone: Tz,
    slots: &[TimeSlot],
    name: &str,
    role: Role,
) {
    for (date, time) in slots.iter().project_into(zone) {
        if !window.contains(date) {
            debug!("slot for {} projects to {} outside the window", name, date);
            continue;
        }
        grid.entry(SlotKey::new(date, time))
            .or_insert_with(SlotOccupancy::default)
            .push_occupant(name, role);
    }
}
