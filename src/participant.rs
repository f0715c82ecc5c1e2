use crate::time::TimeSlot;
use chrono_tz::Tz;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One person who submitted availability for a schedule.
///
/// The name is the participant's identity within its schedule
/// (case-sensitive); slots are only ever appended, never edited in place.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Participant {
    pub name: String,
    pub timezone: Tz,
    #[cfg_attr(feature = "serde", serde(rename = "selectedSlots"))]
    pub slots: Vec<TimeSlot>,
    /// Opaque best-effort identity tag set by the boundary layer (for the
    /// default-display-timezone guess). Never an authentication mechanism.
    #[cfg_attr(feature = "serde", serde(rename = "viewerTag", default))]
    pub viewer_tag: Option<String>,
}

impl Participant {
    /// Constructs a new Participant with the slots they marked themselves
    /// available for, each recorded in their own timezone.
    pub fn new(name: &str, timezone: Tz, slots: Vec<TimeSlot>) -> Participant {
        Participant {
            name: name.to_string(),
            timezone,
            slots,
            viewer_tag: None,
        }
    }

    pub fn with_viewer_tag(mut self, tag: &str) -> Participant {
        self.viewer_tag = Some(tag.to_string());
        self
    }
}
