//! CSV export of participant availability.
//!
//! One row per participant slot, rendered in that participant's own
//! timezone. The day-name column is recomputed from the projected date at
//! export time; it is a display label, not stored state.

use crate::schedule::Schedule;
use crate::time::project;
use log::warn;
use serde::Serialize;
use std::io::Write;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write CSV output")]
    Csv(#[from] csv::Error),
    #[error("Failed to flush CSV output")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportRow {
    #[serde(rename = "Participant Name")]
    pub participant_name: String,
    #[serde(rename = "Timezone")]
    pub timezone: String,
    #[serde(rename = "Day")]
    pub day: String,
    #[serde(rename = "Start Time (Local)")]
    pub local_start: String,
}

/// Writes every participant's slots as CSV rows
/// `(Participant Name, Timezone, Day, Start Time (Local))`.
///
/// Unreadable slot records are skipped with a warning, matching the
/// aggregation path; the rest of the export still goes out.
pub fn export_csv<W: Write>(schedule: &Schedule, writer: W) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for participant in &schedule.participants {
        for slot in &participant.slots {
            let Some(instant) = slot.instant() else {
                warn!(
                    "export skipping unreadable slot record {:?} for {}",
                    slot.start_time, participant.name
                );
                continue;
            };
            let (date, time) = project(instant, participant.timezone);
            csv_writer.serialize(ExportRow {
                participant_name: participant.name.clone(),
                timezone: participant.timezone.to_string(),
                day: date.format("%a").to_string(),
                local_start: format!("{} {}", date.format("%m/%d/%Y"), time.format("%H:%M")),
            })?;
        }
    }

    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::Participant;
    use crate::time::TimeSlot;
    use chrono::{NaiveDate, NaiveTime};

    fn written_csv(schedule: &Schedule) -> String {
        let mut buffer = Vec::new();
        export_csv(schedule, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn rows_are_rendered_in_each_participants_own_zone() {
        let monday = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let mut schedule = Schedule::new("Admin", chrono_tz::UTC, monday, vec![]);
        schedule
            .push_participant(Participant::new(
                "Sam",
                chrono_tz::America::Los_Angeles,
                vec![TimeSlot::new(
                    monday,
                    NaiveTime::from_hms_opt(2, 0, 0).unwrap(),
                    chrono_tz::America::Los_Angeles,
                )],
            ))
            .unwrap();

        let csv = written_csv(&schedule);
        let mut lines = csv.lines();

        assert_eq!(
            lines.next(),
            Some("Participant Name,Timezone,Day,Start Time (Local)")
        );
        // Round-trip through the participant's own zone reproduces the
        // wall clock they picked; Monday stays Monday.
        assert_eq!(
            lines.next(),
            Some("Sam,America/Los_Angeles,Mon,06/10/2024 02:00")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn day_name_comes_from_the_projected_date() {
        let sunday = NaiveDate::from_ymd_opt(2024, 6, 9).unwrap();
        let mut schedule = Schedule::new("Admin", chrono_tz::UTC, sunday, vec![]);
        schedule
            .push_participant(Participant::new(
                "Yuki",
                chrono_tz::Asia::Tokyo,
                // Recorded late Sunday in New York; in Tokyo that instant is
                // already Monday afternoon.
                vec![TimeSlot::new(
                    sunday,
                    NaiveTime::from_hms_opt(23, 30, 0).unwrap(),
                    chrono_tz::America::New_York,
                )],
            ))
            .unwrap();

        let csv = written_csv(&schedule);
        let row = csv.lines().nth(1).unwrap();

        assert_eq!(row, "Yuki,Asia/Tokyo,Mon,06/10/2024 12:30");
    }

    #[test]
    fn unreadable_records_are_skipped_not_fatal() {
        let monday = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let mut schedule = Schedule::new("Admin", chrono_tz::UTC, monday, vec![]);
        schedule
            .push_participant(Participant::new(
                "Sam",
                chrono_tz::UTC,
                vec![
                    TimeSlot {
                        start_time: "garbage".to_string(),
                        timezone: chrono_tz::UTC,
                    },
                    TimeSlot::new(
                        monday,
                        NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                        chrono_tz::UTC,
                    ),
                ],
            ))
            .unwrap();

        let csv = written_csv(&schedule);

        assert_eq!(csv.lines().count(), 2);
        assert!(csv.lines().nth(1).unwrap().starts_with("Sam,UTC,Mon,"));
    }
}
