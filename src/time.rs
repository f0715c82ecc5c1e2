use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;
use core::fmt;
use itertools::Itertools;
use log::warn;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Granularity of the availability grid, in minutes.
pub const SLOT_MINUTES: u32 = 30;

/// Number of grid rows in one day: 48 half-hour slots from 00:00 to 23:30.
pub const SLOTS_PER_DAY: u32 = 24 * 60 / SLOT_MINUTES;

/// Number of columns in the grid: one week.
pub const WINDOW_DAYS: u32 = 7;

/// One half-hour slot a person marked as available, expressed as the
/// wall-clock reading in *their* timezone at the moment of selection.
///
/// The reading is stored as the raw `YYYY-MM-DDTHH:mm` string it arrived as
/// (a trailing `:ss` is tolerated) and parsed defensively at read time, so a
/// corrupt record degrades to a skipped slot instead of a failed grid.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeSlot {
    #[cfg_attr(feature = "serde", serde(rename = "startTime"))]
    pub start_time: String,
    pub timezone: Tz,
}

impl TimeSlot {
    /// Constructs a well-formed slot from its wall-clock parts.
    ///
    /// `time` is expected to sit on a 30-minute boundary. The serde boundary
    /// rejects unaligned submissions and projection floors whatever slips
    /// through; direct constructions are checked in debug builds.
    ///
    /// # Examples
    /// ```
    /// use chrono::{NaiveDate, NaiveTime};
    /// use wochenplan::time::TimeSlot;
    ///
    /// let slot = TimeSlot::new(
    ///     NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
    ///     NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
    ///     chrono_tz::UTC,
    /// );
    ///
    /// assert_eq!(slot.start_time, "2024-06-10T09:00");
    /// ```
    pub fn new(date: NaiveDate, time: NaiveTime, timezone: Tz) -> TimeSlot {
        debug_assert!(
            time.minute() % SLOT_MINUTES == 0 && time.second() == 0,
            "slot start {} is not 30-minute aligned",
            time
        );
        TimeSlot {
            start_time: format!("{}T{}", date.format("%Y-%m-%d"), time.format("%H:%M")),
            timezone,
        }
    }

    /// Parses the stored wall-clock reading, if it is readable.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use wochenplan::time::TimeSlot;
    ///
    /// let slot = TimeSlot {
    ///     start_time: "2024-06-10T23:30".to_string(),
    ///     timezone: chrono_tz::America::New_York,
    /// };
    ///
    /// assert_eq!(
    ///     slot.local_start().map(|dt| dt.date()),
    ///     NaiveDate::from_ymd_opt(2024, 6, 10)
    /// );
    ///
    /// let corrupt = TimeSlot {
    ///     start_time: "not a time".to_string(),
    ///     timezone: chrono_tz::UTC,
    /// };
    ///
    /// assert_eq!(corrupt.local_start(), None);
    /// ```
    pub fn local_start(&self) -> Option<NaiveDateTime> {
        let raw = self.start_time.trim();
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
            .ok()
    }

    /// The absolute instant this slot's wall-clock reading denotes in its
    /// recorded timezone, or `None` for an unreadable record.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        self.local_start()
            .and_then(|local| normalize(local, self.timezone))
    }
}

/// Canonical identity of one grid cell: `YYYY-MM-DD_HH:mm`.
///
/// The date and time are always relative to whichever timezone the current
/// viewer requested; a `SlotKey` is a projection key, not an absolute
/// identity. The fixed-width format makes the derived lexicographic order
/// chronological.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SlotKey(String);

impl SlotKey {
    /// Formats a key from an already-projected date and time.
    ///
    /// # Examples
    /// ```
    /// use chrono::{NaiveDate, NaiveTime};
    /// use wochenplan::time::SlotKey;
    ///
    /// let key = SlotKey::new(
    ///     NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
    ///     NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
    /// );
    ///
    /// assert_eq!(key.as_str(), "2024-06-10_09:30");
    /// ```
    pub fn new(date: NaiveDate, time: NaiveTime) -> SlotKey {
        SlotKey(format!(
            "{}_{}",
            date.format("%Y-%m-%d"),
            time.format("%H:%M")
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves a wall-clock reading in `zone` to the absolute instant it
/// denotes.
///
/// DST transitions are resolved deterministically:
/// - a reading inside a fall-back fold denotes two instants; the earlier one
///   (the pre-transition offset) is taken;
/// - a reading inside a spring-forward gap denotes no instant; the
///   post-transition offset is applied, by probing forward in half-hour steps
///   until the clock is readable again and undoing the probe distance.
///
/// Returns `None` only when the probe fails to escape a gap within two days,
/// which no published tz database exhibits; callers treat it as a malformed
/// record.
///
/// # Examples
/// ```
/// use chrono::{NaiveDate, TimeZone, Utc};
/// use wochenplan::time::normalize;
///
/// let nine_local = NaiveDate::from_ymd_opt(2024, 6, 10)
///     .unwrap()
///     .and_hms_opt(9, 0, 0)
///     .unwrap();
///
/// // 09:00 in New York is 13:00 UTC during daylight saving.
/// assert_eq!(
///     normalize(nine_local, chrono_tz::America::New_York),
///     Some(Utc.with_ymd_and_hms(2024, 6, 10, 13, 0, 0).unwrap())
/// );
///
/// // 02:30 never happened on 2024-03-10 in New York; the post-transition
/// // offset (UTC-4) applies.
/// let gap = NaiveDate::from_ymd_opt(2024, 3, 10)
///     .unwrap()
///     .and_hms_opt(2, 30, 0)
///     .unwrap();
///
/// assert_eq!(
///     normalize(gap, chrono_tz::America::New_York),
///     Some(Utc.with_ymd_and_hms(2024, 3, 10, 6, 30, 0).unwrap())
/// );
/// ```
pub fn normalize(local: NaiveDateTime, zone: Tz) -> Option<DateTime<Utc>> {
    match zone.from_local_datetime(&local) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => {
            let step = Duration::minutes(SLOT_MINUTES as i64);
            let mut probe = step;
            // Gaps can span a whole calendar day in zones that skipped one.
            while probe <= Duration::days(2) {
                match zone.from_local_datetime(&(local + probe)) {
                    LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                        return Some(dt.with_timezone(&Utc) - probe);
                    }
                    LocalResult::None => probe = probe + step,
                }
            }
            None
        }
    }
}

/// Projects an absolute instant into `zone`, flooring to the start of the
/// enclosing half-hour slot.
///
/// Flooring only matters for zones whose offset is not a multiple of 30
/// minutes (for example Asia/Kathmandu at UTC+5:45): such a projection lands
/// between slot boundaries and is attributed to the slot it falls within.
///
/// # Examples
/// ```
/// use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
/// use wochenplan::time::project;
///
/// let instant = Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap();
///
/// // UTC+5:45 puts 09:00 UTC at 14:45 local; the slot starts at 14:30.
/// assert_eq!(
///     project(instant, chrono_tz::Asia::Kathmandu),
///     (
///         NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
///         NaiveTime::from_hms_opt(14, 30, 0).unwrap()
///     )
/// );
/// ```
pub fn project(instant: DateTime<Utc>, zone: Tz) -> (NaiveDate, NaiveTime) {
    let local = instant.with_timezone(&zone).naive_local();
    let floored = local.minute() - local.minute() % SLOT_MINUTES;
    let time = NaiveTime::from_hms_opt(local.hour(), floored, 0)
        .expect("floored minute is within the hour");
    (local.date(), time)
}

/// The seven consecutive calendar dates anchoring a schedule's grid.
///
/// The dates themselves are fixed by the organizer's start date; whether a
/// given slot falls inside the window is re-evaluated per viewer timezone,
/// since projection can shift a slot across a day boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    start: NaiveDate,
}

impl WeekWindow {
    pub fn new(start: NaiveDate) -> WeekWindow {
        WeekWindow { start }
    }

    /// The window's dates, in order.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use wochenplan::time::WeekWindow;
    ///
    /// let window = WeekWindow::new(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
    ///
    /// assert_eq!(window.days().count(), 7);
    /// assert_eq!(
    ///     window.days().last(),
    ///     NaiveDate::from_ymd_opt(2024, 6, 16)
    /// );
    /// ```
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        (0..WINDOW_DAYS).map(move |offset| start + Duration::days(offset as i64))
    }

    /// The 48 half-hour slot starts of any grid day, `00:00` through `23:30`.
    pub fn times() -> impl Iterator<Item = NaiveTime> {
        (0..SLOTS_PER_DAY).map(|row| {
            NaiveTime::from_hms_opt(row * SLOT_MINUTES / 60, row * SLOT_MINUTES % 60, 0)
                .expect("grid rows stay within the day")
        })
    }

    /// Every cell of the grid as a key, day-major: all of day one's slots,
    /// then day two's, and so on.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use wochenplan::time::WeekWindow;
    ///
    /// let window = WeekWindow::new(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
    /// let keys: Vec<_> = window.keys().collect();
    ///
    /// assert_eq!(keys.len(), 336);
    /// assert_eq!(keys[0].as_str(), "2024-06-10_00:00");
    /// assert_eq!(keys[335].as_str(), "2024-06-16_23:30");
    /// ```
    pub fn keys(&self) -> impl Iterator<Item = SlotKey> {
        self.days()
            .cartesian_product(Self::times().collect_vec())
            .map(|(date, time)| SlotKey::new(date, time))
    }

    /// Whether a projected date falls on one of the window's seven days.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.start + Duration::days(WINDOW_DAYS as i64)
    }
}

pub trait Projected {
    fn project_into(self, zone: Tz) -> Vec<(NaiveDate, NaiveTime)>;
}

impl<'a, T> Projected for T
where
    T: Iterator<Item = &'a TimeSlot>,
{
    /// Projects each slot into `zone` through its own recorded timezone.
    ///
    /// Records whose stored reading cannot be parsed are skipped and logged,
    /// so one corrupt slot cannot take down the rest of the grid.
    ///
    /// # Examples
    /// ```
    /// use chrono::{NaiveDate, NaiveTime};
    /// use wochenplan::time::{Projected, TimeSlot};
    ///
    /// let slots = vec![TimeSlot::new(
    ///     NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
    ///     NaiveTime::from_hms_opt(23, 30, 0).unwrap(),
    ///     chrono_tz::America::New_York,
    /// )];
    ///
    /// // 23:30 in New York is already the next morning in Tokyo.
    /// assert_eq!(
    ///     slots.iter().project_into(chrono_tz::Asia::Tokyo),
    ///     vec![(
    ///         NaiveDate::from_ymd_opt(2024, 6, 11).unwrap(),
    ///         NaiveTime::from_hms_opt(12, 30, 0).unwrap()
    ///     )]
    /// );
    /// ```
    fn project_into(self, zone: Tz) -> Vec<(NaiveDate, NaiveTime)> {
        self.filter_map(|slot| match slot.instant() {
            Some(instant) => Some(project(instant, zone)),
            None => {
                warn!(
                    "skipping unreadable slot record {:?} ({})",
                    slot.start_time, slot.timezone
                );
                None
            }
        })
        .collect_vec()
    }
}
