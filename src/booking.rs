//! Timezone verification for a single calendar booking.
//!
//! Google Calendar hands out event times with the offset of the calendar's zone, the sync payload
//! carries them as UTC with millisecond precision and the database stores them as `timestamptz`.
//! The admin calendar then groups bookings by their date in the display zone. [`BookingCheck`]
//! recomputes every one of those representations so they can be compared side by side.

use crate::{Error, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Offset, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Format used to display instants.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format accepted for expected local wall-clock times.
pub const LOCAL_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Parses an RFC 3339 timestamp with any offset (or `Z`) into a UTC instant. Fractional seconds
/// are accepted.
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| Error::InvalidTimestamp {
            input: s.to_owned(),
            source,
        })
}

/// Renders an instant as `YYYY-MM-DD HH:MM:SS` in UTC.
pub fn format_display(instant: &DateTime<Utc>) -> String {
    instant.format(DISPLAY_FORMAT).to_string()
}

/// Renders an instant the way the sync payload carries it, e.g. `2025-11-21T23:00:00.000Z`.
pub fn to_utc_iso(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Renders an instant in the text form PostgreSQL uses for a UTC `timestamptz`.
pub fn to_database_timestamp(instant: &DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%S+00").to_string()
}

/// Looks up an IANA time zone by name.
pub fn parse_time_zone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| Error::UnknownTimeZone(name.to_owned()))
}

/// The calendar date of an instant in `tz`.
pub fn local_date(instant: &DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// The wall-clock time of an instant in `tz`.
pub fn local_time(instant: &DateTime<Utc>, tz: Tz) -> NaiveDateTime {
    instant.with_timezone(&tz).naive_local()
}

/// Offset of `tz` from UTC at the given instant, e.g. `UTC+11` or `UTC+9:30`.
pub fn utc_offset_label(instant: &DateTime<Utc>, tz: Tz) -> String {
    let seconds = instant.with_timezone(&tz).offset().fix().local_minus_utc();
    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.abs() / 60;

    match minutes % 60 {
        0 => format!("UTC{sign}{}", minutes / 60),
        m => format!("UTC{sign}{}:{m:02}", minutes / 60),
    }
}

// "Australia/Melbourne" -> "Melbourne"
fn zone_label(tz: Tz) -> &'static str {
    let name = tz.name();
    name.rsplit('/').next().unwrap_or(name)
}

/// Start or end time of a Google Calendar event.
///
/// Timed events carry `dateTime`, all-day events only carry `date`.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    pub date_time: Option<String>,
    pub date: Option<NaiveDate>,
    pub time_zone: Option<String>,
}

impl EventTime {
    /// The raw value as Google sent it.
    pub fn raw(&self) -> String {
        match (&self.date_time, &self.date) {
            (Some(date_time), _) => date_time.clone(),
            (None, Some(date)) => date.to_string(),
            (None, None) => String::new(),
        }
    }

    /// Resolves the event time to a UTC instant. All-day dates are local midnight in the event's
    /// own zone, or in `fallback` if the event has none.
    pub fn to_utc(&self, fallback: Tz) -> Result<DateTime<Utc>> {
        if let Some(date_time) = &self.date_time {
            return parse_instant(date_time);
        }

        let date = self.date.ok_or(Error::MissingEventTime)?;
        let tz = match &self.time_zone {
            Some(name) => parse_time_zone(name)?,
            None => fallback,
        };

        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| Error::InvalidDate(date.to_string()))?;

        // Midnight may fall into a DST gap; the day then starts at its first valid minute.
        (0..24 * 60)
            .find_map(|minute| {
                tz.from_local_datetime(&(midnight + Duration::minutes(minute)))
                    .earliest()
            })
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| Error::InvalidDate(date.to_string()))
    }
}

impl FromStr for EventTime {
    type Err = Error;

    /// Parses either a full timestamp or a bare `YYYY-MM-DD` date.
    fn from_str(s: &str) -> Result<Self> {
        let err = match parse_instant(s) {
            Ok(_) => {
                return Ok(EventTime {
                    date_time: Some(s.to_owned()),
                    ..Default::default()
                })
            }
            Err(err) => err,
        };

        // Report the timestamp error unless the input is a valid date.
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| err)?;

        Ok(EventTime {
            date: Some(date),
            ..Default::default()
        })
    }
}

/// Parses an expected local wall-clock time in [`LOCAL_FORMAT`].
pub fn parse_local(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, LOCAL_FORMAT).map_err(|source| Error::InvalidTimestamp {
        input: s.to_owned(),
        source,
    })
}

/// A booking whose start time should be verified.
#[derive(Debug, Clone)]
pub struct BookingCheck {
    /// The booking title.
    pub title: String,
    /// Start time as returned by Google Calendar.
    pub google_start: EventTime,
    /// Zone the admin calendar displays bookings in.
    pub time_zone: Tz,
    /// Wall-clock time the booking is expected to show in `time_zone`.
    pub expected_local: Option<NaiveDateTime>,
}

impl BookingCheck {
    /// Computes all derived representations of the booking start.
    pub fn run(&self) -> Result<BookingReport> {
        let start = self.google_start.to_utc(self.time_zone)?;
        let local = local_time(&start, self.time_zone);

        // Expected times only carry minutes.
        let local_minutes = local.format(LOCAL_FORMAT).to_string();
        let matches = self
            .expected_local
            .map(|expected| expected.format(LOCAL_FORMAT).to_string() == local_minutes);

        log::debug!(
            "{:?}: {} -> {} ({:?})",
            self.title,
            self.google_start.raw(),
            to_utc_iso(&start),
            matches
        );

        Ok(BookingReport {
            title: self.title.clone(),
            google_raw: self.google_start.raw(),
            start,
            time_zone: self.time_zone,
            expected_local: self.expected_local,
            matches,
        })
    }
}

/// Result of a [`BookingCheck`].
#[derive(Debug, Clone, PartialEq)]
pub struct BookingReport {
    pub title: String,
    pub google_raw: String,
    pub start: DateTime<Utc>,
    pub time_zone: Tz,
    pub expected_local: Option<NaiveDateTime>,
    /// `None` if no expected local time was given.
    pub matches: Option<bool>,
}

impl BookingReport {
    /// The payload value sent by the sync.
    pub fn payload(&self) -> String {
        to_utc_iso(&self.start)
    }

    /// The `start_time` column as stored in the database.
    pub fn start_time(&self) -> String {
        to_database_timestamp(&self.start)
    }

    /// The `start_date` column, i.e. the date in the display zone.
    pub fn start_date(&self) -> NaiveDate {
        local_date(&self.start, self.time_zone)
    }

    pub fn local_time(&self) -> NaiveDateTime {
        local_time(&self.start, self.time_zone)
    }
}

impl fmt::Display for BookingReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let zone = zone_label(self.time_zone);
        let local = self.start.with_timezone(&self.time_zone);

        writeln!(f, "=== Checking Booking: {} ===", self.title)?;
        writeln!(
            f,
            "Google Calendar shows: {} {zone} time",
            local.format("%A, %b %-d, %-I:%M %p")
        )?;
        writeln!(f)?;

        writeln!(f, "From sync logs:")?;
        writeln!(f, "  Raw from Google: {}", self.google_raw)?;
        writeln!(f, "  Converted to UTC: {}", self.payload())?;
        writeln!(f, "  Payload sent: {}", self.payload())?;
        writeln!(f)?;

        writeln!(f, "Expected in database:")?;
        writeln!(
            f,
            "  start_time: {} ({})",
            self.start_time(),
            self.start.format("%-I:%M %p UTC on %b %-d")
        )?;
        writeln!(
            f,
            "  start_date: {} (when converted to {zone} = {})",
            self.start_date(),
            local.format("%b %-d")
        )?;
        writeln!(f)?;

        writeln!(f, "Verification:")?;
        writeln!(
            f,
            "  UTC time: {} ({})",
            format_display(&self.start),
            self.start.format("%b %-d, %-I:%M %p")
        )?;
        writeln!(
            f,
            "  {zone} offset: {}",
            utc_offset_label(&self.start, self.time_zone)
        )?;

        let local_label = local.format("%b %-d, %-I:%M %p");
        match (self.matches, self.expected_local) {
            (Some(true), _) => {
                writeln!(f, "  {zone} time: {local_label} ✓ CORRECT")?;
                writeln!(f)?;
                write!(
                    f,
                    "✅ The conversion is correct. The booking should display on {} in the admin calendar.",
                    local.format("%A, %b %-d")
                )
            }
            (Some(false), Some(expected)) => {
                writeln!(f, "  {zone} time: {local_label} ✗ WRONG")?;
                writeln!(f)?;
                write!(
                    f,
                    "❌ Expected {} but the booking resolves to {}.",
                    expected.format(LOCAL_FORMAT),
                    local.format(LOCAL_FORMAT)
                )
            }
            _ => write!(f, "  {zone} time: {local_label}"),
        }
    }
}
