//! Calendar-day helpers: canonical day keys, inclusive day intervals in a
//! time zone, and the display formats used across the app.

use chrono::{DateTime, Duration, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Canonical day key and route format
pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// `YYYY-MM-DD` key for a calendar day
pub fn day_key(date: NaiveDate) -> String {
    date.format(DAY_KEY_FORMAT).to_string()
}

/// Strict `YYYY-MM-DD` parse
pub fn parse_day(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s.trim(), DAY_KEY_FORMAT)
}

/// "June 01, 2024"
pub fn format_long(date: NaiveDate) -> String {
    date.format("%B %d, %Y").to_string()
}

/// "June 01, 2024 - 10:00 AM" in local time
pub fn format_reminder(instant: DateTime<Utc>) -> String {
    instant.with_timezone(&Local).format("%B %d, %Y - %I:%M %p").to_string()
}

/// Inclusive interval covering one calendar day, at millisecond resolution.
///
/// `end` is the last millisecond before the next day starts. Instants are
/// compared at millisecond precision, the resolution the store keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayInterval {
    /// Interval of `date` in the machine's local zone
    pub fn local(date: NaiveDate) -> Self {
        Self::in_zone(date, &Local)
    }

    pub fn in_zone<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Self {
        let start = start_of_day_in(date, tz);
        let next_start = match date.succ_opt() {
            Some(next) => start_of_day_in(next, tz),
            None => start + Duration::days(1),
        };
        Self {
            start,
            end: next_start - Duration::milliseconds(1),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        let t = instant.timestamp_millis();
        self.start.timestamp_millis() <= t && t <= self.end.timestamp_millis()
    }
}

/// Start of the current local day
pub fn start_of_today() -> DateTime<Utc> {
    DayInterval::local(Local::now().date_naive()).start
}

/// `date` at the given local wall-clock time, resolved to an instant
pub fn instant_on(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    resolve_local(&Local, date.and_time(time))
}

fn start_of_day_in<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    resolve_local(tz, date.and_time(NaiveTime::MIN))
}

fn resolve_local<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(t) => t.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            // Wall-clock time skipped by a DST jump: take the first valid minute after it
            (1..=180)
                .find_map(|m| tz.from_local_datetime(&(local + Duration::minutes(m))).earliest())
                .map(|t| t.with_timezone(&Utc))
                .unwrap_or_else(|| Utc.from_utc_datetime(&local))
        }
    }
}
