use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid date {0:?}, expected YYYY-MM-DD or YYYY/MM/DD")]
pub struct InvalidDate(pub String);

/// Parses a date given as `YYYY-MM-DD` or `YYYY/MM/DD` into local midnight.
pub fn parse_flexible_date(value: &str) -> Result<DateTime<Utc>, InvalidDate> {
    let format = if value.contains('/') {
        "%Y/%m/%d"
    } else {
        "%Y-%m-%d"
    };

    let date =
        NaiveDate::parse_from_str(value, format).map_err(|_| InvalidDate(value.to_string()))?;

    Ok(local_midnight(date))
}

/// Midnight of the day containing `t`, in the local timezone.
pub fn start_of_day(t: DateTime<Utc>) -> DateTime<Utc> {
    local_midnight(t.with_timezone(&Local).date_naive())
}

/// Midnight of the following day, in the local timezone.
pub fn end_of_day(t: DateTime<Utc>) -> DateTime<Utc> {
    start_of_day(t) + Duration::days(1)
}

fn local_midnight(date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    // DST transitions around midnight: prefer the earliest valid instant,
    // fall back to UTC when the local time does not exist at all.
    match Local.from_local_datetime(&midnight) {
        chrono::LocalResult::Single(t) => t.with_timezone(&Utc),
        chrono::LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        chrono::LocalResult::None => Utc.from_utc_datetime(&midnight),
    }
}

/// Renders a duration as a compact human-readable string, e.g. `1h30m`.
pub fn format_duration(d: Duration) -> String {
    let total_minutes = d.num_minutes();
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    match (hours, minutes) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h{}m", h, m),
    }
}
