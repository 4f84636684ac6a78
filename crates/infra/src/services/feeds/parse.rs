use calgate_domain::CalendarEvent;
use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};
use icalendar::parser::{read_calendar, unfold};
use icalendar::{CalendarDateTime, DatePerhapsTime};
use tracing::error;

/// Parses an iCalendar payload into events of the named feed calendar.
///
/// Items without a start time are skipped; a missing end stays unset.
pub fn parse_feed(feed_name: &str, content: &str) -> Vec<CalendarEvent> {
    let unfolded = unfold(content);
    let calendar = match read_calendar(&unfolded) {
        Ok(calendar) => calendar,
        Err(err) => {
            error!(feed = %feed_name, error = %err, "failed to parse feed payload");
            return Vec::new();
        }
    };

    let mut events = Vec::new();

    for component in &calendar.components {
        if component.name != "VEVENT" {
            continue;
        }

        let id = component
            .find_prop("UID")
            .map(|p| p.val.to_string())
            .unwrap_or_default();

        let summary = component
            .find_prop("SUMMARY")
            .map(|p| p.val.to_string())
            .unwrap_or_default();

        let description = component
            .find_prop("DESCRIPTION")
            .map(|p| p.val.to_string())
            .unwrap_or_default();

        let start = component
            .find_prop("DTSTART")
            .and_then(|p| DatePerhapsTime::try_from(p).ok())
            .and_then(to_utc);
        let Some(start_time) = start else {
            error!(feed = %feed_name, event = %id, "skipping feed event without start time");
            continue;
        };

        let end_time = component
            .find_prop("DTEND")
            .and_then(|p| DatePerhapsTime::try_from(p).ok())
            .and_then(to_utc);

        events.push(CalendarEvent {
            id,
            calendar_id: feed_name.to_string(),
            summary,
            description,
            start_time,
            end_time,
            full_day: false,
            is_free: false,
            create_time: None,
            resources: Vec::new(),
            annotation: None,
        });
    }

    events
}

fn to_utc(value: DatePerhapsTime) -> Option<DateTime<Utc>> {
    match value {
        DatePerhapsTime::DateTime(dt) => match dt {
            CalendarDateTime::Utc(t) => Some(t),
            CalendarDateTime::Floating(naive) => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|t| t.with_timezone(&Utc)),
            CalendarDateTime::WithTimezone { date_time, tzid } => tzid
                .parse::<chrono_tz::Tz>()
                .ok()
                .and_then(|tz| tz.from_local_datetime(&date_time).earliest())
                .map(|t| t.with_timezone(&Utc)),
        },
        DatePerhapsTime::Date(date) => Local
            .from_local_datetime(&date.and_time(NaiveTime::MIN))
            .earliest()
            .map(|t| t.with_timezone(&Utc)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_utc_events() {
        let payload = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nUID:a\r\nSUMMARY:One\r\nDTSTART:20240402T060000Z\r\nDTEND:20240402T063000Z\r\nEND:VEVENT\r\nBEGIN:VEVENT\r\nUID:b\r\nSUMMARY:Two\r\nDTSTART:20240403T060000Z\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";

        let events = parse_feed("feed", payload);
        assert_eq!(events.len(), 2);

        assert_eq!(events[0].id, "a");
        assert_eq!(
            events[0].start_time,
            Utc.with_ymd_and_hms(2024, 4, 2, 6, 0, 0).unwrap()
        );
        assert_eq!(
            events[0].end_time,
            Some(Utc.with_ymd_and_hms(2024, 4, 2, 6, 30, 0).unwrap())
        );

        // no DTEND leaves the end unset
        assert_eq!(events[1].end_time, None);
    }

    #[test]
    fn items_without_a_start_are_skipped() {
        let payload = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nUID:broken\r\nSUMMARY:No start\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
        assert!(parse_feed("feed", payload).is_empty());
    }

    #[test]
    fn garbage_payloads_yield_no_events() {
        assert!(parse_feed("feed", "definitely not ical").is_empty());
    }

    #[test]
    fn zoned_times_are_converted_to_utc() {
        let payload = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nUID:z\r\nDTSTART;TZID=Europe/Vienna:20240102T100000\r\nDTEND;TZID=Europe/Vienna:20240102T110000\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";

        let events = parse_feed("feed", payload);
        assert_eq!(events.len(), 1);
        // Vienna is UTC+1 in January
        assert_eq!(
            events[0].start_time,
            Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap()
        );
    }
}
