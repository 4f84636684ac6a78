use crate::date::format_duration;
use crate::event::{sort_events, CalendarEvent};
use chrono::{DateTime, Duration, Utc};

/// Gaps shorter than this are not worth offering as bookable slots.
const MIN_SLOT_DURATION: Duration = Duration::minutes(5);

/// A half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy)]
struct TimeRange(DateTime<Utc>, DateTime<Utc>);

impl TimeRange {
    fn includes(&self, t: DateTime<Utc>) -> bool {
        self.0 <= t && self.1 > t
    }
}

/// Computes the free pseudo-events between the booked events of a calendar
/// inside `[start, end]`.
///
/// Full-day events and events without an end time do not block time. The
/// emitted slots are pairwise disjoint, ordered, each longer than five
/// minutes and clamped to the requested range.
pub fn calculate_free_slots(
    calendar_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    events: &[CalendarEvent],
) -> Vec<CalendarEvent> {
    let bounds = TimeRange(start, end);

    let mut filtered: Vec<&CalendarEvent> = events
        .iter()
        .filter(|evt| {
            let evt_end = match evt.end_time {
                Some(t) if !evt.full_day => t,
                _ => return false,
            };

            let evt_bounds = TimeRange(evt.start_time, evt_end);

            bounds.includes(evt.start_time)
                || bounds.includes(evt_end)
                || evt_bounds.includes(start)
                || evt_bounds.includes(end)
        })
        .collect();

    filtered.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.end_time.cmp(&b.end_time))
    });

    let mut slots = Vec::new();

    for (i, evt) in filtered.iter().enumerate() {
        let mut start_of_slot = if i == 0 {
            start
        } else {
            // preceding events always carry an end, the filter guarantees it
            filtered[i - 1].end_time.unwrap_or(start)
        };
        if start_of_slot > end {
            start_of_slot = end;
        }

        let mut end_of_slot = evt.start_time;
        if end_of_slot < start {
            end_of_slot = start;
        }
        if end_of_slot > end {
            end_of_slot = end;
        }

        push_slot(&mut slots, calendar_id, start_of_slot, end_of_slot, false);
    }

    match filtered.last() {
        Some(last) => {
            let last_end = last.end_time.unwrap_or(end);
            if last_end < end {
                push_slot(&mut slots, calendar_id, last_end, end, true);
            }
        }
        None => {
            // nothing booked, the whole range is free
            push_slot(&mut slots, calendar_id, start, end, true);
        }
    }

    sort_events(&mut slots);
    slots
}

fn push_slot(
    slots: &mut Vec<CalendarEvent>,
    calendar_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    trailing: bool,
) {
    if end - start <= MIN_SLOT_DURATION {
        return;
    }

    let id = if trailing {
        "free-slot-end".to_string()
    } else {
        format!("free-slot-{}", slots.len())
    };

    slots.push(CalendarEvent {
        id,
        calendar_id: calendar_id.to_string(),
        summary: format!("Free slot for {}", format_duration(end - start)),
        start_time: start,
        end_time: Some(end),
        is_free: true,
        ..Default::default()
    });
}
