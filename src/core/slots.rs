use crate::domain::model::{TimeSlot, WorkingHours};
use crate::domain::ports::TrailingSlotPolicy;
use crate::domain::time;
use crate::utils::error::{BookingError, Result};

fn slot_between(start_minute: u32, end_minute: u32) -> Result<TimeSlot> {
    let start = time::time_from_minutes(start_minute);
    let end = time::time_from_minutes(end_minute);
    match (start, end) {
        (Some(start), Some(end)) => TimeSlot::new(start, end),
        _ => Err(BookingError::invalid(
            "slot",
            format!("minute {}..{} is outside the day", start_minute, end_minute),
        )),
    }
}

/// 產生一天內的候選時段：從開始時間起每次前進 `duration_minutes`，
/// 直到下一個時段的結束時間超過營業結束時間為止。
///
/// With [`TrailingSlotPolicy::Drop`] a remainder shorter than the duration is not offered;
/// [`TrailingSlotPolicy::Truncate`] offers it as a shorter final slot ending at closing time.
pub fn generate_slots(
    hours: &WorkingHours,
    duration_minutes: u32,
    policy: TrailingSlotPolicy,
) -> Result<Vec<TimeSlot>> {
    hours.validate()?;
    if duration_minutes == 0 {
        return Err(BookingError::invalid(
            "duration_minutes",
            "slot duration must be positive",
        ));
    }

    let closes_at = hours.closes_at();
    let mut cursor = hours.opens_at();
    let mut slots = Vec::with_capacity(((closes_at - cursor) / duration_minutes) as usize + 1);

    while cursor < closes_at {
        let end = cursor + duration_minutes;
        if end > closes_at {
            if policy == TrailingSlotPolicy::Truncate {
                slots.push(slot_between(cursor, closes_at)?);
            } else {
                tracing::debug!(
                    "Dropping {} trailing minutes for provider {}",
                    closes_at - cursor,
                    hours.provider_id
                );
            }
            break;
        }
        slots.push(slot_between(cursor, end)?);
        cursor = end;
    }

    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hours(start: u8, end: u8) -> WorkingHours {
        WorkingHours::new("doc-1", start, end).unwrap()
    }

    fn labels(slots: &[TimeSlot]) -> Vec<String> {
        slots.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_even_window_produces_contiguous_slots() {
        let slots = generate_slots(&hours(8, 10), 30, TrailingSlotPolicy::Drop).unwrap();
        assert_eq!(
            labels(&slots),
            vec!["08:00-08:30", "08:30-09:00", "09:00-09:30", "09:30-10:00"]
        );
    }

    #[test]
    fn test_partial_trailing_slot_is_dropped_by_default() {
        let slots = generate_slots(&hours(8, 9), 40, TrailingSlotPolicy::default()).unwrap();
        assert_eq!(labels(&slots), vec!["08:00-08:40"]);
    }

    #[test]
    fn test_truncate_policy_keeps_short_final_slot() {
        let slots = generate_slots(&hours(8, 9), 40, TrailingSlotPolicy::Truncate).unwrap();
        assert_eq!(labels(&slots), vec!["08:00-08:40", "08:40-09:00"]);
    }

    #[test]
    fn test_duration_longer_than_window_yields_nothing() {
        let slots = generate_slots(&hours(8, 9), 90, TrailingSlotPolicy::Drop).unwrap();
        assert!(slots.is_empty());
    }

    #[test]
    fn test_rejects_invalid_inputs() {
        assert!(generate_slots(&hours(8, 9), 0, TrailingSlotPolicy::Drop).is_err());

        let inverted = WorkingHours {
            provider_id: "doc-1".to_string(),
            start_hour: 10,
            end_hour: 8,
        };
        assert!(generate_slots(&inverted, 30, TrailingSlotPolicy::Drop).is_err());
    }

    #[test]
    fn test_generated_slots_respect_bounds_and_length() {
        for (start, end) in [(0u8, 23u8), (7, 12), (8, 9), (13, 18)] {
            for duration in [5u32, 15, 20, 25, 30, 45, 60, 90] {
                let window = hours(start, end);
                let slots = generate_slots(&window, duration, TrailingSlotPolicy::Drop).unwrap();

                for slot in &slots {
                    assert_eq!(slot.duration_minutes(), duration);
                    assert!(slot.start_minute() >= window.opens_at());
                    assert!(slot.end_minute() <= window.closes_at());
                }
                for (i, a) in slots.iter().enumerate() {
                    for b in &slots[i + 1..] {
                        assert!(!a.overlaps(b), "{} overlaps {}", a, b);
                    }
                }
                for pair in slots.windows(2) {
                    assert_eq!(pair[0].end, pair[1].start);
                }

                let again = generate_slots(&window, duration, TrailingSlotPolicy::Drop).unwrap();
                assert_eq!(slots, again);
            }
        }
    }
}
