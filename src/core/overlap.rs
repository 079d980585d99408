use crate::domain::model::{Booking, TimeSlot};

/// 移除與任何有效預約重疊的候選時段，保留原本順序。
/// Cancelled bookings never block a slot.
pub fn filter_available(candidates: Vec<TimeSlot>, bookings: &[Booking]) -> Vec<TimeSlot> {
    if bookings.is_empty() {
        return candidates;
    }

    candidates
        .into_iter()
        .filter(|slot| !bookings.iter().any(|booking| booking.blocks(slot)))
        .collect()
}

/// First active booking that overlaps `slot`, if any.
pub fn find_conflict<'a>(slot: &TimeSlot, bookings: &'a [Booking]) -> Option<&'a Booking> {
    bookings.iter().find(|booking| booking.blocks(slot))
}
