use crate::core::overlap::find_conflict;
use crate::domain::model::{BookingStatus, InsertOutcome, NewBooking, TimeSlot};
use crate::domain::ports::BookingStore;
use crate::domain::time::format_date;
use crate::utils::error::{BookingError, Result};
use chrono::NaiveDate;

/// A patient's chosen slot, ready to be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub provider_id: String,
    pub patient_id: String,
    pub service_id: String,
    pub date: NaiveDate,
    pub slot: TimeSlot,
    pub notes: String,
}

impl BookingRequest {
    fn into_new_booking(self) -> NewBooking {
        NewBooking {
            provider_id: self.provider_id,
            patient_id: self.patient_id,
            service_id: self.service_id,
            date: self.date,
            start_time: self.slot.start,
            end_time: self.slot.end,
            status: BookingStatus::Confirmed,
            notes: self.notes,
        }
    }
}

/// 送出前重新讀取當日預約並再次檢查重疊，接著交給 store 做條件式寫入。
///
/// The fresh read catches bookings created since the slots were listed; the conditional
/// write catches the ones created between this read and the insert.
pub async fn commit<S: BookingStore + ?Sized>(
    store: &S,
    request: BookingRequest,
) -> Result<InsertOutcome> {
    let fresh = store
        .get_bookings_for_provider_on_date(&request.provider_id, request.date)
        .await?;

    if let Some(existing) = find_conflict(&request.slot, &fresh) {
        tracing::warn!(
            "⚠️ Slot {} on {} for provider {} now taken by booking {}",
            request.slot,
            format_date(request.date),
            request.provider_id,
            existing.id
        );
        return Ok(InsertOutcome::Conflict);
    }

    let slot = request.slot;
    let date = request.date;
    match store.insert_if_vacant(request.into_new_booking()).await {
        Ok(InsertOutcome::Conflict) => {
            tracing::warn!(
                "⚠️ Store rejected {} on {}: booked concurrently",
                slot,
                format_date(date)
            );
            Ok(InsertOutcome::Conflict)
        }
        Ok(inserted) => Ok(inserted),
        Err(e @ BookingError::PersistFailed { .. }) => Err(e),
        Err(e) => Err(BookingError::PersistFailed {
            message: e.to_string(),
        }),
    }
}
