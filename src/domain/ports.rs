use crate::domain::model::{
    Booking, BookingStatus, InsertOutcome, NewBooking, Service, WorkingHours,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 持久層介面：營業時間、服務與既有預約都從這裡讀取
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn get_working_hours(&self, provider_id: &str) -> Result<WorkingHours>;

    async fn get_service_by_id(&self, service_id: &str) -> Result<Service>;

    async fn list_services(&self, provider_id: &str) -> Result<Vec<Service>>;

    /// All bookings of the provider on `date`, cancelled ones included.
    async fn get_bookings_for_provider_on_date(
        &self,
        provider_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Booking>>;

    /// Single conditional write: inserts only when no non-cancelled booking of the
    /// same provider and date overlaps the new interval.
    async fn insert_if_vacant(&self, booking: NewBooking) -> Result<InsertOutcome>;

    async fn get_booking(&self, booking_id: &str) -> Result<Booking>;

    async fn update_booking_status(&self, booking_id: &str, status: BookingStatus)
        -> Result<Booking>;

    async fn delete_booking(&self, booking_id: &str) -> Result<()>;
}

/// What to do with the remainder when the service duration does not divide the working window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailingSlotPolicy {
    #[default]
    Drop,
    Truncate,
}

pub trait ConfigProvider: Send + Sync {
    fn trailing_slot_policy(&self) -> TrailingSlotPolicy;
}

/// Engine settings for callers that do not load a config file.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineSettings {
    pub trailing_slot: TrailingSlotPolicy,
}

impl ConfigProvider for EngineSettings {
    fn trailing_slot_policy(&self) -> TrailingSlotPolicy {
        self.trailing_slot
    }
}
