pub mod engine;
pub mod export;
pub mod lifecycle;
pub mod overlap;
pub mod slots;
pub mod validator;

pub use crate::domain::model::{Booking, BookingResult, BookingStatus, TimeSlot};
pub use crate::domain::ports::{BookingStore, ConfigProvider, TrailingSlotPolicy};
pub use crate::utils::error::Result;
