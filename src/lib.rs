pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{HttpStore, InMemoryStore};
pub use config::TomlConfig;
pub use core::engine::SlotEngine;
pub use domain::model::{
    Booking, BookingResult, BookingStatus, RequestContext, Role, Service, TimeSlot, WorkingHours,
};
pub use domain::ports::{BookingStore, EngineSettings, TrailingSlotPolicy};
pub use utils::error::{BookingError, Result};
