// Adapters layer: concrete implementations of the BookingStore port.

pub mod http;
pub mod memory;

pub use http::HttpStore;
pub use memory::{InMemoryStore, Snapshot, SnapshotLock};
