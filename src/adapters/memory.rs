use crate::domain::model::{
    Booking, BookingStatus, InsertOutcome, NewBooking, Service, WorkingHours,
};
use crate::domain::ports::BookingStore;
use crate::utils::error::{BookingError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// 整個 store 的內容，也是 JSON 快照檔的格式
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub working_hours: Vec<WorkingHours>,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub bookings: Vec<Booking>,
}

/// 快照檔旁 `<snapshot>.lock` 的獨佔鎖。
///
/// The store's mutex only covers one process; CLI runs sharing a snapshot file hold this
/// from `load` through `save`. Released on drop.
#[derive(Debug)]
pub struct SnapshotLock {
    path: PathBuf,
    _file: File,
}

impl SnapshotLock {
    pub async fn acquire<P: AsRef<Path>>(snapshot: P) -> Result<Self> {
        let mut name = snapshot.as_ref().as_os_str().to_owned();
        name.push(".lock");
        let path = PathBuf::from(name);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let lock_path = path.clone();
        let file = tokio::task::spawn_blocking(move || -> std::io::Result<File> {
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&lock_path)?;
            file.lock_exclusive()?;
            Ok(file)
        })
        .await
        .map_err(|e| BookingError::PersistFailed {
            message: format!("waiting for snapshot lock failed: {}", e),
        })??;

        tracing::debug!("🔒 Holding snapshot lock {}", path.display());
        Ok(Self { path, _file: file })
    }

}

impl Drop for SnapshotLock {
    fn drop(&mut self) {
        tracing::debug!("🔓 Released snapshot lock {}", self.path.display());
    }
}

/// Process-local store. A single mutex guards all data, so `insert_if_vacant` checks and
/// writes inside one critical section.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    data: Arc<Mutex<Snapshot>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            data: Arc::new(Mutex::new(snapshot)),
        }
    }

    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !tokio::fs::try_exists(path).await? {
            tracing::warn!("Snapshot {} not found, starting empty", path.display());
            return Ok(Self::new());
        }
        let content = tokio::fs::read(path).await?;
        let snapshot: Snapshot = serde_json::from_slice(&content)?;
        tracing::debug!(
            "Loaded snapshot {}: {} providers, {} services, {} bookings",
            path.display(),
            snapshot.working_hours.len(),
            snapshot.services.len(),
            snapshot.bookings.len()
        );
        Ok(Self::from_snapshot(snapshot))
    }

    pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = {
            let data = self.data.lock().await;
            serde_json::to_vec_pretty(&*data)?
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.data.lock().await.clone()
    }

    pub async fn put_working_hours(&self, hours: WorkingHours) {
        let mut data = self.data.lock().await;
        data.working_hours.retain(|h| h.provider_id != hours.provider_id);
        data.working_hours.push(hours);
    }

    pub async fn put_service(&self, service: Service) {
        let mut data = self.data.lock().await;
        data.services.retain(|s| s.id != service.id);
        data.services.push(service);
    }

    /// Stores a booking as-is, without any overlap check.
    pub async fn put_booking(&self, booking: Booking) {
        let mut data = self.data.lock().await;
        data.bookings.retain(|b| b.id != booking.id);
        data.bookings.push(booking);
    }

    fn not_found(entity: &str, id: &str) -> BookingError {
        BookingError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}

#[async_trait]
impl BookingStore for InMemoryStore {
    async fn get_working_hours(&self, provider_id: &str) -> Result<WorkingHours> {
        let data = self.data.lock().await;
        data.working_hours
            .iter()
            .find(|h| h.provider_id == provider_id)
            .cloned()
            .ok_or_else(|| Self::not_found("working hours", provider_id))
    }

    async fn get_service_by_id(&self, service_id: &str) -> Result<Service> {
        let data = self.data.lock().await;
        data.services
            .iter()
            .find(|s| s.id == service_id)
            .cloned()
            .ok_or_else(|| Self::not_found("service", service_id))
    }

    async fn list_services(&self, provider_id: &str) -> Result<Vec<Service>> {
        let data = self.data.lock().await;
        Ok(data
            .services
            .iter()
            .filter(|s| s.provider_id == provider_id)
            .cloned()
            .collect())
    }

    async fn get_bookings_for_provider_on_date(
        &self,
        provider_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Booking>> {
        let data = self.data.lock().await;
        Ok(data
            .bookings
            .iter()
            .filter(|b| b.provider_id == provider_id && b.date == date)
            .cloned()
            .collect())
    }

    async fn insert_if_vacant(&self, booking: NewBooking) -> Result<InsertOutcome> {
        let mut data = self.data.lock().await;
        let slot = booking.slot();
        let taken = data.bookings.iter().any(|b| {
            b.provider_id == booking.provider_id && b.date == booking.date && b.blocks(&slot)
        });
        if taken {
            return Ok(InsertOutcome::Conflict);
        }

        let stored = booking.into_booking(uuid::Uuid::new_v4().to_string());
        data.bookings.push(stored.clone());
        Ok(InsertOutcome::Inserted(stored))
    }

    async fn get_booking(&self, booking_id: &str) -> Result<Booking> {
        let data = self.data.lock().await;
        data.bookings
            .iter()
            .find(|b| b.id == booking_id)
            .cloned()
            .ok_or_else(|| Self::not_found("booking", booking_id))
    }

    async fn update_booking_status(
        &self,
        booking_id: &str,
        status: BookingStatus,
    ) -> Result<Booking> {
        let mut data = self.data.lock().await;
        let booking = data
            .bookings
            .iter_mut()
            .find(|b| b.id == booking_id)
            .ok_or_else(|| Self::not_found("booking", booking_id))?;
        booking.status = status;
        Ok(booking.clone())
    }

    async fn delete_booking(&self, booking_id: &str) -> Result<()> {
        let mut data = self.data.lock().await;
        let before = data.bookings.len();
        data.bookings.retain(|b| b.id != booking_id);
        if data.bookings.len() == before {
            return Err(Self::not_found("booking", booking_id));
        }
        Ok(())
    }
}
