use crate::domain::model::{
    Booking, BookingStatus, InsertOutcome, NewBooking, Service, WorkingHours,
};
use crate::domain::ports::BookingStore;
use crate::domain::time::format_date;
use crate::utils::error::{BookingError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// REST 文件儲存的用戶端。
///
/// The server owns the uniqueness constraint on (provider, date, interval) and answers
/// `409 Conflict` when `POST /providers/{id}/bookings` would double-book.
#[derive(Debug, Clone)]
pub struct HttpStore {
    base: Url,
    client: Client,
}

#[derive(Serialize)]
struct StatusPatch {
    status: BookingStatus,
}

impl HttpStore {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let mut base = Url::parse(endpoint).map_err(|e| BookingError::InvalidConfigValueError {
            field: "store.endpoint".to_string(),
            value: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { base, client })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| BookingError::invalid("url", e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, what: &str, id: &str, url: Url) -> Result<T> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BookingError::fetch(what, e))?;
        let response = Self::check_read(what, id, response)?;
        response
            .json::<T>()
            .await
            .map_err(|e| BookingError::fetch(what, e))
    }

    fn check_read(what: &str, id: &str, response: Response) -> Result<Response> {
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(BookingError::NotFound {
                entity: what.to_string(),
                id: id.to_string(),
            }),
            status => Err(BookingError::fetch(what, format!("server answered {}", status))),
        }
    }

    fn check_write(id: &str, response: Response) -> Result<Response> {
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(BookingError::NotFound {
                entity: "booking".to_string(),
                id: id.to_string(),
            }),
            status => Err(BookingError::PersistFailed {
                message: format!("server answered {}", status),
            }),
        }
    }
}

#[async_trait]
impl BookingStore for HttpStore {
    async fn get_working_hours(&self, provider_id: &str) -> Result<WorkingHours> {
        let url = self.url(&format!("providers/{}/working-hours", provider_id))?;
        self.get_json("working hours", provider_id, url).await
    }

    async fn get_service_by_id(&self, service_id: &str) -> Result<Service> {
        let url = self.url(&format!("services/{}", service_id))?;
        self.get_json("service", service_id, url).await
    }

    async fn list_services(&self, provider_id: &str) -> Result<Vec<Service>> {
        let url = self.url(&format!("providers/{}/services", provider_id))?;
        self.get_json("services", provider_id, url).await
    }

    async fn get_bookings_for_provider_on_date(
        &self,
        provider_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Booking>> {
        let mut url = self.url(&format!("providers/{}/bookings", provider_id))?;
        url.query_pairs_mut().append_pair("date", &format_date(date));
        self.get_json("bookings", provider_id, url).await
    }

    async fn insert_if_vacant(&self, booking: NewBooking) -> Result<InsertOutcome> {
        let url = self.url(&format!("providers/{}/bookings", booking.provider_id))?;
        tracing::debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .json(&booking)
            .send()
            .await
            .map_err(|e| BookingError::PersistFailed {
                message: e.to_string(),
            })?;

        if response.status() == StatusCode::CONFLICT {
            return Ok(InsertOutcome::Conflict);
        }
        let response = Self::check_write(&booking.provider_id, response)?;
        let stored = response
            .json::<Booking>()
            .await
            .map_err(|e| BookingError::PersistFailed {
                message: format!("unreadable response: {}", e),
            })?;
        Ok(InsertOutcome::Inserted(stored))
    }

    async fn get_booking(&self, booking_id: &str) -> Result<Booking> {
        let url = self.url(&format!("bookings/{}", booking_id))?;
        self.get_json("booking", booking_id, url).await
    }

    async fn update_booking_status(
        &self,
        booking_id: &str,
        status: BookingStatus,
    ) -> Result<Booking> {
        let url = self.url(&format!("bookings/{}", booking_id))?;
        tracing::debug!("PATCH {}", url);
        let response = self
            .client
            .patch(url)
            .json(&StatusPatch { status })
            .send()
            .await
            .map_err(|e| BookingError::PersistFailed {
                message: e.to_string(),
            })?;
        let response = Self::check_write(booking_id, response)?;
        response
            .json::<Booking>()
            .await
            .map_err(|e| BookingError::PersistFailed {
                message: format!("unreadable response: {}", e),
            })
    }

    async fn delete_booking(&self, booking_id: &str) -> Result<()> {
        let url = self.url(&format!("bookings/{}", booking_id))?;
        tracing::debug!("DELETE {}", url);
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|e| BookingError::PersistFailed {
                message: e.to_string(),
            })?;
        Self::check_write(booking_id, response)?;
        Ok(())
    }
}
