use crate::core::export::bookings_to_csv;
use crate::core::lifecycle::{authorize_delete, authorize_transition};
use crate::core::overlap::{filter_available, find_conflict};
use crate::core::slots::generate_slots;
use crate::core::validator::{commit, BookingRequest};
use crate::core::{BookingStore, ConfigProvider};
use crate::domain::model::{
    Booking, BookingResult, BookingStatus, InsertOutcome, RequestContext, Role, Service,
    TimeSlot, WorkingHours,
};
use crate::domain::time::{format_date, format_time};
use crate::utils::error::{BookingError, Result};
use crate::utils::validation::validate_non_empty_string;
use chrono::{NaiveDate, NaiveTime};

pub struct SlotEngine<S: BookingStore, C: ConfigProvider> {
    store: S,
    config: C,
}

impl<S: BookingStore, C: ConfigProvider> SlotEngine<S, C> {
    pub fn new(store: S, config: C) -> Self {
        Self { store, config }
    }

    /// 同時讀取營業時間與服務，兩者都到齊後才往下計算
    async fn load_schedule(
        &self,
        provider_id: &str,
        service_id: &str,
    ) -> Result<(WorkingHours, Service)> {
        let (hours, service) = tokio::try_join!(
            self.store.get_working_hours(provider_id),
            self.store.get_service_by_id(service_id),
        )?;
        Self::check_service_owner(provider_id, &service)?;
        Ok((hours, service))
    }

    fn check_service_owner(provider_id: &str, service: &Service) -> Result<()> {
        service.validate()?;
        if service.provider_id != provider_id {
            return Err(BookingError::invalid(
                "service_id",
                format!(
                    "service '{}' is offered by provider '{}', not '{}'",
                    service.id, service.provider_id, provider_id
                ),
            ));
        }
        Ok(())
    }

    fn candidates(&self, hours: &WorkingHours, service: &Service) -> Result<Vec<TimeSlot>> {
        generate_slots(
            hours,
            service.duration_minutes,
            self.config.trailing_slot_policy(),
        )
    }

    /// Ordered free slots for the service on `date`. An empty list is a normal outcome.
    pub async fn list_available_slots(
        &self,
        provider_id: &str,
        service_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<TimeSlot>> {
        validate_non_empty_string("provider_id", provider_id)?;
        validate_non_empty_string("service_id", service_id)?;

        tracing::debug!(
            "Loading schedule for provider {} service {} on {}",
            provider_id,
            service_id,
            format_date(date)
        );
        let (hours, service, bookings) = tokio::try_join!(
            self.store.get_working_hours(provider_id),
            self.store.get_service_by_id(service_id),
            self.store.get_bookings_for_provider_on_date(provider_id, date),
        )?;
        Self::check_service_owner(provider_id, &service)?;

        let candidates = self.candidates(&hours, &service)?;
        let total = candidates.len();
        let available = filter_available(candidates, &bookings);

        tracing::info!(
            "📅 Provider {} on {}: {} of {} slots free ({} min {})",
            provider_id,
            format_date(date),
            available.len(),
            total,
            service.duration_minutes,
            service.name
        );
        Ok(available)
    }

    pub async fn list_services(&self, provider_id: &str) -> Result<Vec<Service>> {
        validate_non_empty_string("provider_id", provider_id)?;
        let mut services = self.store.list_services(provider_id).await?;
        services.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(services)
    }

    /// 依開始時間找出產生器實際給出的時段，截短的最後一段也算
    pub async fn slot_starting_at(
        &self,
        provider_id: &str,
        service_id: &str,
        start: NaiveTime,
    ) -> Result<TimeSlot> {
        validate_non_empty_string("provider_id", provider_id)?;
        validate_non_empty_string("service_id", service_id)?;

        let (hours, service) = self.load_schedule(provider_id, service_id).await?;
        let slot = self
            .candidates(&hours, &service)?
            .into_iter()
            .find(|slot| slot.start == start)
            .ok_or_else(|| {
                BookingError::invalid(
                    "start",
                    format!(
                        "no {}-minute slot starts at {} within {:02}:00-{:02}:00",
                        service.duration_minutes,
                        format_time(start),
                        hours.start_hour,
                        hours.end_hour
                    ),
                )
            })?;
        tracing::debug!(
            "Start {} resolves to {} ({} min)",
            format_time(start),
            slot,
            slot.duration_minutes()
        );
        Ok(slot)
    }

    /// Like [`Self::list_available_slots`] but turns the empty state into `NoAvailableSlots`.
    pub async fn require_available_slots(
        &self,
        provider_id: &str,
        service_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<TimeSlot>> {
        let slots = self
            .list_available_slots(provider_id, service_id, date)
            .await?;
        if slots.is_empty() {
            return Err(BookingError::NoAvailableSlots {
                provider_id: provider_id.to_string(),
                date: format_date(date),
            });
        }
        Ok(slots)
    }

    pub async fn confirm_booking(
        &self,
        ctx: &RequestContext,
        provider_id: &str,
        patient_id: &str,
        service_id: &str,
        date: NaiveDate,
        slot: TimeSlot,
    ) -> BookingResult {
        self.confirm_booking_with_notes(ctx, provider_id, patient_id, service_id, date, slot, "")
            .await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn confirm_booking_with_notes(
        &self,
        ctx: &RequestContext,
        provider_id: &str,
        patient_id: &str,
        service_id: &str,
        date: NaiveDate,
        slot: TimeSlot,
        notes: &str,
    ) -> BookingResult {
        let request = match self
            .prepare_request(ctx, provider_id, patient_id, service_id, date, slot, notes)
            .await
        {
            Ok(request) => request,
            Err(e) => {
                tracing::error!("❌ Booking {} on {} rejected: {}", slot, format_date(date), e);
                return BookingResult::Failed(e);
            }
        };

        match commit(&self.store, request).await {
            Ok(InsertOutcome::Inserted(booking)) => {
                tracing::info!(
                    "✅ Booking {} confirmed: provider {} patient {} {} {}",
                    booking.id,
                    booking.provider_id,
                    booking.patient_id,
                    format_date(booking.date),
                    booking.slot()
                );
                BookingResult::Confirmed(booking)
            }
            Ok(InsertOutcome::Conflict) => BookingResult::SlotNoLongerAvailable,
            Err(e) => {
                tracing::error!("❌ Booking {} on {} failed: {}", slot, format_date(date), e);
                BookingResult::Failed(e)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn prepare_request(
        &self,
        ctx: &RequestContext,
        provider_id: &str,
        patient_id: &str,
        service_id: &str,
        date: NaiveDate,
        slot: TimeSlot,
        notes: &str,
    ) -> Result<BookingRequest> {
        validate_non_empty_string("provider_id", provider_id)?;
        validate_non_empty_string("patient_id", patient_id)?;
        validate_non_empty_string("service_id", service_id)?;

        if ctx.role == Role::Patient && ctx.actor_id != patient_id {
            return Err(BookingError::Forbidden {
                reason: "patients can only book for themselves".to_string(),
            });
        }

        let (hours, service) = self.load_schedule(provider_id, service_id).await?;
        if !hours.contains(&slot) {
            return Err(BookingError::invalid(
                "slot",
                format!(
                    "{} is outside working hours {:02}:00-{:02}:00",
                    slot, hours.start_hour, hours.end_hour
                ),
            ));
        }
        if !self.candidates(&hours, &service)?.contains(&slot) {
            return Err(BookingError::invalid(
                "slot",
                format!(
                    "{} is not a {}-minute slot within {:02}:00-{:02}:00",
                    slot, service.duration_minutes, hours.start_hour, hours.end_hour
                ),
            ));
        }

        Ok(BookingRequest {
            provider_id: provider_id.to_string(),
            patient_id: patient_id.to_string(),
            service_id: service_id.to_string(),
            date,
            slot,
            notes: notes.to_string(),
        })
    }

    pub async fn update_status(
        &self,
        ctx: &RequestContext,
        booking_id: &str,
        status: BookingStatus,
    ) -> Result<Booking> {
        let booking = self.store.get_booking(booking_id).await?;
        authorize_transition(ctx, &booking, status)?;

        if status == booking.status {
            return Ok(booking);
        }

        // 重新啟用已取消的預約前，要確認時段沒有被別人訂走
        if !booking.status.occupies_slot() && status.occupies_slot() {
            let same_day = self
                .store
                .get_bookings_for_provider_on_date(&booking.provider_id, booking.date)
                .await?;
            let others: Vec<Booking> = same_day
                .into_iter()
                .filter(|b| b.id != booking.id)
                .collect();
            if find_conflict(&booking.slot(), &others).is_some() {
                return Err(BookingError::SlotNoLongerAvailable {
                    date: format_date(booking.date),
                    slot: booking.slot().to_string(),
                });
            }
        }

        let updated = self.store.update_booking_status(booking_id, status).await?;
        tracing::info!(
            "🔄 Booking {} changed {} -> {} by {:?} {}",
            booking_id,
            booking.status,
            updated.status,
            ctx.role,
            ctx.actor_id
        );
        Ok(updated)
    }

    pub async fn cancel_booking(&self, ctx: &RequestContext, booking_id: &str) -> Result<Booking> {
        self.update_status(ctx, booking_id, BookingStatus::Cancelled)
            .await
    }

    pub async fn delete_booking(&self, ctx: &RequestContext, booking_id: &str) -> Result<()> {
        let booking = self.store.get_booking(booking_id).await?;
        authorize_delete(ctx, &booking)?;
        self.store.delete_booking(booking_id).await?;
        tracing::info!("🗑️ Booking {} deleted by admin {}", booking_id, ctx.actor_id);
        Ok(())
    }

    pub async fn export_day_schedule(&self, provider_id: &str, date: NaiveDate) -> Result<String> {
        validate_non_empty_string("provider_id", provider_id)?;
        let bookings = self
            .store
            .get_bookings_for_provider_on_date(provider_id, date)
            .await?;
        tracing::debug!(
            "Exporting {} bookings for provider {} on {}",
            bookings.len(),
            provider_id,
            format_date(date)
        );
        bookings_to_csv(&bookings)
    }
}
