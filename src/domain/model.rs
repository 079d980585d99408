use crate::domain::time::{self, hhmm};
use crate::utils::error::{BookingError, Result};
use crate::utils::validation::validate_range;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingHours {
    pub provider_id: String,
    pub start_hour: u8,
    pub end_hour: u8,
}

impl WorkingHours {
    pub fn new(provider_id: impl Into<String>, start_hour: u8, end_hour: u8) -> Result<Self> {
        let hours = Self {
            provider_id: provider_id.into(),
            start_hour,
            end_hour,
        };
        hours.validate()?;
        Ok(hours)
    }

    /// Hours arrive from the store unchecked, so the engine re-validates them before use.
    pub fn validate(&self) -> Result<()> {
        validate_range("start_hour", self.start_hour, 0, 23)?;
        validate_range("end_hour", self.end_hour, 0, 23)?;
        if self.start_hour >= self.end_hour {
            return Err(BookingError::invalid(
                "working_hours",
                format!(
                    "start hour {} must be before end hour {}",
                    self.start_hour, self.end_hour
                ),
            ));
        }
        Ok(())
    }

    pub fn opens_at(&self) -> u32 {
        u32::from(self.start_hour) * 60
    }

    pub fn closes_at(&self) -> u32 {
        u32::from(self.end_hour) * 60
    }

    pub fn contains(&self, slot: &TimeSlot) -> bool {
        slot.start_minute() >= self.opens_at() && slot.end_minute() <= self.closes_at()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub provider_id: String,
    pub name: String,
    pub price: u32,
    pub duration_minutes: u32,
}

impl Service {
    pub fn validate(&self) -> Result<()> {
        if self.duration_minutes == 0 {
            return Err(BookingError::invalid(
                "duration_minutes",
                format!("service '{}' must last at least one minute", self.id),
            ));
        }
        Ok(())
    }
}

/// 預約時段，半開區間 `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl TimeSlot {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self> {
        if start >= end {
            return Err(BookingError::invalid(
                "slot",
                format!("{} must start before it ends", Self { start, end }),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn start_minute(&self) -> u32 {
        time::minute_of_day(self.start)
    }

    pub fn end_minute(&self) -> u32 {
        time::minute_of_day(self.end)
    }

    pub fn duration_minutes(&self) -> u32 {
        self.end_minute() - self.start_minute()
    }

    /// `[a,b)` 與 `[c,d)` 重疊若且唯若 `a < d && b > c`
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && self.end > other.start
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            time::format_time(self.start),
            time::format_time(self.end)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookingStatus {
    Confirmed,
    Pending,
    Cancelled,
    Completed,
    NoShow,
}

impl BookingStatus {
    /// Every status except `cancelled` holds its interval.
    pub fn occupies_slot(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Cancelled | BookingStatus::Completed | BookingStatus::NoShow
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Pending => "pending",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
            BookingStatus::NoShow => "no-show",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "pending" => Ok(BookingStatus::Pending),
            "cancelled" | "canceled" => Ok(BookingStatus::Cancelled),
            "completed" => Ok(BookingStatus::Completed),
            "no-show" | "noshow" | "no_show" => Ok(BookingStatus::NoShow),
            other => Err(BookingError::invalid(
                "status",
                format!(
                    "'{}' is not one of confirmed, pending, cancelled, completed, no-show",
                    other
                ),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub provider_id: String,
    pub patient_id: String,
    pub service_id: String,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub status: BookingStatus,
    #[serde(default)]
    pub notes: String,
}

impl Booking {
    pub fn slot(&self) -> TimeSlot {
        TimeSlot {
            start: self.start_time,
            end: self.end_time,
        }
    }

    pub fn blocks(&self, slot: &TimeSlot) -> bool {
        self.status.occupies_slot() && self.slot().overlaps(slot)
    }
}

/// 尚未寫入的預約，id 由 store 指派
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub provider_id: String,
    pub patient_id: String,
    pub service_id: String,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub status: BookingStatus,
    #[serde(default)]
    pub notes: String,
}

impl NewBooking {
    pub fn slot(&self) -> TimeSlot {
        TimeSlot {
            start: self.start_time,
            end: self.end_time,
        }
    }

    pub fn into_booking(self, id: String) -> Booking {
        Booking {
            id,
            provider_id: self.provider_id,
            patient_id: self.patient_id,
            service_id: self.service_id,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            status: self.status,
            notes: self.notes,
        }
    }
}

/// Result of the store's conditional write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(Booking),
    Conflict,
}

#[derive(Debug)]
pub enum BookingResult {
    Confirmed(Booking),
    SlotNoLongerAvailable,
    Failed(BookingError),
}

impl BookingResult {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, BookingResult::Confirmed(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
    Admin,
}

impl FromStr for Role {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "patient" => Ok(Role::Patient),
            "doctor" | "provider" => Ok(Role::Doctor),
            "admin" => Ok(Role::Admin),
            other => Err(BookingError::invalid(
                "role",
                format!("'{}' is not one of patient, doctor, admin", other),
            )),
        }
    }
}

/// Who is acting. Passed explicitly to every mutating call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub actor_id: String,
    pub role: Role,
}

impl RequestContext {
    pub fn new(actor_id: impl Into<String>, role: Role) -> Self {
        Self {
            actor_id: actor_id.into(),
            role,
        }
    }

    pub fn patient(actor_id: impl Into<String>) -> Self {
        Self::new(actor_id, Role::Patient)
    }

    pub fn doctor(actor_id: impl Into<String>) -> Self {
        Self::new(actor_id, Role::Doctor)
    }

    pub fn admin(actor_id: impl Into<String>) -> Self {
        Self::new(actor_id, Role::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(start: &str, end: &str) -> TimeSlot {
        TimeSlot::new(
            time::parse_time(start).unwrap(),
            time::parse_time(end).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_half_open_overlap() {
        let nine = slot("09:00", "09:30");
        assert!(nine.overlaps(&slot("09:15", "09:45")));
        assert!(nine.overlaps(&slot("08:00", "10:00")));
        // touching edges do not overlap
        assert!(!nine.overlaps(&slot("09:30", "10:00")));
        assert!(!nine.overlaps(&slot("08:30", "09:00")));
    }

    #[test]
    fn test_working_hours_validation() {
        assert!(WorkingHours::new("doc-1", 8, 17).is_ok());
        assert!(WorkingHours::new("doc-1", 10, 10).is_err());
        assert!(WorkingHours::new("doc-1", 12, 9).is_err());
        assert!(matches!(
            WorkingHours::new("doc-1", 8, 24),
            Err(BookingError::InvalidInput { field, .. }) if field == "end_hour"
        ));
    }

    #[test]
    fn test_working_hours_contain_slots_inside_the_window() {
        let hours = WorkingHours::new("doc-1", 8, 9).unwrap();
        let slot = |start: &str, end: &str| {
            TimeSlot::new(time::parse_time(start).unwrap(), time::parse_time(end).unwrap()).unwrap()
        };
        assert!(hours.contains(&slot("08:40", "09:00")));
        assert!(!hours.contains(&slot("08:40", "09:20")));
        assert!(!hours.contains(&slot("07:30", "08:00")));
    }

    #[test]
    fn test_status_parsing_and_wire_format() {
        assert_eq!("no-show".parse::<BookingStatus>().unwrap(), BookingStatus::NoShow);
        assert_eq!("Cancelled".parse::<BookingStatus>().unwrap(), BookingStatus::Cancelled);
        assert!("archived".parse::<BookingStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&BookingStatus::NoShow).unwrap(),
            "\"no-show\""
        );
        assert!(!BookingStatus::Cancelled.occupies_slot());
        assert!(BookingStatus::NoShow.occupies_slot());
    }

    #[test]
    fn test_booking_serializes_boundary_strings() {
        let booking = Booking {
            id: "b-1".to_string(),
            provider_id: "doc-1".to_string(),
            patient_id: "pat-1".to_string(),
            service_id: "svc-1".to_string(),
            date: time::parse_date("2024-05-01").unwrap(),
            start_time: time::parse_time("09:00").unwrap(),
            end_time: time::parse_time("09:30").unwrap(),
            status: BookingStatus::Confirmed,
            notes: String::new(),
        };

        let json = serde_json::to_value(&booking).unwrap();
        assert_eq!(json["date"], "2024-05-01");
        assert_eq!(json["startTime"], "09:00");
        assert_eq!(json["endTime"], "09:30");
        assert_eq!(json["providerId"], "doc-1");
    }
}
