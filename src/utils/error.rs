use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Failed to fetch {what}: {message}")]
    DataFetchFailed { what: String, message: String },

    #[error("No available slots for provider {provider_id} on {date}")]
    NoAvailableSlots { provider_id: String, date: String },

    #[error("Slot {slot} on {date} is no longer available")]
    SlotNoLongerAvailable { date: String, slot: String },

    #[error("Failed to persist booking: {message}")]
    PersistFailed { message: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Action not permitted: {reason}")]
    Forbidden { reason: String },

    #[error("Cannot change booking status from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Availability,
    Conflict,
    Storage,
    Input,
    Permission,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BookingError {
    pub fn fetch(what: impl Into<String>, message: impl ToString) -> Self {
        BookingError::DataFetchFailed {
            what: what.into(),
            message: message.to_string(),
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        BookingError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            BookingError::NoAvailableSlots { .. } => ErrorCategory::Availability,
            BookingError::SlotNoLongerAvailable { .. } | BookingError::InvalidTransition { .. } => {
                ErrorCategory::Conflict
            }
            BookingError::DataFetchFailed { .. }
            | BookingError::PersistFailed { .. }
            | BookingError::NotFound { .. }
            | BookingError::HttpError(_) => ErrorCategory::Storage,
            BookingError::InvalidInput { .. } => ErrorCategory::Input,
            BookingError::Forbidden { .. } => ErrorCategory::Permission,
            BookingError::ConfigValidationError { .. }
            | BookingError::InvalidConfigValueError { .. }
            | BookingError::MissingConfigError { .. } => ErrorCategory::Configuration,
            BookingError::CsvError(_)
            | BookingError::IoError(_)
            | BookingError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Availability => ErrorSeverity::Low,
            ErrorCategory::Conflict | ErrorCategory::Storage => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Permission | ErrorCategory::Configuration => {
                ErrorSeverity::High
            }
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 只有寫入失敗值得使用者重試，讀取失敗與其他錯誤都是該次操作的終點
    pub fn is_retryable(&self) -> bool {
        matches!(self, BookingError::PersistFailed { .. })
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            BookingError::DataFetchFailed { what, .. } => {
                format!("Could not load {}. Please check your connection.", what)
            }
            BookingError::NoAvailableSlots { date, .. } => {
                format!("There are no free appointments on {}.", date)
            }
            BookingError::SlotNoLongerAvailable { slot, .. } => {
                format!("The {} slot was just taken. Please pick another time.", slot)
            }
            BookingError::PersistFailed { .. } => {
                "Your appointment could not be saved. Please try again.".to_string()
            }
            BookingError::NotFound { entity, .. } => format!("The requested {} does not exist.", entity),
            BookingError::Forbidden { .. } => "You are not allowed to do that.".to_string(),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Availability => "Try another date or service",
            ErrorCategory::Conflict => "List the available slots again and choose a new one",
            ErrorCategory::Storage => "Check that the store is reachable, then retry",
            ErrorCategory::Input => "Dates use yyyy-MM-dd and times use HH:mm",
            ErrorCategory::Permission => "Run the command as the owning provider or an admin",
            ErrorCategory::Configuration => "Fix the configuration file and run check-config",
            ErrorCategory::System => "Check file permissions and disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, BookingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_follows_category() {
        let empty = BookingError::NoAvailableSlots {
            provider_id: "doc-1".to_string(),
            date: "2024-05-01".to_string(),
        };
        assert_eq!(empty.severity(), ErrorSeverity::Low);

        let taken = BookingError::SlotNoLongerAvailable {
            date: "2024-05-01".to_string(),
            slot: "09:00-09:30".to_string(),
        };
        assert_eq!(taken.category(), ErrorCategory::Conflict);
        assert_eq!(taken.severity(), ErrorSeverity::Medium);

        let config = BookingError::MissingConfigError {
            field: "store.endpoint".to_string(),
        };
        assert_eq!(config.severity(), ErrorSeverity::High);
    }

    #[test]
    fn test_only_persist_failures_are_retryable() {
        assert!(BookingError::PersistFailed {
            message: "quota".to_string()
        }
        .is_retryable());
        assert!(!BookingError::fetch("bookings", "timeout").is_retryable());
        assert!(!BookingError::invalid("date", "bad").is_retryable());
    }
}
