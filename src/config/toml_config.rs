use crate::domain::ports::{ConfigProvider, TrailingSlotPolicy};
use crate::utils::error::{BookingError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub store: StoreConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineSection {
    #[serde(default)]
    pub trailing_slot: TrailingSlotPolicy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Memory,
    Http,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub r#type: StoreKind,
    pub snapshot: Option<String>,
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub json: Option<bool>,
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("static pattern is valid"))
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BookingError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| BookingError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${STORE_URL})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        match self.store.r#type {
            StoreKind::Http => {
                let endpoint = validation::validate_required_field("store.endpoint", &self.store.endpoint)?;
                validation::validate_url("store.endpoint", endpoint)?;
            }
            StoreKind::Memory => {
                if let Some(snapshot) = &self.store.snapshot {
                    validation::validate_path("store.snapshot", snapshot)?;
                }
            }
        }

        if let Some(timeout) = self.store.timeout_seconds {
            validation::validate_positive_number("store.timeout_seconds", timeout, 1)?;
        }

        if let Some(level) = self.logging.as_ref().and_then(|l| l.level.as_deref()) {
            let valid_levels = ["trace", "debug", "info", "warn", "error"];
            if !valid_levels.contains(&level) {
                return Err(BookingError::InvalidConfigValueError {
                    field: "logging.level".to_string(),
                    value: level.to_string(),
                    reason: format!("Valid levels: {}", valid_levels.join(", ")),
                });
            }
        }

        Ok(())
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store.timeout_seconds.unwrap_or(10))
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn trailing_slot_policy(&self) -> TrailingSlotPolicy {
        self.engine.trailing_slot
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[engine]
trailing_slot = "truncate"

[store]
type = "http"
endpoint = "https://clinic.example.com/api"
timeout_seconds = 3

[logging]
level = "debug"
json = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.trailing_slot_policy(), TrailingSlotPolicy::Truncate);
        assert_eq!(config.store.r#type, StoreKind::Http);
        assert_eq!(config.store_timeout(), Duration::from_secs(3));
        assert_eq!(config.log_level(), Some("debug"));
        assert!(config.json_logs());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_drop_trailing_slot_and_use_memory_store() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config.trailing_slot_policy(), TrailingSlotPolicy::Drop);
        assert_eq!(config.store.r#type, StoreKind::Memory);
        assert_eq!(config.store_timeout(), Duration::from_secs(10));
        assert!(!config.json_logs());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("CLINIC_SLOTS_TEST_STORE_URL", "https://store.test");

        let toml_content = r#"
[store]
type = "http"
endpoint = "${CLINIC_SLOTS_TEST_STORE_URL}/v1"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.store.endpoint.as_deref(), Some("https://store.test/v1"));

        std::env::remove_var("CLINIC_SLOTS_TEST_STORE_URL");
    }

    #[test]
    fn test_http_store_requires_valid_endpoint() {
        let missing = TomlConfig::from_toml_str("[store]\ntype = \"http\"\n").unwrap();
        assert!(matches!(
            missing.validate(),
            Err(BookingError::MissingConfigError { .. })
        ));

        let unset = TomlConfig::from_toml_str(
            "[store]\ntype = \"http\"\nendpoint = \"${CLINIC_SLOTS_UNSET_VAR}\"\n",
        )
        .unwrap();
        assert!(unset.validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_policy_and_level() {
        assert!(TomlConfig::from_toml_str("[engine]\ntrailing_slot = \"round\"\n").is_err());

        let config = TomlConfig::from_toml_str("[logging]\nlevel = \"loud\"\n").unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str("[store]\ntimeout_seconds = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[store]\ntype = \"memory\"\nsnapshot = \"./clinic.json\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.store.snapshot.as_deref(), Some("./clinic.json"));
    }
}
