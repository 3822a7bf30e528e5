use crate::error::{AppError, AppResult};
use crate::models::{Combo, default_combos};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub storefront: StorefrontConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default = "default_combos")]
    pub combos: Vec<Combo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub token_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorefrontConfig {
    pub show_id: Option<String>,
    pub countdown_secs: u32,
    pub countdown_tick_ms: u64,
    pub handoff_delay_ms: u64,
    pub max_quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub ticket_interval_ms: u64,
    pub ticket_max_attempts: Option<u32>,
    pub ticket_max_duration_secs: Option<u64>,
    pub monitor_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            auth: AuthConfig::default(),
            storefront: StorefrontConfig::default(),
            polling: PollingConfig::default(),
            combos: default_combos(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            timeout_secs: 15,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_path: PathBuf::from(".ticketdesk/session.json"),
        }
    }
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            show_id: None,
            countdown_secs: 15,
            countdown_tick_ms: 1000,
            handoff_delay_ms: 500,
            max_quantity: 10,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            ticket_interval_ms: 2000,
            ticket_max_attempts: None,
            ticket_max_duration_secs: Some(600),
            monitor_interval_ms: 6000,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl StorefrontConfig {
    pub fn countdown_tick(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_ms)
    }

    pub fn handoff_delay(&self) -> Duration {
        Duration::from_millis(self.handoff_delay_ms)
    }
}

impl PollingConfig {
    pub fn ticket_interval(&self) -> Duration {
        Duration::from_millis(self.ticket_interval_ms)
    }

    pub fn ticket_max_duration(&self) -> Option<Duration> {
        self.ticket_max_duration_secs.map(Duration::from_secs)
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms)
    }
}

impl Config {
    pub fn from_toml() -> AppResult<Self> {
        let config_path =
            env::var("TICKETDESK_CONFIG").unwrap_or_else(|_| "ticketdesk.toml".to_string());
        Self::load(&config_path)
    }

    /// 读取配置文件；文件不存在时使用默认值，之后统一用环境变量覆盖
    pub fn load(config_path: &str) -> AppResult<Self> {
        use std::io::ErrorKind;

        let mut config: Config = match std::fs::read_to_string(config_path) {
            Ok(config_str) => toml::from_str(&config_str)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("No config file at {config_path}, using defaults");
                Config::default()
            }
            Err(e) => {
                return Err(AppError::ConfigError(format!(
                    "Cannot read config file {config_path}: {e}"
                )));
            }
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(v) = env::var("TICKETDESK_API_URL") {
            self.api.base_url = v;
        }
        if let Ok(v) = env::var("TICKETDESK_API_TIMEOUT")
            && let Ok(n) = v.parse()
        {
            self.api.timeout_secs = n;
        }
        if let Ok(v) = env::var("TICKETDESK_TOKEN_PATH") {
            self.auth.token_path = PathBuf::from(v);
        }
        if let Ok(v) = env::var("TICKETDESK_SHOW_ID") {
            self.storefront.show_id = Some(v);
        }
        if let Ok(v) = env::var("TICKETDESK_POLL_INTERVAL_MS")
            && let Ok(n) = v.parse()
        {
            self.polling.ticket_interval_ms = n;
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(AppError::ConfigError("api.base_url must not be empty".into()));
        }
        if self.storefront.countdown_tick_ms == 0
            || self.polling.ticket_interval_ms == 0
            || self.polling.monitor_interval_ms == 0
        {
            return Err(AppError::ConfigError(
                "timer intervals must be greater than zero".into(),
            ));
        }
        if self.storefront.max_quantity == 0 {
            return Err(AppError::ConfigError(
                "storefront.max_quantity must be at least 1".into(),
            ));
        }
        if self.combos.is_empty() {
            return Err(AppError::ConfigError("combo catalog is empty".into()));
        }
        let mut ids = HashSet::new();
        for combo in &self.combos {
            if !ids.insert(combo.id.as_str()) {
                return Err(AppError::ConfigError(format!(
                    "duplicate combo id: {}",
                    combo.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.storefront.countdown_secs, 15);
        assert_eq!(config.polling.ticket_interval_ms, 2000);
        assert_eq!(config.polling.monitor_interval_ms, 6000);
        assert_eq!(config.combos.len(), 3);
    }

    #[test]
    fn test_partial_file_keeps_section_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[api]
base_url = "https://tickets.example.com/api"

[[combos]]
id = "solo"
name = "Solo"
unit_price = 500000
"#
        )
        .unwrap();

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.api.base_url, "https://tickets.example.com/api");
        assert_eq!(config.api.timeout_secs, 15);
        assert_eq!(config.storefront.handoff_delay_ms, 500);
        assert_eq!(config.combos.len(), 1);
        assert!(!config.combos[0].popular);
    }

    #[test]
    fn test_storefront_section_alone_loads() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[storefront]\nshow_id = \"show-42\"").unwrap();

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.storefront.show_id.as_deref(), Some("show-42"));
        assert_eq!(config.storefront.countdown_secs, 15);
        assert_eq!(config.storefront.max_quantity, 10);
        assert_eq!(config.polling.ticket_max_duration_secs, Some(600));
    }

    #[test]
    fn test_partial_polling_section_keeps_duration_bound() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[polling]\nticket_interval_ms = 3000\nmonitor_interval_ms = 6000"
        )
        .unwrap();

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.polling.ticket_interval_ms, 3000);
        assert_eq!(config.polling.ticket_max_attempts, None);
        assert_eq!(
            config.polling.ticket_max_duration(),
            Some(Duration::from_secs(600))
        );
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.combos.len(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duplicate_combo_ids_rejected() {
        let mut config = Config::default();
        let dup = config.combos[0].clone();
        config.combos.push(dup);
        assert!(matches!(config.validate(), Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = Config::default();
        config.polling.ticket_interval_ms = 0;
        assert!(config.validate().is_err());
    }
}
