use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::{
    debounce::{DEFAULT_MIN_QUERY_CHARS, DEFAULT_QUIET_PERIOD},
    gateway::{cached::DEFAULT_TTL, weatherapi::DEFAULT_BASE_URL},
    model::ForecastDays,
};

/// Environment variable that overrides `api_key` from the config file.
pub const API_KEY_ENV: &str = "WEATHER_API_KEY";

pub const DEFAULT_CITY: &str = "Seoul";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// default_city = "Seoul"
/// forecast_days = 7
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    /// City shown when nothing has been picked yet.
    pub default_city: String,
    pub forecast_days: ForecastDays,
    pub search_debounce_ms: u64,
    pub min_query_chars: usize,
    /// Freshness window for repeated searches and forecasts; 0 disables it.
    pub cache_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_city: DEFAULT_CITY.to_string(),
            forecast_days: ForecastDays::default(),
            search_debounce_ms: DEFAULT_QUIET_PERIOD.as_millis() as u64,
            min_query_chars: DEFAULT_MIN_QUERY_CHARS,
            cache_ttl_secs: DEFAULT_TTL.as_secs(),
        }
    }
}

/// The knobs the workflow controller needs, detached from file handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSettings {
    pub default_city: String,
    pub forecast_days: ForecastDays,
    pub search_quiet_period: Duration,
    pub min_query_chars: usize,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Config::default().workflow_settings()
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet,
    /// then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let cfg = Self::load_from(&path)?;
        Ok(cfg.with_env_overrides(|name| std::env::var(name).ok()))
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, use defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Apply overrides read through `lookup` (normally the process environment).
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        self
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// Returns the API key or a hint on how to configure one.
    pub fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No API key configured for WeatherAPI.com.\n\
                     Hint: set {API_KEY_ENV} or run `weather configure` and enter your API key."
                )
            })
    }

    pub fn workflow_settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            default_city: self.default_city.clone(),
            forecast_days: self.forecast_days,
            search_quiet_period: Duration::from_millis(self.search_debounce_ms),
            min_query_chars: self.min_query_chars,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_errors_when_not_set() {
        let cfg = Config::default();
        let err = cfg.api_key().unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("No API key configured"));
        assert!(msg.contains("Hint: set WEATHER_API_KEY"));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let cfg = Config {
            api_key: Some("   ".into()),
            ..Config::default()
        };
        assert!(cfg.api_key().is_err());
    }

    #[test]
    fn env_override_wins_over_file() {
        let mut cfg = Config::default();
        cfg.set_api_key("FILE_KEY".into());

        let cfg = cfg.with_env_overrides(|name| {
            (name == API_KEY_ENV).then(|| "ENV_KEY".to_string())
        });

        assert_eq!(cfg.api_key().ok(), Some("ENV_KEY"));
    }

    #[test]
    fn empty_env_value_is_ignored() {
        let mut cfg = Config::default();
        cfg.set_api_key("FILE_KEY".into());

        let cfg = cfg.with_env_overrides(|_| Some(String::new()));

        assert_eq!(cfg.api_key().ok(), Some("FILE_KEY"));
    }

    #[test]
    fn defaults_match_workflow_design() {
        let settings = Config::default().workflow_settings();

        assert_eq!(settings.default_city, "Seoul");
        assert_eq!(settings.forecast_days.get(), 7);
        assert_eq!(settings.search_quiet_period, Duration::from_millis(500));
        assert_eq!(settings.min_query_chars, 3);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "default_city = \"Tokyo\"\nforecast_days = 3\n").expect("write");

        let cfg = Config::load_from(&path).expect("load");

        assert_eq!(cfg.default_city, "Tokyo");
        assert_eq!(cfg.forecast_days.get(), 3);
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.cache_ttl_secs, 900);
    }

    #[test]
    fn out_of_range_days_fail_to_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "forecast_days = 20\n").expect("write");

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from(&dir.path().join("absent.toml")).expect("load");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn save_then_load_keeps_api_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.save_to(&path).expect("save");

        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded.api_key().ok(), Some("KEY"));
    }
}
