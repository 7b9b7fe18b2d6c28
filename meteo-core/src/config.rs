use anyhow::{Context, Result, anyhow, ensure};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_TODAY_URL: &str =
    "https://www.meteoromania.ro/wp-json/meteoapi/v2/starea-vremii";
pub const DEFAULT_FORECAST_URL: &str = "https://www.meteoromania.ro/anm/prognoza-orase-xml.php";

/// Threshold used by `trend` when neither the command line nor the config sets one.
pub const DEFAULT_TREND_THRESHOLD: f64 = 1.0;

/// Where the two upstream feeds live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_today_url")]
    pub today_url: String,

    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,

    /// Request timeout; absent means requests never time out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_today_url() -> String {
    DEFAULT_TODAY_URL.to_string()
}

fn default_forecast_url() -> String {
    DEFAULT_FORECAST_URL.to_string()
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            today_url: default_today_url(),
            forecast_url: default_forecast_url(),
            timeout_secs: None,
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// default_city = "Iasi"
/// trend_threshold = 0.5
///
/// [feeds]
/// today_url = "https://..."
/// forecast_url = "https://..."
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub feeds: FeedConfig,

    pub default_city: Option<String>,

    pub trend_threshold: Option<f64>,
}

impl Config {
    /// Resolve the city to query: the explicit argument wins over `default_city`.
    pub fn resolve_city(&self, explicit: Option<String>) -> Result<String> {
        explicit.or_else(|| self.default_city.clone()).ok_or_else(|| {
            anyhow!(
                "No city given and no default city configured.\n\
                 Hint: pass a city or run `meteo configure` to set a default."
            )
        })
    }

    pub fn trend_threshold(&self) -> f64 {
        self.trend_threshold.unwrap_or(DEFAULT_TREND_THRESHOLD)
    }

    pub fn set_trend_threshold(&mut self, threshold: f64) -> Result<()> {
        ensure!(
            threshold.is_finite() && threshold >= 0.0,
            "Trend threshold must be a non-negative number, got {threshold}"
        );
        self.trend_threshold = Some(threshold);
        Ok(())
    }

    pub fn set_default_city(&mut self, city: &str) {
        let city = city.trim();
        self.default_city = (!city.is_empty()).then(|| city.to_string());
    }

    pub fn set_feed_urls(&mut self, today_url: &str, forecast_url: &str) -> Result<()> {
        ensure!(!today_url.trim().is_empty(), "Today feed URL cannot be empty");
        ensure!(!forecast_url.trim().is_empty(), "Forecast feed URL cannot be empty");
        self.feeds.today_url = today_url.trim().to_string();
        self.feeds.forecast_url = forecast_url.trim().to_string();
        Ok(())
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
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
        let dirs = ProjectDirs::from("ro", "meteo", "meteo-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_points_at_public_feeds() {
        let cfg = Config::default();
        assert_eq!(cfg.feeds.today_url, DEFAULT_TODAY_URL);
        assert_eq!(cfg.feeds.forecast_url, DEFAULT_FORECAST_URL);
        assert_eq!(cfg.feeds.timeout_secs, None);
        assert_eq!(cfg.trend_threshold(), DEFAULT_TREND_THRESHOLD);
    }

    #[test]
    fn resolve_city_prefers_explicit_argument() {
        let mut cfg = Config::default();
        cfg.set_default_city("Iasi");

        assert_eq!(cfg.resolve_city(Some("Arad".into())).unwrap(), "Arad");
        assert_eq!(cfg.resolve_city(None).unwrap(), "Iasi");
    }

    #[test]
    fn resolve_city_errors_without_default() {
        let err = Config::default().resolve_city(None).unwrap_err();
        assert!(err.to_string().contains("No city given"));
    }

    #[test]
    fn blank_default_city_clears_it() {
        let mut cfg = Config::default();
        cfg.set_default_city("Iasi");
        cfg.set_default_city("   ");
        assert_eq!(cfg.default_city, None);
    }

    #[test]
    fn negative_threshold_is_rejected() {
        let mut cfg = Config::default();
        assert!(cfg.set_trend_threshold(-0.5).is_err());
        assert!(cfg.set_trend_threshold(f64::NAN).is_err());
        cfg.set_trend_threshold(0.0).unwrap();
        assert_eq!(cfg.trend_threshold(), 0.0);
    }

    #[test]
    fn empty_feed_url_is_rejected() {
        let mut cfg = Config::default();
        assert!(cfg.set_feed_urls("", "http://x").is_err());
        assert_eq!(cfg.feeds, FeedConfig::default());
    }

    #[test]
    fn partial_toml_fills_in_feed_defaults() {
        let cfg: Config = toml::from_str("default_city = \"Cluj-Napoca\"\n").unwrap();
        assert_eq!(cfg.default_city.as_deref(), Some("Cluj-Napoca"));
        assert_eq!(cfg.feeds, FeedConfig::default());

        let cfg: Config = toml::from_str("[feeds]\ntimeout_secs = 10\n").unwrap();
        assert_eq!(cfg.feeds.timeout_secs, Some(10));
        assert_eq!(cfg.feeds.today_url, DEFAULT_TODAY_URL);
    }

    #[test]
    fn save_then_load_restores_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_default_city("Timisoara");
        cfg.set_trend_threshold(0.5).unwrap();
        cfg.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }
}
