use crate::clock::BusinessClock;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

pub const DEFAULT_EXCLUDED_PROVIDER: &str = "E.ON Energie Deutschland GmbH";
pub const DEFAULT_TIMEZONE: &str = "Europe/Berlin";
pub const DEFAULT_INSERT_BATCH_SIZE: usize = 30_000;

/// Runtime configuration of a calculation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite database holding reference data and results.
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Directory the price snapshots are read from.
    #[serde(default = "default_snapshot_root")]
    pub snapshot_root: String,
    /// Observations of this provider are never competitors.
    #[serde(default = "default_excluded_provider")]
    pub excluded_provider: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_insert_batch_size")]
    pub insert_batch_size: usize,
    /// Round the tariff price to cents (halves to even) before computing caps.
    /// Production has always run with the unrounded price.
    #[serde(default)]
    pub round_eonprice: bool,
}

fn default_database_path() -> String { "bonus.db".into() }
fn default_snapshot_root() -> String { "./snapshots".into() }
fn default_excluded_provider() -> String { DEFAULT_EXCLUDED_PROVIDER.into() }
fn default_timezone() -> String { DEFAULT_TIMEZONE.into() }
fn default_insert_batch_size() -> usize { DEFAULT_INSERT_BATCH_SIZE }

impl AppConfig {
    /// Load from a JSON file. Missing fields fall back to defaults.
    /// In tests, use AppConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Config with hardcoded defaults for use in tests.
    pub fn default_test() -> Self {
        Self {
            database_path:     ":memory:".into(),
            snapshot_root:     "./snapshots".into(),
            excluded_provider: DEFAULT_EXCLUDED_PROVIDER.into(),
            timezone:          DEFAULT_TIMEZONE.into(),
            insert_batch_size: DEFAULT_INSERT_BATCH_SIZE,
            round_eonprice:    false,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.tz()?;
        if self.insert_batch_size == 0 {
            anyhow::bail!("insert_batch_size must be at least 1");
        }
        Ok(())
    }

    pub fn tz(&self) -> anyhow::Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Unknown time zone {}: {e}", self.timezone))
    }

    pub fn clock(&self) -> anyhow::Result<BusinessClock> {
        Ok(BusinessClock::new(self.tz()?))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path:     default_database_path(),
            snapshot_root:     default_snapshot_root(),
            excluded_provider: default_excluded_provider(),
            timezone:          default_timezone(),
            insert_batch_size: default_insert_batch_size(),
            round_eonprice:    false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "database_path": "/var/lib/bonus/bonus.db" }"#).unwrap();
        assert_eq!(config.database_path, "/var/lib/bonus/bonus.db");
        assert_eq!(config.excluded_provider, DEFAULT_EXCLUDED_PROVIDER);
        assert_eq!(config.insert_batch_size, 30_000);
        assert_eq!(config.tz().unwrap(), chrono_tz::Europe::Berlin);
        assert!(!config.round_eonprice);
    }

    #[test]
    fn unknown_time_zone_is_rejected() {
        let config = AppConfig { timezone: "Mars/Olympus".into(), ..AppConfig::default_test() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_reports_the_path() {
        let err = AppConfig::load("/nonexistent/bonus.json").unwrap_err();
        assert!(err.to_string().contains("Cannot read /nonexistent/bonus.json"));
    }
}
