//! User preferences. Stored as one flat camelCase JSON object; unknown keys are ignored and
//! missing keys take their defaults.

pub mod store;

use std::fmt::Display;

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::level_filters::LevelFilter;

use crate::export::ExportFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// How long records are kept. Stored as a day count where `-1` means forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum DataRetention {
    Days(u32),
    Forever,
}

impl Default for DataRetention {
    fn default() -> Self {
        DataRetention::Days(90)
    }
}

impl TryFrom<i64> for DataRetention {
    type Error = String;

    fn try_from(value: i64) -> std::result::Result<Self, Self::Error> {
        match value {
            -1 => Ok(DataRetention::Forever),
            1.. => u32::try_from(value)
                .map(DataRetention::Days)
                .map_err(|_| format!("data retention of {value} days is too large")),
            _ => Err(format!(
                "data retention must be -1 or a positive number of days, got {value}"
            )),
        }
    }
}

impl From<DataRetention> for i64 {
    fn from(value: DataRetention) -> Self {
        match value {
            DataRetention::Days(days) => days.into(),
            DataRetention::Forever => -1,
        }
    }
}

impl Display for DataRetention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataRetention::Days(days) => write!(f, "{days} days"),
            DataRetention::Forever => write!(f, "forever"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub notifications: bool,
    pub auto_start: bool,
    pub minimize_to_tray: bool,
    pub track_idle_time: bool,
    /// Seconds without input before the user counts as idle.
    pub idle_threshold: u64,
    pub data_retention: DataRetention,
    pub export_format: ExportFormat,
    /// Milliseconds between tracker samples.
    pub update_interval: u64,
    pub enable_logging: bool,
    pub log_level: LogLevel,
    pub privacy_mode: bool,
    pub auto_backup: bool,
    /// Days between backups.
    pub backup_interval: u32,
    pub theme: Theme,
    pub auto_refresh: bool,
    /// Seconds between dashboard refreshes.
    pub refresh_interval: u64,
    pub monitored_apps: Vec<String>,
    pub blacklisted_apps: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notifications: true,
            auto_start: true,
            minimize_to_tray: true,
            track_idle_time: false,
            idle_threshold: 300,
            data_retention: DataRetention::default(),
            export_format: ExportFormat::Csv,
            update_interval: 1000,
            enable_logging: true,
            log_level: LogLevel::Info,
            privacy_mode: false,
            auto_backup: false,
            backup_interval: 7,
            theme: Theme::Light,
            auto_refresh: false,
            refresh_interval: 30,
            monitored_apps: vec![],
            blacklisted_apps: vec![],
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.idle_threshold == 0 {
            bail!("idleThreshold must be greater than 0");
        }
        if self.update_interval == 0 {
            bail!("updateInterval must be greater than 0");
        }
        if self.backup_interval == 0 {
            bail!("backupInterval must be greater than 0");
        }
        if self.refresh_interval == 0 {
            bail!("refreshInterval must be greater than 0");
        }
        if self.data_retention == DataRetention::Days(0) {
            bail!("dataRetention must be -1 or a positive number of days");
        }
        Ok(())
    }

    /// Level the log subscriber should use, `None` when logging is disabled in the settings.
    pub fn log_filter(&self) -> Option<LevelFilter> {
        self.enable_logging.then_some(self.log_level.into())
    }

    /// Current value of `key` in its JSON form.
    pub fn get(&self, key: &str) -> Result<Value> {
        let value = serde_json::to_value(self)?;
        value
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow!("Unknown setting {key}"))
    }

    /// Updates one key by its JSON name. `value` is parsed as JSON and falls back to a plain
    /// string, so both `dark` and `["Slack"]` are accepted.
    /// The settings are left untouched when the result doesn't validate.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let Value::Object(mut map) = serde_json::to_value(&*self)? else {
            bail!("Settings did not serialize to an object");
        };
        if !map.contains_key(key) {
            bail!("Unknown setting {key}");
        }

        let parsed = serde_json::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.into()));
        map.insert(key.to_owned(), parsed);

        let updated = serde_json::from_value::<Settings>(Value::Object(map))
            .map_err(|e| anyhow!("Invalid value {value:?} for {key}: {e}"))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tracing::level_filters::LevelFilter;

    use crate::export::ExportFormat;

    use super::{DataRetention, LogLevel, Settings, Theme};

    #[test]
    fn test_defaults_serialize_to_wire_names() -> anyhow::Result<()> {
        let value = serde_json::to_value(Settings::default())?;
        assert_eq!(value["idleThreshold"], 300);
        assert_eq!(value["dataRetention"], 90);
        assert_eq!(value["exportFormat"], "csv");
        assert_eq!(value["logLevel"], "info");
        assert_eq!(value["theme"], "light");
        assert_eq!(value["refreshInterval"], 30);
        assert_eq!(value["monitoredApps"], json!([]));
        Ok(())
    }

    #[test]
    fn test_partial_document_takes_defaults() -> anyhow::Result<()> {
        let settings: Settings =
            serde_json::from_str(r#"{"theme": "dark", "dataRetention": -1, "somethingElse": 1}"#)?;
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.data_retention, DataRetention::Forever);
        assert_eq!(settings.idle_threshold, 300);
        assert!(settings.notifications);
        Ok(())
    }

    #[test]
    fn test_invalid_retention_is_rejected() {
        assert!(serde_json::from_str::<Settings>(r#"{"dataRetention": 0}"#).is_err());
        assert!(serde_json::from_str::<Settings>(r#"{"dataRetention": -5}"#).is_err());
    }

    #[test]
    fn test_validate() {
        assert!(Settings::default().validate().is_ok());
        let settings = Settings {
            refresh_interval: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
        let settings = Settings {
            data_retention: DataRetention::Days(0),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_set_by_key() -> anyhow::Result<()> {
        let mut settings = Settings::default();
        settings.set("theme", "dark")?;
        settings.set("exportFormat", "xlsx")?;
        settings.set("refreshInterval", "60")?;
        settings.set("autoRefresh", "true")?;
        settings.set("blacklistedApps", r#"["Steam"]"#)?;
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.export_format, ExportFormat::Xlsx);
        assert_eq!(settings.refresh_interval, 60);
        assert!(settings.auto_refresh);
        assert_eq!(settings.blacklisted_apps, vec!["Steam".to_string()]);
        assert_eq!(settings.get("refreshInterval")?, 60);
        Ok(())
    }

    #[test]
    fn test_set_rejects_bad_input_without_changes() {
        let mut settings = Settings::default();
        assert!(settings.set("noSuchKey", "1").is_err());
        assert!(settings.set("idleThreshold", "soon").is_err());
        assert!(settings.set("idleThreshold", "0").is_err());
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_log_filter() {
        let mut settings = Settings {
            log_level: LogLevel::Debug,
            ..Default::default()
        };
        assert_eq!(settings.log_filter(), Some(LevelFilter::DEBUG));
        settings.enable_logging = false;
        assert_eq!(settings.log_filter(), None);
    }

    #[test]
    fn test_theme_toggle() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
    }
}
