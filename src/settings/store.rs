use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::store::entities::OperationResult;

use super::Settings;

pub const SETTINGS_FILE: &str = "settings.json";

/// Persists [Settings] as a pretty printed JSON file.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store for `settings.json` inside the application directory.
    pub fn in_dir(application_dir: &Path) -> Self {
        Self::new(application_dir.join(SETTINGS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the settings file. `None` when it does not exist yet.
    pub async fn read(&self) -> Result<Option<Settings>> {
        read_settings(&self.path).await
    }

    /// Like [Self::read], but never fails: a missing file gives the defaults silently, an
    /// unreadable or invalid one gives the defaults with a warning.
    pub async fn load(&self) -> Settings {
        Self::or_defaults(&self.path, self.read().await)
    }

    pub fn or_defaults(path: &Path, result: Result<Option<Settings>>) -> Settings {
        match result {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                debug!("No settings at {path:?}, using defaults");
                Settings::default()
            }
            Err(e) => {
                warn!("Failed to load settings from {path:?}, using defaults: {e:#}");
                Settings::default()
            }
        }
    }

    pub async fn save(&self, settings: &Settings) -> Result<OperationResult> {
        write_settings(&self.path, settings).await?;
        info!("Saved settings to {:?}", self.path);
        Ok(OperationResult::ok())
    }

    /// Writes `settings` to an arbitrary file, leaving the stored settings alone.
    pub async fn export_to(&self, settings: &Settings, path: &Path) -> Result<OperationResult> {
        write_settings(path, settings).await?;
        Ok(OperationResult::ok_with(format!(
            "Settings exported to {}",
            path.display()
        )))
    }

    /// Reads settings from `path`, validates them and makes them the stored settings.
    pub async fn import_from(&self, path: &Path) -> Result<Settings> {
        let settings = read_settings(path)
            .await?
            .with_context(|| format!("Settings file {path:?} does not exist"))?;
        self.save(&settings).await?;
        Ok(settings)
    }
}

async fn read_settings(path: &Path) -> Result<Option<Settings>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(v) => v,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read {path:?}"))?,
    };
    let settings = serde_json::from_str::<Settings>(&content)
        .with_context(|| format!("Failed to parse {path:?}"))?;
    settings.validate()?;
    Ok(Some(settings))
}

async fn write_settings(path: &Path, settings: &Settings) -> Result<()> {
    settings.validate()?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let content = serde_json::to_string_pretty(settings)?;
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write {path:?}"))
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::{
        settings::{Settings, Theme},
        utils::logging::TEST_LOGGING,
    };

    use super::SettingsStore;

    #[tokio::test]
    async fn test_missing_file_gives_defaults() -> Result<()> {
        let dir = tempdir()?;
        let store = SettingsStore::in_dir(dir.path());
        assert_eq!(store.read().await?, None);
        assert_eq!(store.load().await, Settings::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_file_gives_defaults() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let store = SettingsStore::in_dir(dir.path());
        std::fs::write(store.path(), "{\"theme\": \"dark\",")?;
        assert!(store.read().await.is_err());
        assert_eq!(store.load().await, Settings::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_save_then_load() -> Result<()> {
        let dir = tempdir()?;
        let store = SettingsStore::in_dir(&dir.path().join("app"));
        let settings = Settings {
            theme: Theme::Dark,
            refresh_interval: 5,
            ..Default::default()
        };
        assert!(store.save(&settings).await?.success);
        assert_eq!(store.load().await, settings);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_settings_are_not_saved() -> Result<()> {
        let dir = tempdir()?;
        let store = SettingsStore::in_dir(dir.path());
        let settings = Settings {
            idle_threshold: 0,
            ..Default::default()
        };
        assert!(store.save(&settings).await.is_err());
        assert!(!store.path().exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_export_and_import() -> Result<()> {
        let dir = tempdir()?;
        let store = SettingsStore::in_dir(dir.path());
        let exported = Settings {
            auto_refresh: true,
            ..Default::default()
        };
        let target = dir.path().join("backup").join("exported.json");
        store.export_to(&exported, &target).await?;
        assert_eq!(store.read().await?, None);

        let imported = store.import_from(&target).await?;
        assert_eq!(imported, exported);
        assert_eq!(store.load().await, exported);

        assert!(store.import_from(&dir.path().join("missing.json")).await.is_err());
        Ok(())
    }
}
