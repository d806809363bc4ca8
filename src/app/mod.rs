//! Application shell of the dashboard. [Dashboard] owns the [state::AppState] and runs the
//! actions that need IO: fetching records, exporting, clearing and persisting settings.
//! Failures of those actions end up as notifications, never as errors to the caller.

pub mod notifications;
pub mod refresh;
pub mod shutdown;
pub mod state;

use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use anyhow::Result;
use futures::future::try_join;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    export::{ExportOutcome, ExportRequest, Exporter},
    query::QueryParams,
    settings::{store::SettingsStore, Settings},
    store::{
        entities::{OperationResult, UsageRecord},
        record_store::RecordStore,
    },
    utils::clock::Clock,
};

use notifications::{Notification, NotificationKind};
use state::{Action, AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// The fetched records replaced the shown ones.
    Applied,
    /// A newer fetch was started in the meantime, the results were dropped.
    Stale,
    /// The store failed. Previously loaded records are kept.
    Failed,
}

pub struct Dashboard {
    store: Arc<dyn RecordStore>,
    exporter: Exporter,
    settings: SettingsStore,
    clock: Arc<dyn Clock>,
    // Never held across an await.
    state: Mutex<AppState>,
}

impl Dashboard {
    pub fn new(
        store: Arc<dyn RecordStore>,
        exporter: Exporter,
        settings: SettingsStore,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            exporter,
            settings,
            clock,
            state: Mutex::new(AppState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn dispatch(&self, action: Action) {
        self.state().reduce(action);
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.state())
    }

    pub fn notify(&self, kind: NotificationKind, message: impl Into<String>) {
        self.dispatch(Action::Notify {
            kind,
            message: message.into(),
            at: self.clock.time(),
        });
    }

    /// Drops expired notifications and returns the remaining ones.
    pub fn active_notifications(&self) -> Vec<Notification> {
        let now = self.clock.time();
        let mut state = self.state();
        state.reduce(Action::ExpireNotifications(now));
        state.notifications.active(now)
    }

    /// Fetches records for the current query inputs.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> FetchStatus {
        let (ticket, params) = {
            let mut state = self.state();
            (state.begin_fetch(), state.query_params())
        };

        let result = try_join(
            self.store.fetch_usage_stats(&params),
            self.store.fetch_process_stats(&params),
        )
        .await;

        let mut state = self.state();
        if !state.is_current(ticket) {
            debug!("Fetch {ticket:?} was superseded");
            return FetchStatus::Stale;
        }
        match result {
            Ok((usage, processes)) => {
                info!(
                    "Fetched {} usage and {} process records",
                    usage.len(),
                    processes.len()
                );
                state.reduce(Action::FetchCompleted {
                    ticket,
                    usage,
                    processes,
                });
                FetchStatus::Applied
            }
            Err(e) => {
                error!("Error fetching data {e:?}");
                state.reduce(Action::FetchFailed {
                    ticket,
                    at: self.clock.time(),
                });
                FetchStatus::Failed
            }
        }
    }

    /// Takes over the query inputs of `params` without fetching.
    pub fn apply_query(&self, params: QueryParams) {
        let mut state = self.state();
        state.reduce(Action::SetDateRange {
            start: params.start_date,
            end: params.end_date,
        });
        state.reduce(Action::SelectUser(params.username));
        state.reduce(Action::SetSearch(params.search_term.unwrap_or_default()));
        if let Some(field) = params.sort_by {
            state.reduce(Action::SetSort {
                field,
                order: params.sort_order,
            });
        }
        state.reduce(Action::ClearColumnFilters);
        for filter in params.column_filters {
            state.reduce(Action::AddColumnFilter(filter));
        }
    }

    /// Takes over the query inputs of `params` and fetches with them.
    pub async fn search(&self, params: QueryParams) -> FetchStatus {
        self.apply_query(params);
        self.refresh().await
    }

    /// Fetches again and confirms with a notification when that worked.
    pub async fn reload(&self) -> FetchStatus {
        let status = self.refresh().await;
        if status == FetchStatus::Applied {
            self.notify(NotificationKind::Success, "Data reloaded successfully");
        }
        status
    }

    /// Exports the filtered rows in the selected export format.
    pub async fn export(&self) -> Option<ExportOutcome> {
        let request = self.with_state(|state| ExportRequest {
            format: state.export_format,
            data: state.filtered(),
            start_date: state.start_date,
            end_date: state.end_date,
        });

        match self.exporter.export(request).await {
            Ok(outcome) => {
                self.notify(
                    NotificationKind::Success,
                    format!(
                        "Data exported successfully to {}",
                        outcome.file_path.display()
                    ),
                );
                Some(outcome)
            }
            Err(e) => {
                error!("Export error {e:?}");
                self.notify(NotificationKind::Error, "Export failed");
                None
            }
        }
    }

    /// Removes every stored record and reloads. Returns whether clearing worked.
    pub async fn clear_data(&self) -> bool {
        match self.store.clear_data().await {
            Ok(OperationResult { success: true, .. }) => {
                self.refresh().await;
                self.notify(NotificationKind::Success, "Data cleared successfully");
                true
            }
            Ok(OperationResult { message, .. }) => {
                error!("Store refused to clear data {message:?}");
                self.notify(NotificationKind::Error, "Failed to clear data");
                false
            }
            Err(e) => {
                error!("Clear data error {e:?}");
                self.notify(NotificationKind::Error, "Failed to clear data");
                false
            }
        }
    }

    /// Appends records to the store and refreshes the shown data. The result is only
    /// successful when that refresh was applied too.
    pub async fn import_usage(&self, records: Vec<UsageRecord>) -> Result<OperationResult> {
        let count = records.len();
        self.store.append_usage(records).await?;
        match self.refresh().await {
            FetchStatus::Applied => {
                Ok(OperationResult::ok_with(format!("Imported {count} records")))
            }
            status => {
                warn!("Reload after importing {count} records was not applied: {status:?}");
                Ok(OperationResult {
                    success: false,
                    message: Some(format!("Imported {count} records, but reloading them failed")),
                })
            }
        }
    }

    pub async fn store_size(&self) -> Result<u64> {
        self.store.size_on_disk().await
    }

    /// Loads the stored settings, falling back to defaults, and applies them.
    pub async fn load_settings(&self) -> Settings {
        let settings = self.settings.load().await;
        self.dispatch(Action::ApplySettings(settings.clone()));
        settings
    }

    pub async fn save_settings(&self, settings: Settings) -> bool {
        match self.settings.save(&settings).await {
            Ok(_) => {
                self.dispatch(Action::ApplySettings(settings));
                self.notify(NotificationKind::Success, "Settings saved successfully");
                true
            }
            Err(e) => {
                error!("Failed to save settings {e:?}");
                self.notify(NotificationKind::Error, "Failed to save settings");
                false
            }
        }
    }

    pub async fn reset_settings(&self) -> bool {
        let saved = self.save_settings(Settings::default()).await;
        if saved {
            self.notify(NotificationKind::Info, "Settings reset");
        }
        saved
    }

    pub async fn export_settings(&self, path: &Path) -> bool {
        let settings = self.settings.load().await;
        match self.settings.export_to(&settings, path).await {
            Ok(_) => {
                self.notify(NotificationKind::Success, "Settings exported");
                true
            }
            Err(e) => {
                error!("Failed to export settings {e:?}");
                self.notify(NotificationKind::Error, "Failed to export settings");
                false
            }
        }
    }

    pub async fn import_settings(&self, path: &Path) -> Option<Settings> {
        match self.settings.import_from(path).await {
            Ok(settings) => {
                self.dispatch(Action::ApplySettings(settings.clone()));
                self.notify(NotificationKind::Success, "Settings imported successfully");
                Some(settings)
            }
            Err(e) => {
                error!("Failed to import settings {e:?}");
                self.notify(
                    NotificationKind::Error,
                    "Failed to import settings - Invalid file format",
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        path::Path,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
    };

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use chrono::{TimeDelta, TimeZone, Utc};
    use tempfile::tempdir;
    use tokio::sync::Notify;

    use crate::{
        export::Exporter,
        query::QueryParams,
        settings::{store::SettingsStore, Settings, Theme},
        store::{
            entities::{OperationResult, ProcessRecord, UsageRecord},
            record_store::{MemoryRecordStore, MockRecordStore, RecordStore},
        },
        utils::{clock::ManualClock, logging::TEST_LOGGING},
    };

    use super::{notifications::NotificationKind, Dashboard, FetchStatus};

    fn dashboard(store: Arc<dyn RecordStore>, dir: &Path, clock: Arc<ManualClock>) -> Dashboard {
        Dashboard::new(
            store,
            Exporter::new(dir.join("exports"), clock.clone()),
            SettingsStore::in_dir(dir),
            clock,
        )
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 3, 9, 0, 0).unwrap(),
        ))
    }

    #[tokio::test]
    async fn test_search_filters_sample() -> Result<()> {
        let dir = tempdir()?;
        let dashboard = dashboard(Arc::new(MemoryRecordStore::sample()), dir.path(), clock());

        assert_eq!(dashboard.refresh().await, FetchStatus::Applied);
        assert_eq!(dashboard.with_state(|v| v.filtered().len()), 5);

        let status = dashboard.search(QueryParams::new().with_search("chrome")).await;
        assert_eq!(status, FetchStatus::Applied);
        let filtered = dashboard.with_state(|v| v.filtered());
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].application, "Google Chrome");
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_data_and_notifies() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let calls = AtomicUsize::new(0);
        let mut store = MockRecordStore::new();
        store.expect_fetch_usage_stats().returning(move |_| {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(vec![UsageRecord::new("Slack", 1.8, 31)])
            } else {
                Err(anyhow!("database is gone"))
            }
        });
        store.expect_fetch_process_stats().returning(|_| Ok(vec![]));

        let dashboard = dashboard(Arc::new(store), dir.path(), clock());
        assert_eq!(dashboard.reload().await, FetchStatus::Applied);
        assert_eq!(dashboard.reload().await, FetchStatus::Failed);

        assert_eq!(dashboard.with_state(|v| v.records.len()), 1);
        let messages = dashboard
            .active_notifications()
            .into_iter()
            .map(|v| (v.kind, v.message))
            .collect::<Vec<_>>();
        assert_eq!(
            messages,
            vec![
                (NotificationKind::Success, "Data reloaded successfully".to_string()),
                (NotificationKind::Error, "Error fetching data".to_string()),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_notifications_expire_with_clock() -> Result<()> {
        let dir = tempdir()?;
        let clock = clock();
        let dashboard = dashboard(Arc::new(MemoryRecordStore::sample()), dir.path(), clock.clone());
        dashboard.reload().await;
        assert_eq!(dashboard.active_notifications().len(), 1);

        clock.advance(TimeDelta::seconds(5));
        assert!(dashboard.active_notifications().is_empty());
        Ok(())
    }

    struct GatedStore {
        calls: AtomicUsize,
        gate: Notify,
    }

    #[async_trait]
    impl RecordStore for GatedStore {
        async fn fetch_usage_stats(&self, _: &QueryParams) -> Result<Vec<UsageRecord>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                self.gate.notified().await;
                Ok(vec![UsageRecord::new("old", 1., 1)])
            } else {
                Ok(vec![UsageRecord::new("new", 1., 1)])
            }
        }

        async fn fetch_process_stats(&self, _: &QueryParams) -> Result<Vec<ProcessRecord>> {
            Ok(vec![])
        }

        async fn clear_data(&self) -> Result<OperationResult> {
            Ok(OperationResult::ok())
        }

        async fn append_usage(&self, _: Vec<UsageRecord>) -> Result<()> {
            Ok(())
        }

        async fn append_processes(&self, _: Vec<ProcessRecord>) -> Result<()> {
            Ok(())
        }

        async fn size_on_disk(&self) -> Result<u64> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_superseded_fetch_is_discarded() -> Result<()> {
        let dir = tempdir()?;
        let store = Arc::new(GatedStore {
            calls: AtomicUsize::new(0),
            gate: Notify::new(),
        });
        let dashboard = dashboard(store.clone(), dir.path(), clock());

        let (first, second) = tokio::join!(dashboard.refresh(), async {
            let status = dashboard.refresh().await;
            store.gate.notify_one();
            status
        });

        assert_eq!(first, FetchStatus::Stale);
        assert_eq!(second, FetchStatus::Applied);
        assert_eq!(dashboard.with_state(|v| v.records[0].application.clone()), "new");
        Ok(())
    }

    #[tokio::test]
    async fn test_export_notifies_with_path() -> Result<()> {
        let dir = tempdir()?;
        let dashboard = dashboard(Arc::new(MemoryRecordStore::sample()), dir.path(), clock());
        dashboard.refresh().await;

        let outcome = dashboard.export().await.ok_or_else(|| anyhow!("export failed"))?;
        assert_eq!(
            outcome.file_path,
            dir.path().join("exports").join("usage-data-2024-05-03.csv")
        );
        let csv = std::fs::read_to_string(&outcome.file_path)?;
        assert_eq!(csv.lines().count(), 6);
        assert!(dashboard.active_notifications()[0]
            .message
            .starts_with("Data exported successfully to"));
        Ok(())
    }

    #[tokio::test]
    async fn test_clear_data() -> Result<()> {
        let dir = tempdir()?;
        let dashboard = dashboard(Arc::new(MemoryRecordStore::sample()), dir.path(), clock());
        dashboard.refresh().await;

        assert!(dashboard.clear_data().await);
        assert!(dashboard.with_state(|v| v.records.is_empty()));

        let mut failing = MockRecordStore::new();
        failing
            .expect_clear_data()
            .returning(|| Err(anyhow!("read only")));
        let dashboard = dashboard_with(failing, dir.path());
        assert!(!dashboard.clear_data().await);
        assert_eq!(
            dashboard.active_notifications()[0].message,
            "Failed to clear data"
        );
        Ok(())
    }

    fn dashboard_with(store: MockRecordStore, dir: &Path) -> Dashboard {
        dashboard(Arc::new(store), dir, clock())
    }

    #[tokio::test]
    async fn test_import_reports_failed_reload() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let mut store = MockRecordStore::new();
        store.expect_append_usage().times(1).returning(|_| Ok(()));
        store
            .expect_fetch_usage_stats()
            .returning(|_| Err(anyhow!("database is gone")));
        store.expect_fetch_process_stats().returning(|_| Ok(vec![]));
        let dashboard = dashboard_with(store, dir.path());

        let result = dashboard
            .import_usage(vec![UsageRecord::new("Slack", 1.8, 31)])
            .await?;
        assert!(!result.success);
        assert_eq!(
            result.message.as_deref(),
            Some("Imported 1 records, but reloading them failed")
        );

        let imported = dashboard_with_sample(dir.path())
            .import_usage(vec![UsageRecord::new("Slack", 1.8, 31)])
            .await?;
        assert!(imported.success);
        assert_eq!(imported.message.as_deref(), Some("Imported 1 records"));
        Ok(())
    }

    fn dashboard_with_sample(dir: &Path) -> Dashboard {
        dashboard(Arc::new(MemoryRecordStore::sample()), dir, clock())
    }

    #[tokio::test]
    async fn test_settings_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let dashboard = dashboard(Arc::new(MemoryRecordStore::sample()), dir.path(), clock());
        assert_eq!(dashboard.load_settings().await, Settings::default());

        let settings = Settings {
            theme: Theme::Dark,
            ..Default::default()
        };
        assert!(dashboard.save_settings(settings.clone()).await);
        assert_eq!(dashboard.with_state(|v| v.theme), Theme::Dark);
        assert_eq!(dashboard.load_settings().await, settings);

        let invalid = Settings {
            refresh_interval: 0,
            ..Default::default()
        };
        assert!(!dashboard.save_settings(invalid).await);
        assert_eq!(dashboard.load_settings().await, settings);

        let exported = dir.path().join("exported.json");
        assert!(dashboard.export_settings(&exported).await);
        assert!(dashboard.reset_settings().await);
        assert_eq!(dashboard.with_state(|v| v.theme), Theme::Light);
        assert_eq!(dashboard.import_settings(&exported).await, Some(settings));
        assert_eq!(dashboard.with_state(|v| v.theme), Theme::Dark);
        Ok(())
    }
}
