use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::query::QueryParams;

use super::entities::{OperationResult, ProcessRecord, UsageRecord};

/// Source of usage and process records. Implementations apply the date range of [QueryParams]
/// themselves; everything else in the params is left to the query pipeline.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn fetch_usage_stats(&self, params: &QueryParams) -> Result<Vec<UsageRecord>>;

    async fn fetch_process_stats(&self, params: &QueryParams) -> Result<Vec<ProcessRecord>>;

    /// Removes every stored record. Clearing an empty store succeeds.
    async fn clear_data(&self) -> Result<OperationResult>;

    async fn append_usage(&self, records: Vec<UsageRecord>) -> Result<()>;

    async fn append_processes(&self, records: Vec<ProcessRecord>) -> Result<()>;

    /// Bytes occupied by the stored records. Zero for stores that don't persist anything.
    async fn size_on_disk(&self) -> Result<u64>;
}

/// Keeps records in memory only. Used for the built-in sample data and in tests.
#[derive(Default)]
pub struct MemoryRecordStore {
    usage: RwLock<Vec<UsageRecord>>,
    processes: RwLock<Vec<ProcessRecord>>,
}

impl MemoryRecordStore {
    pub fn new(usage: Vec<UsageRecord>, processes: Vec<ProcessRecord>) -> Self {
        Self {
            usage: RwLock::new(usage),
            processes: RwLock::new(processes),
        }
    }

    /// Fixed data set shown when no real records are available. Timestamps are taken at
    /// construction time.
    pub fn sample() -> Self {
        let now = Utc::now();
        let usage = [
            ("Visual Studio Code", 5.5, 23),
            ("Google Chrome", 3.2, 45),
            ("Microsoft Word", 2.1, 12),
            ("Slack", 1.8, 31),
            ("Adobe Photoshop", 4.2, 8),
        ]
        .into_iter()
        .map(|(application, hours, count)| {
            UsageRecord::new(application, hours, count)
                .with_user("TestUser")
                .with_machine("TestComputer", "127.0.0.1")
                .with_last_activity(now)
        })
        .collect();

        let processes = vec![
            ProcessRecord {
                process_name: "Photoshop Plugin".into(),
                parent_software: "Adobe Photoshop".into(),
                plugin_path: "C:\\Program Files\\Adobe\\Photoshop\\Plugins\\test.dll".into(),
                last_seen: now,
                detection_count: 15,
            },
            ProcessRecord {
                process_name: "VS Code Extension".into(),
                parent_software: "Visual Studio Code".into(),
                plugin_path: "C:\\Users\\...\\extensions\\test-extension".into(),
                last_seen: now,
                detection_count: 8,
            },
        ];

        Self::new(usage, processes)
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn fetch_usage_stats(&self, params: &QueryParams) -> Result<Vec<UsageRecord>> {
        debug!("Fetching usage stats from memory {params:?}");
        Ok(self
            .usage
            .read()
            .await
            .iter()
            .filter(|v| params.in_date_range(v.last_activity))
            .cloned()
            .collect())
    }

    async fn fetch_process_stats(&self, params: &QueryParams) -> Result<Vec<ProcessRecord>> {
        Ok(self
            .processes
            .read()
            .await
            .iter()
            .filter(|v| params.in_date_range(Some(v.last_seen)))
            .cloned()
            .collect())
    }

    async fn clear_data(&self) -> Result<OperationResult> {
        self.usage.write().await.clear();
        self.processes.write().await.clear();
        Ok(OperationResult::ok())
    }

    async fn append_usage(&self, records: Vec<UsageRecord>) -> Result<()> {
        self.usage.write().await.extend(records);
        Ok(())
    }

    async fn append_processes(&self, records: Vec<ProcessRecord>) -> Result<()> {
        self.processes.write().await.extend(records);
        Ok(())
    }

    async fn size_on_disk(&self) -> Result<u64> {
        Ok(0)
    }
}
