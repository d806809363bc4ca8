use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Result;
use async_trait::async_trait;
use fs4::tokio::AsyncFileExt;
use serde::{de::DeserializeOwned, Serialize};
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
};
use tracing::{debug, info, warn};

use crate::query::QueryParams;

use super::{
    entities::{OperationResult, ProcessRecord, UsageRecord},
    record_store::RecordStore,
};

const USAGE_FILE: &str = "usage.jsonl";
const PROCESS_FILE: &str = "processes.jsonl";

/// [RecordStore] keeping one JSON document per line in a records directory.
pub struct JsonRecordStore {
    record_dir: PathBuf,
}

impl JsonRecordStore {
    pub fn new(record_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&record_dir)?;

        Ok(Self { record_dir })
    }

    fn usage_path(&self) -> PathBuf {
        self.record_dir.join(USAGE_FILE)
    }

    fn process_path(&self) -> PathBuf {
        self.record_dir.join(PROCESS_FILE)
    }
}

/// Reads every parsable line of `path`. A missing file is an empty store.
async fn read_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    async fn extract<T: DeserializeOwned>(path: &Path) -> std::result::Result<Vec<T>, std::io::Error> {
        debug!("Extracting {path:?}");
        let file = File::open(path).await?;
        file.lock_shared()?;
        let mut reader = BufReader::new(file);

        let result = async {
            let mut values = vec![];
            let mut line = vec![];
            while reader.read_until(b'\n', &mut line).await? > 0 {
                if let Some(value) = parse_line(path, &line) {
                    values.push(value);
                }
                line.clear();
            }
            Ok::<_, std::io::Error>(values)
        }
        .await;

        reader.into_inner().unlock_async().await?;
        result
    }

    match extract(path).await {
        Ok(s) => Ok(s),
        Err(e) => {
            if e.kind() == ErrorKind::NotFound {
                Ok(vec![])
            } else {
                Err(e)?
            }
        }
    }
}

/// Lines are parsed as raw bytes, so one that isn't valid UTF-8 is skipped like any other
/// unparsable line instead of ending the read.
fn parse_line<T: DeserializeOwned>(path: &Path, line: &[u8]) -> Option<T> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_slice::<T>(line) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(
                "During parsing in path {:?} found illegal json string {}:  {e}",
                path,
                String::from_utf8_lossy(line)
            );
            None
        }
    }
}

async fn append_lines<T: Serialize>(path: &Path, values: &[T]) -> Result<()> {
    let mut buffer = Vec::<u8>::new();
    for value in values {
        serde_json::to_writer(&mut buffer, value)?;
        buffer.push(b'\n');
    }

    let mut file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .await?;

    file.lock_exclusive()?;
    let result = async {
        file.write_all(&buffer).await?;
        file.flush().await
    }
    .await;
    file.unlock_async().await?;
    Ok(result?)
}

async fn remove_if_exists(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

async fn file_size(path: &Path) -> Result<u64> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => Ok(metadata.len()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl RecordStore for JsonRecordStore {
    async fn fetch_usage_stats(&self, params: &QueryParams) -> Result<Vec<UsageRecord>> {
        let records = read_lines::<UsageRecord>(&self.usage_path()).await?;
        Ok(records
            .into_iter()
            .filter(|v| params.in_date_range(v.last_activity))
            .collect())
    }

    async fn fetch_process_stats(&self, params: &QueryParams) -> Result<Vec<ProcessRecord>> {
        let records = read_lines::<ProcessRecord>(&self.process_path()).await?;
        Ok(records
            .into_iter()
            .filter(|v| params.in_date_range(Some(v.last_seen)))
            .collect())
    }

    async fn clear_data(&self) -> Result<OperationResult> {
        remove_if_exists(&self.usage_path()).await?;
        remove_if_exists(&self.process_path()).await?;
        info!("Cleared records in {:?}", self.record_dir);
        Ok(OperationResult::ok())
    }

    async fn append_usage(&self, records: Vec<UsageRecord>) -> Result<()> {
        append_lines(&self.usage_path(), &records).await
    }

    async fn append_processes(&self, records: Vec<ProcessRecord>) -> Result<()> {
        append_lines(&self.process_path(), &records).await
    }

    async fn size_on_disk(&self) -> Result<u64> {
        Ok(file_size(&self.usage_path()).await? + file_size(&self.process_path()).await?)
    }
}
