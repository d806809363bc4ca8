//! Writes the currently filtered usage rows to a file in one of the [ExportFormat]s.

use std::{
    fmt::Display,
    path::PathBuf,
    sync::Arc,
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use rust_xlsxwriter::Workbook;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{
    query::columns::Column,
    store::entities::UsageRecord,
    utils::{clock::Clock, time::date_to_file_name},
};

const FILE_PREFIX: &str = "usage-data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

impl Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub format: ExportFormat,
    pub data: Vec<UsageRecord>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOutcome {
    pub success: bool,
    pub file_path: PathBuf,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonExport<'a> {
    exported_at: DateTime<Utc>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    total_count: usize,
    records: &'a [UsageRecord],
}

pub struct Exporter {
    output_dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl Exporter {
    pub fn new(output_dir: PathBuf, clock: Arc<dyn Clock>) -> Self {
        Self { output_dir, clock }
    }

    /// `usage-data-<start>_<end>.<ext>` when both bounds are given, `usage-data-<today>.<ext>`
    /// otherwise.
    pub fn file_name(&self, request: &ExportRequest) -> String {
        let stem = match (request.start_date, request.end_date) {
            (Some(start), Some(end)) => format!(
                "{}_{}",
                date_to_file_name(start.date_naive()),
                date_to_file_name(end.date_naive())
            ),
            _ => date_to_file_name(self.clock.time().date_naive()),
        };
        format!("{FILE_PREFIX}-{stem}.{}", request.format.extension())
    }

    #[instrument(skip_all, fields(format = %request.format, records = request.data.len()))]
    pub async fn export(&self, request: ExportRequest) -> Result<ExportOutcome> {
        let bytes = match request.format {
            ExportFormat::Csv => build_csv(&request.data).into_bytes(),
            ExportFormat::Json => serde_json::to_vec_pretty(&JsonExport {
                exported_at: self.clock.time(),
                start_date: request.start_date,
                end_date: request.end_date,
                total_count: request.data.len(),
                records: &request.data,
            })?,
            ExportFormat::Xlsx => build_xlsx(&request.data)?,
        };

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("Failed to create export directory {:?}", self.output_dir))?;
        let file_path = self.output_dir.join(self.file_name(&request));
        tokio::fs::write(&file_path, bytes)
            .await
            .with_context(|| format!("Failed to write export {file_path:?}"))?;

        info!("Exported {} records to {file_path:?}", request.data.len());
        Ok(ExportOutcome {
            success: true,
            file_path,
        })
    }
}

/// Header row followed by one row per record, `\n` separated.
pub fn build_csv(records: &[UsageRecord]) -> String {
    let mut csv = Column::ALL
        .iter()
        .map(|v| v.header())
        .collect::<Vec<_>>()
        .join(",");
    csv.push('\n');

    for record in records {
        let row = Column::ALL
            .iter()
            .map(|column| escape_csv_field(&column.text(record)))
            .collect::<Vec<_>>()
            .join(",");
        csv.push_str(&row);
        csv.push('\n');
    }

    csv
}

/// Quotes a field per RFC 4180 when it contains a separator, a quote or a line break.
fn escape_csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn build_xlsx(records: &[UsageRecord]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Usage Data")?;

    for (col, column) in Column::ALL.iter().enumerate() {
        worksheet.write_string(0, col as u16, column.header())?;
    }

    for (row, record) in records.iter().enumerate() {
        let row = row as u32 + 1;
        for (col, column) in Column::ALL.iter().enumerate() {
            let col = col as u16;
            match column {
                Column::TotalHours => worksheet.write_number(row, col, record.total_hours)?,
                Column::Sessions => worksheet.write_number(row, col, record.usage_count as f64)?,
                Column::AvgSession => worksheet.write_number(row, col, record.avg_session())?,
                _ => worksheet.write_string(row, col, column.text(record))?,
            };
        }
    }

    Ok(workbook.save_to_buffer()?)
}
