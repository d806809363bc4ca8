//! Dashboard flows over the JSON lines record store

use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{TimeDelta, TimeZone, Utc};
use tempfile::tempdir;
use usagedash::{
    analytics::categories::CategoryMatching,
    app::{state::Action, Dashboard, FetchStatus},
    export::{ExportFormat, Exporter},
    query::{columns::Column, ColumnFilter, QueryParams, SortOrder},
    settings::{store::SettingsStore, Settings, Theme},
    store::{
        entities::{ProcessRecord, UsageRecord},
        json_store::JsonRecordStore,
        record_store::RecordStore,
    },
    utils::clock::ManualClock,
};

fn sample_usage() -> Vec<UsageRecord> {
    let day = Utc.with_ymd_and_hms(2024, 5, 2, 15, 0, 0).unwrap();
    [
        ("Visual Studio Code", 5.5, 23),
        ("Google Chrome", 3.2, 45),
        ("Microsoft Word", 2.1, 12),
        ("Slack", 1.8, 31),
        ("Adobe Photoshop", 4.2, 8),
    ]
    .into_iter()
    .map(|(app, hours, count)| {
        UsageRecord::new(app, hours, count)
            .with_user("TestUser")
            .with_machine("TestComputer", "127.0.0.1")
            .with_last_activity(day)
    })
    .collect()
}

struct Fixture {
    _dir: tempfile::TempDir,
    root: std::path::PathBuf,
    store: Arc<JsonRecordStore>,
    clock: Arc<ManualClock>,
}

impl Fixture {
    fn new() -> Result<Self> {
        let dir = tempdir()?;
        let root = dir.path().to_owned();
        let store = Arc::new(JsonRecordStore::new(root.join("records"))?);
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 3, 9, 30, 0).unwrap(),
        ));
        Ok(Self {
            _dir: dir,
            root,
            store,
            clock,
        })
    }

    fn dashboard(&self) -> Dashboard {
        Dashboard::new(
            self.store.clone(),
            Exporter::new(self.root.join("exports"), self.clock.clone()),
            SettingsStore::in_dir(&self.root),
            self.clock.clone(),
        )
    }
}

#[tokio::test]
async fn test_import_then_analyze() -> Result<()> {
    let fixture = Fixture::new()?;
    let dashboard = fixture.dashboard();
    dashboard.import_usage(sample_usage()).await?;

    let report = dashboard.with_state(|v| v.analytics());
    assert!((report.total_hours - 16.8).abs() < 1e-9);
    assert_eq!(report.total_sessions, 119);
    assert_eq!(report.most_used_app, "Visual Studio Code");
    // Code, Word and Photoshop count as productive
    assert!((*report.productivity_score - 11.8 / 16.8 * 100.).abs() < 1e-9);
    assert_eq!(report.top_apps.len(), 5);

    let stats = dashboard.with_state(|v| v.quick_stats());
    assert_eq!(stats.unique_apps, 5);
    assert_eq!(stats.unique_users, 1);
    Ok(())
}

#[tokio::test]
async fn test_query_pipeline() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.store.append_usage(sample_usage()).await?;
    let dashboard = fixture.dashboard();

    let params = QueryParams::new()
        .with_search("o")
        .with_sort("app", SortOrder::Asc)
        .with_column_filter(ColumnFilter::new(Column::Sessions, "2"));
    assert_eq!(dashboard.search(params).await, FetchStatus::Applied);

    let apps = dashboard.with_state(|v| {
        v.filtered()
            .into_iter()
            .map(|v| v.application)
            .collect::<Vec<_>>()
    });
    assert_eq!(apps, vec!["Microsoft Word", "Visual Studio Code"]);

    let day = Utc.with_ymd_and_hms(2024, 5, 3, 0, 0, 0).unwrap();
    let status = dashboard
        .search(QueryParams::new().with_range(Some(day), Some(day + TimeDelta::days(1))))
        .await;
    assert_eq!(status, FetchStatus::Applied);
    assert!(dashboard.with_state(|v| v.records.is_empty()));
    assert_eq!(dashboard.with_state(|v| v.analytics().most_used_app), "N/A");
    Ok(())
}

#[tokio::test]
async fn test_category_matching_policy() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture
        .store
        .append_usage(vec![UsageRecord::new("Microsoft Edge Word Add-in", 2., 1)])
        .await?;
    let dashboard = fixture.dashboard();
    dashboard.refresh().await;

    let overlapping = dashboard.with_state(|v| v.analytics().category_breakdown.len());
    dashboard.dispatch(Action::SetCategoryMatching(CategoryMatching::FirstMatch));
    let first_match = dashboard.with_state(|v| v.analytics().category_breakdown.len());
    assert_eq!((overlapping, first_match), (2, 1));
    Ok(())
}

#[tokio::test]
async fn test_export_formats() -> Result<()> {
    let fixture = Fixture::new()?;
    let mut usage = sample_usage();
    usage.push(UsageRecord::new("Acme, Inc. Editor", 0.5, 2).with_user("TestUser"));
    fixture.store.append_usage(usage).await?;
    let dashboard = fixture.dashboard();
    dashboard
        .search(QueryParams::new().with_sort("app", SortOrder::Asc))
        .await;

    let csv = dashboard
        .export()
        .await
        .ok_or_else(|| anyhow!("csv export failed"))?;
    assert_eq!(
        csv.file_path,
        fixture.root.join("exports").join("usage-data-2024-05-03.csv")
    );
    let content = std::fs::read_to_string(&csv.file_path)?;
    assert!(content.lines().nth(1).unwrap_or_default().starts_with("\"Acme, Inc. Editor\",0.5,2,"));

    dashboard.dispatch(Action::SetExportFormat(ExportFormat::Json));
    let json = dashboard
        .export()
        .await
        .ok_or_else(|| anyhow!("json export failed"))?;
    let document: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&json.file_path)?)?;
    assert_eq!(document["totalCount"], 6);
    assert_eq!(document["records"][0]["app"], "Acme, Inc. Editor");

    dashboard.dispatch(Action::SetExportFormat(ExportFormat::Xlsx));
    let xlsx = dashboard
        .export()
        .await
        .ok_or_else(|| anyhow!("xlsx export failed"))?;
    assert!(xlsx.file_path.ends_with("usage-data-2024-05-03.xlsx"));
    assert!(std::fs::metadata(&xlsx.file_path)?.len() > 0);
    Ok(())
}

#[tokio::test]
async fn test_clear_and_processes() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.store.append_usage(sample_usage()).await?;
    fixture
        .store
        .append_processes(vec![ProcessRecord {
            process_name: "Photoshop Plugin".into(),
            parent_software: "Adobe Photoshop".into(),
            plugin_path: "Plugins/test.dll".into(),
            last_seen: Utc.with_ymd_and_hms(2024, 5, 2, 15, 0, 0).unwrap(),
            detection_count: 15,
        }])
        .await?;
    let dashboard = fixture.dashboard();
    dashboard.refresh().await;
    assert_eq!(dashboard.with_state(|v| v.process_summary().monitored_processes), 1);
    assert!(dashboard.store_size().await? > 0);

    assert!(dashboard.clear_data().await);
    assert!(dashboard.with_state(|v| v.records.is_empty() && v.process_records.is_empty()));
    assert_eq!(dashboard.store_size().await?, 0);
    assert!(dashboard.clear_data().await);
    Ok(())
}

#[tokio::test]
async fn test_corrupt_settings_load_as_defaults() -> Result<()> {
    let fixture = Fixture::new()?;
    std::fs::write(fixture.root.join("settings.json"), "not json")?;
    let dashboard = fixture.dashboard();
    assert_eq!(dashboard.load_settings().await, Settings::default());

    let mut settings = Settings::default();
    settings.set("theme", "dark")?;
    assert!(dashboard.save_settings(settings).await);
    assert_eq!(fixture.dashboard().load_settings().await.theme, Theme::Dark);
    Ok(())
}
