use std::collections::HashSet;

use serde::Serialize;

use crate::store::entities::{ProcessRecord, UsageRecord};

/// Processes listed under "recent activity".
pub const RECENT_PROCESS_LIMIT: usize = 5;

/// Figures shown above the usage table, computed over the filtered rows.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSummary {
    pub total_hours: f64,
    pub total_sessions: u64,
    pub unique_apps: usize,
    pub unique_users: usize,
    pub avg_session_time: f64,
}

impl TableSummary {
    pub fn from_records(records: &[UsageRecord]) -> Self {
        let total_hours = records.iter().map(|v| v.total_hours).sum::<f64>();
        let total_sessions = records.iter().map(|v| v.usage_count).sum::<u64>();
        Self {
            total_hours,
            total_sessions,
            unique_apps: records
                .iter()
                .map(|v| v.application.as_str())
                .collect::<HashSet<_>>()
                .len(),
            unique_users: records
                .iter()
                .map(|v| v.username.as_str())
                .collect::<HashSet<_>>()
                .len(),
            avg_session_time: if total_sessions > 0 {
                total_hours / total_sessions as f64
            } else {
                0.
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSummary {
    pub monitored_processes: usize,
    pub parent_applications: usize,
    pub recent: Vec<ProcessRecord>,
}

impl ProcessSummary {
    pub fn from_records(records: &[ProcessRecord]) -> Self {
        Self {
            monitored_processes: records.len(),
            parent_applications: records
                .iter()
                .map(|v| v.parent_software.as_str())
                .collect::<HashSet<_>>()
                .len(),
            recent: records.iter().take(RECENT_PROCESS_LIMIT).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::store::entities::{ProcessRecord, UsageRecord};

    use super::{ProcessSummary, TableSummary};

    #[test]
    fn test_table_summary() {
        let records = vec![
            UsageRecord::new("Slack", 2., 4).with_user("alice"),
            UsageRecord::new("Slack", 1., 2).with_user("bob"),
            UsageRecord::new("Steam", 3., 0).with_user("alice"),
        ];
        let summary = TableSummary::from_records(&records);
        assert_eq!(summary.total_hours, 6.);
        assert_eq!(summary.total_sessions, 6);
        assert_eq!(summary.unique_apps, 2);
        assert_eq!(summary.unique_users, 2);
        assert_eq!(summary.avg_session_time, 1.);
    }

    #[test]
    fn test_empty_table_summary() {
        assert_eq!(TableSummary::from_records(&[]), TableSummary::default());
    }

    #[test]
    fn test_process_summary() {
        let process = |name: &str, parent: &str| ProcessRecord {
            process_name: name.into(),
            parent_software: parent.into(),
            plugin_path: String::new(),
            last_seen: Utc::now(),
            detection_count: 1,
        };
        let records = (0..7)
            .map(|i| process(&format!("plugin {i}"), if i % 2 == 0 { "Photoshop" } else { "Code" }))
            .collect::<Vec<_>>();
        let summary = ProcessSummary::from_records(&records);
        assert_eq!(summary.monitored_processes, 7);
        assert_eq!(summary.parent_applications, 2);
        assert_eq!(summary.recent.len(), 5);
        assert_eq!(summary.recent[0].process_name, "plugin 0");
    }
}
