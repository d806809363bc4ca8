use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Usage of one application by one user on one machine over the queried window. Field names on
/// the wire follow the record files and exports (`app`, `total_hours`, `computerName`, ...).
#[derive(PartialEq, Debug, Serialize, Deserialize, Clone)]
pub struct UsageRecord {
    #[serde(rename = "app")]
    pub application: String,
    #[serde(default)]
    pub total_hours: f64,
    #[serde(default)]
    pub usage_count: u64,
    #[serde(default)]
    pub username: String,
    #[serde(rename = "computerName", default)]
    pub computer_name: String,
    #[serde(rename = "ipAddress", default)]
    pub ip_address: String,
    #[serde(rename = "lastActivity", default)]
    pub last_activity: Option<DateTime<Utc>>,
}

impl UsageRecord {
    pub fn new(application: impl Into<String>, total_hours: f64, usage_count: u64) -> Self {
        Self {
            application: application.into(),
            total_hours,
            usage_count,
            username: String::new(),
            computer_name: String::new(),
            ip_address: String::new(),
            last_activity: None,
        }
    }

    /// Average session length in hours. Zero when there were no sessions.
    pub fn avg_session(&self) -> f64 {
        if self.usage_count > 0 {
            self.total_hours / self.usage_count as f64
        } else {
            0.
        }
    }

    pub fn with_user(self, username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..self
        }
    }

    pub fn with_machine(self, computer_name: impl Into<String>, ip_address: impl Into<String>) -> Self {
        Self {
            computer_name: computer_name.into(),
            ip_address: ip_address.into(),
            ..self
        }
    }

    pub fn with_last_activity(self, last_activity: DateTime<Utc>) -> Self {
        Self {
            last_activity: Some(last_activity),
            ..self
        }
    }
}

/// A child process or plugin detected under a tracked application.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRecord {
    pub process_name: String,
    pub parent_software: String,
    #[serde(default)]
    pub plugin_path: String,
    pub last_seen: DateTime<Utc>,
    #[serde(rename = "count", default)]
    pub detection_count: u64,
}

/// Outcome of a mutating store or settings operation.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl OperationResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn ok_with(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{ProcessRecord, UsageRecord};

    #[test]
    fn test_avg_session() {
        assert_eq!(UsageRecord::new("Slack", 3., 4).avg_session(), 0.75);
        assert_eq!(UsageRecord::new("Slack", 3., 0).avg_session(), 0.);
    }

    #[test]
    fn test_usage_record_wire_names() -> anyhow::Result<()> {
        let json = r#"{"app":"Slack","total_hours":1.8,"usage_count":31,"username":"TestUser",
            "computerName":"TestComputer","ipAddress":"127.0.0.1","lastActivity":"2024-05-01T10:00:00Z"}"#;
        let record: UsageRecord = serde_json::from_str(json)?;
        assert_eq!(
            record,
            UsageRecord::new("Slack", 1.8, 31)
                .with_user("TestUser")
                .with_machine("TestComputer", "127.0.0.1")
                .with_last_activity(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap())
        );
        Ok(())
    }

    #[test]
    fn test_usage_record_missing_optional_fields() -> anyhow::Result<()> {
        let record: UsageRecord = serde_json::from_str(r#"{"app":"Slack"}"#)?;
        assert_eq!(record, UsageRecord::new("Slack", 0., 0));
        Ok(())
    }

    #[test]
    fn test_process_record_count_name() -> anyhow::Result<()> {
        let json = r#"{"processName":"Photoshop Plugin","parentSoftware":"Adobe Photoshop",
            "pluginPath":"C:\\plugins\\test.dll","lastSeen":"2024-05-01T10:00:00Z","count":15}"#;
        let record: ProcessRecord = serde_json::from_str(json)?;
        assert_eq!(record.detection_count, 15);
        assert_eq!(record.parent_software, "Adobe Photoshop");
        Ok(())
    }
}
