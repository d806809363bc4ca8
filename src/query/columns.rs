use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::store::entities::UsageRecord;

/// Columns of the usage table. Used for sorting, per-column filters and exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    #[serde(rename = "app")]
    Application,
    #[serde(rename = "total_hours")]
    TotalHours,
    #[serde(rename = "usage_count")]
    Sessions,
    #[serde(rename = "avg_session")]
    AvgSession,
    #[serde(rename = "computerName")]
    Computer,
    #[serde(rename = "ipAddress")]
    IpAddress,
    #[serde(rename = "username")]
    User,
    #[serde(rename = "lastActivity")]
    LastActivity,
}

impl Column {
    /// Table order.
    pub const ALL: [Column; 8] = [
        Column::Application,
        Column::TotalHours,
        Column::Sessions,
        Column::AvgSession,
        Column::Computer,
        Column::IpAddress,
        Column::User,
        Column::LastActivity,
    ];

    /// Accepts the record field name in either its wire or snake_case spelling, ignoring case.
    pub fn parse(name: &str) -> Option<Column> {
        match name.trim().to_ascii_lowercase().as_str() {
            "app" | "application" => Some(Column::Application),
            "total_hours" | "totalhours" | "hours" => Some(Column::TotalHours),
            "usage_count" | "usagecount" | "sessions" => Some(Column::Sessions),
            "avg_session" | "avgsession" => Some(Column::AvgSession),
            "computername" | "computer_name" | "computer" => Some(Column::Computer),
            "ipaddress" | "ip_address" | "ip" => Some(Column::IpAddress),
            "username" | "user" => Some(Column::User),
            "lastactivity" | "last_activity" => Some(Column::LastActivity),
            _ => None,
        }
    }

    pub fn field_name(&self) -> &'static str {
        match self {
            Column::Application => "app",
            Column::TotalHours => "total_hours",
            Column::Sessions => "usage_count",
            Column::AvgSession => "avg_session",
            Column::Computer => "computerName",
            Column::IpAddress => "ipAddress",
            Column::User => "username",
            Column::LastActivity => "lastActivity",
        }
    }

    pub fn header(&self) -> &'static str {
        match self {
            Column::Application => "Application",
            Column::TotalHours => "Total Hours",
            Column::Sessions => "Sessions",
            Column::AvgSession => "Avg Session",
            Column::Computer => "Computer",
            Column::IpAddress => "IP Address",
            Column::User => "User",
            Column::LastActivity => "Last Activity",
        }
    }

    /// Raw text of the cell, as matched by column filters and written by exports.
    pub fn text(&self, record: &UsageRecord) -> String {
        match self {
            Column::Application => record.application.clone(),
            Column::TotalHours => record.total_hours.to_string(),
            Column::Sessions => record.usage_count.to_string(),
            Column::AvgSession => record.avg_session().to_string(),
            Column::Computer => record.computer_name.clone(),
            Column::IpAddress => record.ip_address.clone(),
            Column::User => record.username.clone(),
            Column::LastActivity => record
                .last_activity
                .map(|v| v.to_rfc3339())
                .unwrap_or_default(),
        }
    }
}

impl Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.field_name())
    }
}

#[cfg(test)]
mod tests {
    use super::Column;

    #[test]
    fn test_parse_aliases() {
        assert_eq!(Column::parse("total_hours"), Some(Column::TotalHours));
        assert_eq!(Column::parse("computerName"), Some(Column::Computer));
        assert_eq!(Column::parse("last_activity"), Some(Column::LastActivity));
        assert_eq!(Column::parse("color"), None);
    }

    #[test]
    fn test_parse_field_name_roundtrip() {
        for column in Column::ALL {
            assert_eq!(Column::parse(column.field_name()), Some(column));
        }
    }
}
