use std::env;

use serde::Serialize;
use sysinfo::System;

const LOCALHOST: &str = "127.0.0.1";

/// Host details shown next to the records: who is tracked, on what machine.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub computer_name: String,
    pub username: String,
    pub platform: String,
    pub os_version: Option<String>,
    pub arch: String,
    pub ip_address: String,
    pub total_memory: u64,
    pub free_memory: u64,
    pub uptime: u64,
}

impl SystemInfo {
    pub fn collect() -> Self {
        let mut system = System::new();
        system.refresh_memory();

        Self {
            computer_name: System::host_name().unwrap_or_else(|| "unknown".into()),
            username: env::var("USER")
                .or_else(|_| env::var("USERNAME"))
                .unwrap_or_else(|_| "unknown".into()),
            platform: env::consts::OS.into(),
            os_version: System::long_os_version(),
            arch: env::consts::ARCH.into(),
            ip_address: LOCALHOST.into(),
            total_memory: system.total_memory(),
            free_memory: system.free_memory(),
            uptime: System::uptime(),
        }
    }
}

/// Human readable byte size, e.g. `1 KB` or `3.5 MB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024. && unit < UNITS.len() - 1 {
        value /= 1024.;
        unit += 1;
    }
    if value.fract() == 0. {
        format!("{} {}", value as u64, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::format_size;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1024), "1 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5 MB");
    }
}
