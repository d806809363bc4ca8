use std::{path::Path, sync::LazyLock};

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::fmt::{format::FmtSpan, writer::MakeWriterExt};

use crate::settings::Settings;

pub const CLI_PREFIX: &str = "cli";

const DEFAULT_LEVEL: &str = "info";

/// Level the cli passes to [enable_logging]. `--log` forces TRACE. Otherwise a settings file
/// that could be read decides, and `None` leaves the choice to `RUST_LOG`.
pub fn cli_log_level(trace: bool, stored: &Result<Option<Settings>>) -> Option<LevelFilter> {
    if trace {
        return Some(LevelFilter::TRACE);
    }
    match stored {
        Ok(Some(settings)) => settings.log_filter(),
        _ => None,
    }
}

/// `log_level` wins over `RUST_LOG`, which wins over [DEFAULT_LEVEL]. Only this crate's
/// events pass the filter.
fn filter_directive(log_level: Option<LevelFilter>, rust_log: Option<String>) -> String {
    let level = log_level
        .map(|v| v.to_string().to_lowercase())
        .or(rust_log)
        .unwrap_or_else(|| DEFAULT_LEVEL.into());
    format!("{}={level}", env!("CARGO_PKG_NAME").replace("-", "_"))
}

/// Installs the global subscriber. Logs always go to a daily rotated file under
/// `application_data_path/logs`; stdout only receives them when `show_std` is set.
pub fn enable_logging(
    prefix: &str,
    application_data_path: &Path,
    log_level: Option<LevelFilter>,
    show_std: bool,
) -> Result<()> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(5)
        .filename_prefix(prefix)
        .build(application_data_path.join("logs"))?;

    let stdout = std::io::stdout.with_filter(move |_| show_std);
    let directive = filter_directive(log_level, std::env::var("RUST_LOG").ok());

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(directive))
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(stdout.and(appender))
        .pretty()
        .init();
    Ok(())
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .pretty()
        .try_init();
});
