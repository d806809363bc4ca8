pub mod output;
pub mod query;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use output::{print_notifications, print_processes, print_report, print_system, print_table};
use query::{ParsedQuery, QueryArgs};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    app::{
        refresh::AutoRefresh,
        shutdown::detect_shutdown,
        state::Action,
        Dashboard, FetchStatus,
    },
    export::{ExportFormat, Exporter},
    query::pagination::{DEFAULT_PAGE_SIZE, PAGE_SIZE_OPTIONS},
    settings::store::SettingsStore,
    store::{
        entities::UsageRecord,
        json_store::JsonRecordStore,
        record_store::{MemoryRecordStore, RecordStore},
    },
    utils::{
        clock::{Clock, DefaultClock},
        dir::create_application_default_path,
        logging::{cli_log_level, enable_logging, CLI_PREFIX},
        system::SystemInfo,
    },
};

#[derive(Parser, Debug)]
#[command(name = "Usagedash", version, long_about = None)]
#[command(about = "Dashboard for analyzing application usage records", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Print logs to the console at trace level")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default uses $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        help = "Use the built-in sample records instead of the record store"
    )]
    sample: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Show totals, top applications, categories and insights")]
    Dashboard {
        #[command(flatten)]
        query: QueryArgs,
    },
    #[command(about = "Show the usage records as a paged table")]
    Table {
        #[command(flatten)]
        query: QueryArgs,
        #[arg(long, default_value_t = 1, help = "Page to show, starting at 1")]
        page: usize,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, value_parser = parse_page_size, help = "Rows per page. One of 10, 20, 30, 50, 100")]
        page_size: usize,
    },
    #[command(about = "Show processes and plugins detected under tracked applications")]
    Processes {
        #[command(flatten)]
        query: QueryArgs,
    },
    #[command(about = "Export the filtered records to a file")]
    Export {
        #[command(flatten)]
        query: QueryArgs,
        #[arg(long, value_enum, help = "Export format. Defaults to the exportFormat setting")]
        format: Option<ExportFormat>,
        #[arg(long, help = "Output directory. Defaults to <dir>/exports")]
        output: Option<PathBuf>,
    },
    #[command(about = "Append usage records from a JSON array file")]
    Import { file: PathBuf },
    #[command(about = "Remove all stored records")]
    Clear {
        #[arg(long, help = "Confirm removal. This action cannot be undone")]
        yes: bool,
    },
    #[command(about = "Show or change settings")]
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
    #[command(about = "Refresh the dashboard periodically until interrupted")]
    Watch {
        #[command(flatten)]
        query: QueryArgs,
        #[arg(long, help = "Seconds between refreshes. Defaults to the refreshInterval setting")]
        interval: Option<u64>,
    },
    #[command(about = "Show information about this machine and the record store")]
    System,
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    #[command(about = "Print the current settings")]
    Show,
    #[command(about = "Print a single setting, e.g. `settings get refreshInterval`")]
    Get { key: String },
    #[command(about = "Change a single setting, e.g. `settings set theme dark`")]
    Set { key: String, value: String },
    #[command(about = "Restore the default settings")]
    Reset,
    #[command(about = "Write the settings to a file")]
    Export { path: PathBuf },
    #[command(about = "Replace the settings with the ones in a file")]
    Import { path: PathBuf },
}

fn parse_page_size(value: &str) -> Result<usize, String> {
    let size = value.parse::<usize>().map_err(|e| e.to_string())?;
    if PAGE_SIZE_OPTIONS.contains(&size) {
        Ok(size)
    } else {
        Err(format!("Page size must be one of {PAGE_SIZE_OPTIONS:?}"))
    }
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let dir = match args.dir {
        Some(dir) => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create application directory {dir:?}"))?;
            dir
        }
        None => create_application_default_path()?,
    };

    let settings_store = SettingsStore::in_dir(&dir);
    let stored_settings = settings_store.read().await;

    let logging_level = cli_log_level(args.log, &stored_settings);
    enable_logging(CLI_PREFIX, &dir, logging_level, args.log)?;

    // Reported only now that logging is set up.
    let settings = SettingsStore::or_defaults(settings_store.path(), stored_settings);

    let export_dir = match &args.commands {
        Commands::Export {
            output: Some(output),
            ..
        } => output.clone(),
        _ => dir.join("exports"),
    };

    let store: Arc<dyn RecordStore> = if args.sample {
        Arc::new(MemoryRecordStore::sample())
    } else {
        Arc::new(JsonRecordStore::new(dir.join("records"))?)
    };
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let dashboard = Arc::new(Dashboard::new(
        store,
        Exporter::new(export_dir, clock.clone()),
        settings_store,
        clock.clone(),
    ));
    dashboard.dispatch(Action::ApplySettings(settings.clone()));
    info!("Opened dashboard in {dir:?}");

    match args.commands {
        Commands::Dashboard { query } => {
            fetch(&dashboard, query).await?;
            dashboard.with_state(|state| print_report(&state.analytics(), &state.quick_stats()));
            Ok(())
        }
        Commands::Table {
            query,
            page,
            page_size,
        } => {
            fetch(&dashboard, query).await?;
            dashboard.dispatch(Action::SetPageSize(page_size));
            dashboard.dispatch(Action::GotoPage(page.saturating_sub(1)));
            dashboard.with_state(|state| {
                let filtered = state.filtered();
                print_table(
                    state.page.slice(&filtered),
                    state.page,
                    filtered.len(),
                    &state.quick_stats(),
                )
            });
            Ok(())
        }
        Commands::Processes { query } => {
            fetch(&dashboard, query).await?;
            dashboard.with_state(|state| print_processes(&state.process_summary()));
            Ok(())
        }
        Commands::Export { query, format, .. } => {
            fetch(&dashboard, query).await?;
            dashboard.dispatch(Action::SetExportFormat(
                format.unwrap_or(settings.export_format),
            ));
            let outcome = dashboard.export().await;
            print_notifications(&dashboard.active_notifications());
            match outcome {
                Some(outcome) => {
                    println!("{}", outcome.file_path.display());
                    Ok(())
                }
                None => bail!("Export failed"),
            }
        }
        Commands::Import { file } => {
            let content = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {file:?}"))?;
            let records = serde_json::from_str::<Vec<UsageRecord>>(&content)
                .with_context(|| format!("{file:?} is not a JSON array of usage records"))?;
            let result = dashboard.import_usage(records).await?;
            if let Some(message) = result.message {
                println!("{message}");
            }
            print_notifications(&dashboard.active_notifications());
            if !result.success {
                bail!("Error fetching data");
            }
            Ok(())
        }
        Commands::Clear { yes } => {
            if !yes {
                return Err(Args::command()
                    .error(
                        ErrorKind::MissingRequiredArgument,
                        "Clearing removes every stored record, confirm with --yes",
                    )
                    .into());
            }
            let cleared = dashboard.clear_data().await;
            print_notifications(&dashboard.active_notifications());
            if !cleared {
                bail!("Failed to clear data");
            }
            Ok(())
        }
        Commands::Settings { command } => process_settings_command(&dashboard, command).await,
        Commands::Watch { query, interval } => {
            let ParsedQuery { params, matching } = query.parse_query()?;
            dashboard.dispatch(Action::SetCategoryMatching(matching));
            dashboard.apply_query(params);

            let interval = interval.unwrap_or(settings.refresh_interval);
            if interval == 0 {
                return Err(Args::command()
                    .error(ErrorKind::ValueValidation, "Interval must be greater than 0")
                    .into());
            }

            let shutdown = CancellationToken::new();
            let refresh = AutoRefresh::new(
                dashboard.clone(),
                Duration::from_secs(interval),
                shutdown.clone(),
                clock,
            );
            tokio::join!(
                refresh.run(|dashboard, status| {
                    println!("{}", "-".repeat(40));
                    if status != FetchStatus::Stale {
                        dashboard
                            .with_state(|state| print_report(&state.analytics(), &state.quick_stats()));
                    }
                    print_notifications(&dashboard.active_notifications());
                }),
                detect_shutdown(shutdown.clone())
            );
            Ok(())
        }
        Commands::System => {
            let info = SystemInfo::collect();
            let size = dashboard.store_size().await?;
            print_system(&info, size);
            Ok(())
        }
    }
}

/// Runs the query and fails when the records couldn't be fetched.
async fn fetch(dashboard: &Dashboard, query: QueryArgs) -> Result<()> {
    let ParsedQuery { params, matching } = query.parse_query()?;
    dashboard.dispatch(Action::SetCategoryMatching(matching));
    if dashboard.search(params).await == FetchStatus::Failed {
        print_notifications(&dashboard.active_notifications());
        bail!("Error fetching data");
    }
    Ok(())
}

async fn process_settings_command(dashboard: &Dashboard, command: SettingsCommand) -> Result<()> {
    let succeeded = match command {
        SettingsCommand::Show => {
            let settings = dashboard.load_settings().await;
            println!("{}", serde_json::to_string_pretty(&settings)?);
            true
        }
        SettingsCommand::Get { key } => {
            let settings = dashboard.load_settings().await;
            println!("{}", settings.get(&key)?);
            true
        }
        SettingsCommand::Set { key, value } => {
            let mut settings = dashboard.load_settings().await;
            settings.set(&key, &value)?;
            dashboard.save_settings(settings).await
        }
        SettingsCommand::Reset => dashboard.reset_settings().await,
        SettingsCommand::Export { path } => dashboard.export_settings(&path).await,
        SettingsCommand::Import { path } => dashboard.import_settings(&path).await.is_some(),
    };
    print_notifications(&dashboard.active_notifications());
    if !succeeded {
        bail!("Settings were not changed");
    }
    Ok(())
}
