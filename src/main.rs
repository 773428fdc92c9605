//! patchkeeper - synth preset and session state keeper
//!
//! Loads the settings store, restores program banks and controller mappings,
//! then serves session manager requests until asked to quit.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use patchkeeper::app::App;
use patchkeeper::cli::{self, ConsoleHost};
use patchkeeper::config::Config;
use patchkeeper::paths::AppPaths;
use patchkeeper::session::SessionHandler;
use patchkeeper::{APP_TITLE, APP_VERSION};

/// Keep synth presets, program banks and MIDI controller mappings
#[derive(Parser, Debug)]
#[command(name = APP_TITLE, version, about, long_about = None, disable_version_flag = true)]
struct Args {
    /// Preset file to load on startup
    preset_file: Option<PathBuf>,

    /// Print version information and exit
    #[arg(short = 'v', short_alias = 'V', long, action = ArgAction::Version)]
    version: Option<bool>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Read commands from an interactive console acting as session manager
    #[arg(long)]
    console: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.print()?;
            return Ok(ExitCode::from(1));
        }
        Err(e) => e.exit(),
    };

    init_logging(&args.log_level)?;

    info!("Starting {} v{}...", APP_TITLE, APP_VERSION);

    let paths = AppPaths::detect();
    paths.ensure_directories()?;
    info!(
        "Settings database: {} ({} mode)",
        paths.settings_db.display(),
        if paths.is_portable { "portable" } else { "installed" }
    );

    let mut config = Config::open_at(&paths.settings_db).with_context(|| {
        format!(
            "Failed to open settings database: {}",
            paths.settings_db.display()
        )
    })?;
    if config.preset_dir.is_empty() {
        config.preset_dir = paths.presets_dir.display().to_string();
    }

    let session = SessionHandler::for_current_exe(APP_TITLE);
    let mut app = App::new(config, session, ConsoleHost::new())?;

    if let Some(preset_file) = &args.preset_file {
        if let Err(e) = app.load_preset(preset_file) {
            warn!("Could not load preset {}: {:#}", preset_file.display(), e);
        }
    }

    if args.console {
        let notifier = app.notifier();
        std::thread::Builder::new()
            .name("console".into())
            .spawn(move || {
                if let Err(e) = cli::run_repl(notifier) {
                    error!("Console error: {:#}", e);
                }
            })
            .context("Failed to start console thread")?;
    }

    app.run(shutdown_signal()).await?;

    info!("{} shutdown complete", APP_TITLE);
    Ok(ExitCode::SUCCESS)
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
}
