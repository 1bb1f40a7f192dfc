//! xray-ui entry point.

use std::process::ExitCode;

use tracing::Level;

use xray_ui_cli::cli::usage_text;
use xray_ui_cli::commands;
use xray_ui_cli::dispatch::{self, Dispatch, Invocation};
use xray_ui_cli::error::CliResult;
use xray_ui_core::{PANEL_VERSION, PanelConfig, TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let args = std::env::args_os().map(|arg| arg.to_string_lossy().into_owned());
    let dispatch = match dispatch::parse(args) {
        Ok(dispatch) => dispatch,
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(2));
        }
    };

    // Neither of these touches configuration or storage.
    match dispatch.invocation {
        Invocation::Version => {
            println!("{}", PANEL_VERSION);
            return ExitCode::SUCCESS;
        }
        Invocation::Usage => {
            print!("{}", usage_text());
            return ExitCode::SUCCESS;
        }
        _ => {}
    }

    match run(dispatch).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(dispatch: Dispatch) -> CliResult<()> {
    let mut config = PanelConfig::load(dispatch.config.as_deref())?;
    if dispatch.debug {
        config.debug = true;
    }

    if dispatch.invocation == Invocation::Serve {
        return commands::run::run(&config).await;
    }

    let level = if config.debug {
        Level::DEBUG
    } else {
        Level::WARN
    };
    init_tracing(TracingConfig::cli().with_level(level))?;

    match dispatch.invocation {
        Invocation::Setting(plan) => commands::setting::run(&config, &plan),
        Invocation::MigrateLegacy { db } => commands::v2ui::run(&config, &db).await,
        Invocation::GeoUpdate => commands::geoip::run(&config).await,
        Invocation::Serve | Invocation::Version | Invocation::Usage => Ok(()),
    }
}
