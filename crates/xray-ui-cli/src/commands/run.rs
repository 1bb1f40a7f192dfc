//! Run command: the long-lived panel process.
//!
//! Startup order:
//! - log level (an unknown level stops here)
//! - logging
//! - panel database
//! - PID file, when configured
//! - signal listener
//! - supervisor, which starts the first panel instance and then waits for
//!   signals

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info};

use xray_ui_core::{
    FileStore, PANEL_NAME, PANEL_VERSION, PanelConfig, TracingConfig, init_tracing,
};
use xray_ui_server::{Exit, PanelServer, PidFile, SharedStore, SignalHandler, Supervisor};

use crate::error::CliResult;

/// Runs the panel in the foreground until a terminate signal arrives.
pub async fn run(config: &PanelConfig) -> CliResult<()> {
    let level = config.log_level()?;
    init_tracing(
        TracingConfig::panel()
            .with_level(level.as_tracing_level())
            .with_format(config.log_format),
    )?;
    info!(version = PANEL_VERSION, level = %level, "Starting {}", PANEL_NAME);

    let db_path = config.db_path();
    let store = FileStore::open(&db_path)
        .inspect_err(|e| error!(path = %db_path.display(), error = %e, "Failed to open database"))?;
    let store: SharedStore = Arc::new(RwLock::new(store));

    let _pid_file = config.pid_file.as_ref().map(PidFile::create).transpose()?;

    let mut signals = SignalHandler::new();
    signals.spawn_listener()?;

    let mut supervisor = Supervisor::new(move || PanelServer::new(store.clone()));
    supervisor.start().await?;

    match supervisor.run(&mut signals).await {
        Ok(Exit::Signal(signal)) => {
            info!(signal = signal.name(), reloads = supervisor.reloads(), "Panel stopped");
            Ok(())
        }
        Ok(Exit::QueueClosed) => {
            info!("Signal queue closed, panel stopped");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Panel terminated");
            Err(e.into())
        }
    }
}
