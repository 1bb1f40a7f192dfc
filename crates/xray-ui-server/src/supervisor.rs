//! Process supervisor for the panel service.
//!
//! ```text
//! Initializing ──start ok──▶ Running ◀──start ok── ReloadPending
//!      │                       │  │                     ▲
//!  start failed                │  └──────SIGHUP─────────┘
//!      │                       │                        │
//!      ▼                    SIGTERM/SIGINT/SIGQUIT   start failed
//!  Terminated ◀── Stopping ◀───┘                        │
//!      ▲                                                │
//!      └────────────────────────────────────────────────┘
//! ```
//!
//! The supervisor is the only owner of the live service instance. It waits
//! on one signal at a time; a failed `stop` is logged and never blocks the
//! next step, while a failed `start` always ends the process.

use tracing::{error, info, warn};

use crate::error::{ServerError, ServerResult};
use crate::service::{Service, ServiceFactory};
use crate::signals::{Signal, SignalAction, SignalHandler};

/// Lifecycle state of the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Initializing,
    Running,
    ReloadPending,
    Stopping,
    Terminated,
}

/// Why the supervisor stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// A terminate-class signal was received.
    Signal(Signal),
    /// The signal queue was closed.
    QueueClosed,
}

/// Owns the running service and reacts to signals.
pub struct Supervisor<F: ServiceFactory> {
    factory: F,
    current: Option<F::Service>,
    state: SupervisorState,
    reloads: u64,
}

impl<F: ServiceFactory> Supervisor<F> {
    /// Creates a supervisor that builds service instances with `factory`.
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            current: None,
            state: SupervisorState::Initializing,
            reloads: 0,
        }
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Returns true while a started service instance is owned.
    pub fn is_live(&self) -> bool {
        self.current.is_some()
    }

    /// Returns the number of completed reloads.
    pub fn reloads(&self) -> u64 {
        self.reloads
    }

    /// Starts the first service instance.
    ///
    /// On failure the supervisor is terminated and the error is returned.
    pub async fn start(&mut self) -> ServerResult<()> {
        if self.state != SupervisorState::Initializing {
            return Err(ServerError::config(format!(
                "supervisor cannot start from state {:?}",
                self.state
            )));
        }

        let mut service = self.factory.create();
        match service.start().await {
            Ok(()) => {
                self.current = Some(service);
                self.state = SupervisorState::Running;
                info!("Panel service started");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to start panel service");
                self.state = SupervisorState::Terminated;
                Err(e)
            }
        }
    }

    /// Handles signals until the process should exit.
    ///
    /// Starts the service first if [`Supervisor::start`] was not called.
    /// Returns an error if the service cannot be (re)started; signals still
    /// queued at that point are left unprocessed.
    pub async fn run(&mut self, signals: &mut SignalHandler) -> ServerResult<Exit> {
        if self.state == SupervisorState::Initializing {
            self.start().await?;
        }
        if self.state != SupervisorState::Running {
            return Err(ServerError::config(format!(
                "supervisor cannot run from state {:?}",
                self.state
            )));
        }

        loop {
            let Some(signal) = signals.recv().await else {
                info!("Signal queue closed, shutting down");
                self.shutdown().await;
                return Ok(Exit::QueueClosed);
            };

            match signal.action() {
                SignalAction::Reload => self.reload().await?,
                SignalAction::Shutdown => {
                    info!(signal = signal.name(), "Shutting down");
                    self.shutdown().await;
                    return Ok(Exit::Signal(signal));
                }
            }
        }
    }

    async fn reload(&mut self) -> ServerResult<()> {
        self.state = SupervisorState::ReloadPending;
        info!("Restarting panel service");

        if let Some(mut old) = self.current.take()
            && let Err(e) = old.stop().await
        {
            warn!(error = %e, "Failed to stop panel service, restarting anyway");
        }

        let mut next = self.factory.create();
        if let Err(e) = next.start().await {
            error!(error = %e, "Failed to restart panel service");
            self.state = SupervisorState::Terminated;
            return Err(ServerError::ReloadFailed(Box::new(e)));
        }

        self.current = Some(next);
        self.reloads += 1;
        self.state = SupervisorState::Running;
        info!(reloads = self.reloads, "Panel service restarted");
        Ok(())
    }

    async fn shutdown(&mut self) {
        self.state = SupervisorState::Stopping;
        if let Some(mut service) = self.current.take()
            && let Err(e) = service.stop().await
        {
            warn!(error = %e, "Failed to stop panel service");
        }
        self.state = SupervisorState::Terminated;
        info!("Panel service stopped");
    }
}
