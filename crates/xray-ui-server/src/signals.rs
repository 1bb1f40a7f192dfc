//! Unix signal handling for the panel process.
//!
//! OS signals are translated into [`Signal`] values and pushed into a bounded
//! queue that the supervisor drains one at a time:
//! - SIGHUP: restart the panel service in place
//! - SIGTERM/SIGINT/SIGQUIT: stop the panel service and exit

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::ServerResult;

/// Queue depth between the listener task and the supervisor.
const QUEUE_CAPACITY: usize = 1;

/// Signals that the panel process handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// SIGHUP.
    Hangup,
    /// SIGTERM.
    Terminate,
    /// SIGINT.
    Interrupt,
    /// SIGQUIT.
    Quit,
}

/// What the supervisor does in response to a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// Stop the running service and start a fresh one.
    Reload,
    /// Stop the running service and exit.
    Shutdown,
}

impl Signal {
    /// Maps the signal to the supervisor's reaction.
    pub fn action(self) -> SignalAction {
        match self {
            Self::Hangup => SignalAction::Reload,
            Self::Terminate | Self::Interrupt | Self::Quit => SignalAction::Shutdown,
        }
    }

    /// Returns the conventional signal name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Hangup => "SIGHUP",
            Self::Terminate => "SIGTERM",
            Self::Interrupt => "SIGINT",
            Self::Quit => "SIGQUIT",
        }
    }
}

/// Receives OS signals and queues them for the supervisor.
pub struct SignalHandler {
    tx: mpsc::Sender<Signal>,
    rx: mpsc::Receiver<Signal>,
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalHandler {
    /// Creates a signal handler with an empty queue.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        Self { tx, rx }
    }

    /// Installs the OS signal handlers and spawns the listener task.
    ///
    /// Must be called from within a Tokio runtime.
    #[cfg(unix)]
    pub fn spawn_listener(&self) -> ServerResult<()> {
        use tokio::signal::unix::{SignalKind, signal};

        use crate::error::ServerError;

        let mut sighup = signal(SignalKind::hangup()).map_err(ServerError::Signal)?;
        let mut sigterm = signal(SignalKind::terminate()).map_err(ServerError::Signal)?;
        let mut sigint = signal(SignalKind::interrupt()).map_err(ServerError::Signal)?;
        let mut sigquit = signal(SignalKind::quit()).map_err(ServerError::Signal)?;
        let tx = self.tx.clone();

        tokio::spawn(async move {
            loop {
                let received = tokio::select! {
                    _ = sighup.recv() => Signal::Hangup,
                    _ = sigterm.recv() => Signal::Terminate,
                    _ = sigint.recv() => Signal::Interrupt,
                    _ = sigquit.recv() => Signal::Quit,
                };
                info!(signal = received.name(), "Received signal");
                if tx.send(received).await.is_err() {
                    break;
                }
            }

            debug!("Signal listener stopped");
        });

        Ok(())
    }

    /// Non-Unix implementation: only Ctrl+C, mapped to an interrupt.
    #[cfg(not(unix))]
    pub fn spawn_listener(&self) -> ServerResult<()> {
        let tx = self.tx.clone();

        tokio::spawn(async move {
            while let Ok(()) = tokio::signal::ctrl_c().await {
                info!("Received Ctrl+C");
                if tx.send(Signal::Interrupt).await.is_err() {
                    break;
                }
            }
        });

        Ok(())
    }

    /// Returns a sender for injecting signals programmatically.
    pub fn sender(&self) -> mpsc::Sender<Signal> {
        self.tx.clone()
    }

    /// Queues a signal if there is room. Returns false when the queue is full
    /// or closed.
    pub fn trigger(&self, signal: Signal) -> bool {
        self.tx.try_send(signal).is_ok()
    }

    /// Waits for the next queued signal.
    ///
    /// Returns `None` once the queue is closed and drained.
    pub async fn recv(&mut self) -> Option<Signal> {
        self.rx.recv().await
    }

    /// Stops accepting new signals. Already queued ones are still delivered.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn only_hangup_reloads() {
        assert_eq!(Signal::Hangup.action(), SignalAction::Reload);
        assert_eq!(Signal::Terminate.action(), SignalAction::Shutdown);
        assert_eq!(Signal::Interrupt.action(), SignalAction::Shutdown);
        assert_eq!(Signal::Quit.action(), SignalAction::Shutdown);
    }

    #[tokio::test]
    async fn trigger_and_recv() {
        let mut handler = SignalHandler::new();
        assert!(handler.trigger(Signal::Hangup));
        assert_eq!(handler.recv().await, Some(Signal::Hangup));
    }

    #[tokio::test]
    async fn queue_is_bounded() {
        let mut handler = SignalHandler::new();
        assert!(handler.trigger(Signal::Hangup));
        assert!(!handler.trigger(Signal::Terminate));

        assert_eq!(handler.recv().await, Some(Signal::Hangup));
        assert!(handler.trigger(Signal::Terminate));
        assert_eq!(handler.recv().await, Some(Signal::Terminate));
    }

    #[tokio::test]
    async fn sender_waits_for_room() {
        let mut handler = SignalHandler::new();
        let tx = handler.sender();

        let producer = tokio::spawn(async move {
            for signal in [Signal::Hangup, Signal::Hangup, Signal::Terminate] {
                tx.send(signal).await.unwrap();
            }
        });

        let mut received = Vec::new();
        for _ in 0..3 {
            let next = tokio::time::timeout(Duration::from_millis(500), handler.recv())
                .await
                .unwrap();
            received.push(next.unwrap());
        }
        producer.await.unwrap();

        assert_eq!(
            received,
            vec![Signal::Hangup, Signal::Hangup, Signal::Terminate]
        );
    }

    #[tokio::test]
    async fn closed_queue_drains_then_ends() {
        let mut handler = SignalHandler::new();
        assert!(handler.trigger(Signal::Quit));
        handler.close();

        assert!(!handler.trigger(Signal::Hangup));
        assert_eq!(handler.recv().await, Some(Signal::Quit));
        assert_eq!(handler.recv().await, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn listener_installs() {
        let handler = SignalHandler::new();
        assert!(handler.spawn_listener().is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn os_signals_reach_the_queue() {
        let mut handler = SignalHandler::new();
        handler.spawn_listener().unwrap();

        for (raw, expected) in [
            (libc::SIGHUP, Signal::Hangup),
            (libc::SIGTERM, Signal::Terminate),
            (libc::SIGQUIT, Signal::Quit),
        ] {
            // SAFETY: signalling our own process, handlers are installed above.
            assert_eq!(unsafe { libc::kill(libc::getpid(), raw) }, 0);

            let received = tokio::time::timeout(Duration::from_secs(5), handler.recv())
                .await
                .unwrap();
            assert_eq!(received, Some(expected));
        }

        assert_eq!(Signal::Hangup.action(), SignalAction::Reload);
        assert_eq!(Signal::Terminate.action(), SignalAction::Shutdown);
        assert_eq!(Signal::Quit.action(), SignalAction::Shutdown);
    }
}
