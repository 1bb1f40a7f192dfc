//! Panel process runtime.
//!
//! This crate runs the xray-ui panel as a long-lived process:
//! - [`PanelServer`]: the network service, rebuilt from stored settings on
//!   every start
//! - [`SignalHandler`]: turns OS signals into a queue of reload/shutdown
//!   requests
//! - [`Supervisor`]: owns the live service and restarts or stops it on
//!   signals
//! - [`PidFile`]: keeps a second panel process from starting
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use tokio::sync::RwLock;
//! use xray_ui_core::FileStore;
//! use xray_ui_server::{PanelServer, SignalHandler, Supervisor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(RwLock::new(FileStore::open("/etc/xray-ui/xray-ui.json")?));
//!     let mut signals = SignalHandler::new();
//!     signals.spawn_listener()?;
//!
//!     let mut supervisor = Supervisor::new(move || PanelServer::new(store.clone()));
//!     supervisor.run(&mut signals).await?;
//!     Ok(())
//! }
//! ```

mod error;
mod panel;
mod pidfile;
mod service;
mod signals;
mod supervisor;

pub use error::{ServerError, ServerResult};
pub use panel::{PanelServer, SharedStore};
pub use pidfile::PidFile;
pub use service::{Service, ServiceFactory};
pub use signals::{Signal, SignalAction, SignalHandler};
pub use supervisor::{Exit, Supervisor, SupervisorState};
