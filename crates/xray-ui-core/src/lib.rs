//! Core types: configuration, tracing, panel data model, settings store

pub mod config;
pub mod error;
pub mod file_store;
pub mod model;
pub mod store;
pub mod tracing;

pub use config::{GeoSettings, LogLevel, PANEL_NAME, PANEL_VERSION, PanelConfig};
pub use error::{ConfigError, StoreError, StoreResult};
pub use file_store::FileStore;
pub use model::{GeoDataVersion, Inbound, PanelDatabase, PanelSettings, UserCredential};
pub use store::{Field, MemoryStore, PanelStore};
pub use crate::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
