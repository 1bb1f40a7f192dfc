//! CLI, dispatcher, administrative actions
//!
//! This crate provides the `xray-ui` binary: the panel runner and the
//! one-shot administrative commands around the panel database.

pub mod actions;
pub mod cli;
pub mod commands;
pub mod dispatch;
pub mod error;
pub mod geodata;
pub mod migrate;

pub use cli::Cli;
pub use dispatch::{Dispatch, Invocation};
pub use error::{CliError, CliResult};
