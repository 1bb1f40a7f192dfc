//! Setting command.

use tracing::debug;

use xray_ui_core::{FileStore, PanelConfig};

use super::print_report;
use crate::actions::setting::{self, SettingPlan};
use crate::error::{CliError, CliResult};

/// Applies `plan` to the panel database.
pub fn run(config: &PanelConfig, plan: &SettingPlan) -> CliResult<()> {
    let mut store = FileStore::open(config.db_path())?;
    debug!(path = %store.path().display(), "Opened panel database");

    let report = setting::apply(&mut store, plan);
    print_report(&report);

    if report.is_success() {
        Ok(())
    } else {
        Err(CliError::Action(format!(
            "{} setting operation(s) failed",
            report.failures()
        )))
    }
}
