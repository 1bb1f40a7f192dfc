//! v2-ui migration command.

use std::path::Path;

use xray_ui_core::{FileStore, PanelConfig};

use crate::error::CliResult;
use crate::migrate::migrate_from_v2ui;

/// Imports the inbounds of the v2-ui database at `db`.
pub async fn run(config: &PanelConfig, db: &Path) -> CliResult<()> {
    let mut store = FileStore::open(config.db_path())?;
    let count = migrate_from_v2ui(db, &mut store).await?;
    println!("migrated {count} inbound(s) from v2-ui");
    Ok(())
}
