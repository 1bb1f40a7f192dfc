//! Geo data command.

use xray_ui_core::{FileStore, PanelConfig};

use crate::actions::geoip::refresh;
use crate::error::{CliError, CliResult};
use crate::geodata::GithubGeoSource;

/// Downloads the latest geoip and geosite bundles into the binary folder.
pub async fn run(config: &PanelConfig) -> CliResult<()> {
    let mut store = FileStore::open(config.db_path())?;
    let source = GithubGeoSource::new(&config.geo, &config.bin_folder)
        .map_err(|e| CliError::Action(e.to_string()))?;

    let version = refresh(&source, &mut store).await?;
    println!("GeoIP and Geosite files for version {version} downloaded and updated successfully!");
    Ok(())
}
