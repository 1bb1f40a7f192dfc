//! The `geoip` action: refresh both geo data bundles.

use std::fmt;

use thiserror::Error;
use tracing::info;

use xray_ui_core::{PanelStore, StoreError};

use crate::geodata::{GeoError, GeoSource};

/// A step of the refresh sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoStep {
    LatestVersion,
    Geoip,
    Geosite,
    RecordVersion,
}

impl fmt::Display for GeoStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LatestVersion => "getting the latest version",
            Self::Geoip => "updating the GeoIP file",
            Self::Geosite => "updating the Geosite file",
            Self::RecordVersion => "recording the version",
        })
    }
}

/// A refresh that stopped at some step.
#[derive(Debug, Error)]
pub enum GeoRefreshError {
    #[error("{step} failed: {source}")]
    Fetch {
        step: GeoStep,
        #[source]
        source: GeoError,
    },

    #[error("{} {version} failed: {source}", GeoStep::RecordVersion)]
    Record {
        version: String,
        #[source]
        source: StoreError,
    },
}

impl GeoRefreshError {
    /// The step that failed.
    pub fn step(&self) -> GeoStep {
        match self {
            Self::Fetch { step, .. } => *step,
            Self::Record { .. } => GeoStep::RecordVersion,
        }
    }
}

/// Fetches the latest version, installs both bundles, then records the
/// version. Stops at the first failing step; the version is only recorded
/// once both bundles are in place.
pub async fn refresh<G, S>(source: &G, store: &mut S) -> Result<String, GeoRefreshError>
where
    G: GeoSource,
    S: PanelStore,
{
    let version = source
        .latest_version()
        .await
        .map_err(failed_at(GeoStep::LatestVersion))?;
    info!(version = %version, "Latest geo data release");

    source
        .update_geoip(&version)
        .await
        .map_err(failed_at(GeoStep::Geoip))?;
    source
        .update_geosite(&version)
        .await
        .map_err(failed_at(GeoStep::Geosite))?;

    store
        .set_geo_version(&version)
        .map_err(|source| GeoRefreshError::Record {
            version: version.clone(),
            source,
        })?;

    Ok(version)
}

fn failed_at(step: GeoStep) -> impl FnOnce(GeoError) -> GeoRefreshError {
    move |source| GeoRefreshError::Fetch { step, source }
}
