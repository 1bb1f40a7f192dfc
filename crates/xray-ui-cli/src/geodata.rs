//! Geo data bundles (`geoip.dat`, `geosite.dat`) used by the proxy core.
//!
//! [`GithubGeoSource`] asks the releases API for the newest tag and
//! downloads both bundles of that release into the binary folder.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use xray_ui_core::{GeoSettings, PANEL_NAME, PANEL_VERSION};

/// File name of the IP rules bundle.
pub const GEOIP_FILE: &str = "geoip.dat";

/// File name of the domain rules bundle.
pub const GEOSITE_FILE: &str = "geosite.dat";

/// Errors raised while fetching geo data.
#[derive(Debug, Error)]
pub enum GeoError {
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request did not complete.
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The release metadata could not be understood.
    #[error("unexpected release data: {0}")]
    Release(String),

    /// A downloaded bundle could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Where geo data comes from.
pub trait GeoSource {
    /// Returns the tag of the newest release.
    fn latest_version(&self) -> impl Future<Output = Result<String, GeoError>> + Send;

    /// Installs the IP rules bundle of `version`.
    fn update_geoip(&self, version: &str) -> impl Future<Output = Result<(), GeoError>> + Send;

    /// Installs the domain rules bundle of `version`.
    fn update_geosite(&self, version: &str) -> impl Future<Output = Result<(), GeoError>> + Send;
}

#[derive(Debug, Deserialize)]
struct Release {
    #[serde(default)]
    tag_name: String,
}

/// Geo data from GitHub releases.
pub struct GithubGeoSource {
    http_client: reqwest::Client,
    release_api: String,
    download_base: String,
    bin_folder: PathBuf,
}

impl GithubGeoSource {
    /// Creates a source that installs bundles into `bin_folder`.
    pub fn new(settings: &GeoSettings, bin_folder: impl Into<PathBuf>) -> Result<Self, GeoError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(format!("{PANEL_NAME}/{PANEL_VERSION}"))
            .build()
            .map_err(GeoError::Client)?;
        Ok(Self::with_client(http_client, settings, bin_folder))
    }

    /// Creates a source around an existing client.
    pub fn with_client(
        http_client: reqwest::Client,
        settings: &GeoSettings,
        bin_folder: impl Into<PathBuf>,
    ) -> Self {
        Self {
            http_client,
            release_api: settings.release_api.clone(),
            download_base: settings.download_base.trim_end_matches('/').to_string(),
            bin_folder: bin_folder.into(),
        }
    }

    async fn fetch(&self, url: &str) -> Result<reqwest::Response, GeoError> {
        debug!(url, "Fetching");
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|source| GeoError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeoError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn download(&self, version: &str, file: &str) -> Result<(), GeoError> {
        let url = format!("{}/{}/{}", self.download_base, version, file);
        let body = self
            .fetch(&url)
            .await?
            .bytes()
            .await
            .map_err(|source| GeoError::Request {
                url: url.clone(),
                source,
            })?;

        let path = self.bin_folder.join(file);
        write_atomically(&path, &body)
            .await
            .map_err(|source| GeoError::Write {
                path: path.clone(),
                source,
            })?;

        info!(file, version, bytes = body.len(), "Installed geo data");
        Ok(())
    }
}

impl GeoSource for GithubGeoSource {
    async fn latest_version(&self) -> Result<String, GeoError> {
        let text = self
            .fetch(&self.release_api)
            .await?
            .text()
            .await
            .map_err(|source| GeoError::Request {
                url: self.release_api.clone(),
                source,
            })?;

        let release: Release =
            serde_json::from_str(&text).map_err(|e| GeoError::Release(e.to_string()))?;
        if release.tag_name.is_empty() {
            return Err(GeoError::Release("release has no tag".to_string()));
        }
        Ok(release.tag_name)
    }

    async fn update_geoip(&self, version: &str) -> Result<(), GeoError> {
        self.download(version, GEOIP_FILE).await
    }

    async fn update_geosite(&self, version: &str) -> Result<(), GeoError> {
        self.download(version, GEOSITE_FILE).await
    }
}

/// Writes `data` next to `path` and renames it into place.
async fn write_atomically(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, data).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(())
}
