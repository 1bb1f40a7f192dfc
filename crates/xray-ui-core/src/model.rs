//! Persisted panel records.
//!
//! - [`PanelSettings`]: web listener and notification bot settings
//! - [`UserCredential`]: panel login
//! - [`Inbound`]: a proxy inbound
//! - [`GeoDataVersion`]: the geo data release last installed
//! - [`PanelDatabase`]: everything above, as stored on disk

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default panel port.
pub const DEFAULT_PORT: u16 = 54321;

/// Default base path of the panel UI.
pub const DEFAULT_BASE_PATH: &str = "/";

/// Login seeded into a fresh database.
pub const DEFAULT_USERNAME: &str = "admin";
/// Password seeded into a fresh database.
pub const DEFAULT_PASSWORD: &str = "admin";

/// Web listener and notification bot settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelSettings {
    /// Listen address; empty means all interfaces.
    pub web_listen: String,
    pub web_port: u16,
    /// Always starts and ends with `/`.
    pub web_base_path: String,
    pub tgbot_enabled: bool,
    pub tgbot_token: String,
    /// Zero when unset.
    pub tgbot_chat_id: i64,
    /// Cron-like schedule of the periodic report.
    pub tgbot_runtime: String,
    pub time_location: String,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            web_listen: String::new(),
            web_port: DEFAULT_PORT,
            web_base_path: DEFAULT_BASE_PATH.to_string(),
            tgbot_enabled: false,
            tgbot_token: String::new(),
            tgbot_chat_id: 0,
            tgbot_runtime: "@daily".to_string(),
            time_location: "Asia/Shanghai".to_string(),
        }
    }
}

/// A panel login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCredential {
    pub id: u32,
    pub username: String,
    pub password: String,
}

impl UserCredential {
    /// Returns true when either half of the credential is empty.
    pub fn is_incomplete(&self) -> bool {
        self.username.is_empty() || self.password.is_empty()
    }
}

impl Default for UserCredential {
    fn default() -> Self {
        Self {
            id: 1,
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
        }
    }
}

/// A proxy inbound served by the proxy core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Inbound {
    pub id: u32,
    pub user_id: u32,
    /// Uploaded bytes.
    pub up: i64,
    /// Downloaded bytes.
    pub down: i64,
    /// Traffic quota in bytes, zero for unlimited.
    pub total: i64,
    pub remark: String,
    pub enable: bool,
    /// Unix milliseconds, zero for never.
    pub expiry_time: i64,
    pub listen: String,
    pub port: u16,
    pub protocol: String,
    /// Protocol settings as raw JSON text.
    pub settings: String,
    pub stream_settings: String,
    pub tag: String,
    pub sniffing: String,
}

/// Geo data release recorded after a successful refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoDataVersion {
    pub tag: String,
    pub updated_at: DateTime<Utc>,
}

/// Full on-disk content of the panel database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelDatabase {
    pub settings: PanelSettings,
    pub users: Vec<UserCredential>,
    pub inbounds: Vec<Inbound>,
    pub geo_version: Option<GeoDataVersion>,
}

impl Default for PanelDatabase {
    fn default() -> Self {
        Self {
            settings: PanelSettings::default(),
            users: vec![UserCredential::default()],
            inbounds: Vec::new(),
            geo_version: None,
        }
    }
}

/// Normalizes a base path so it starts and ends with `/`.
pub fn normalize_base_path(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len() + 2);
    if !path.starts_with('/') {
        normalized.push('/');
    }
    normalized.push_str(path);
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_has_admin_user() {
        let db = PanelDatabase::default();
        assert_eq!(db.users.len(), 1);
        assert_eq!(db.users[0].username, "admin");
        assert_eq!(db.users[0].password, "admin");
        assert_eq!(db.settings.web_port, 54321);
        assert_eq!(db.settings.web_base_path, "/");
        assert!(db.geo_version.is_none());
    }

    #[test]
    fn base_path_normalization() {
        assert_eq!(normalize_base_path("panel"), "/panel/");
        assert_eq!(normalize_base_path("/panel"), "/panel/");
        assert_eq!(normalize_base_path("panel/"), "/panel/");
        assert_eq!(normalize_base_path("/a/b/"), "/a/b/");
        assert_eq!(normalize_base_path("/"), "/");
    }

    #[test]
    fn incomplete_credential() {
        let mut user = UserCredential::default();
        assert!(!user.is_incomplete());
        user.password.clear();
        assert!(user.is_incomplete());
    }

    #[test]
    fn database_tolerates_missing_sections() {
        let db: PanelDatabase = serde_json::from_str(r#"{"settings":{"web_port":8443}}"#).unwrap();
        assert_eq!(db.settings.web_port, 8443);
        assert_eq!(db.settings.web_base_path, "/");
        assert_eq!(db.users.len(), 1);
    }
}
