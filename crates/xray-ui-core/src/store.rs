//! Typed access to persisted panel state.
//!
//! [`PanelStore`] has two required methods: [`PanelStore::database`] for
//! reads and [`PanelStore::modify`] for writes. Every typed accessor is
//! built on top of them, so a backend only decides how a modified
//! [`PanelDatabase`] becomes durable. A write either fully applies or leaves
//! the store untouched, and writes never depend on each other.

use std::fmt;

use chrono::Utc;

use crate::error::{StoreError, StoreResult};
use crate::model::{
    GeoDataVersion, Inbound, PanelDatabase, PanelSettings, UserCredential, normalize_base_path,
};

/// A persisted value touched by a single write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Port,
    Listen,
    BasePath,
    Credentials,
    TgbotToken,
    TgbotRuntime,
    TgbotChatId,
    TgbotEnabled,
    /// All settings at once (reset).
    Settings,
    Inbounds,
    GeoVersion,
}

impl Field {
    /// Returns the field name used in messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Port => "port",
            Self::Listen => "listen",
            Self::BasePath => "base path",
            Self::Credentials => "credentials",
            Self::TgbotToken => "bot token",
            Self::TgbotRuntime => "bot schedule",
            Self::TgbotChatId => "bot chat id",
            Self::TgbotEnabled => "bot enabled",
            Self::Settings => "settings",
            Self::Inbounds => "inbounds",
            Self::GeoVersion => "geo version",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings, user and version store backing the panel.
pub trait PanelStore {
    /// Returns the current database content.
    fn database(&self) -> StoreResult<&PanelDatabase>;

    /// Applies `change` to a copy of the database and makes it durable.
    ///
    /// If `change` or persisting fails the store keeps its previous content.
    fn modify<F>(&mut self, field: Field, change: F) -> StoreResult<()>
    where
        F: FnOnce(&mut PanelDatabase) -> StoreResult<()>;

    fn settings(&self) -> StoreResult<PanelSettings> {
        Ok(self.database()?.settings.clone())
    }

    fn port(&self) -> StoreResult<u16> {
        Ok(self.database()?.settings.web_port)
    }

    fn set_port(&mut self, port: u16) -> StoreResult<()> {
        if port == 0 {
            return Err(StoreError::invalid(
                Field::Port.as_str(),
                "must be greater than zero",
            ));
        }
        self.modify(Field::Port, |db| {
            db.settings.web_port = port;
            Ok(())
        })
    }

    fn listen(&self) -> StoreResult<String> {
        Ok(self.database()?.settings.web_listen.clone())
    }

    fn set_listen(&mut self, listen: &str) -> StoreResult<()> {
        self.modify(Field::Listen, |db| {
            db.settings.web_listen = listen.to_string();
            Ok(())
        })
    }

    fn base_path(&self) -> StoreResult<String> {
        Ok(self.database()?.settings.web_base_path.clone())
    }

    fn set_base_path(&mut self, path: &str) -> StoreResult<()> {
        let normalized = normalize_base_path(path);
        self.modify(Field::BasePath, |db| {
            db.settings.web_base_path = normalized;
            Ok(())
        })
    }

    fn set_tgbot_token(&mut self, token: &str) -> StoreResult<()> {
        self.modify(Field::TgbotToken, |db| {
            db.settings.tgbot_token = token.to_string();
            Ok(())
        })
    }

    fn set_tgbot_runtime(&mut self, runtime: &str) -> StoreResult<()> {
        self.modify(Field::TgbotRuntime, |db| {
            db.settings.tgbot_runtime = runtime.to_string();
            Ok(())
        })
    }

    fn set_tgbot_chat_id(&mut self, chat_id: i64) -> StoreResult<()> {
        self.modify(Field::TgbotChatId, |db| {
            db.settings.tgbot_chat_id = chat_id;
            Ok(())
        })
    }

    fn tgbot_enabled(&self) -> StoreResult<bool> {
        Ok(self.database()?.settings.tgbot_enabled)
    }

    fn set_tgbot_enabled(&mut self, enabled: bool) -> StoreResult<()> {
        self.modify(Field::TgbotEnabled, |db| {
            db.settings.tgbot_enabled = enabled;
            Ok(())
        })
    }

    /// Restores every setting to its default. Users and inbounds are kept.
    fn reset_settings(&mut self) -> StoreResult<()> {
        self.modify(Field::Settings, |db| {
            db.settings = PanelSettings::default();
            Ok(())
        })
    }

    fn first_user(&self) -> StoreResult<UserCredential> {
        self.database()?
            .users
            .first()
            .cloned()
            .ok_or(StoreError::NoUser)
    }

    /// Updates the first user's login. A `None` half keeps its stored value.
    fn update_first_user(
        &mut self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> StoreResult<()> {
        if username.is_some_and(str::is_empty) {
            return Err(StoreError::invalid("username", "can not be empty"));
        }
        if password.is_some_and(str::is_empty) {
            return Err(StoreError::invalid("password", "can not be empty"));
        }
        self.modify(Field::Credentials, |db| {
            let user = db.users.first_mut().ok_or(StoreError::NoUser)?;
            if let Some(username) = username {
                user.username = username.to_string();
            }
            if let Some(password) = password {
                user.password = password.to_string();
            }
            Ok(())
        })
    }

    fn inbounds(&self) -> StoreResult<Vec<Inbound>> {
        Ok(self.database()?.inbounds.clone())
    }

    /// Adds all inbounds or none of them.
    ///
    /// Ids are assigned by the store. Fails if any port is already taken,
    /// including by another inbound of the same batch.
    fn add_inbounds(&mut self, inbounds: Vec<Inbound>) -> StoreResult<usize> {
        let count = inbounds.len();
        self.modify(Field::Inbounds, move |db| {
            let mut next_id = db.inbounds.iter().map(|i| i.id).max().unwrap_or(0);
            for mut inbound in inbounds {
                if db.inbounds.iter().any(|existing| existing.port == inbound.port) {
                    return Err(StoreError::PortInUse { port: inbound.port });
                }
                next_id += 1;
                inbound.id = next_id;
                db.inbounds.push(inbound);
            }
            Ok(())
        })?;
        Ok(count)
    }

    fn geo_version(&self) -> StoreResult<Option<GeoDataVersion>> {
        Ok(self.database()?.geo_version.clone())
    }

    fn set_geo_version(&mut self, tag: &str) -> StoreResult<()> {
        if tag.is_empty() {
            return Err(StoreError::invalid(
                Field::GeoVersion.as_str(),
                "can not be empty",
            ));
        }
        self.modify(Field::GeoVersion, |db| {
            db.geo_version = Some(GeoDataVersion {
                tag: tag.to_string(),
                updated_at: Utc::now(),
            });
            Ok(())
        })
    }
}

/// A store that lives only in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    db: PanelDatabase,
}

impl MemoryStore {
    /// Creates a store seeded with the default database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `db`.
    pub fn with_database(db: PanelDatabase) -> Self {
        Self { db }
    }

    /// Consumes the store and returns its content.
    pub fn into_database(self) -> PanelDatabase {
        self.db
    }
}

impl PanelStore for MemoryStore {
    fn database(&self) -> StoreResult<&PanelDatabase> {
        Ok(&self.db)
    }

    fn modify<F>(&mut self, _field: Field, change: F) -> StoreResult<()>
    where
        F: FnOnce(&mut PanelDatabase) -> StoreResult<()>,
    {
        let mut next = self.db.clone();
        change(&mut next)?;
        self.db = next;
        Ok(())
    }
}
