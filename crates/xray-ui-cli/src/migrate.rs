//! Import of inbounds from a v2-ui installation.
//!
//! v2-ui keeps its inbounds in the `inbound` table of a SQLite database. All
//! rows are read, attached to the panel's first user and added in a single
//! batch, so a clash on any port leaves the panel untouched.

use std::path::{Path, PathBuf};

use sqlx::sqlite::{SqliteConnectOptions, SqliteRow};
use sqlx::{Connection, Row, SqliteConnection};
use thiserror::Error;
use tracing::{debug, info};

use xray_ui_core::{Inbound, PanelStore, StoreError};

const SELECT_INBOUNDS: &str = "SELECT id, port, listen, protocol, settings, stream_settings, \
     tag, sniffing, remark, up, down, enable FROM inbound";

/// Errors raised by [`migrate_from_v2ui`].
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("v2-ui database not found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("cannot access v2-ui database at {}: {source}", path.display())]
    Access {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read v2-ui database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("v2-ui inbound {id} has invalid port {port}")]
    InvalidPort { id: i64, port: i64 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Copies every v2-ui inbound into `store`. Returns how many were added.
pub async fn migrate_from_v2ui<S: PanelStore>(
    path: &Path,
    store: &mut S,
) -> Result<usize, MigrateError> {
    let exists = tokio::fs::try_exists(path)
        .await
        .map_err(|source| MigrateError::Access {
            path: path.to_path_buf(),
            source,
        })?;
    if !exists {
        return Err(MigrateError::NotFound(path.to_path_buf()));
    }

    let user = store.first_user()?;

    let options = SqliteConnectOptions::new()
        .filename(path)
        .read_only(true);
    let mut conn = SqliteConnection::connect_with(&options).await?;
    let rows = sqlx::query(SELECT_INBOUNDS).fetch_all(&mut conn).await?;
    conn.close().await?;
    debug!(rows = rows.len(), path = %path.display(), "Read v2-ui inbounds");

    let inbounds = rows
        .iter()
        .map(|row| to_inbound(row, user.id))
        .collect::<Result<Vec<_>, _>>()?;

    let count = store.add_inbounds(inbounds)?;
    info!(count, "Migrated inbounds from v2-ui");
    Ok(count)
}

fn to_inbound(row: &SqliteRow, user_id: u32) -> Result<Inbound, MigrateError> {
    let id: i64 = row.try_get("id")?;
    let raw_port: i64 = row.try_get("port")?;
    let port = u16::try_from(raw_port)
        .ok()
        .filter(|port| *port != 0)
        .ok_or(MigrateError::InvalidPort { id, port: raw_port })?;

    let text = |column: &str| -> Result<String, sqlx::Error> {
        Ok(row.try_get::<Option<String>, _>(column)?.unwrap_or_default())
    };

    Ok(Inbound {
        id: 0,
        user_id,
        up: row.try_get::<Option<i64>, _>("up")?.unwrap_or(0),
        down: row.try_get::<Option<i64>, _>("down")?.unwrap_or(0),
        total: 0,
        remark: text("remark")?,
        enable: row.try_get::<Option<bool>, _>("enable")?.unwrap_or(true),
        expiry_time: 0,
        listen: text("listen")?,
        port,
        protocol: text("protocol")?,
        settings: text("settings")?,
        stream_settings: text("stream_settings")?,
        tag: text("tag")?,
        sniffing: text("sniffing")?,
    })
}

#[cfg(test)]
mod tests {
    use tempfile::{TempDir, tempdir};
    use xray_ui_core::MemoryStore;

    use super::*;

    const CREATE_TABLE: &str = "CREATE TABLE inbound (
        id INTEGER PRIMARY KEY,
        port INTEGER,
        listen TEXT,
        protocol TEXT,
        settings TEXT,
        stream_settings TEXT,
        tag TEXT,
        sniffing TEXT,
        remark TEXT,
        up INTEGER,
        down INTEGER,
        enable BOOLEAN
    )";

    async fn legacy_db(rows: &[(i64, &str)]) -> (TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("v2-ui.db");
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true);
        let mut conn = SqliteConnection::connect_with(&options).await.unwrap();

        sqlx::query(CREATE_TABLE).execute(&mut conn).await.unwrap();
        for (port, remark) in rows {
            sqlx::query(
                "INSERT INTO inbound (port, listen, protocol, settings, stream_settings, \
                 tag, sniffing, remark, up, down, enable) \
                 VALUES (?, '0.0.0.0', 'vmess', '{}', '{}', ?, '{}', ?, 10, 20, 1)",
            )
            .bind(*port)
            .bind(format!("inbound-{port}"))
            .bind(*remark)
            .execute(&mut conn)
            .await
            .unwrap();
        }
        conn.close().await.unwrap();

        (dir, path)
    }

    #[tokio::test]
    async fn migrates_every_row() {
        let (_dir, path) = legacy_db(&[(10086, "first"), (10087, "second")]).await;
        let mut store = MemoryStore::new();

        let count = migrate_from_v2ui(&path, &mut store).await.unwrap();

        assert_eq!(count, 2);
        let inbounds = store.inbounds().unwrap();
        assert_eq!(inbounds.len(), 2);
        assert_eq!(inbounds[0].port, 10086);
        assert_eq!(inbounds[0].remark, "first");
        assert_eq!(inbounds[0].tag, "inbound-10086");
        assert_eq!(inbounds[0].up, 10);
        assert_eq!(inbounds[0].down, 20);
        assert!(inbounds[0].enable);
        assert!(inbounds.iter().all(|i| i.user_id == 1));
        assert_eq!(inbounds[1].id, 2);
    }

    #[tokio::test]
    async fn port_clash_rejects_whole_batch() {
        let (_dir, path) = legacy_db(&[(20000, "a"), (443, "b")]).await;
        let mut store = MemoryStore::new();
        store
            .add_inbounds(vec![Inbound {
                port: 443,
                ..Inbound::default()
            }])
            .unwrap();

        let result = migrate_from_v2ui(&path, &mut store).await;

        assert!(matches!(
            result,
            Err(MigrateError::Store(StoreError::PortInUse { port: 443 }))
        ));
        assert_eq!(store.inbounds().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_table_migrates_nothing() {
        let (_dir, path) = legacy_db(&[]).await;
        let mut store = MemoryStore::new();

        assert_eq!(migrate_from_v2ui(&path, &mut store).await.unwrap(), 0);
        assert!(store.inbounds().unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_port_is_reported() {
        let (_dir, path) = legacy_db(&[(70000, "too big")]).await;
        let mut store = MemoryStore::new();

        let result = migrate_from_v2ui(&path, &mut store).await;
        assert!(matches!(
            result,
            Err(MigrateError::InvalidPort { port: 70000, .. })
        ));
    }

    #[tokio::test]
    async fn missing_database_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.db");
        let mut store = MemoryStore::new();

        let result = migrate_from_v2ui(&path, &mut store).await;
        assert!(matches!(result, Err(MigrateError::NotFound(p)) if p == path));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn unreadable_location_is_not_reported_missing() {
        let dir = tempdir().unwrap();
        let not_a_dir = dir.path().join("plain-file");
        std::fs::write(&not_a_dir, b"").unwrap();
        let path = not_a_dir.join("v2-ui.db");
        let mut store = MemoryStore::new();

        let result = migrate_from_v2ui(&path, &mut store).await;
        assert!(matches!(result, Err(MigrateError::Access { .. })));
    }

    #[tokio::test]
    async fn missing_table_is_a_database_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.db");
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true);
        let mut conn = SqliteConnection::connect_with(&options).await.unwrap();
        sqlx::query("CREATE TABLE setting (id INTEGER PRIMARY KEY)")
            .execute(&mut conn)
            .await
            .unwrap();
        conn.close().await.unwrap();

        let mut store = MemoryStore::new();
        let result = migrate_from_v2ui(&path, &mut store).await;
        assert!(matches!(result, Err(MigrateError::Database(_))));
    }
}
