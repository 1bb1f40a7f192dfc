//! JSON file backend for [`PanelStore`].

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::model::PanelDatabase;
use crate::store::{Field, PanelStore};

/// Panel database kept in a single JSON file.
///
/// The whole document is rewritten on every change, through a temporary
/// file renamed over the original.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    db: PanelDatabase,
}

impl FileStore {
    /// Opens the database at `path`, creating it with defaults if missing.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();

        let db = if path.exists() {
            Self::read(&path)?
        } else {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
            }
            let db = PanelDatabase::default();
            Self::persist(&path, &db)?;
            info!(path = %path.display(), "Created panel database");
            db
        };

        Ok(Self { path, db })
    }

    /// Returns the database file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reloads the content from disk, picking up writes from other processes.
    pub fn refresh(&mut self) -> StoreResult<()> {
        self.db = Self::read(&self.path)?;
        debug!(path = %self.path.display(), "Reloaded panel database");
        Ok(())
    }

    fn read(path: &Path) -> StoreResult<PanelDatabase> {
        let bytes = fs::read(path).map_err(|e| StoreError::io(path, e))?;
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
    }

    fn persist(path: &Path, db: &PanelDatabase) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(db).map_err(StoreError::Encode)?;

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&tmp).map_err(|e| StoreError::io(&tmp, e))?;
        file.write_all(&json).map_err(|e| StoreError::io(&tmp, e))?;
        file.sync_all().map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| StoreError::io(path, e))?;
        Ok(())
    }
}

impl PanelStore for FileStore {
    fn database(&self) -> StoreResult<&PanelDatabase> {
        Ok(&self.db)
    }

    fn modify<F>(&mut self, field: Field, change: F) -> StoreResult<()>
    where
        F: FnOnce(&mut PanelDatabase) -> StoreResult<()>,
    {
        let mut next = self.db.clone();
        change(&mut next)?;
        Self::persist(&self.path, &next)?;
        self.db = next;
        debug!(field = %field, path = %self.path.display(), "Persisted change");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_creates_default_database() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("xray-ui.json");

        let store = FileStore::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.path(), path);
        assert_eq!(store.port().unwrap(), 54321);
        assert_eq!(store.first_user().unwrap().username, "admin");
    }

    #[test]
    fn writes_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("xray-ui.json");

        {
            let mut store = FileStore::open(&path).unwrap();
            store.set_port(8443).unwrap();
            store.set_base_path("/panel").unwrap();
            store.update_first_user(Some("root"), Some("pw")).unwrap();
        }

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.port().unwrap(), 8443);
        assert_eq!(store.base_path().unwrap(), "/panel/");
        let user = store.first_user().unwrap();
        assert_eq!((user.username.as_str(), user.password.as_str()), ("root", "pw"));
    }

    #[test]
    fn refresh_sees_other_handles() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("xray-ui.json");

        let mut long_lived = FileStore::open(&path).unwrap();
        let mut other = FileStore::open(&path).unwrap();
        other.set_listen("10.0.0.1").unwrap();

        assert_eq!(long_lived.listen().unwrap(), "");
        long_lived.refresh().unwrap();
        assert_eq!(long_lived.listen().unwrap(), "10.0.0.1");
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("xray-ui.json");
        fs::write(&path, b"{not json").unwrap();

        let result = FileStore::open(&path);
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn failed_change_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("xray-ui.json");
        let mut store = FileStore::open(&path).unwrap();
        let before = fs::read(&path).unwrap();

        assert!(store.set_port(0).is_err());
        assert!(store.update_first_user(Some(""), None).is_err());

        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn unwritable_location_is_an_io_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"").unwrap();

        let result = FileStore::open(blocker.join("xray-ui.json"));
        assert!(matches!(result, Err(StoreError::Io { .. })));
    }
}
