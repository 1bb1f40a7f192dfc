//! PID file guarding against a second panel process.
//!
//! The file holds the decimal PID of the running panel and is removed when
//! the guard drops. A leftover file whose process is gone is replaced.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process;

use tracing::{debug, info, warn};

use crate::error::{ServerError, ServerResult};

/// Held for the lifetime of the `run` command.
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
    pid: u32,
}

impl PidFile {
    /// Claims `path` for the current process.
    ///
    /// Fails with [`ServerError::AlreadyRunning`] when the file names a live
    /// process.
    pub fn create(path: impl Into<PathBuf>) -> ServerResult<Self> {
        let path = path.into();

        match read_pid(&path) {
            Ok(Some(pid)) if is_process_running(pid) => {
                return Err(ServerError::already_running(path.display().to_string()));
            }
            Ok(Some(pid)) => {
                warn!(path = %path.display(), pid, "Replacing stale PID file");
                fs::remove_file(&path)?;
            }
            Ok(None) => {}
            Err(_) => {
                warn!(path = %path.display(), "Replacing unreadable PID file");
                fs::remove_file(&path)?;
            }
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let pid = process::id();
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            // Lost a race against another panel starting at the same moment.
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(ServerError::already_running(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        writeln!(file, "{pid}")?;
        file.sync_all()?;

        info!(path = %path.display(), pid, "Wrote PID file");
        Ok(Self { path, pid })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        // Only remove the file if it still names us.
        if !matches!(read_pid(&self.path), Ok(Some(pid)) if pid == self.pid) {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed PID file"),
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove PID file"
            ),
        }
    }
}

/// Reads the PID stored at `path`. `Ok(None)` means there is no file.
fn read_pid(path: &Path) -> ServerResult<Option<u32>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    contents
        .trim()
        .parse::<u32>()
        .map(Some)
        .map_err(|_| ServerError::config(format!("invalid PID in {}", path.display())))
}

#[cfg(unix)]
fn is_process_running(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // Signal 0 probes for existence. EPERM still means the process exists.
    if unsafe { libc::kill(pid, 0) } == 0 {
        return true;
    }
    std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(not(unix))]
fn is_process_running(_pid: u32) -> bool {
    true
}
