//! PID file management for the daemon.
//!
//! Prevents two daemon instances from running against the same socket. The
//! file is created on startup and removed on drop; a stale or invalid file
//! left by a dead process is replaced.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use tracing::{debug, info, warn};

use crate::error::{ServerError, ServerResult};

/// PID file manager.
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Creates a PID file at `path`.
    ///
    /// Returns an error if another instance is already running.
    pub fn create(path: impl Into<PathBuf>) -> ServerResult<Self> {
        let path = path.into();

        if path.exists() {
            match Self::read_pid(&path) {
                Ok(pid) if Self::is_process_running(pid) => {
                    return Err(ServerError::already_running(path.to_string_lossy()));
                }
                Ok(pid) => {
                    warn!(path = %path.display(), pid, "removing stale PID file");
                    fs::remove_file(&path)?;
                }
                Err(_) => {
                    warn!(path = %path.display(), "removing invalid PID file");
                    fs::remove_file(&path)?;
                }
            }
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let pid = process::id();
        let mut file = File::create(&path)?;
        writeln!(file, "{pid}")?;
        file.sync_all()?;

        info!(path = %path.display(), pid, "created PID file");
        Ok(Self { path })
    }

    /// Returns the path to the PID file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_pid(path: &Path) -> ServerResult<u32> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        contents
            .trim()
            .parse::<u32>()
            .map_err(|_| ServerError::config(format!("invalid PID in file: {}", contents.trim())))
    }

    #[cfg(unix)]
    fn is_process_running(pid: u32) -> bool {
        // Signal 0 checks for existence without delivering anything.
        unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
    }

    #[cfg(not(unix))]
    fn is_process_running(_pid: u32) -> bool {
        true
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                warn!(path = %self.path.display(), error = %e, "failed to remove PID file");
            } else {
                debug!(path = %self.path.display(), "removed PID file");
            }
        }
    }
}

/// Returns the default PID file path.
///
/// Uses `$XDG_RUNTIME_DIR/meetwise.pid` if available, otherwise
/// `/tmp/meetwise-$PID.pid`.
pub fn default_pid_path() -> PathBuf {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        PathBuf::from(runtime_dir).join("meetwise.pid")
    } else {
        PathBuf::from(format!("/tmp/meetwise-{}.pid", process::id()))
    }
}
