//! One sync process per database.
//!
//! Two processes reconciling the same PBX would each keep their own request
//! spacer and double the outbound rate, so the service holds a PID file next
//! to its database for its whole lifetime.

use std::fs;
use std::path::{Path, PathBuf};

use pbxpresence_domain::{PresenceError, Result};
use tracing::{info, warn};

/// PID-file lock released on drop.
#[derive(Debug)]
pub struct InstanceLock {
    pid_file: PathBuf,
}

impl InstanceLock {
    /// Lock the database at `db_path` (the PID file is `<db_path>.pid`).
    ///
    /// A PID file left by a process that no longer exists is replaced.
    ///
    /// # Errors
    /// `PresenceError::Config` when a live process holds the lock or the PID
    /// file cannot be written.
    pub fn acquire_for_database<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let mut pid_file = db_path.as_ref().as_os_str().to_owned();
        pid_file.push(".pid");
        Self::acquire(PathBuf::from(pid_file))
    }

    fn acquire(pid_file: PathBuf) -> Result<Self> {
        if let Some(pid) = read_pid(&pid_file) {
            if pid != std::process::id() && is_process_running(pid) {
                warn!(existing_pid = pid, path = %pid_file.display(), "Instance lock held");
                return Err(PresenceError::Config(format!(
                    "another pbxpresence process (PID {pid}) is using this database"
                )));
            }
            warn!(stale_pid = pid, path = %pid_file.display(), "Replacing stale PID file");
        }

        if let Some(parent) = pid_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                PresenceError::Config(format!(
                    "failed to create lock directory {}: {err}",
                    parent.display()
                ))
            })?;
        }

        let current_pid = std::process::id();
        fs::write(&pid_file, current_pid.to_string()).map_err(|err| {
            PresenceError::Config(format!(
                "failed to write PID file {}: {err}",
                pid_file.display()
            ))
        })?;

        info!(pid = current_pid, path = %pid_file.display(), "Instance lock acquired");
        Ok(Self { pid_file })
    }

    pub fn path(&self) -> &Path {
        &self.pid_file
    }
}

fn read_pid(pid_file: &Path) -> Option<u32> {
    fs::read_to_string(pid_file).ok()?.trim().parse().ok()
}

#[cfg(target_os = "linux")]
fn is_process_running(pid: u32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists()
}

#[cfg(not(target_os = "linux"))]
fn is_process_running(pid: u32) -> bool {
    // No cheap portable probe; treat the holder as alive.
    warn!(pid, "Cannot probe process liveness on this platform");
    true
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        match fs::remove_file(&self.pid_file) {
            Ok(()) => info!(path = %self.pid_file.display(), "Instance lock released"),
            Err(err) => {
                warn!(error = %err, path = %self.pid_file.display(), "Failed to remove PID file");
            }
        }
    }
}
