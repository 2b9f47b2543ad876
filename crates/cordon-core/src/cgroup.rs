//! Cgroups v2 resource control for a single run.
//!
//! The launcher provisions the group before spawning and joins it
//! itself, so the cloned sandbox inherits membership atomically. The
//! teardown path migrates the launcher back out and removes the
//! directory; it runs unconditionally after wait.

use std::io::Write;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};

use cordon_common::constants::CGROUP_V2_PATH;
use cordon_common::error::{CordonError, Result};
use cordon_common::types::{ResourceLimits, RunId};
use nix::sys::resource::{Resource, setrlimit};

/// Enables the memory/cpu/pids/io controllers at the root hierarchy.
///
/// Idempotent and process-wide; subtree control is inherited, so one
/// write at the root covers every group created below it.
///
/// # Errors
///
/// Returns [`CordonError::ResourceSetup`] if the control file cannot
/// be written.
pub fn enable_controllers() -> Result<()> {
    let path = Path::new(CGROUP_V2_PATH).join("cgroup.subtree_control");
    std::fs::write(&path, "+memory +cpu +pids +io").map_err(|e| CordonError::ResourceSetup {
        path: path.clone(),
        source: e,
    })?;
    tracing::debug!("cgroup controllers enabled");
    Ok(())
}

/// The ordered control-file writes for one run.
///
/// The membership write comes last: only once every ceiling is in
/// place does the launcher (pid `self_pid`) join the group, to be
/// inherited by the sandbox it is about to spawn.
#[must_use]
pub fn settings(limits: &ResourceLimits, self_pid: u32) -> Vec<(&'static str, String)> {
    vec![
        ("memory.max", limits.memory_bytes.to_string()),
        ("cpu.weight", limits.cpu_weight.to_string()),
        ("pids.max", limits.pids_max.to_string()),
        ("io.weight", limits.io_weight.to_string()),
        ("cgroup.procs", self_pid.to_string()),
    ]
}

/// Handle to the dedicated cgroup directory of one run.
#[derive(Debug)]
pub struct Cgroup {
    path: PathBuf,
}

impl Cgroup {
    /// Creates the run's cgroup directory under the v2 mount.
    ///
    /// # Errors
    ///
    /// Returns [`CordonError::ResourceSetup`] if the directory cannot
    /// be created.
    pub fn create(id: &RunId) -> Result<Self> {
        let path = Path::new(CGROUP_V2_PATH).join(id.as_str());
        std::fs::DirBuilder::new()
            .mode(0o700)
            .create(&path)
            .map_err(|e| CordonError::ResourceSetup {
                path: path.clone(),
                source: e,
            })?;
        tracing::info!(path = %path.display(), "cgroup created");
        Ok(Self { path })
    }

    /// Applies every configured ceiling, then joins the group.
    ///
    /// Writes are sequential with no partial rollback; cleanup
    /// removes the whole directory however far this got.
    ///
    /// # Errors
    ///
    /// Returns [`CordonError::ResourceSetup`] on the first write that
    /// fails.
    pub fn apply(&self, limits: &ResourceLimits, self_pid: u32) -> Result<()> {
        for (file, value) in settings(limits, self_pid) {
            let path = self.path.join(file);
            write_control(&path, &value)?;
            tracing::debug!(file, value = %value, "cgroup setting applied");
        }
        Ok(())
    }

    /// Tears down the cgroup for `id`.
    ///
    /// A non-empty cgroup cannot be removed, so the caller is first
    /// migrated back to the root group. Safe to invoke twice: a
    /// missing directory reports `NotFound` without touching anything
    /// else.
    ///
    /// # Errors
    ///
    /// Returns [`CordonError::NotFound`] when the group no longer
    /// exists, [`CordonError::ResourceSetup`] if migration or removal
    /// fails.
    pub fn destroy(id: &RunId) -> Result<()> {
        let path = Path::new(CGROUP_V2_PATH).join(id.as_str());
        if !path.exists() {
            return Err(CordonError::NotFound {
                kind: "cgroup",
                id: id.to_string(),
            });
        }

        let root_procs = Path::new(CGROUP_V2_PATH).join("cgroup.procs");
        write_control(&root_procs, &std::process::id().to_string())?;

        std::fs::remove_dir(&path).map_err(|e| CordonError::ResourceSetup {
            path: path.clone(),
            source: e,
        })?;
        tracing::info!(path = %path.display(), "cgroup removed");
        Ok(())
    }
}

/// Single unbuffered write to a cgroup control file. The v2 interface
/// rejects writes it cannot honor, so errors surface here rather than
/// at close time.
fn write_control(path: &Path, value: &str) -> Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|e| CordonError::ResourceSetup {
            path: path.to_path_buf(),
            source: e,
        })?;
    file.write_all(value.as_bytes())
        .map_err(|e| CordonError::ResourceSetup {
            path: path.to_path_buf(),
            source: e,
        })?;
    Ok(())
}

/// Caps the open-file-descriptor count; inherited by the sandbox at
/// clone time.
///
/// # Errors
///
/// Returns [`CordonError::ResourceSetup`] if `setrlimit(2)` fails.
pub fn set_fd_limit(count: u64) -> Result<()> {
    setrlimit(Resource::RLIMIT_NOFILE, count, count).map_err(|errno| {
        CordonError::ResourceSetup {
            path: PathBuf::from("RLIMIT_NOFILE"),
            source: std::io::Error::from_raw_os_error(errno as i32),
        }
    })
}
