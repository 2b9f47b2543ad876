//! User-namespace creation, id mapping, and the id switch.
//!
//! The child attempts the namespace best-effort: lacking permission
//! is not fatal, only reported. The parent side writes the mapping
//! table through `/proc/<pid>/`, which is why child existence must
//! happen-before the mapping write. The id switch itself runs in both
//! the namespaced and non-namespaced cases.

use std::path::PathBuf;

use cordon_common::constants::{USERNS_COUNT, USERNS_OFFSET};
use cordon_common::error::{CordonError, Result};
use nix::sched::{CloneFlags, unshare};
use nix::unistd::{Gid, Pid, Uid, setgroups, setresgid, setresuid};

/// Attempts to move the calling process into a new user namespace.
///
/// Returns whether it worked; failure here is expected on kernels
/// that restrict unprivileged user namespaces.
#[must_use]
pub fn try_unshare_user() -> bool {
    match unshare(CloneFlags::CLONE_NEWUSER) {
        Ok(()) => {
            tracing::debug!("user namespace created");
            true
        }
        Err(errno) => {
            tracing::debug!(%errno, "user namespace not available");
            false
        }
    }
}

/// Writes the uid and gid mapping tables for the sandbox process.
///
/// Inner id 0 maps to [`USERNS_OFFSET`] on the host, covering
/// [`USERNS_COUNT`] contiguous ids, the only ids the sandboxed
/// process may ever present as its own.
///
/// # Errors
///
/// Returns [`CordonError::Io`] if either map file cannot be written.
pub fn write_id_maps(pid: Pid) -> Result<()> {
    let record = format!("0 {USERNS_OFFSET} {USERNS_COUNT}\n");
    for map in ["uid_map", "gid_map"] {
        let path = PathBuf::from(format!("/proc/{pid}/{map}"));
        tracing::debug!(path = %path.display(), "writing id map");
        std::fs::write(&path, &record).map_err(|e| CordonError::Io { path, source: e })?;
    }
    Ok(())
}

/// Switches real, effective, and saved user and group ids to `uid`
/// and clears supplementary groups down to that id's group.
///
/// # Errors
///
/// Returns [`CordonError::PrivilegeDrop`] if any of the three id
/// operations fails.
pub fn switch_user(uid: u32) -> Result<()> {
    tracing::debug!(uid, "switching ids");
    let user = Uid::from_raw(uid);
    let group = Gid::from_raw(uid);

    let id_err = |operation: &str| {
        let operation = operation.to_owned();
        move |errno: nix::Error| CordonError::PrivilegeDrop {
            capability: operation,
            message: errno.to_string(),
        }
    };

    setgroups(&[group]).map_err(id_err("setgroups"))?;
    setresgid(group, group, group).map_err(id_err("setresgid"))?;
    setresuid(user, user, user).map_err(id_err("setresuid"))?;
    Ok(())
}
