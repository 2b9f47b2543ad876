//! Root isolation via bind mounts and `pivot_root(2)`.
//!
//! Runs inside the freshly created mount namespace and leaves the
//! process rooted in the caller's rootfs with the old root detached.
//! The sequence must complete fully; a half-pivoted root never
//! reaches exec.

use std::path::{Path, PathBuf};

use cordon_common::constants::SCRATCH_DIR;
use cordon_common::error::{CordonError, Result};
use nix::mount::{MntFlags, MsFlags, mount, umount2};
use nix::unistd::{chdir, pivot_root};

fn mount_err(step: &str, detail: impl std::fmt::Display) -> CordonError {
    CordonError::MountSetup {
        message: format!("{step}: {detail}"),
    }
}

/// Replaces the process root with `rootfs`.
///
/// Steps, in order:
/// 1. recursively remount the whole tree `MS_PRIVATE`, so nothing
///    done here propagates back to the host;
/// 2. bind-mount `rootfs` onto a fresh scratch directory (the pivot
///    target must be a mount point distinct from its parent);
/// 3. create a staging directory inside the bind mount to receive the
///    old root;
/// 4. `pivot_root(2)`;
/// 5. `chdir("/")`;
/// 6. lazily detach the old root and remove the staging directory,
///    named from the path actually created in step 3.
///
/// # Errors
///
/// Returns [`CordonError::MountSetup`] naming the failing step.
pub fn isolate_root(rootfs: &Path) -> Result<()> {
    tracing::debug!(rootfs = %rootfs.display(), "isolating root");

    mount(
        None::<&str>,
        "/",
        None::<&str>,
        MsFlags::MS_REC | MsFlags::MS_PRIVATE,
        None::<&str>,
    )
    .map_err(|e| mount_err("remounting / private", e))?;

    let bind_dir = scratch_dir(SCRATCH_DIR, "cordon.")?;
    mount(
        Some(rootfs),
        &bind_dir,
        None::<&str>,
        MsFlags::MS_BIND | MsFlags::MS_PRIVATE,
        None::<&str>,
    )
    .map_err(|e| mount_err("bind-mounting rootfs", e))?;

    let staging = scratch_dir(&bind_dir, "oldroot.")?;

    pivot_root(&bind_dir, &staging).map_err(|e| mount_err("pivot_root", e))?;
    chdir("/").map_err(|e| mount_err("chdir to new root", e))?;

    // The staging directory now lives at the new root, under whatever
    // name mkdtemp actually picked.
    let staging_name = staging
        .file_name()
        .ok_or_else(|| mount_err("staging path has no file name", staging.display()))?;
    let old_root = Path::new("/").join(staging_name);

    umount2(&old_root, MntFlags::MNT_DETACH)
        .map_err(|e| mount_err("detaching old root", e))?;
    std::fs::remove_dir(&old_root)
        .map_err(|e| mount_err("removing old root staging directory", e))?;

    tracing::debug!("root isolated");
    Ok(())
}

/// Creates a uniquely named directory under `parent` that survives
/// drop; it is consumed by the mount table, not by this process.
fn scratch_dir(parent: impl AsRef<Path>, prefix: &str) -> Result<PathBuf> {
    let dir = tempfile::Builder::new()
        .prefix(prefix)
        .tempdir_in(parent)
        .map_err(|e| mount_err("creating scratch directory", e))?;
    Ok(dir.into_path())
}
