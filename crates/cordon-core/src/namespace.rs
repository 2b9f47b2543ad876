//! Namespace creation for the sandbox process.
//!
//! The sandbox enters every namespace it will ever get in a single
//! `clone(2)`: mount, cgroup, PID, IPC, network, and UTS. The user
//! namespace is the exception: it is attempted later by the child
//! itself so that its absence can be tolerated (see [`crate::userns`]).

use cordon_common::error::{CordonError, Result};
use nix::sched::{CloneFlags, clone};
use nix::sys::signal::Signal;
use nix::unistd::Pid;

/// The combined namespace flag set for a sandbox spawn.
#[must_use]
pub fn sandbox_flags() -> CloneFlags {
    CloneFlags::CLONE_NEWNS
        | CloneFlags::CLONE_NEWCGROUP
        | CloneFlags::CLONE_NEWPID
        | CloneFlags::CLONE_NEWIPC
        | CloneFlags::CLONE_NEWNET
        | CloneFlags::CLONE_NEWUTS
}

/// Spawns `entry` as the first process of a fresh namespace bundle.
///
/// The caller owns `stack` and must keep it alive until the child has
/// been waited on. SIGCHLD is requested so the parent's `waitpid`
/// works as for a regular fork.
///
/// # Errors
///
/// Returns [`CordonError::Spawn`] if `clone(2)` fails.
#[allow(unsafe_code)]
pub fn spawn_sandboxed(
    entry: Box<dyn FnMut() -> isize + '_>,
    stack: &mut [u8],
) -> Result<Pid> {
    // SAFETY: the child runs in a copied address space (no CLONE_VM),
    // so the callback and its captures are duplicated at clone time;
    // the stack slice outlives the child by the caller's contract.
    let pid = unsafe {
        clone(
            entry,
            stack,
            sandbox_flags(),
            Some(Signal::SIGCHLD as libc::c_int),
        )
    }
    .map_err(|errno| CordonError::Spawn {
        source: std::io::Error::from_raw_os_error(errno as i32),
    })?;
    tracing::debug!(pid = %pid, "sandbox process spawned");
    Ok(pid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_set_covers_all_spawned_namespaces() {
        let flags = sandbox_flags();
        for required in [
            CloneFlags::CLONE_NEWNS,
            CloneFlags::CLONE_NEWCGROUP,
            CloneFlags::CLONE_NEWPID,
            CloneFlags::CLONE_NEWIPC,
            CloneFlags::CLONE_NEWNET,
            CloneFlags::CLONE_NEWUTS,
        ] {
            assert!(flags.contains(required), "missing {required:?}");
        }
        // The user namespace is attempted post-clone, never here.
        assert!(!flags.contains(CloneFlags::CLONE_NEWUSER));
    }
}
