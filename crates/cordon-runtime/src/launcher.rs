//! Launcher-side orchestration of a run.
//!
//! The order of operations is the contract: the cgroup is provisioned
//! and joined before the spawn so the sandbox inherits membership at
//! creation, the id-mapping handshake completes before the child
//! switches ids, the wait always happens, and teardown runs on every
//! exit path without ever overriding the primary outcome.

use cordon_common::constants::SANDBOX_STACK_SIZE;
use cordon_common::error::{CordonError, Result};
use cordon_common::types::{ResourceLimits, SandboxSpec};
use cordon_core::cgroup::{self, Cgroup};
use cordon_core::seccomp::SyscallPolicy;
use cordon_core::sync::{self, ParentEndpoint};
use cordon_core::{namespace, userns};
use nix::sys::signal::{Signal, kill};
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::Pid;

use crate::{host, sandbox};

/// Everything a run needs, fixed before the spawn.
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    /// What to execute, as whom, and where.
    pub spec: SandboxSpec,
    /// Ceilings applied to the run's cgroup.
    pub limits: ResourceLimits,
}

/// Runs one sandboxed program to completion.
///
/// Returns the sandboxed program's exit status. Resource teardown is
/// unconditional once provisioning has begun; teardown failures are
/// logged and never displace the primary result.
///
/// # Errors
///
/// Any setup-phase failure, per the workspace error taxonomy. The
/// sandboxed program's own failure is not an error here; it comes
/// back as its exit status.
pub fn run(config: &LaunchConfig) -> Result<i32> {
    config.spec.validate()?;
    host::validate_host()?;

    cgroup::enable_controllers()?;
    let group = Cgroup::create(&config.spec.run_id)?;
    tracing::info!(run_id = %config.spec.run_id, "run provisioned");

    // The cgroup now exists: whatever happens below, it gets removed.
    let outcome = provisioned_run(config, &group);

    if let Err(err) = Cgroup::destroy(&config.spec.run_id) {
        tracing::warn!(error = %err, "cgroup teardown failed");
    }

    outcome
}

/// Spawns, synchronizes, and waits. Failures propagate to the caller,
/// which owns cleanup.
fn provisioned_run(config: &LaunchConfig, group: &Cgroup) -> Result<i32> {
    group.apply(&config.limits, std::process::id())?;
    cgroup::set_fd_limit(config.limits.fd_count)?;

    let policy = SyscallPolicy::deny_list()?;
    let (parent_end, child_end) = sync::channel()?;

    let mut stack = vec![0u8; SANDBOX_STACK_SIZE];
    let spec = config.spec.clone();
    let mut child_end = Some(child_end);
    let entry = Box::new(move || {
        child_end
            .take()
            .map_or(1, |channel| sandbox::enter(&spec, channel, &policy))
    });

    let pid = namespace::spawn_sandboxed(entry, &mut stack)?;
    // Dropping the entry closure on return closed this process's copy
    // of the child endpoint; the sandbox runs with its own copy.

    let handshake = drive_id_mapping(&parent_end, pid);
    drop(parent_end);

    if handshake.is_err() {
        tracing::warn!(pid = %pid, "id-mapping handshake failed, killing sandbox");
        if let Err(errno) = kill(pid, Signal::SIGKILL) {
            tracing::warn!(%errno, pid = %pid, "failed to signal sandbox");
        }
    }

    let status = wait_for_exit(pid)?;
    handshake?;
    tracing::info!(pid = %pid, status, "sandbox exited");
    Ok(status)
}

/// Parent half of the id-mapping rendezvous.
///
/// The child's existence happens-before this read, and the mapping
/// write happens-before the acknowledgement, which in turn
/// happens-before the child's id switch.
fn drive_id_mapping(channel: &ParentEndpoint, pid: Pid) -> Result<()> {
    let created = channel.recv_userns_report()?;
    tracing::debug!(pid = %pid, created, "sandbox reported user namespace attempt");
    if created {
        userns::write_id_maps(pid)?;
    }
    channel.send_ack()
}

fn wait_for_exit(pid: Pid) -> Result<i32> {
    match waitpid(pid, None) {
        Ok(WaitStatus::Exited(_, code)) => Ok(code),
        Ok(WaitStatus::Signaled(_, signal, _)) => Ok(128 + signal as i32),
        Ok(status) => {
            tracing::warn!(pid = %pid, ?status, "unexpected wait status");
            Ok(1)
        }
        Err(errno) => Err(CordonError::Spawn {
            source: std::io::Error::from_raw_os_error(errno as i32),
        }),
    }
}
