//! The sandbox side of a run: everything between `clone(2)` and
//! `execve(2)`.
//!
//! The sequence is a short-circuiting chain of fallible steps whose
//! ordering is load-bearing: the root pivot needs the mount
//! namespace, the id switch must follow the parent's mapping write,
//! the capability drop must follow the id switch, and the seccomp
//! load comes last because earlier steps still need syscalls the
//! filter would complicate. Any failure aborts before exec.

use std::convert::Infallible;
use std::ffi::CString;

use cordon_common::error::{CordonError, Result};
use cordon_common::types::SandboxSpec;
use cordon_core::seccomp::SyscallPolicy;
use cordon_core::sync::ChildEndpoint;
use cordon_core::{capability, filesystem, userns};
use nix::unistd::{execve, sethostname};

/// Entry point handed to `clone(2)`; returns the child's exit status
/// when setup fails, and does not return on success.
pub fn enter(spec: &SandboxSpec, channel: ChildEndpoint, policy: &SyscallPolicy) -> isize {
    match setup_and_exec(spec, channel, policy) {
        Err(err) => {
            tracing::error!(error = %err, "sandbox setup failed");
            1
        }
        Ok(never) => match never {},
    }
}

fn setup_and_exec(
    spec: &SandboxSpec,
    channel: ChildEndpoint,
    policy: &SyscallPolicy,
) -> Result<Infallible> {
    sethostname(spec.run_id.as_str()).map_err(|errno| CordonError::Io {
        path: "/proc/sys/kernel/hostname".into(),
        source: std::io::Error::from_raw_os_error(errno as i32),
    })?;

    filesystem::isolate_root(&spec.rootfs)?;

    let created = userns::try_unshare_user();
    channel.send_userns_report(created)?;
    channel.recv_ack()?;
    userns::switch_user(spec.uid)?;

    capability::drop_denied(&capability::DENIED_CAPABILITIES)?;
    policy.install()?;

    // Handshake role complete; close our endpoint before the image
    // replacement.
    drop(channel);

    exec(&spec.command)
}

/// Replaces the process image with the target program, handing it an
/// empty environment.
fn exec(command: &[String]) -> Result<Infallible> {
    let argv = command
        .iter()
        .map(|arg| CString::new(arg.as_str()))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| CordonError::Usage {
            message: "command contains an interior NUL byte".into(),
        })?;
    let program = argv.first().ok_or_else(|| CordonError::Usage {
        message: "no command to execute".into(),
    })?;

    let env: [CString; 0] = [];
    execve(program, &argv, &env).map_err(|errno| CordonError::Exec {
        program: command[0].clone(),
        source: std::io::Error::from_raw_os_error(errno as i32),
    })
}
