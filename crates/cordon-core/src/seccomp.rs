//! Syscall filtering for the sandbox process.
//!
//! The filter is default-allow with a curated deny-list; every denied
//! call fails with EPERM instead of killing the process. Loading the
//! filter is the final privilege-reduction step before exec.

use std::collections::BTreeMap;

use cordon_common::error::{CordonError, Result};
use seccompiler::{
    BpfProgram, SeccompAction, SeccompCmpArgLen, SeccompCmpOp, SeccompCondition, SeccompFilter,
    SeccompRule, TargetArch, apply_filter,
};

fn seccomp_err(detail: impl std::fmt::Display) -> CordonError {
    CordonError::Seccomp {
        message: detail.to_string(),
    }
}

/// A rule matching calls whose argument has all bits of `mask` set.
fn masked_arg(arg: u8, len: SeccompCmpArgLen, mask: u64) -> Result<SeccompRule> {
    let condition = SeccompCondition::new(arg, len, SeccompCmpOp::MaskedEq(mask), mask)
        .map_err(seccomp_err)?;
    SeccompRule::new(vec![condition]).map_err(seccomp_err)
}

/// The immutable syscall deny-list, built once at startup and handed
/// to the sandbox entry.
#[derive(Debug)]
pub struct SyscallPolicy {
    rules: BTreeMap<i64, Vec<SeccompRule>>,
}

impl SyscallPolicy {
    /// Builds the default deny-list.
    ///
    /// Conditional denials:
    /// - `chmod`/`fchmod`/`fchmodat` requesting the setuid or setgid
    ///   bit;
    /// - `unshare`/`clone` requesting a new user namespace, which
    ///   would otherwise hand back a fresh set of namespace-local
    ///   capabilities;
    /// - `ioctl` with TIOCSTI, which injects input into the
    ///   controlling terminal.
    ///
    /// Unconditional denials: the kernel keyring calls, `ptrace`
    /// (subverts filtering on kernels before 4.8), the NUMA policy
    /// calls, `userfaultfd`, and `perf_event_open`.
    ///
    /// # Errors
    ///
    /// Returns [`CordonError::Seccomp`] if a rule cannot be
    /// constructed.
    pub fn deny_list() -> Result<Self> {
        let mut rules: BTreeMap<i64, Vec<SeccompRule>> = BTreeMap::new();

        let setuid_bit = u64::from(libc::S_ISUID);
        let setgid_bit = u64::from(libc::S_ISGID);

        // Mode is argument 1 for chmod/fchmod, argument 2 for fchmodat.
        for syscall in [libc::SYS_chmod, libc::SYS_fchmod] {
            let _ = rules.insert(
                syscall,
                vec![
                    masked_arg(1, SeccompCmpArgLen::Dword, setuid_bit)?,
                    masked_arg(1, SeccompCmpArgLen::Dword, setgid_bit)?,
                ],
            );
        }
        let _ = rules.insert(
            libc::SYS_fchmodat,
            vec![
                masked_arg(2, SeccompCmpArgLen::Dword, setuid_bit)?,
                masked_arg(2, SeccompCmpArgLen::Dword, setgid_bit)?,
            ],
        );

        let new_user = libc::CLONE_NEWUSER as u64;
        let _ = rules.insert(
            libc::SYS_unshare,
            vec![masked_arg(0, SeccompCmpArgLen::Dword, new_user)?],
        );
        let _ = rules.insert(
            libc::SYS_clone,
            vec![masked_arg(0, SeccompCmpArgLen::Qword, new_user)?],
        );

        let _ = rules.insert(
            libc::SYS_ioctl,
            vec![masked_arg(1, SeccompCmpArgLen::Qword, libc::TIOCSTI as u64)?],
        );

        for syscall in [
            libc::SYS_keyctl,
            libc::SYS_add_key,
            libc::SYS_request_key,
            libc::SYS_ptrace,
            libc::SYS_mbind,
            libc::SYS_migrate_pages,
            libc::SYS_move_pages,
            libc::SYS_set_mempolicy,
            libc::SYS_userfaultfd,
            libc::SYS_perf_event_open,
        ] {
            let _ = rules.insert(syscall, vec![]);
        }

        Ok(Self { rules })
    }

    /// Compiles the policy into a loadable BPF program.
    ///
    /// # Errors
    ///
    /// Returns [`CordonError::Seccomp`] if filter construction or BPF
    /// compilation fails.
    pub fn compile(&self) -> Result<BpfProgram> {
        let filter = SeccompFilter::new(
            self.rules.clone(),
            SeccompAction::Allow,
            SeccompAction::Errno(libc::EPERM as u32),
            TargetArch::x86_64,
        )
        .map_err(seccomp_err)?;
        filter.try_into().map_err(seccomp_err)
    }

    /// Loads the filter into the current process.
    ///
    /// no-new-privs is left unset: the loading process still holds
    /// CAP_SYS_ADMIN inside its namespace, and descendants keep the
    /// ordinary exec privilege semantics minus the bounding set.
    ///
    /// # Errors
    ///
    /// Returns [`CordonError::Seccomp`] if compilation or the load
    /// syscall fails.
    pub fn install(&self) -> Result<()> {
        tracing::debug!(denied = self.rules.len(), "loading seccomp filter");
        let program = self.compile()?;
        apply_filter(&program).map_err(seccomp_err)?;
        tracing::debug!("seccomp filter loaded");
        Ok(())
    }
}
