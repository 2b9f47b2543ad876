//! Capability reduction for the sandbox process.
//!
//! A fixed deny-list is removed from the bounding set first, capping
//! what any descendant can ever reacquire, and from the inheritable
//! set second, so nothing on the list survives the exec. A single
//! failed drop is fatal; the sandbox never continues with excess
//! privilege.

use caps::{CapSet, Capability};
use cordon_common::error::{CordonError, Result};

/// Capabilities the sandbox must never hold.
pub const DENIED_CAPABILITIES: [Capability; 20] = [
    // Access to the audit subsystem.
    Capability::CAP_AUDIT_CONTROL,
    Capability::CAP_AUDIT_READ,
    Capability::CAP_AUDIT_WRITE,
    // Features that can block system suspend.
    Capability::CAP_BLOCK_SUSPEND,
    // Bypass file read permission checks.
    Capability::CAP_DAC_READ_SEARCH,
    // Preserve setuid bits across chown/modification.
    Capability::CAP_FSETID,
    // Lock memory.
    Capability::CAP_IPC_LOCK,
    // Override or administer MAC policy.
    Capability::CAP_MAC_ADMIN,
    Capability::CAP_MAC_OVERRIDE,
    // Create device nodes.
    Capability::CAP_MKNOD,
    // Set arbitrary capabilities on files.
    Capability::CAP_SETFCAP,
    // Privileged syslog operations.
    Capability::CAP_SYSLOG,
    // System administration, reboot, module loading.
    Capability::CAP_SYS_ADMIN,
    Capability::CAP_SYS_BOOT,
    Capability::CAP_SYS_MODULE,
    // Priority elevation, raw I/O, resource-limit override.
    Capability::CAP_SYS_NICE,
    Capability::CAP_SYS_RAWIO,
    Capability::CAP_SYS_RESOURCE,
    // System clock and wake alarms.
    Capability::CAP_SYS_TIME,
    Capability::CAP_WAKE_ALARM,
];

/// Drops every capability in `denied` from the bounding set, then the
/// inheritable set.
///
/// # Errors
///
/// Returns [`CordonError::PrivilegeDrop`] on the first drop that
/// fails.
pub fn drop_denied(denied: &[Capability]) -> Result<()> {
    tracing::debug!(count = denied.len(), "dropping capabilities");
    for set in [CapSet::Bounding, CapSet::Inheritable] {
        for &cap in denied {
            caps::drop(None, set, cap).map_err(|e| CordonError::PrivilegeDrop {
                capability: cap.to_string(),
                message: e.to_string(),
            })?;
        }
    }
    tracing::debug!("capabilities dropped");
    Ok(())
}
