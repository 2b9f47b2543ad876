//! Unified error types for the cordon workspace.
//!
//! Every fallible stage of a run maps onto one variant here, so a
//! failure reports which stage gave up and the sandbox side can abort
//! strictly before exec.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum CordonError {
    /// Invalid or missing command-line input. No host state was touched.
    #[error("usage error: {message}")]
    Usage {
        /// Description of the invalid input.
        message: String,
    },

    /// The host kernel or architecture is unsupported.
    #[error("incompatible host: {message}")]
    HostCompatibility {
        /// What the host reported and what was expected.
        message: String,
    },

    /// Cgroup provisioning failed before the sandbox was spawned.
    #[error("resource setup failed at {path}: {source}")]
    ResourceSetup {
        /// Control file or directory that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The sandbox process could not be created.
    #[error("spawn failed: {source}")]
    Spawn {
        /// Errno from `clone(2)`.
        source: std::io::Error,
    },

    /// The id-mapping rendezvous broke down (short read/write or
    /// premature peer close).
    #[error("sync protocol failure during {stage}")]
    SyncProtocol {
        /// Handshake stage that observed the failure.
        stage: &'static str,
    },

    /// Root isolation failed; the sandbox must not exec.
    #[error("mount setup failed: {message}")]
    MountSetup {
        /// Step that failed, with errno detail.
        message: String,
    },

    /// A capability could not be dropped. Continuing would leave
    /// excess privilege in place.
    #[error("failed to drop capability {capability}: {message}")]
    PrivilegeDrop {
        /// Capability whose drop failed.
        capability: String,
        /// Underlying error detail.
        message: String,
    },

    /// The seccomp filter could not be built or loaded.
    #[error("seccomp filter error: {message}")]
    Seccomp {
        /// What failed while assembling or installing the filter.
        message: String,
    },

    /// The target program image could not be executed.
    #[error("exec of {program} failed: {source}")]
    Exec {
        /// Program path handed to `execve(2)`.
        program: String,
        /// Errno from the exec attempt.
        source: std::io::Error,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, CordonError>;
