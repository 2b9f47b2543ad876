//! Domain primitive types used across the cordon workspace.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_IDENTIFIER_LEN;
use crate::error::{CordonError, Result};

/// Identifier for one sandbox run.
///
/// Doubles as the sandbox hostname and as the name of the run's cgroup
/// directory, so it is validated up front instead of trusting later
/// path construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(String);

impl RunId {
    /// Creates a run identifier, validating that it fits in a path
    /// component.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is empty, longer than
    /// [`MAX_IDENTIFIER_LEN`], or contains a character unsuitable for
    /// a path component.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() || id.len() > MAX_IDENTIFIER_LEN {
            return Err(CordonError::Usage {
                message: format!(
                    "run identifier must be 1..={MAX_IDENTIFIER_LEN} bytes, got {}",
                    id.len()
                ),
            });
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return Err(CordonError::Usage {
                message: format!("run identifier contains invalid characters: {id}"),
            });
        }
        Ok(Self(id))
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What to run and as whom, fixed for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxSpec {
    /// Program and arguments, `argv[0]` first.
    pub command: Vec<String>,
    /// Numeric id the target runs as after the id switch.
    pub uid: u32,
    /// Directory that becomes `/` inside the sandbox.
    pub rootfs: PathBuf,
    /// Hostname and run identifier.
    pub run_id: RunId,
}

impl SandboxSpec {
    /// Validates the spec before any host state is touched.
    ///
    /// # Errors
    ///
    /// Returns a usage error if the command is empty or the rootfs
    /// does not name a directory.
    pub fn validate(&self) -> Result<()> {
        if self.command.is_empty() {
            return Err(CordonError::Usage {
                message: "no command to execute".into(),
            });
        }
        if !self.rootfs.is_dir() {
            return Err(CordonError::Usage {
                message: format!("rootfs is not a directory: {}", self.rootfs.display()),
            });
        }
        Ok(())
    }
}

/// Resource ceilings applied to the run's cgroup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Hard memory ceiling in bytes (`memory.max`).
    pub memory_bytes: u64,
    /// Relative cpu weight (`cpu.weight`).
    pub cpu_weight: u64,
    /// Process-count ceiling (`pids.max`).
    pub pids_max: u64,
    /// Io weight (`io.weight`).
    pub io_weight: u64,
    /// Open-file-descriptor ceiling (`RLIMIT_NOFILE`).
    pub fd_count: u64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            memory_bytes: crate::constants::DEFAULT_MEMORY_MAX,
            cpu_weight: crate::constants::DEFAULT_CPU_WEIGHT,
            pids_max: crate::constants::DEFAULT_PIDS_MAX,
            io_weight: crate::constants::DEFAULT_IO_WEIGHT,
            fd_count: crate::constants::DEFAULT_FD_COUNT,
        }
    }
}
