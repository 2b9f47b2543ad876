//! System-wide constants and default paths.

/// Cgroups v2 unified hierarchy mount point.
pub const CGROUP_V2_PATH: &str = "/sys/fs/cgroup";

/// Scratch directory used for the root-pivot staging mounts.
pub const SCRATCH_DIR: &str = "/tmp";

/// Host-side uid/gid that inner id 0 maps to when a user namespace
/// is available.
pub const USERNS_OFFSET: u32 = 10000;

/// Number of contiguous ids covered by the id-mapping table.
pub const USERNS_COUNT: u32 = 2000;

/// Default hard memory ceiling for a run (1 GiB).
pub const DEFAULT_MEMORY_MAX: u64 = 1_073_741_824;

/// Default relative cpu weight.
pub const DEFAULT_CPU_WEIGHT: u64 = 256;

/// Default process-count ceiling.
pub const DEFAULT_PIDS_MAX: u64 = 64;

/// Default io weight.
pub const DEFAULT_IO_WEIGHT: u64 = 10;

/// Default open-file-descriptor ceiling inherited by the sandbox.
pub const DEFAULT_FD_COUNT: u64 = 64;

/// Stack size handed to `clone(2)` for the sandbox process (1 MiB).
pub const SANDBOX_STACK_SIZE: usize = 1024 * 1024;

/// Longest accepted run identifier. Identifiers become path components
/// under the cgroup mount and must stay well inside `NAME_MAX`.
pub const MAX_IDENTIFIER_LEN: usize = 128;

/// Binary name for the CLI.
pub const BIN_NAME: &str = "cordon";
