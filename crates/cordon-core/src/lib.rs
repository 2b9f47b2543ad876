//! # cordon-core
//!
//! Low-level Linux isolation primitives for the cordon launcher.
//!
//! This crate provides safe abstractions over:
//! - **Namespaces**: the combined `clone(2)` flag set and sandbox spawn.
//! - **Cgroups v2**: per-run resource ceilings via the unified hierarchy.
//! - **Filesystem**: root isolation through bind mounts and `pivot_root(2)`.
//! - **Capabilities**: bounding- and inheritable-set reduction.
//! - **Seccomp**: a default-allow syscall filter with a curated deny-list.
//! - **Sync**: the socketpair rendezvous carrying the id-mapping handshake.
//!
//! All unsafe system calls are encapsulated in safe wrappers with
//! proper error handling and `// SAFETY:` documentation.

pub mod capability;
pub mod cgroup;
pub mod filesystem;
pub mod namespace;
pub mod seccomp;
pub mod sync;
pub mod userns;
