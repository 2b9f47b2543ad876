//! # cordon-runtime
//!
//! Lifecycle of one sandboxed run: validate the host, provision the
//! cgroup, spawn the sandbox into its namespace bundle, drive the
//! id-mapping handshake, wait for exit, and tear everything down on
//! every path out.

pub mod host;
pub mod hostname;
pub mod launcher;
pub mod sandbox;

pub use launcher::{LaunchConfig, run};
