//! # cordon: sandbox launcher CLI
//!
//! Runs a single program inside fresh namespaces, rooted in a
//! caller-supplied directory, boxed into a dedicated cgroup, with
//! capabilities and syscalls reduced.
//!
//! ```text
//! cordon -m ./rootfs -u 0 -c /bin/sh
//! ```

use std::path::PathBuf;

use clap::Parser;
use cordon_common::constants::BIN_NAME;
use cordon_common::types::{ResourceLimits, SandboxSpec};
use cordon_runtime::LaunchConfig;

#[derive(Parser)]
#[command(name = BIN_NAME, about = "Launch a program inside an isolated sandbox")]
struct Cli {
    /// Directory to use as the sandbox's root filesystem.
    #[arg(short = 'm', value_name = "DIR")]
    rootfs: PathBuf,

    /// Numeric id the sandboxed program runs as.
    #[arg(short = 'u', value_name = "ID")]
    uid: u32,

    /// Program to execute and its arguments; consumes the rest of the
    /// command line.
    #[arg(
        short = 'c',
        value_name = "PROGRAM",
        num_args = 1..,
        allow_hyphen_values = true,
        required = true
    )]
    command: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = LaunchConfig {
        spec: SandboxSpec {
            command: cli.command,
            uid: cli.uid,
            rootfs: cli.rootfs,
            run_id: cordon_runtime::hostname::choose()?,
        },
        limits: ResourceLimits::default(),
    };

    let status = cordon_runtime::run(&config)?;
    std::process::exit(status);
}
