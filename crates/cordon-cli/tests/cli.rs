//! Black-box tests of the `cordon` binary's flag surface.
//!
//! Everything here must run unprivileged: these runs are expected to
//! fail before any host state is touched.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::process::Command;

fn cordon() -> Command {
    Command::new(env!("CARGO_BIN_EXE_cordon"))
}

#[test]
fn help_names_the_binary() {
    let output = cordon().arg("--help").output().expect("failed to execute");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("cordon"), "stdout: {stdout}");
}

#[test]
fn missing_rootfs_flag_is_a_usage_error() {
    let output = cordon()
        .args(["-u", "0", "-c", "/bin/true"])
        .output()
        .expect("failed to execute");
    assert!(!output.status.success());
}

#[test]
fn missing_command_flag_is_a_usage_error() {
    let output = cordon()
        .args(["-m", "/tmp", "-u", "0"])
        .output()
        .expect("failed to execute");
    assert!(!output.status.success());
}

#[test]
fn non_numeric_uid_is_a_usage_error() {
    let output = cordon()
        .args(["-m", "/tmp", "-u", "nobody", "-c", "/bin/true"])
        .output()
        .expect("failed to execute");
    assert!(!output.status.success());
}

#[test]
fn nonexistent_rootfs_fails_without_side_effects() {
    let output = cordon()
        .args(["-m", "/does/not/exist", "-u", "0", "-c", "/bin/true"])
        .output()
        .expect("failed to execute");
    assert!(!output.status.success());
}

#[test]
fn command_flag_consumes_hyphenated_arguments() {
    // `-c` swallows the rest of the line, so `-u` here must be an
    // argument of the target program, not a flag. The run still fails
    // unprivileged, but not with a flag-parse error on stderr.
    let output = cordon()
        .args(["-m", "/tmp", "-u", "0", "-c", "/bin/echo", "-u", "abc"])
        .output()
        .expect("failed to execute");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("invalid value"), "stderr: {stderr}");
    assert!(!stderr.contains("Usage:"), "stderr: {stderr}");
}
