//! End-to-end launch tests.
//!
//! The full pipeline needs root and a statically linked shell to
//! populate the throwaway rootfs, so those tests are `#[ignore]`d and
//! skip themselves when the environment cannot run them
//! (`cargo test -- --ignored` as root to include them).

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::print_stderr)]

use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use cordon_common::constants::USERNS_OFFSET;
use cordon_common::types::{ResourceLimits, RunId, SandboxSpec};
use cordon_runtime::LaunchConfig;

fn busybox() -> Option<PathBuf> {
    ["/bin/busybox", "/usr/bin/busybox", "/sbin/busybox"]
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

/// A minimal rootfs containing only a busybox multicall binary.
fn create_test_rootfs(dir: &Path) -> PathBuf {
    let rootfs = dir.join("rootfs");
    std::fs::create_dir_all(rootfs.join("bin")).unwrap();
    let busybox = busybox().expect("checked by caller");
    let _ = std::fs::copy(busybox, rootfs.join("bin/busybox")).unwrap();
    for applet in ["sh", "true", "false", "touch", "chmod", "mknod", "id"] {
        std::fs::hard_link(rootfs.join("bin/busybox"), rootfs.join("bin").join(applet)).unwrap();
    }
    // A sticky world-writable scratch dir usable by the mapped uid.
    let tmp = rootfs.join("tmp");
    std::fs::create_dir_all(&tmp).unwrap();
    std::fs::set_permissions(&tmp, std::os::unix::fs::PermissionsExt::from_mode(0o1777)).unwrap();
    rootfs
}

fn privileged_config(rootfs: PathBuf, command: Vec<String>) -> LaunchConfig {
    LaunchConfig {
        spec: SandboxSpec {
            command,
            uid: 0,
            rootfs,
            run_id: RunId::new(format!("cordon-test-{}", std::process::id())).unwrap(),
        },
        limits: ResourceLimits::default(),
    }
}

fn skip_unprivileged() -> bool {
    if !nix::unistd::getuid().is_root() {
        eprintln!("skipping privileged test - not running as root");
        return true;
    }
    if busybox().is_none() {
        eprintln!("skipping privileged test - no busybox binary found");
        return true;
    }
    false
}

#[test]
#[ignore]
fn exit_code_propagates_from_the_sandboxed_program() {
    if skip_unprivileged() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let rootfs = create_test_rootfs(dir.path());

    let config = privileged_config(
        rootfs,
        vec!["/bin/sh".into(), "-c".into(), "exit 7".into()],
    );
    let status = cordon_runtime::run(&config).expect("launch should succeed");
    assert_eq!(status, 7);
}

#[test]
#[ignore]
fn cgroup_directory_is_gone_after_the_run() {
    if skip_unprivileged() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let rootfs = create_test_rootfs(dir.path());

    let config = privileged_config(rootfs, vec!["/bin/true".into()]);
    let cgroup_dir = Path::new("/sys/fs/cgroup").join(config.spec.run_id.as_str());

    let status = cordon_runtime::run(&config).expect("launch should succeed");
    assert_eq!(status, 0);
    assert!(!cgroup_dir.exists(), "cgroup survived teardown");
}

#[test]
#[ignore]
fn host_marker_file_is_unreachable_from_the_sandbox() {
    if skip_unprivileged() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let rootfs = create_test_rootfs(dir.path());
    // Placed next to, not inside, the rootfs.
    std::fs::write(dir.path().join("host-marker"), b"host").unwrap();

    let config = privileged_config(
        rootfs,
        vec![
            "/bin/sh".into(),
            "-c".into(),
            "test ! -e /host-marker && test ! -e /tmp/host-marker".into(),
        ],
    );
    let status = cordon_runtime::run(&config).expect("launch should succeed");
    assert_eq!(status, 0);
}

#[test]
#[ignore]
fn setuid_chmod_is_denied_inside_the_sandbox() {
    if skip_unprivileged() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let rootfs = create_test_rootfs(dir.path());

    // Plain chmod succeeds, the setuid bit is refused.
    let config = privileged_config(
        rootfs,
        vec![
            "/bin/sh".into(),
            "-c".into(),
            "touch /tmp/probe && chmod 0755 /tmp/probe && ! chmod 04755 /tmp/probe".into(),
        ],
    );
    let status = cordon_runtime::run(&config).expect("launch should succeed");
    assert_eq!(status, 0);
}

#[test]
#[ignore]
fn device_node_creation_is_denied_inside_the_sandbox() {
    if skip_unprivileged() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let rootfs = create_test_rootfs(dir.path());

    // mknod needs CAP_MKNOD, which is out of the bounding set by the
    // time the shell runs.
    let config = privileged_config(
        rootfs,
        vec![
            "/bin/sh".into(),
            "-c".into(),
            "! mknod /tmp/null c 1 3".into(),
        ],
    );
    let status = cordon_runtime::run(&config).expect("launch should succeed");
    assert_eq!(status, 0);
}

#[test]
#[ignore]
fn sandbox_sees_the_target_id_while_the_host_sees_the_mapped_id() {
    if skip_unprivileged() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let rootfs = create_test_rootfs(dir.path());

    // Inside, the process runs as the target id; the file it leaves
    // behind lands in the bind-mounted rootfs, owned on the host by
    // the id-map translation of inner 0.
    let config = privileged_config(
        rootfs.clone(),
        vec![
            "/bin/sh".into(),
            "-c".into(),
            "test \"$(id -u)\" = 0 && touch /tmp/witness".into(),
        ],
    );
    let status = cordon_runtime::run(&config).expect("launch should succeed");
    assert_eq!(status, 0);

    let witness = std::fs::metadata(rootfs.join("tmp/witness")).unwrap();
    assert_eq!(witness.uid(), USERNS_OFFSET);
    assert_eq!(witness.gid(), USERNS_OFFSET);
}

#[test]
fn launch_refuses_a_missing_rootfs() {
    let config = LaunchConfig {
        spec: SandboxSpec {
            command: vec!["/bin/true".into()],
            uid: 0,
            rootfs: PathBuf::from("/does/not/exist"),
            run_id: RunId::new("cordon-test-missing-rootfs").unwrap(),
        },
        limits: ResourceLimits::default(),
    };
    assert!(cordon_runtime::run(&config).is_err());
}
