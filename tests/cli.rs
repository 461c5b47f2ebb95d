//! Command line tests for cephfs-xattr-influx.
//!
//! Runs the built binary so the environment layer is read by a fresh process.
//! Every run points at a missing paths file, so it stops right after logging
//! the effective configuration, before any cluster connection.

use std::path::Path;
use std::process::{Command, Output};

const ENV_VARS: &[&str] = &[
    "CEPHFS_XATTR_INFLUX_INFLUX_ADDR",
    "CEPHFS_XATTR_INFLUX_INFLUX_TOKEN",
    "CEPHFS_XATTR_INFLUX_INFLUX_ORG",
    "CEPHFS_XATTR_INFLUX_INFLUX_BUCKET",
    "CEPHFS_XATTR_INFLUX_CEPH_CLIENT",
    "CEPHFS_XATTR_INFLUX_CEPH_KEYRING",
    "CEPHFS_XATTR_INFLUX_CEPH_MONS",
    "CEPHFS_XATTR_INFLUX_PATHS",
    "CEPHFS_XATTR_INFLUX_CONFIG",
    "RUST_LOG",
];

fn command(envs: &[(&str, &str)], args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_cephfs-xattr-influx"));
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd.envs(envs.iter().copied()).args(args);
    cmd
}

fn write_config(dir: &Path, content: &str) -> String {
    let path = dir.join("collector.conf");
    std::fs::write(&path, content).unwrap();
    path.to_str().unwrap().to_string()
}

fn output_text(output: &Output) -> String {
    format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

fn config_with_missing_paths(dir: &Path) -> String {
    let paths = dir.join("missing.json");
    write_config(
        dir,
        &format!(
            "influx.org    from-file\n\
             influx.bucket file-bucket\n\
             paths         {}\n",
            paths.display()
        ),
    )
}

#[test]
fn env_beats_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with_missing_paths(dir.path());

    let output = command(
        &[("CEPHFS_XATTR_INFLUX_INFLUX_ORG", "from-env")],
        &["--config", &config],
    )
    .output()
    .unwrap();
    let text = output_text(&output);

    assert!(text.contains("org=\"from-env\""), "output: {text}");
    assert!(text.contains("bucket=\"file-bucket\""), "output: {text}");
}

#[test]
fn command_line_beats_env() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with_missing_paths(dir.path());

    let output = command(
        &[
            ("CEPHFS_XATTR_INFLUX_INFLUX_ORG", "from-env"),
            ("CEPHFS_XATTR_INFLUX_INFLUX_BUCKET", "env-bucket"),
        ],
        &["--config", &config, "--influx.org", "from-cli"],
    )
    .output()
    .unwrap();
    let text = output_text(&output);

    assert!(text.contains("org=\"from-cli\""), "output: {text}");
    assert!(text.contains("bucket=\"env-bucket\""), "output: {text}");
}

#[test]
fn config_file_read_from_env() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with_missing_paths(dir.path());

    let output = command(&[("CEPHFS_XATTR_INFLUX_CONFIG", config.as_str())], &[])
        .output()
        .unwrap();
    let text = output_text(&output);

    assert!(text.contains("org=\"from-file\""), "output: {text}");
}

#[test]
fn missing_paths_file_exits_with_failure() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with_missing_paths(dir.path());

    let output = command(&[], &["--config", &config]).output().unwrap();
    let text = output_text(&output);

    assert!(!output.status.success());
    assert!(text.contains("unable to read paths file"), "output: {text}");
    assert!(!text.contains("cephfs support"), "output: {text}");
}

#[test]
fn missing_bucket_exits_with_failure() {
    let output = command(&[], &[]).output().unwrap();
    assert!(!output.status.success());
    assert!(output_text(&output).contains("influx.bucket must be set"));
}
