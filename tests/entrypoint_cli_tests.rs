#![cfg(unix)]

mod common;

use std::fs;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

fn fake_manage(dir: &Path, code: i32) -> String {
    let script = dir.join("manage.sh");
    let log = dir.join("steps.log");
    fs::write(
        &script,
        format!("echo \"$1\" >> {}\nexit {code}\n", log.display()),
    )
    .expect("write script");
    format!("sh {}", script.display())
}

fn entrypoint(manage: &str) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_solar-entrypoint"));
    cmd.env("ENTRYPOINT_MANAGE_COMMAND", manage)
        .env_remove("DATABASE")
        .env_remove("ENTRYPOINT_STRICT_MIGRATIONS")
        .env_remove("ENTRYPOINT_WAIT_FOR");
    cmd
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn hands_off_after_migrations() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = entrypoint(&fake_manage(dir.path(), 0))
        .args(["sh", "-c", "echo handed-off; exit 7"])
        .output()
        .expect("run entrypoint");

    assert!(stdout_of(&output).contains("handed-off"));
    // the final command's status is the container's status
    assert_eq!(output.status.code(), Some(7));
    assert_eq!(
        fs::read_to_string(dir.path().join("steps.log")).expect("log"),
        "makemigrations\nmigrate\n"
    );
}

#[test]
fn hand_off_happens_even_when_migrations_fail() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = entrypoint(&fake_manage(dir.path(), 1))
        .args(["sh", "-c", "echo handed-off"])
        .output()
        .expect("run entrypoint");

    assert!(output.status.success());
    assert!(stdout_of(&output).contains("handed-off"));
}

#[test]
fn strict_mode_blocks_hand_off_on_failed_migration() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = entrypoint(&fake_manage(dir.path(), 1))
        .env("ENTRYPOINT_STRICT_MIGRATIONS", "true")
        .args(["sh", "-c", "echo handed-off"])
        .output()
        .expect("run entrypoint");

    assert!(!output.status.success());
    assert!(!stdout_of(&output).contains("handed-off"));
}

#[test]
fn unreachable_database_stops_before_migrations() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = entrypoint(&fake_manage(dir.path(), 0))
        .env("DATABASE", "mysql")
        .env("SQL_HOST", "127.0.0.1")
        .env("SQL_PORT", common::closed_port().to_string())
        .env("ENTRYPOINT_WAIT_TIMEOUT_SECS", "1")
        .args(["sh", "-c", "echo handed-off"])
        .output()
        .expect("run entrypoint");

    assert!(!output.status.success());
    assert!(!stdout_of(&output).contains("handed-off"));
    assert!(!dir.path().join("steps.log").exists());
}

#[test]
fn no_command_means_nothing_to_hand_off() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = entrypoint(&fake_manage(dir.path(), 0))
        .output()
        .expect("run entrypoint");

    assert!(output.status.success());
}

/// Logs each subcommand, then blocks in `makemigrations`.
fn slow_manage(dir: &Path) -> String {
    let script = dir.join("manage.sh");
    let log = dir.join("steps.log");
    fs::write(
        &script,
        format!(
            "echo \"$1\" >> {}\nif [ \"$1\" = makemigrations ]; then exec sleep 10; fi\n",
            log.display()
        ),
    )
    .expect("write script");
    format!("sh {}", script.display())
}

fn signal_mid_migration(signal: &str) {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = dir.path().join("steps.log");
    let child = entrypoint(&slow_manage(dir.path()))
        .args(["sh", "-c", "echo handed-off"])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("start entrypoint");

    let deadline = Instant::now() + Duration::from_secs(10);
    while !fs::read_to_string(&log)
        .map(|steps| steps.contains("makemigrations"))
        .unwrap_or(false)
    {
        assert!(Instant::now() < deadline, "migration never started");
        thread::sleep(Duration::from_millis(20));
    }

    let sent = Command::new("kill")
        .args(["-s", signal, &child.id().to_string()])
        .status()
        .expect("run kill");
    assert!(sent.success());

    let started = Instant::now();
    let output = child.wait_with_output().expect("wait entrypoint");
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(output.status.code(), Some(130));
    assert!(!stdout_of(&output).contains("handed-off"));
    assert_eq!(fs::read_to_string(&log).expect("log"), "makemigrations\n");
}

#[test]
fn interrupt_during_migration_skips_hand_off() {
    signal_mid_migration("INT");
}

#[test]
fn terminate_during_migration_skips_hand_off() {
    signal_mid_migration("TERM");
}
