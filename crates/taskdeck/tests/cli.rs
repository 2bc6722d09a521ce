//! End-to-end tests driving the `taskdeck` binary against a temporary data directory.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use anyhow::{Context, Result, anyhow};
use assert_cmd::cargo::CommandCargoExt;
use serde_json::Value;
use tempfile::TempDir;

/// Test helper: data directory whose config removes the sign-in latency
fn setup_data_dir() -> Result<TempDir> {
    let dir = TempDir::with_prefix("taskdeck-cli-").context("create temp dir")?;
    fs::write(
        dir.path().join("config.toml"),
        "[identity]\ndemo_delay_ms = 0\ngoogle_delay_ms = 0\n",
    )
    .context("write config")?;
    Ok(dir)
}

fn taskdeck(data_dir: &Path, args: &[&str]) -> Result<Output> {
    taskdeck_logging(data_dir, args, "warn")
}

fn taskdeck_logging(data_dir: &Path, args: &[&str], rust_log: &str) -> Result<Output> {
    let output = Command::cargo_bin("taskdeck")?
        .arg("--data-dir")
        .arg(data_dir)
        .args(args)
        .env("RUST_LOG", rust_log)
        .output()
        .context("failed to run taskdeck")?;
    Ok(output)
}

fn stdout_of(data_dir: &Path, args: &[&str]) -> Result<String> {
    let output = taskdeck(data_dir, args)?;
    if !output.status.success() {
        return Err(anyhow!(
            "taskdeck {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        ));
    }
    Ok(String::from_utf8(output.stdout)?)
}

fn list_json(data_dir: &Path, extra: &[&str]) -> Result<Vec<Value>> {
    let mut args = vec!["ls", "--format", "json"];
    args.extend_from_slice(extra);
    let raw = stdout_of(data_dir, &args)?;
    let value: Value = serde_json::from_str(&raw).context("ls output is json")?;
    value
        .as_array()
        .cloned()
        .ok_or_else(|| anyhow!("ls output must be an array: {raw}"))
}

fn created_id(stdout: &str) -> Result<String> {
    stdout
        .trim()
        .strip_prefix("created todo: ")
        .map(str::to_owned)
        .ok_or_else(|| anyhow!("unexpected add output: {stdout}"))
}

#[test]
fn todo_lifecycle_through_the_binary() -> Result<()> {
    let dir = setup_data_dir()?;
    let milk = created_id(&stdout_of(dir.path(), &["add", "--title", "Buy milk"])?)?;
    stdout_of(
        dir.path(),
        &["add", "--title", "Walk dog", "--due", "2030-01-01T09:00:00Z"],
    )?;

    stdout_of(dir.path(), &["toggle", "--id", &milk])?;

    let open = list_json(dir.path(), &["--filter", "open"])?;
    assert_eq!(open.len(), 1);
    assert_eq!(open[0]["title"], "Walk dog");

    let searched = list_json(dir.path(), &["--search", "MILK"])?;
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0]["status"], "complete");

    stdout_of(dir.path(), &["rm", "--id", &milk])?;
    assert!(list_json(dir.path(), &["--filter", "complete"])?.is_empty());

    let snapshot = fs::read_to_string(dir.path().join("store").join("todos.json"))?;
    assert!(snapshot.contains("Walk dog"));
    Ok(())
}

#[test]
fn stats_report_completion_rate() -> Result<()> {
    let dir = setup_data_dir()?;
    let first = created_id(&stdout_of(dir.path(), &["add", "--title", "one"])?)?;
    stdout_of(dir.path(), &["add", "--title", "two"])?;
    stdout_of(dir.path(), &["toggle", "--id", &first])?;

    let raw = stdout_of(dir.path(), &["stats", "--format", "json"])?;
    let stats: Value = serde_json::from_str(&raw)?;
    assert_eq!(stats["stats"]["total"], 2);
    assert_eq!(stats["stats"]["completion_rate"], 50);
    assert_eq!(stats["tier"], "fair");
    Ok(())
}

#[test]
fn invalid_input_exits_non_zero() -> Result<()> {
    let dir = setup_data_dir()?;
    let blank = taskdeck(dir.path(), &["add", "--title", "   "])?;
    assert!(!blank.status.success());

    let bad_due = taskdeck(dir.path(), &["add", "--title", "x", "--due", "tomorrow"])?;
    assert!(!bad_due.status.success());

    let missing = taskdeck(dir.path(), &["toggle", "--id", "does-not-exist"])?;
    assert!(!missing.status.success());
    Ok(())
}

#[test]
fn session_commands_round_trip() -> Result<()> {
    let dir = setup_data_dir()?;
    assert_eq!(stdout_of(dir.path(), &["whoami"])?.trim(), "not signed in");

    let login = stdout_of(dir.path(), &["login", "demo"])?;
    assert!(login.starts_with("signed in as"), "{login}");
    assert!(dir.path().join("store").join("user.json").exists());

    stdout_of(
        dir.path(),
        &["profile", "--name", "Ada", "--email", "ada@example.com"],
    )?;
    let whoami = stdout_of(dir.path(), &["whoami"])?;
    assert_eq!(whoami.trim(), "Ada <ada@example.com> (demo)");

    stdout_of(dir.path(), &["logout"])?;
    assert!(!dir.path().join("store").join("user.json").exists());

    let profile = taskdeck(dir.path(), &["profile", "--name", "Ada", "--email", "ada@example.com"])?;
    assert!(!profile.status.success());
    Ok(())
}

#[test]
fn rust_log_controls_stderr_verbosity() -> Result<()> {
    let dir = setup_data_dir()?;

    let quiet = taskdeck_logging(dir.path(), &["add", "--title", "quiet"], "warn")?;
    assert!(quiet.status.success());
    let stderr = String::from_utf8_lossy(&quiet.stderr);
    assert!(!stderr.contains("INFO"), "{stderr}");

    let verbose = taskdeck_logging(dir.path(), &["add", "--title", "verbose"], "debug")?;
    assert!(verbose.status.success());
    let stderr = String::from_utf8_lossy(&verbose.stderr);
    assert!(stderr.contains("DEBUG"), "{stderr}");
    assert!(stderr.contains("INFO"), "{stderr}");
    Ok(())
}
