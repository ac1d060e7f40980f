use anyhow::Result;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn clonebench(cwd: &Path, args: &[&str]) -> Result<Output> {
    Ok(Command::new(env!("CARGO_BIN_EXE_clonebench"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .output()?)
}

fn write_config(dir: &Path, git_binary: &str) -> Result<String> {
    let config_path = dir.join("clonebench.toml");
    fs::write(&config_path, format!("git_binary = \"{git_binary}\"\n"))?;
    Ok(config_path.to_string_lossy().into_owned())
}

// Dry run with no branches: two listings, nothing executed, report written next to the caller
#[test]
fn test_dry_run_writes_report_in_cwd() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = write_config(temp_dir.path(), "clonebench-missing-git")?;

    let output = clonebench(
        temp_dir.path(),
        &["--config", &config, "-n", "myhost.example.com", "myrepo"],
    )?;
    assert_eq!(output.status.code(), Some(0));

    let report_path = temp_dir.path().join("clonebench.report");
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains(&format!("report saved to {}", report_path.display())));

    let report = fs::read_to_string(&report_path)?;
    assert!(!report.is_empty());
    assert!(report.contains("Benchmarking 1 repository on myhost.example.com"));
    assert!(report.contains("git:        unknown"));
    assert!(report.contains("$ clonebench-missing-git clone ssh://myhost.example.com/myrepo"));
    assert_eq!(report.matches("elapsed: skipped (dry run)").count(), 2);
    assert!(!report.contains("report saved to"));
    Ok(())
}

#[test]
fn test_report_flag_overrides_location() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = write_config(temp_dir.path(), "clonebench-missing-git")?;
    let custom = temp_dir.path().join("custom.report");
    let custom_arg = custom.to_string_lossy().into_owned();

    let output = clonebench(
        temp_dir.path(),
        &["--config", &config, "--report", &custom_arg, "-n", "host", "repo:main"],
    )?;
    assert_eq!(output.status.code(), Some(0));
    assert!(custom.exists());
    assert!(!temp_dir.path().join("clonebench.report").exists());
    Ok(())
}

#[test]
fn test_missing_git_client_is_an_environment_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = write_config(temp_dir.path(), "clonebench-missing-git")?;

    let output = clonebench(temp_dir.path(), &["--config", &config, "host", "repo"])?;
    assert_eq!(output.status.code(), Some(2));
    assert!(!temp_dir.path().join("clonebench.report").exists());
    Ok(())
}

#[test]
fn test_usage_errors_exit_one() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let no_args = clonebench(temp_dir.path(), &[])?;
    assert_eq!(no_args.status.code(), Some(1));
    assert!(String::from_utf8(no_args.stderr)?.contains("Usage"));

    let help = clonebench(temp_dir.path(), &["-h"])?;
    assert_eq!(help.status.code(), Some(1));
    assert!(help.stdout.is_empty());
    assert!(String::from_utf8(help.stderr)?.contains("Usage"));

    let bad_flag = clonebench(temp_dir.path(), &["-z", "host", "repo"])?;
    assert_eq!(bad_flag.status.code(), Some(1));

    let bad_spec = clonebench(temp_dir.path(), &["host", "repo:"])?;
    assert_eq!(bad_spec.status.code(), Some(1));
    Ok(())
}

#[test]
fn test_bad_config_exits_one() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config_path = temp_dir.path().join("clonebench.toml");
    fs::write(&config_path, "url_template = \"ssh://{remote}\"\n")?;
    let config = config_path.to_string_lossy().into_owned();

    let output = clonebench(temp_dir.path(), &["--config", &config, "-n", "host", "repo"])?;
    assert_eq!(output.status.code(), Some(1));
    Ok(())
}
