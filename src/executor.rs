//! Strategy Executor.
//!
//! Runs one strategy's command sequence inside its own scratch directory and
//! measures the wall-clock time of the whole sequence. The scratch directory is
//! a [`tempfile::TempDir`], so it is removed on every exit path.

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::config::{Config, ErrorPolicy};
use crate::error::{BenchError, Result};
use crate::git::{CommandOutcome, CommandRunner, Invocation};
use crate::repo::repo_url;
use crate::strategy::{render_command, StrategyKind};
use crate::style::Palette;
use crate::tee::OutputTee;

/// Outcome of one strategy run
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkResult {
    pub strategy: StrategyKind,
    pub repository: String,
    /// `None` for dry runs
    pub elapsed: Option<Duration>,
    pub dry_run: bool,
    /// Commands that exited non-zero or failed to start
    pub failed_commands: usize,
}

impl BenchmarkResult {
    pub fn branch_context(&self) -> &[String] {
        self.strategy.branch_context()
    }
}

/// Settings the executor needs from the configuration
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    pub git_binary: String,
    pub url_template: String,
    pub checkout_ref: String,
    pub policy: ErrorPolicy,
    pub scratch_root: Option<PathBuf>,
}

impl From<&Config> for ExecutorSettings {
    fn from(config: &Config) -> Self {
        Self {
            git_binary: config.git_binary.clone(),
            url_template: config.url_template.clone(),
            checkout_ref: config.checkout_ref.clone(),
            policy: config.on_error,
            scratch_root: config.scratch_root.clone(),
        }
    }
}

pub struct Executor<'a, R: CommandRunner> {
    runner: &'a R,
    settings: &'a ExecutorSettings,
    palette: Palette,
    remote: &'a str,
}

impl<'a, R: CommandRunner> Executor<'a, R> {
    pub fn new(
        runner: &'a R,
        settings: &'a ExecutorSettings,
        palette: Palette,
        remote: &'a str,
    ) -> Self {
        Self {
            runner,
            settings,
            palette,
            remote,
        }
    }

    pub fn url_for(&self, repository: &str) -> String {
        repo_url(&self.settings.url_template, self.remote, repository)
    }

    pub fn run(
        &self,
        strategy: &StrategyKind,
        dry_run: bool,
        output: &mut OutputTee,
    ) -> Result<BenchmarkResult> {
        let url = self.url_for(strategy.repository());
        let plan = strategy.plan(&url, &self.settings.checkout_ref);

        for line in plan.listing(&self.settings.git_binary) {
            output
                .println(self.palette.command(format!("$ {line}")))
                .context("Failed to write command listing")?;
        }

        let mut result = BenchmarkResult {
            strategy: strategy.clone(),
            repository: strategy.repository().to_string(),
            elapsed: None,
            dry_run,
            failed_commands: 0,
        };

        if dry_run {
            debug!(strategy = strategy.slug(), "dry run, nothing executed");
            return Ok(result);
        }

        let scratch = self.scratch_dir(strategy)?;
        let workdir = match &plan.workdir {
            Some(dir) => {
                let path = scratch.path().join(dir);
                fs::create_dir_all(&path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                path
            }
            None => scratch.path().to_path_buf(),
        };

        info!(strategy = strategy.slug(), %url, "running strategy");
        let started = Instant::now();
        for step in &plan.steps {
            let outcome = self.run_step(strategy, step, &workdir, output)?;
            if !outcome.success {
                result.failed_commands += 1;
                let command = render_command(&self.settings.git_binary, step);
                warn!(strategy = strategy.slug(), %command, code = ?outcome.code, "command failed");
                if self.settings.policy == ErrorPolicy::StopOnError {
                    // Scratch directory is dropped, and removed, on this path too
                    return Err(BenchError::CommandFailed {
                        strategy: strategy.slug().to_string(),
                        command,
                        code: outcome.code,
                    });
                }
            }
        }
        result.elapsed = Some(started.elapsed());

        let scratch_path = scratch.path().to_path_buf();
        if let Err(e) = scratch.close() {
            warn!(path = %scratch_path.display(), error = %e, "failed to remove scratch directory");
        }

        Ok(result)
    }

    fn scratch_dir(&self, strategy: &StrategyKind) -> Result<TempDir> {
        let prefix = format!("{}-", strategy.slug());
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);
        let scratch = match &self.settings.scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .context("Failed to create scratch directory")?;
        debug!(path = %scratch.path().display(), "created scratch directory");
        Ok(scratch)
    }

    fn run_step(
        &self,
        strategy: &StrategyKind,
        step: &[String],
        workdir: &Path,
        output: &mut OutputTee,
    ) -> Result<CommandOutcome> {
        let invocation = Invocation {
            program: &self.settings.git_binary,
            args: step,
            cwd: workdir,
        };

        match self.runner.run(&invocation, output) {
            Ok(outcome) => Ok(outcome),
            // A client that cannot start counts as a failed command
            Err(e) => {
                warn!(strategy = strategy.slug(), error = %e, "command did not run");
                output
                    .eprintln(format!("{}: {e:#}", self.settings.git_binary))
                    .context("Failed to write command error")?;
                Ok(CommandOutcome::failure(None))
            }
        }
    }
}

pub fn format_elapsed(elapsed: Option<Duration>) -> String {
    match elapsed {
        Some(elapsed) => format!("elapsed: {:.3}s", elapsed.as_secs_f64()),
        None => "elapsed: skipped (dry run)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(
            format_elapsed(Some(Duration::from_millis(1500))),
            "elapsed: 1.500s"
        );
        assert_eq!(format_elapsed(None), "elapsed: skipped (dry run)");
    }

    #[test]
    fn test_settings_from_config() {
        let config = Config {
            checkout_ref: "main".to_string(),
            on_error: ErrorPolicy::StopOnError,
            ..Config::default()
        };
        let settings = ExecutorSettings::from(&config);
        assert_eq!(settings.checkout_ref, "main");
        assert_eq!(settings.policy, ErrorPolicy::StopOnError);
        assert_eq!(settings.url_template, "ssh://{remote}/{repo}");
    }
}
