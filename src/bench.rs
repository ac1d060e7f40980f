//! Benchmark Orchestrator.
//!
//! Walks the requested repositories in input order and runs every applicable
//! strategy one after the other. Runs are never overlapped: concurrent clones
//! would share bandwidth and skew the timings being compared.

use anyhow::Context;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::executor::{format_elapsed, Executor, ExecutorSettings};
use crate::git::CommandRunner;
use crate::repo::RepoSpec;
use crate::strategy::applicable_strategies;
use crate::style::Palette;
use crate::tee::OutputTee;

/// Host details shown in the banner
#[derive(Debug, Clone, PartialEq)]
pub struct HostInfo {
    pub hostname: String,
    pub os: String,
    pub git_version: Option<String>,
}

impl HostInfo {
    pub fn detect(git_version: Option<String>) -> Self {
        Self {
            hostname: hostname(),
            os: format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
            git_version,
        }
    }
}

fn hostname() -> String {
    hostname_from(std::env::var("HOSTNAME").ok(), Path::new("/etc/hostname"))
}

/// Host name from the environment or the hostname file, never by running a command
fn hostname_from(env_value: Option<String>, hostname_file: &Path) -> String {
    env_value
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .or_else(|| {
            fs::read_to_string(hostname_file)
                .ok()
                .map(|contents| contents.trim().to_string())
                .filter(|name| !name.is_empty())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

pub struct Benchmark<'a, R: CommandRunner> {
    executor: Executor<'a, R>,
    palette: Palette,
    remote: &'a str,
    host: HostInfo,
}

impl<'a, R: CommandRunner> Benchmark<'a, R> {
    pub fn new(
        runner: &'a R,
        settings: &'a ExecutorSettings,
        palette: Palette,
        remote: &'a str,
        host: HostInfo,
    ) -> Self {
        Self {
            executor: Executor::new(runner, settings, palette, remote),
            palette,
            remote,
            host,
        }
    }

    /// Run every applicable strategy for every repository.
    ///
    /// Returns the number of strategy runs.
    pub fn run_all(
        &self,
        specs: &[RepoSpec],
        dry_run: bool,
        output: &mut OutputTee,
    ) -> Result<usize> {
        self.print_banner(specs, dry_run, output)
            .context("Failed to write banner")?;

        let mut runs = 0;
        for spec in specs {
            let strategies = applicable_strategies(spec);
            let url = self.executor.url_for(&spec.name);
            let heading = self.palette.heading(format!("=== {} ({url}) ===", spec.name));
            output
                .println(format!("\n{heading}"))
                .context("Failed to write repository heading")?;

            let total = strategies.len();
            for (index, strategy) in strategies.iter().enumerate() {
                tracing::info!(
                    repository = %spec.name,
                    strategy = strategy.slug(),
                    "strategy {}/{total}",
                    index + 1
                );
                let section = self.palette.section(format!(
                    "--- [{}/{total}] {} ---",
                    index + 1,
                    strategy.title()
                ));
                output
                    .println(format!("\n{section}"))
                    .context("Failed to write strategy heading")?;

                let result = self.executor.run(strategy, dry_run, output)?;
                output
                    .println(self.palette.timing(format_elapsed(result.elapsed)))
                    .context("Failed to write timing")?;
                runs += 1;
            }
        }

        Ok(runs)
    }

    fn print_banner(
        &self,
        specs: &[RepoSpec],
        dry_run: bool,
        output: &mut OutputTee,
    ) -> std::io::Result<()> {
        let noun = if specs.len() == 1 {
            "repository"
        } else {
            "repositories"
        };
        output.println(self.palette.banner(format!(
            "Benchmarking {} {noun} on {}",
            specs.len(),
            self.remote
        )))?;
        for spec in specs {
            output.println(format!("  {spec}"))?;
        }

        output.println(format!(
            "host:       {} ({})",
            self.host.hostname, self.host.os
        ))?;
        output.println(format!(
            "git:        {}",
            self.host.git_version.as_deref().unwrap_or("unknown")
        ))?;
        output.println(format!(
            "clonebench: {}",
            env!("CARGO_PKG_VERSION")
        ))?;

        if dry_run {
            output.println(
                self.palette
                    .warning("WARNING: dry run, commands are listed but not executed"),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_info_carries_git_version() {
        let host = HostInfo::detect(Some("git version 2.43.0".to_string()));
        assert_eq!(host.git_version.as_deref(), Some("git version 2.43.0"));
        assert!(host.os.contains(std::env::consts::OS));
        assert!(!host.hostname.is_empty());
    }

    #[test]
    fn test_hostname_fallback_order() -> anyhow::Result<()> {
        let temp_dir = tempfile::TempDir::new()?;
        let hostname_file = temp_dir.path().join("hostname");
        let missing = temp_dir.path().join("missing");

        assert_eq!(
            hostname_from(Some("from-env".to_string()), &missing),
            "from-env"
        );

        fs::write(&hostname_file, "bench-box\n")?;
        assert_eq!(hostname_from(None, &hostname_file), "bench-box");
        assert_eq!(hostname_from(Some(String::new()), &hostname_file), "bench-box");

        assert_eq!(hostname_from(None, &missing), "unknown");
        Ok(())
    }
}
