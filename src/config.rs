use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::CliArgs;
use crate::error::BenchError;
use crate::git::GitVersion;

pub const DEFAULT_URL_TEMPLATE: &str = "ssh://{remote}/{repo}";

#[derive(Debug, Deserialize, PartialEq, Clone)]
#[serde(default)]
pub struct Config {
    pub git_binary: String,
    pub url_template: String,
    pub checkout_ref: String,
    pub min_git_version: String,
    pub on_error: ErrorPolicy,
    pub scratch_root: Option<PathBuf>,
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize, PartialEq, Clone)]
#[serde(default)]
pub struct ReportConfig {
    pub strip_escapes: bool,
    pub color: ColorChoice,
    pub path: Option<PathBuf>,
}

/// What to do when a git command exits non-zero
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
pub enum ErrorPolicy {
    /// Keep going: run the remaining commands and strategies
    #[default]
    #[serde(rename = "continue")]
    ContinueOnError,
    /// Abort the strategy sequence and the whole run
    #[serde(rename = "stop")]
    StopOnError,
}

#[derive(
    Debug, Deserialize, PartialEq, Eq, Clone, Copy, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            git_binary: "git".to_string(),
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            checkout_ref: "master".to_string(),
            min_git_version: "1.8.0".to_string(),
            on_error: ErrorPolicy::default(),
            scratch_root: None,
            report: ReportConfig::default(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            strip_escapes: true,
            color: ColorChoice::Auto,
            path: None,
        }
    }
}

pub fn get_default_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("", "", "clonebench")
        .context("Failed to determine project directories")?;

    let config_dir = proj_dirs.config_dir();
    Ok(config_dir.join("clonebench.toml"))
}

/// `<cwd>/<program-stem>.report`
pub fn default_report_path() -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let stem = std::env::args_os()
        .next()
        .and_then(|arg0| {
            Path::new(&arg0)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());
    Ok(cwd.join(format!("{stem}.report")))
}

impl Config {
    /// Load from an explicit path, or from the default location when it exists
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, BenchError> {
        let path = match config_path {
            Some(p) => p,
            None => {
                let default_path = get_default_config_path()?;
                if !default_path.exists() {
                    tracing::debug!(path = %default_path.display(), "no config file, using defaults");
                    return Ok(Config::default());
                }
                default_path
            }
        };

        let contents = fs::read_to_string(&path).map_err(|e| BenchError::Config {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| BenchError::Config {
            path: path.clone(),
            reason: e.message().to_string(),
        })?;

        config.validate(&path)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<(), BenchError> {
        let invalid = |reason: String| BenchError::Config {
            path: path.to_path_buf(),
            reason,
        };

        if !self.url_template.contains("{repo}") {
            return Err(invalid(format!(
                "url_template `{}` must contain {{repo}}",
                self.url_template
            )));
        }
        if self.git_binary.trim().is_empty() {
            return Err(invalid("git_binary is empty".to_string()));
        }
        if self.checkout_ref.trim().is_empty() {
            return Err(invalid("checkout_ref is empty".to_string()));
        }
        if GitVersion::parse(&self.min_git_version).is_none() {
            return Err(invalid(format!(
                "min_git_version `{}` is not a version number",
                self.min_git_version
            )));
        }
        Ok(())
    }

    pub fn min_git_version(&self) -> GitVersion {
        GitVersion::parse(&self.min_git_version).unwrap_or_default()
    }

    pub fn from_cli_and_file(cli_args: &CliArgs) -> Result<Self, BenchError> {
        let mut config = Self::load(cli_args.config.clone())?;

        // CLI args override config file
        if let Some(report) = &cli_args.report {
            config.report.path = Some(report.clone());
        }
        if let Some(color) = cli_args.color {
            config.report.color = color;
        }

        Ok(config)
    }

    pub fn report_path(&self) -> Result<PathBuf> {
        match &self.report.path {
            Some(path) => Ok(path.clone()),
            None => default_report_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.git_binary, "git");
        assert_eq!(config.url_template, "ssh://{remote}/{repo}");
        assert_eq!(config.checkout_ref, "master");
        assert_eq!(config.on_error, ErrorPolicy::ContinueOnError);
        assert!(config.report.strip_escapes);
        assert_eq!(config.report.color, ColorChoice::Auto);
    }

    #[test]
    fn test_partial_file_keeps_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("clonebench.toml");
        fs::write(
            &config_path,
            r#"
checkout_ref = "main"
on_error = "stop"

[report]
strip_escapes = false
"#,
        )?;

        let config = Config::load(Some(config_path))?;
        assert_eq!(config.checkout_ref, "main");
        assert_eq!(config.on_error, ErrorPolicy::StopOnError);
        assert!(!config.report.strip_escapes);
        assert_eq!(config.git_binary, "git");
        assert_eq!(config.report.color, ColorChoice::Auto);
        Ok(())
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let err = Config::load(Some(temp_dir.path().join("missing.toml"))).unwrap_err();
        assert!(matches!(err, BenchError::Config { .. }));
        Ok(())
    }

    #[test]
    fn test_template_without_repo_is_rejected() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("clonebench.toml");
        fs::write(&config_path, "url_template = \"ssh://{remote}/fixed\"\n")?;

        let err = Config::load(Some(config_path)).unwrap_err();
        assert!(err.to_string().contains("{repo}"));
        Ok(())
    }

    #[test]
    fn test_bad_min_version_is_rejected() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("clonebench.toml");
        fs::write(&config_path, "min_git_version = \"new\"\n")?;

        assert!(Config::load(Some(config_path)).is_err());
        Ok(())
    }

    #[test]
    fn test_get_default_config_path() -> Result<()> {
        let path = get_default_config_path()?;
        assert!(path.ends_with("clonebench.toml"));
        Ok(())
    }

    #[test]
    fn test_default_report_path_uses_cwd() -> Result<()> {
        let path = default_report_path()?;
        assert_eq!(path.parent(), Some(std::env::current_dir()?.as_path()));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("report"));
        Ok(())
    }
}
