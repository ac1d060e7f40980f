use std::path::PathBuf;
use thiserror::Error;

/// Exit status for usage, configuration and runtime failures
pub const EXIT_FAILURE: u8 = 1;
/// Exit status when the host environment cannot run the benchmark
pub const EXIT_ENVIRONMENT: u8 = 2;

/// Everything that can stop a benchmark run
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("environment check failed: {reason}")]
    Environment { reason: String },

    #[error("invalid configuration in {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("cannot open report file {path}: {source}")]
    Report {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{strategy}: `{command}` failed ({})", describe_code(.code))]
    CommandFailed {
        strategy: String,
        command: String,
        code: Option<i32>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BenchError {
    pub fn exit_code(&self) -> u8 {
        match self {
            BenchError::Environment { .. } => EXIT_ENVIRONMENT,
            _ => EXIT_FAILURE,
        }
    }
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal or not started".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_error_maps_to_exit_two() {
        let err = BenchError::Environment {
            reason: "git 1.7.1 is older than 1.8.0".to_string(),
        };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_other_errors_map_to_exit_one() {
        let config = BenchError::Config {
            path: PathBuf::from("/etc/clonebench.toml"),
            reason: "url_template must contain {repo}".to_string(),
        };
        assert_eq!(config.exit_code(), 1);

        let failed = BenchError::CommandFailed {
            strategy: "plain-clone".to_string(),
            command: "git clone ssh://host/repo".to_string(),
            code: Some(128),
        };
        assert_eq!(failed.exit_code(), 1);
        assert_eq!(
            failed.to_string(),
            "plain-clone: `git clone ssh://host/repo` failed (exit status 128)"
        );
    }
}
