use anyhow::{Context, Result};
use crossbeam_channel::Sender;
use std::fmt;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use tracing::{debug, warn};

use crate::error::BenchError;
use crate::tee::{OutputTee, Stream};

/// One git client invocation
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub program: &'a str,
    pub args: &'a [String],
    pub cwd: &'a Path,
}

/// How a finished command exited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandOutcome {
    pub success: bool,
    pub code: Option<i32>,
}

impl CommandOutcome {
    pub fn success() -> Self {
        Self {
            success: true,
            code: Some(0),
        }
    }

    pub fn failure(code: Option<i32>) -> Self {
        Self {
            success: false,
            code,
        }
    }
}

/// Port for running git commands
pub trait CommandRunner {
    /// Run to completion, sending all output through the tee
    fn run(&self, invocation: &Invocation<'_>, output: &mut OutputTee) -> Result<CommandOutcome>;
}

/// Runs real child processes and pumps their output into the tee
#[derive(Debug, Default, Clone, Copy)]
pub struct GitRunner;

const PUMP_CHUNK: usize = 8 * 1024;

impl CommandRunner for GitRunner {
    fn run(&self, invocation: &Invocation<'_>, output: &mut OutputTee) -> Result<CommandOutcome> {
        debug!(
            program = invocation.program,
            args = ?invocation.args,
            cwd = %invocation.cwd.display(),
            "spawning"
        );

        let mut child = Command::new(invocation.program)
            .args(invocation.args)
            .current_dir(invocation.cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to run {}", invocation.program))?;

        let (sender, receiver) = crossbeam_channel::unbounded();
        let mut pumps = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            pumps.push(spawn_pump(stdout, Stream::Stdout, sender.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            pumps.push(spawn_pump(stderr, Stream::Stderr, sender.clone()));
        }
        // Receiver loop ends once both pumps hang up
        drop(sender);

        let mut write_error = None;
        for (stream, chunk) in receiver.iter() {
            if write_error.is_some() {
                continue;
            }
            if let Err(e) = output.write(stream, &chunk) {
                write_error = Some(e);
            }
        }

        for pump in pumps {
            if pump.join().is_err() {
                warn!("output pump thread panicked");
            }
        }

        let status = child
            .wait()
            .with_context(|| format!("Failed to wait for {}", invocation.program))?;
        debug!(program = invocation.program, %status, "finished");

        if let Some(e) = write_error {
            return Err(e).context("Failed to write command output");
        }

        Ok(CommandOutcome {
            success: status.success(),
            code: status.code(),
        })
    }
}

fn spawn_pump<R>(
    mut source: R,
    stream: Stream,
    sender: Sender<(Stream, Vec<u8>)>,
) -> thread::JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = [0u8; PUMP_CHUNK];
        loop {
            match source.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if sender.send((stream, buf[..n].to_vec())).is_err() {
                        // Receiver dropped, stop processing
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(?stream, error = %e, "reading child output failed");
                    break;
                }
            }
        }
    })
}

/// `major.minor.patch` of the git client
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct GitVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl GitVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Accepts `2.39.2`, `1.8` and `git version 2.39.2.windows.1` style strings
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let text = text.strip_prefix("git version").unwrap_or(text).trim();
        let token = text.split_whitespace().next()?;

        let mut parts = token.split('.').map(leading_number);
        let major = parts.next()??;
        let minor = parts.next()??;
        let patch = parts.next().flatten().unwrap_or(0);
        Some(Self::new(major, minor, patch))
    }
}

impl fmt::Display for GitVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

fn leading_number(part: &str) -> Option<u32> {
    let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// First line of `<git> --version`, or `None` when the client cannot be run
pub fn git_version_line(git_binary: &str) -> Option<String> {
    let output = Command::new(git_binary)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
}

/// Make sure the git client is new enough to run every strategy.
///
/// Returns the client's version line for the banner. A missing client is
/// tolerated in dry-run mode since nothing will be executed.
pub fn check_environment(
    git_binary: &str,
    minimum: GitVersion,
    dry_run: bool,
) -> Result<Option<String>, BenchError> {
    let Some(line) = git_version_line(git_binary) else {
        if dry_run {
            warn!(git_binary, "git client not found, continuing in dry-run mode");
            return Ok(None);
        }
        return Err(BenchError::Environment {
            reason: format!("cannot run `{git_binary} --version`"),
        });
    };

    let version = GitVersion::parse(&line).ok_or_else(|| BenchError::Environment {
        reason: format!("cannot parse git version from `{line}`"),
    })?;

    if version < minimum {
        return Err(BenchError::Environment {
            reason: format!("git {version} is older than the required {minimum}"),
        });
    }

    debug!(%version, "git client ok");
    Ok(Some(line))
}
