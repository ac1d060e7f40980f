//! Output tee: every byte of benchmark output goes to the terminal unchanged
//! and to the report file with terminal escape sequences removed.

use anyhow::{Context, Result};
use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::BenchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// How bytes are written to the report file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    /// Escape sequences removed
    Sanitized,
    /// Bytes copied as written to the terminal
    Raw,
}

pub const RAW_REPORT_WARNING: &str =
    "warning: escape sequence stripping disabled, report will contain raw terminal output";

type Sink = Box<dyn Write + Send>;

pub struct OutputTee {
    stdout: Sink,
    stderr: Sink,
    report: BufWriter<File>,
    report_path: PathBuf,
    // Per-stream state so a sequence split across chunks is still removed
    strippers: Option<(AnsiStripper, AnsiStripper)>,
    scratch: Vec<u8>,
}

impl OutputTee {
    /// Tee onto the process's stdout and stderr, truncating the report file
    pub fn create(report_path: &Path, mode: ReportMode) -> Result<Self, BenchError> {
        Self::with_terminal(
            report_path,
            mode,
            Box::new(io::stdout()),
            Box::new(io::stderr()),
        )
    }

    pub fn with_terminal(
        report_path: &Path,
        mode: ReportMode,
        stdout: Sink,
        stderr: Sink,
    ) -> Result<Self, BenchError> {
        let file = File::create(report_path).map_err(|source| BenchError::Report {
            path: report_path.to_path_buf(),
            source,
        })?;

        let mut tee = Self {
            stdout,
            stderr,
            report: BufWriter::new(file),
            report_path: report_path.to_path_buf(),
            strippers: match mode {
                ReportMode::Sanitized => Some((AnsiStripper::new(), AnsiStripper::new())),
                ReportMode::Raw => None,
            },
            scratch: Vec::new(),
        };

        if mode == ReportMode::Raw {
            // Terminal only, the report itself stays a pure transcript
            writeln!(tee.stderr, "{RAW_REPORT_WARNING}").context("Failed to write warning")?;
        }

        Ok(tee)
    }

    pub fn write(&mut self, stream: Stream, bytes: &[u8]) -> io::Result<()> {
        let terminal = match stream {
            Stream::Stdout => &mut self.stdout,
            Stream::Stderr => &mut self.stderr,
        };
        terminal.write_all(bytes)?;
        terminal.flush()?;

        match &mut self.strippers {
            Some((out, err)) => {
                let stripper = match stream {
                    Stream::Stdout => out,
                    Stream::Stderr => err,
                };
                self.scratch.clear();
                stripper.strip_into(bytes, &mut self.scratch);
                self.report.write_all(&self.scratch)
            }
            None => self.report.write_all(bytes),
        }
    }

    pub fn println(&mut self, line: impl Display) -> io::Result<()> {
        self.write(Stream::Stdout, format!("{line}\n").as_bytes())
    }

    pub fn eprintln(&mut self, line: impl Display) -> io::Result<()> {
        self.write(Stream::Stderr, format!("{line}\n").as_bytes())
    }

    /// Flush and close the report, handing the terminal back to the caller
    pub fn restore(mut self) -> Result<PathBuf> {
        self.stdout.flush().context("Failed to flush stdout")?;
        self.stderr.flush().context("Failed to flush stderr")?;
        let file = self
            .report
            .into_inner()
            .map_err(|e| e.into_error())
            .with_context(|| format!("Failed to flush {}", self.report_path.display()))?;
        file.sync_all()
            .with_context(|| format!("Failed to sync {}", self.report_path.display()))?;
        Ok(self.report_path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ground,
    Escape,
    EscapeIntermediate,
    Csi,
    /// OSC, DCS, SOS, PM and APC run until BEL or ST
    ControlString,
    ControlStringEscape,
}

const ESC: u8 = 0x1b;
const BEL: u8 = 0x07;

/// Streaming remover of ANSI/ECMA-48 escape sequences
#[derive(Debug, Clone)]
pub struct AnsiStripper {
    state: State,
}

impl Default for AnsiStripper {
    fn default() -> Self {
        Self::new()
    }
}

impl AnsiStripper {
    pub fn new() -> Self {
        Self {
            state: State::Ground,
        }
    }

    pub fn strip_into(&mut self, input: &[u8], out: &mut Vec<u8>) {
        for &byte in input {
            self.state = match self.state {
                State::Ground => {
                    if byte == ESC {
                        State::Escape
                    } else {
                        out.push(byte);
                        State::Ground
                    }
                }
                State::Escape => match byte {
                    b'[' => State::Csi,
                    b']' | b'P' | b'X' | b'^' | b'_' => State::ControlString,
                    ESC => State::Escape,
                    0x20..=0x2f => State::EscapeIntermediate,
                    _ => State::Ground,
                },
                State::EscapeIntermediate => match byte {
                    0x20..=0x2f => State::EscapeIntermediate,
                    ESC => State::Escape,
                    _ => State::Ground,
                },
                State::Csi => match byte {
                    0x40..=0x7e => State::Ground,
                    ESC => State::Escape,
                    _ => State::Csi,
                },
                State::ControlString => match byte {
                    BEL => State::Ground,
                    ESC => State::ControlStringEscape,
                    _ => State::ControlString,
                },
                State::ControlStringEscape => match byte {
                    b'\\' => State::Ground,
                    ESC => State::ControlStringEscape,
                    _ => State::ControlString,
                },
            };
        }
    }
}
