use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;

use crate::config::ColorChoice;
use crate::error::EXIT_FAILURE;
use crate::repo::RepoSpec;

#[derive(Parser, Debug, PartialEq)]
#[command(name = "clonebench", version)]
#[command(about = "Benchmark git clone strategies against a remote host")]
pub struct CliArgs {
    /// List the commands without running them
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Report file (default: ./<program>.report)
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// When to color terminal output
    #[arg(long, value_enum)]
    pub color: Option<ColorChoice>,

    /// Host serving the repositories
    pub remote: String,

    /// Repository and optional branches: name[:branch[,branch...]]
    #[arg(required = true, value_name = "REPO_INFO")]
    pub repos: Vec<RepoSpec>,
}

/// Print a parse failure the way the tool reports usage and pick the exit status.
///
/// Help and usage errors go to stderr with status 1; `--version` goes to
/// stdout with status 0.
pub fn report_parse_error(err: &clap::Error) -> u8 {
    match err.kind() {
        ErrorKind::DisplayVersion => {
            print!("{}", err.render());
            0
        }
        _ => {
            eprint!("{}", err.render());
            EXIT_FAILURE
        }
    }
}
