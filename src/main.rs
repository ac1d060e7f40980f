use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use clonebench::bench::{Benchmark, HostInfo};
use clonebench::cli::{report_parse_error, CliArgs};
use clonebench::config::Config;
use clonebench::executor::ExecutorSettings;
use clonebench::git::{check_environment, GitRunner};
use clonebench::style::Palette;
use clonebench::tee::{OutputTee, ReportMode};
use clonebench::BenchError;

fn main() -> ExitCode {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(err) => return ExitCode::from(report_parse_error(&err)),
    };

    // Initialize tracing with env filter; diagnostics stay out of the report
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(args) {
        Ok(report_path) => {
            // Printed after the tee is gone so it never lands in the report
            println!("report saved to {}", report_path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("benchmark failed: {}", err);
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(args: CliArgs) -> Result<PathBuf, BenchError> {
    let config = Config::from_cli_and_file(&args)?;
    let git_version = check_environment(
        &config.git_binary,
        config.min_git_version(),
        args.dry_run,
    )?;

    let palette = Palette::detect(config.report.color);
    let mode = if config.report.strip_escapes {
        ReportMode::Sanitized
    } else {
        ReportMode::Raw
    };
    let report_path = config.report_path()?;
    info!(path = %report_path.display(), ?mode, "writing report");

    let mut tee = OutputTee::create(&report_path, mode)?;
    let settings = ExecutorSettings::from(&config);
    let runner = GitRunner;
    let benchmark = Benchmark::new(
        &runner,
        &settings,
        palette,
        &args.remote,
        HostInfo::detect(git_version),
    );

    let outcome = benchmark.run_all(&args.repos, args.dry_run, &mut tee);
    let report_path = tee.restore()?;
    let runs = outcome?;
    info!(runs, "benchmark finished");
    Ok(report_path)
}
