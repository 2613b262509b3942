//! Coqui installer CLI entrypoint.
//!
//! Detects the host, reconciles PHP, Composer and git, then installs or
//! updates the Coqui checkout and publishes the `coqui` launcher.

use clap::Parser;
use clap::error::ErrorKind;
use coqui_installer::cli::Cli;
use coqui_installer::confirm::{ConfirmationGate, TerminalPrompter};
use coqui_installer::dirs::SystemBaseDirs;
use coqui_installer::download::HttpDownloader;
use coqui_installer::error::Result;
use coqui_installer::exec::SystemCommandExecutor;
use coqui_installer::output::{Reporter, write_stderr_line};
use coqui_installer::pipeline::run_install;
use coqui_installer::platform;
use coqui_installer::privilege::Privilege;
use coqui_installer::reconcile::ReconcileContext;
use coqui_installer::run_config::RunConfig;
use log::{LevelFilter, debug};
use std::io::Write;

/// Environment variable overriding the log filter.
const LOG_ENV: &str = "COQUI_INSTALLER_LOG";

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let exit_code = exit_code_for_parse_error(err.kind());
            if err.print().is_err() {
                // Nothing more useful to do with a closed stream.
            }
            std::process::exit(exit_code);
        }
    };
    init_logging(&cli);

    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    let executor = SystemCommandExecutor;
    let dirs = SystemBaseDirs;

    let profile = platform::detect(&executor)?;
    let config = RunConfig::from_cli(cli, &dirs)?;
    debug!("run configuration: {config:?}");

    let manager = profile.package_manager().manager();
    let privilege = Privilege::resolve(&executor);
    let prompter = TerminalPrompter;
    let gate = ConfirmationGate::new(config.non_interactive, &prompter);
    let downloader = HttpDownloader;
    let ctx = ReconcileContext {
        profile: &profile,
        manager: manager.as_deref(),
        privilege,
        gate: &gate,
        executor: &executor,
        downloader: &downloader,
        dirs: &dirs,
    };

    let mut reporter = Reporter::new(stderr, config.quiet);
    reporter.step(format!("Detected {profile}"));
    let summary = run_install(&config, &ctx, &mut reporter)?;
    summary.report(&mut reporter);
    Ok(())
}

/// Installs `env_logger`, letting `COQUI_INSTALLER_LOG` override the flags.
fn init_logging(cli: &Cli) {
    env_logger::Builder::new()
        .filter_level(log_level(cli.verbosity))
        .parse_env(env_logger::Env::new().filter(LOG_ENV))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn log_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Error,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Help and version requests are successful exits; every other parse
/// failure is a usage error.
fn exit_code_for_parse_error(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            if let Some(hint) = err.remediation() {
                write_stderr_line(stderr, format!("hint: {hint}"));
            }
            1
        }
    }
}
