//! CLI binary entrypoint.

mod commands;
mod error;
mod format;

use clap::{Parser, Subcommand};
use commands::{format_error_output, run_check, run_info, run_show};
use error::{CliError, ExitCode};
use format::{OutputArgs, OutputMode};
use gopher_config::{EnvSource, ProcessEnv};
use std::io::{self, Write};

#[derive(Debug, Parser)]
#[command(
    name = "gopher",
    version,
    about = "Inspect the gopher runtime configuration",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Assemble the configuration from the environment and report the result.
    Check,
    /// Print the effective configuration with secrets redacted.
    Show,
    /// Show build and version details.
    Info,
}

pub(crate) struct CliOutput {
    stdout: String,
    stderr: String,
    exit_code: ExitCode,
}

#[allow(
    unsafe_code,
    reason = "the process environment handle is created before any thread is spawned"
)]
fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let mode = OutputMode::from_args(&cli.output);
    // SAFETY: the CLI is single-threaded and nothing else reads the
    // environment while the configuration is assembled.
    let mut env = unsafe { ProcessEnv::new() };

    let output = run(&cli.command, mode, &mut env).unwrap_or_else(|error| {
        format_error_output(mode, &error.to_envelope(), error.exit_code())
    });
    match write_output(&output) {
        Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
        Err(error) => exit_with_error(&error),
    }
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

fn run<E: EnvSource + ?Sized>(
    command: &Commands,
    mode: OutputMode,
    env: &mut E,
) -> Result<CliOutput, CliError> {
    match command {
        Commands::Check => run_check(mode, env),
        Commands::Show => run_show(mode, env),
        Commands::Info => run_info(mode),
    }
}

fn write_output(output: &CliOutput) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    stdout.write_all(output.stdout.as_bytes())?;
    stdout.flush()?;

    if !output.stderr.is_empty() {
        let mut stderr = io::stderr();
        stderr.write_all(output.stderr.as_bytes())?;
        stderr.flush()?;
    }

    Ok(())
}
