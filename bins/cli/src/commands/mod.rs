//! CLI command handlers.

pub mod check;
pub mod info;
pub mod show;

pub use check::run_check;
pub use info::run_info;
pub use show::run_show;

use crate::CliOutput;
use crate::error::ExitCode;
use crate::format::{OutputMode, push_text_value, to_json_line};
use gopher_config::telemetry::try_init_with_writer;
use gopher_config::{EnvSource, RuntimeConfiguration, load_runtime_config};
use gopher_shared::ErrorEnvelope;

/// Assemble the configuration, or the failure output to print instead.
///
/// On success the process logger is installed on stderr at the configured
/// level so stdout stays machine-readable.
pub(crate) fn load_config<E: EnvSource + ?Sized>(
    mode: OutputMode,
    env: &mut E,
) -> Result<RuntimeConfiguration, CliOutput> {
    match load_runtime_config(env) {
        Ok(config) => {
            try_init_with_writer(config.log_level(), std::io::stderr);
            Ok(config)
        },
        Err(error) => Err(format_error_output(
            mode,
            &ErrorEnvelope::from(error),
            ExitCode::InvalidConfig,
        )),
    }
}

pub(crate) fn format_error_output(
    mode: OutputMode,
    error: &ErrorEnvelope,
    exit_code: ExitCode,
) -> CliOutput {
    let stderr = format!("error: {}\n", error.message);

    let stdout = if mode.is_json() {
        let payload = serde_json::json!({
            "status": "error",
            "error": error,
        });
        to_json_line(&payload).unwrap_or_else(|_| {
            "{\"status\":\"error\",\"error\":{\"kind\":\"unexpected\",\"code\":{\"namespace\":\"cli\",\"code\":\"serialization\"}}}\n"
                .to_string()
        })
    } else {
        let mut out = String::from("status: error\n");
        out.push_str(&format!("code: {}\n", error.code));
        out.push_str(&format!("kind: {}\n", error.kind));
        out.push_str(&format!("message: {}\n", error.message));
        if !error.metadata.is_empty() {
            let meta = serde_json::json!(error.metadata);
            push_text_value(&mut out, "meta", &meta, 0);
        }
        out
    };

    CliOutput {
        stdout,
        stderr,
        exit_code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use crate::format::OutputFormat;

    #[test]
    fn cli_failures_render_as_unexpected() {
        let error = CliError::from(std::io::Error::other("broken pipe"));
        let mode = OutputMode {
            format: OutputFormat::Text,
        };
        let output = format_error_output(mode, &error.to_envelope(), error.exit_code());

        assert_eq!(output.exit_code, ExitCode::Io);
        assert!(output.stdout.contains("code: cli:io\n"));
        assert!(output.stdout.contains("kind: unexpected\n"));
        assert_eq!(output.stderr, "error: io error: broken pipe\n");
    }
}
