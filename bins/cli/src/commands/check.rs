//! Check command handler.

use super::load_config;
use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, to_json_line};
use gopher_config::EnvSource;
use tracing::info;

/// Run the check command.
pub fn run_check<E: EnvSource + ?Sized>(
    mode: OutputMode,
    env: &mut E,
) -> Result<CliOutput, CliError> {
    let config = match load_config(mode, env) {
        Ok(config) => config,
        Err(output) => return Ok(output),
    };
    info!(command = "check", env = %config.env(), "configuration check passed");

    let stdout = if mode.is_json() {
        to_json_line(&serde_json::json!({
            "status": "ok",
            "env": config.env(),
            "redisConfigured": config.redis().is_configured(),
        }))?
    } else {
        "status: ok\n".to_string()
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}
