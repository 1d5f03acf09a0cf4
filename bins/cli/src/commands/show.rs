//! Show command handler.

use super::load_config;
use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, push_text_value, to_json_line};
use gopher_config::{EnvSource, RedisClientOptions};
use tracing::info;

/// Run the show command.
///
/// Secrets render as the redaction placeholder in both output formats.
pub fn run_show<E: EnvSource + ?Sized>(
    mode: OutputMode,
    env: &mut E,
) -> Result<CliOutput, CliError> {
    let config = match load_config(mode, env) {
        Ok(config) => config,
        Err(output) => return Ok(output),
    };
    info!(command = "show", env = %config.env(), "configuration rendered");

    let config_value = serde_json::to_value(&config)?;
    let client_value = serde_json::to_value(RedisClientOptions::from_config(&config))?;

    let stdout = if mode.is_json() {
        to_json_line(&serde_json::json!({
            "status": "ok",
            "config": config_value,
            "redisClient": client_value,
        }))?
    } else {
        let mut out = String::from("status: ok\n");
        push_text_value(&mut out, "config", &config_value, 0);
        push_text_value(&mut out, "redis_client", &client_value, 0);
        out
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}
