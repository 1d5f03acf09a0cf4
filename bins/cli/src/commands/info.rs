//! Info command handler.

use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, to_json_line};
use gopher_config::config_crate_version;
use gopher_shared::shared_crate_version;

/// Binary name reported by `info`.
const NAME: &str = "gopher";

/// Run the info command.
pub fn run_info(mode: OutputMode) -> Result<CliOutput, CliError> {
    let version = env!("CARGO_PKG_VERSION");

    let stdout = if mode.is_json() {
        to_json_line(&serde_json::json!({
            "status": "ok",
            "build": {
                "name": NAME,
                "version": version,
                "configVersion": config_crate_version(),
                "sharedVersion": shared_crate_version(),
            }
        }))?
    } else {
        format!(
            "status: ok\nname: {NAME}\nversion: {version}\nconfig: {}\nshared: {}\n",
            config_crate_version(),
            shared_crate_version(),
        )
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}
