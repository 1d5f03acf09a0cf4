//! # gopher-config
//!
//! Environment-driven runtime configuration for the gopher service.
//! Read once at start-up; the result is immutable. This crate depends on
//! `shared` only.

/// Redis client options derived from the configuration.
pub mod client;
/// Environment variable names and access.
pub mod env;
/// Configuration assembly from the environment.
pub mod load;
/// Cache connection-string resolution.
pub mod redis;
/// Configuration types.
pub mod schema;
/// Logger installation.
pub mod telemetry;

pub use client::{RedisClientOptions, TlsOptions};
pub use env::{EnvSource, MapEnv, ProcessEnv, ScrubError};
pub use load::{
    ConfigError, ConfigField, ConfigValueError, load_runtime_config, load_runtime_config_std_env,
};
pub use redis::{ConnectionEndpoint, EndpointError, resolve_endpoint};
pub use schema::{
    Environment, HerokuConfig, LogLevel, LogLevelParseError, RedisConfig, RuntimeConfiguration,
    SlackConfig,
};
pub use telemetry::init_logging;

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use gopher_shared::shared_crate_version;

    #[test]
    fn config_crate_compiles() {
        let version = config_crate_version();
        assert!(!version.is_empty());
    }

    #[test]
    fn config_can_use_shared() {
        assert_eq!(config_crate_version(), shared_crate_version());
    }
}
