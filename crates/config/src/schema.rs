//! Typed runtime configuration.
//!
//! [`RuntimeConfiguration`] is built once by the loader and only read
//! afterwards: its fields are private and there are no setters.

use crate::redis::ConnectionEndpoint;
use gopher_shared::SecretString;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Log level used when `GOPHER_LOG_LEVEL` is unset or empty.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Deployment environment the process runs in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development (also the fallback for unknown values).
    #[default]
    Development,
    /// Automated test runs.
    Testing,
    /// Pre-production.
    Staging,
    /// Production.
    Production,
}

impl Environment {
    /// Map an `ENV` value, case-insensitively. Unknown and empty values map
    /// to [`Environment::Development`].
    #[must_use]
    pub fn from_env_value(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "testing" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Testing => "testing",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }

    /// Returns true for [`Environment::Production`].
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Everything.
    Trace,
    /// Debugging detail.
    Debug,
    /// Normal operation.
    #[default]
    Info,
    /// Recoverable problems.
    Warn,
    /// Failed operations.
    Error,
    /// Failures that stop the process.
    Fatal,
    /// Failures that abort the process.
    Panic,
    /// No logging at all.
    Disabled,
}

impl LogLevel {
    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
            Self::Panic => "panic",
            Self::Disabled => "disabled",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Unrecognized log level name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level {value:?}")]
pub struct LogLevelParseError {
    value: String,
}

impl LogLevelParseError {
    /// The rejected input.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl FromStr for LogLevel {
    type Err = LogLevelParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let level = match input.to_ascii_lowercase().as_str() {
            "trace" => Self::Trace,
            "debug" => Self::Debug,
            "info" => Self::Info,
            "warn" => Self::Warn,
            "error" => Self::Error,
            "fatal" => Self::Fatal,
            "panic" => Self::Panic,
            "disabled" => Self::Disabled,
            _ => {
                return Err(LogLevelParseError {
                    value: input.to_owned(),
                });
            },
        };
        Ok(level)
    }
}

/// Redis connection settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RedisConfig {
    /// Resolved endpoint; the zero value when `REDIS_URL` is unset.
    pub endpoint: ConnectionEndpoint,
    /// Connect over plain text.
    pub insecure: bool,
    /// Skip x.509 certificate verification.
    pub skip_verify: bool,
}

impl RedisConfig {
    /// Returns true when `REDIS_URL` produced an endpoint.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.endpoint.is_configured()
    }

    /// Returns true when connections should use TLS.
    #[must_use]
    pub const fn use_tls(&self) -> bool {
        !self.insecure
    }
}

/// Heroku dyno metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HerokuConfig {
    /// `HEROKU_APP_ID`.
    pub app_id: String,
    /// `HEROKU_APP_NAME`.
    pub app_name: String,
    /// `HEROKU_DYNO_ID`.
    pub dyno_id: String,
    /// `HEROKU_SLUG_COMMIT`.
    pub commit: String,
}

/// Slack app identity and credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SlackConfig {
    /// Slack app id.
    pub app_id: String,
    /// Workspace the app is deployed to.
    pub team_id: String,
    /// OAuth client id.
    pub client_id: String,
    /// Legacy verification token.
    pub request_token: SecretString,
    /// OAuth client secret.
    pub client_secret: SecretString,
    /// HMAC secret for request signing.
    pub request_secret: SecretString,
    /// Bot token for API calls.
    pub bot_access_token: SecretString,
}

/// Immutable configuration assembled from the environment at start-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeConfiguration {
    pub(crate) log_level: LogLevel,
    pub(crate) env: Environment,
    pub(crate) port: u16,
    pub(crate) heroku: HerokuConfig,
    pub(crate) redis: RedisConfig,
    pub(crate) slack: SlackConfig,
}

impl RuntimeConfiguration {
    /// Configured log verbosity.
    #[must_use]
    pub const fn log_level(&self) -> LogLevel {
        self.log_level
    }

    /// Deployment environment.
    #[must_use]
    pub const fn env(&self) -> Environment {
        self.env
    }

    /// TCP listen port; `0` means the platform default.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Dyno metadata.
    #[must_use]
    pub const fn heroku(&self) -> &HerokuConfig {
        &self.heroku
    }

    /// Redis connection settings.
    #[must_use]
    pub const fn redis(&self) -> &RedisConfig {
        &self.redis
    }

    /// Slack app settings.
    #[must_use]
    pub const fn slack(&self) -> &SlackConfig {
        &self.slack
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn environment_mapping_is_total_and_case_insensitive() {
        for value in ["PRODUCTION", "production", "Production"] {
            assert_eq!(Environment::from_env_value(value), Environment::Production);
        }
        assert_eq!(Environment::from_env_value("Staging"), Environment::Staging);
        assert_eq!(Environment::from_env_value("testing"), Environment::Testing);
        for value in ["", "prod", "dev", "development", " production"] {
            assert_eq!(Environment::from_env_value(value), Environment::Development);
        }
    }

    #[test]
    fn log_levels_parse_case_insensitively() -> Result<(), Box<dyn Error>> {
        assert_eq!("trace".parse::<LogLevel>()?, LogLevel::Trace);
        assert_eq!("DEBUG".parse::<LogLevel>()?, LogLevel::Debug);
        assert_eq!("Warn".parse::<LogLevel>()?, LogLevel::Warn);
        assert_eq!("fatal".parse::<LogLevel>()?, LogLevel::Fatal);
        assert_eq!("panic".parse::<LogLevel>()?, LogLevel::Panic);
        assert_eq!("disabled".parse::<LogLevel>()?, LogLevel::Disabled);
        assert_eq!(DEFAULT_LOG_LEVEL.parse::<LogLevel>()?, LogLevel::default());
        Ok(())
    }

    #[test]
    fn padded_log_level_is_rejected() {
        for raw in [" info", "debug ", "\twarn\n"] {
            let error = raw.parse::<LogLevel>().err();
            assert_eq!(error.as_ref().map(LogLevelParseError::value), Some(raw));
        }
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let error = "verbose".parse::<LogLevel>().err();
        assert_eq!(
            error.as_ref().map(LogLevelParseError::value),
            Some("verbose")
        );
    }

    #[test]
    fn names_render_lowercase() {
        assert_eq!(LogLevel::Warn.to_string(), "warn");
        assert_eq!(Environment::Staging.to_string(), "staging");
        assert!(Environment::Production.is_production());
    }
}
