//! Runtime configuration assembly.
//!
//! Assembly is all-or-nothing: the first field group that fails aborts the
//! whole load and only the error is returned. Secrets are scrubbed from the
//! environment after they have been copied into the configuration.

use crate::env::{
    ENV_ENV, ENV_HEROKU_APP_ID, ENV_HEROKU_APP_NAME, ENV_HEROKU_DYNO_ID, ENV_HEROKU_SLUG_COMMIT,
    ENV_LOG_LEVEL, ENV_PORT, ENV_REDIS_INSECURE, ENV_REDIS_SKIPVERIFY, ENV_REDIS_URL,
    ENV_SLACK_APP_ID, ENV_SLACK_BOT_ACCESS_TOKEN, ENV_SLACK_CLIENT_ID, ENV_SLACK_CLIENT_SECRET,
    ENV_SLACK_REQUEST_SECRET, ENV_SLACK_REQUEST_TOKEN, ENV_SLACK_TEAM_ID, EnvSource, ProcessEnv,
    SCRUBBED_VARS, read_flag, read_string, read_var,
};
use crate::redis::{EndpointError, resolve_endpoint};
use crate::schema::{
    DEFAULT_LOG_LEVEL, Environment, HerokuConfig, LogLevel, LogLevelParseError, RedisConfig,
    RuntimeConfiguration, SlackConfig,
};
use gopher_shared::{ErrorCode, ErrorEnvelope, SecretString};
use std::fmt;
use std::num::ParseIntError;
use std::sync::{Mutex, PoisonError, TryLockError};
use tracing::{debug, info, warn};

/// Serializes assemblies: the scrub step mutates process-wide state.
static ASSEMBLY_LOCK: Mutex<()> = Mutex::new(());

/// Returns true while some assembly holds [`ASSEMBLY_LOCK`].
pub(crate) fn assembly_in_progress() -> bool {
    matches!(ASSEMBLY_LOCK.try_lock(), Err(TryLockError::WouldBlock))
}

/// Field group whose value failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigField {
    /// Listen port.
    Port,
    /// Cache connection string.
    RedisUrl,
    /// Log verbosity.
    LogLevel,
}

impl ConfigField {
    /// Field name reported to callers.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Port => "PORT",
            Self::RedisUrl => "REDIS_URL",
            Self::LogLevel => "LOG_LEVEL",
        }
    }

    /// Environment variable the field is read from.
    #[must_use]
    pub const fn env_var(self) -> &'static str {
        match self {
            Self::Port => ENV_PORT,
            Self::RedisUrl => ENV_REDIS_URL,
            Self::LogLevel => ENV_LOG_LEVEL,
        }
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

/// Underlying reason a field was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigValueError {
    /// Not an unsigned 16-bit integer.
    #[error("{value:?} is not a valid port: {source}")]
    Port {
        /// Raw value.
        value: String,
        /// Integer parse failure.
        source: ParseIntError,
    },
    /// Leading `+` or `-` on a port number.
    #[error("{value:?} is not a valid port: explicit sign is not allowed")]
    PortSign {
        /// Raw value.
        value: String,
    },
    /// Connection string could not be resolved.
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
    /// Unknown level name.
    #[error(transparent)]
    LogLevel(#[from] LogLevelParseError),
}

/// Invalid configuration: names the field and carries the cause.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to parse {}: {source}", .field.env_var())]
pub struct ConfigError {
    field: ConfigField,
    source: ConfigValueError,
}

impl ConfigError {
    fn new(field: ConfigField, source: impl Into<ConfigValueError>) -> Self {
        Self {
            field,
            source: source.into(),
        }
    }

    /// The rejected field.
    #[must_use]
    pub const fn field(&self) -> ConfigField {
        self.field
    }

    /// Why the field was rejected.
    #[must_use]
    pub const fn cause(&self) -> &ConfigValueError {
        &self.source
    }
}

impl From<ConfigError> for ErrorEnvelope {
    fn from(error: ConfigError) -> Self {
        let field = error.field();
        let code = match field {
            ConfigField::Port => ErrorCode::new("config", "invalid_port"),
            ConfigField::RedisUrl => ErrorCode::new("config", "invalid_redis_url"),
            ConfigField::LogLevel => ErrorCode::new("config", "invalid_log_level"),
        };
        let envelope = Self::expected(code, error.to_string()).with_metadata("field", field.name());

        // REDIS_URL embeds credentials, so its raw value is never echoed.
        match error.source {
            ConfigValueError::Port { value, .. } | ConfigValueError::PortSign { value } => {
                envelope.with_env_value(field.env_var(), &value)
            },
            ConfigValueError::LogLevel(source) => {
                envelope.with_env_value(field.env_var(), source.value())
            },
            ConfigValueError::Endpoint(source) => {
                let envelope = envelope
                    .with_metadata("env_var", field.env_var())
                    .with_metadata("reason", source.kind());
                match source {
                    EndpointError::UnsupportedScheme { scheme } => {
                        envelope.with_metadata("scheme", scheme)
                    },
                    _ => envelope,
                }
            },
        }
    }
}

/// Assemble the runtime configuration from `env`.
///
/// Reads every known variable, resolves `REDIS_URL`, then unsets the three
/// Slack secrets from `env`. Scrub failures are logged and ignored.
pub fn load_runtime_config<E: EnvSource + ?Sized>(
    env: &mut E,
) -> Result<RuntimeConfiguration, ConfigError> {
    let _guard = ASSEMBLY_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

    let port = parse_port(env)?;
    let redis = parse_redis(env)?;
    let log_level = parse_log_level(env)?;
    let environment = Environment::from_env_value(&read_string(env, ENV_ENV));
    let heroku = read_heroku(env);
    let slack = read_slack(env);

    scrub_secrets(env);

    info!(
        env = %environment,
        port,
        log_level = %log_level,
        redis = redis.is_configured(),
        "runtime configuration loaded"
    );

    Ok(RuntimeConfiguration {
        log_level,
        env: environment,
        port,
        heroku,
        redis,
        slack,
    })
}

/// Assemble the runtime configuration from the process environment.
///
/// # Safety
///
/// Scrubbing removes variables from the process environment. No other thread
/// may read or write the environment while this runs; call it during
/// single-threaded start-up.
#[allow(
    unsafe_code,
    reason = "scrubbing mutates the process environment; the caller vouches for single-threaded start-up"
)]
pub unsafe fn load_runtime_config_std_env() -> Result<RuntimeConfiguration, ConfigError> {
    // SAFETY: forwarded from this function's contract.
    let mut env = unsafe { ProcessEnv::new() };
    load_runtime_config(&mut env)
}

fn parse_port<E: EnvSource + ?Sized>(env: &E) -> Result<u16, ConfigError> {
    let Some(raw) = read_var(env, ENV_PORT) else {
        return Ok(0);
    };
    if raw.starts_with(['+', '-']) {
        return Err(ConfigError::new(
            ConfigField::Port,
            ConfigValueError::PortSign { value: raw },
        ));
    }
    raw.parse::<u16>().map_err(|source| {
        ConfigError::new(
            ConfigField::Port,
            ConfigValueError::Port { value: raw, source },
        )
    })
}

fn parse_redis<E: EnvSource + ?Sized>(env: &E) -> Result<RedisConfig, ConfigError> {
    let Some(raw) = read_var(env, ENV_REDIS_URL) else {
        return Ok(RedisConfig::default());
    };

    let insecure = read_flag(env, ENV_REDIS_INSECURE);
    let skip_verify = read_flag(env, ENV_REDIS_SKIPVERIFY);
    let endpoint = resolve_endpoint(&raw, insecure)
        .map_err(|source| ConfigError::new(ConfigField::RedisUrl, source))?;

    debug!(
        host = endpoint.host(),
        port = endpoint.port(),
        tls = !insecure,
        skip_verify,
        "resolved redis endpoint"
    );

    Ok(RedisConfig {
        endpoint,
        insecure,
        skip_verify,
    })
}

fn parse_log_level<E: EnvSource + ?Sized>(env: &E) -> Result<LogLevel, ConfigError> {
    let raw = read_var(env, ENV_LOG_LEVEL).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_owned());
    raw.parse::<LogLevel>()
        .map_err(|source| ConfigError::new(ConfigField::LogLevel, source))
}

fn read_heroku<E: EnvSource + ?Sized>(env: &E) -> HerokuConfig {
    HerokuConfig {
        app_id: read_string(env, ENV_HEROKU_APP_ID),
        app_name: read_string(env, ENV_HEROKU_APP_NAME),
        dyno_id: read_string(env, ENV_HEROKU_DYNO_ID),
        commit: read_string(env, ENV_HEROKU_SLUG_COMMIT),
    }
}

fn read_slack<E: EnvSource + ?Sized>(env: &E) -> SlackConfig {
    let secret = |name| SecretString::from(read_string(env, name));
    SlackConfig {
        app_id: read_string(env, ENV_SLACK_APP_ID),
        team_id: read_string(env, ENV_SLACK_TEAM_ID),
        client_id: read_string(env, ENV_SLACK_CLIENT_ID),
        request_token: secret(ENV_SLACK_REQUEST_TOKEN),
        client_secret: secret(ENV_SLACK_CLIENT_SECRET),
        request_secret: secret(ENV_SLACK_REQUEST_SECRET),
        bot_access_token: secret(ENV_SLACK_BOT_ACCESS_TOKEN),
    }
}

fn scrub_secrets<E: EnvSource + ?Sized>(env: &mut E) {
    for name in SCRUBBED_VARS {
        if let Err(error) = env.unset(name) {
            warn!(env_var = name, %error, "failed to scrub secret from environment");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{MapEnv, ScrubError};
    use std::error::Error;

    struct LockedEnv(MapEnv);

    impl EnvSource for LockedEnv {
        fn get(&self, name: &str) -> Option<String> {
            self.0.get(name)
        }

        fn unset(&mut self, name: &str) -> Result<(), ScrubError> {
            Err(ScrubError::Denied {
                name: name.to_owned(),
                reason: "read-only".to_owned(),
            })
        }
    }

    #[test]
    fn empty_environment_yields_defaults() -> Result<(), Box<dyn Error>> {
        let config = load_runtime_config(&mut MapEnv::new())?;
        assert_eq!(config.port(), 0);
        assert_eq!(config.log_level(), LogLevel::Info);
        assert_eq!(config.env(), Environment::Development);
        assert!(!config.redis().is_configured());
        assert_eq!(config.heroku(), &HerokuConfig::default());
        assert_eq!(config.slack(), &SlackConfig::default());
        Ok(())
    }

    #[test]
    fn port_outside_u16_is_invalid_config() {
        let mut env = MapEnv::new().with(ENV_PORT, "70000");
        let error = load_runtime_config(&mut env).err();
        assert_eq!(error.as_ref().map(|error| error.field().name()), Some("PORT"));
        assert!(matches!(
            error.as_ref().map(ConfigError::cause),
            Some(ConfigValueError::Port { .. })
        ));
    }

    #[test]
    fn signed_port_is_invalid_config() {
        for raw in ["+80", "-0"] {
            let error = load_runtime_config(&mut MapEnv::new().with(ENV_PORT, raw)).err();
            assert_eq!(error.as_ref().map(|error| error.field().name()), Some("PORT"));
            assert_eq!(
                error.as_ref().map(ConfigError::cause),
                Some(&ConfigValueError::PortSign {
                    value: raw.to_owned()
                })
            );
        }
    }

    #[test]
    fn empty_port_is_treated_as_unset() -> Result<(), Box<dyn Error>> {
        let config = load_runtime_config(&mut MapEnv::new().with(ENV_PORT, ""))?;
        assert_eq!(config.port(), 0);

        let config = load_runtime_config(&mut MapEnv::new().with(ENV_PORT, "5000"))?;
        assert_eq!(config.port(), 5000);
        Ok(())
    }

    #[test]
    fn redis_flags_without_url_leave_endpoint_zeroed() -> Result<(), Box<dyn Error>> {
        let mut env = MapEnv::new()
            .with(ENV_REDIS_INSECURE, "1")
            .with(ENV_REDIS_SKIPVERIFY, "1");
        let config = load_runtime_config(&mut env)?;
        assert_eq!(config.redis(), &RedisConfig::default());
        Ok(())
    }

    #[test]
    fn redis_url_is_resolved_with_flags() -> Result<(), Box<dyn Error>> {
        let mut env = MapEnv::new()
            .with(ENV_REDIS_URL, "redis://h:pw@redis.internal:6379")
            .with(ENV_REDIS_SKIPVERIFY, "1");
        let config = load_runtime_config(&mut env)?;
        let redis = config.redis();
        assert_eq!(redis.endpoint.address(), "redis.internal:6380");
        assert_eq!(redis.endpoint.username(), "h");
        assert_eq!(redis.endpoint.password().expose(), "pw");
        assert!(redis.use_tls());
        assert!(redis.skip_verify);

        let mut env = MapEnv::new()
            .with(ENV_REDIS_URL, "redis://redis.internal:6379")
            .with(ENV_REDIS_INSECURE, "1");
        let config = load_runtime_config(&mut env)?;
        assert_eq!(config.redis().endpoint.port(), 6379);
        assert!(config.redis().insecure);
        Ok(())
    }

    #[test]
    fn redis_errors_abort_assembly() {
        let mut env = MapEnv::new()
            .with(ENV_REDIS_URL, "memcached://cache:11211")
            .with(ENV_SLACK_CLIENT_SECRET, "shh");
        let error = load_runtime_config(&mut env).err();
        assert_eq!(
            error.as_ref().map(|error| error.field()),
            Some(ConfigField::RedisUrl)
        );
        assert!(matches!(
            error.as_ref().map(ConfigError::cause),
            Some(ConfigValueError::Endpoint(
                EndpointError::UnsupportedScheme { .. }
            ))
        ));
        // Nothing was consumed, so nothing was scrubbed.
        assert!(env.contains(ENV_SLACK_CLIENT_SECRET));
    }

    #[test]
    fn log_level_defaults_and_validates() -> Result<(), Box<dyn Error>> {
        let config = load_runtime_config(&mut MapEnv::new().with(ENV_LOG_LEVEL, ""))?;
        assert_eq!(config.log_level(), LogLevel::Info);

        let config = load_runtime_config(&mut MapEnv::new().with(ENV_LOG_LEVEL, "debug"))?;
        assert_eq!(config.log_level(), LogLevel::Debug);

        let error = load_runtime_config(&mut MapEnv::new().with(ENV_LOG_LEVEL, "loud")).err();
        assert_eq!(
            error.map(|error| error.field().name()),
            Some("LOG_LEVEL")
        );
        Ok(())
    }

    #[test]
    fn secrets_are_kept_in_config_and_scrubbed_from_env() -> Result<(), Box<dyn Error>> {
        let mut env = MapEnv::new()
            .with(ENV_SLACK_CLIENT_SECRET, "client-secret")
            .with(ENV_SLACK_REQUEST_SECRET, "signing-secret")
            .with(ENV_SLACK_BOT_ACCESS_TOKEN, "xoxb-token")
            .with(ENV_SLACK_REQUEST_TOKEN, "verification")
            .with(ENV_SLACK_APP_ID, "A123");
        let config = load_runtime_config(&mut env)?;

        let slack = config.slack();
        assert_eq!(slack.client_secret.expose(), "client-secret");
        assert_eq!(slack.request_secret.expose(), "signing-secret");
        assert_eq!(slack.bot_access_token.expose(), "xoxb-token");
        assert_eq!(slack.request_token.expose(), "verification");
        assert_eq!(slack.app_id, "A123");

        for name in SCRUBBED_VARS {
            assert!(!env.contains(name), "{name} should be scrubbed");
        }
        assert!(env.contains(ENV_SLACK_REQUEST_TOKEN));
        assert!(env.contains(ENV_SLACK_APP_ID));
        Ok(())
    }

    #[test]
    fn scrub_failures_do_not_abort_assembly() -> Result<(), Box<dyn Error>> {
        let mut env = LockedEnv(MapEnv::new().with(ENV_SLACK_CLIENT_SECRET, "client-secret"));
        let config = load_runtime_config(&mut env)?;
        assert_eq!(config.slack().client_secret.expose(), "client-secret");
        Ok(())
    }

    #[test]
    fn config_errors_map_to_envelopes() -> Result<(), Box<dyn Error>> {
        let source = "70000".parse::<u16>().err().ok_or("70000 fits in u16")?;
        let port_error = ConfigError::new(
            ConfigField::Port,
            ConfigValueError::Port {
                value: "70000".to_owned(),
                source,
            },
        );
        assert_eq!(
            port_error.to_string(),
            "failed to parse PORT: \"70000\" is not a valid port: number too large to fit in target type"
        );
        let envelope = ErrorEnvelope::from(port_error);
        assert_eq!(envelope.code, ErrorCode::new("config", "invalid_port"));
        assert_eq!(envelope.metadata.get("value").map(String::as_str), Some("70000"));

        let redis_error = ConfigError::new(
            ConfigField::RedisUrl,
            EndpointError::UnsupportedScheme {
                scheme: "ftp".to_owned(),
            },
        );
        let envelope = ErrorEnvelope::from(redis_error);
        assert_eq!(envelope.code, ErrorCode::new("config", "invalid_redis_url"));
        assert_eq!(envelope.metadata.get("scheme").map(String::as_str), Some("ftp"));
        assert_eq!(
            envelope.metadata.get("reason").map(String::as_str),
            Some("unsupported_scheme")
        );
        assert!(!envelope.metadata.contains_key("value"));
        Ok(())
    }
}
