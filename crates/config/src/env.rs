//! Environment variable names and the environment capability.
//!
//! Assembly never touches `std::env` directly. It goes through [`EnvSource`],
//! which can read a variable and unset it again (the scrub step), so tests
//! can run against a [`MapEnv`] without mutating process state.
//!
//! Empty values are treated exactly like absent ones.

use crate::load::assembly_in_progress;
use std::collections::BTreeMap;
use std::ffi::OsString;

/// Env var: TCP listen port.
pub const ENV_PORT: &str = "PORT";
/// Env var: cache connection string.
pub const ENV_REDIS_URL: &str = "REDIS_URL";
/// Env var: `"1"` disables TLS and the secure-port offset.
pub const ENV_REDIS_INSECURE: &str = "GOPHER_REDIS_INSECURE";
/// Env var: `"1"` disables certificate verification.
pub const ENV_REDIS_SKIPVERIFY: &str = "GOPHER_REDIS_SKIPVERIFY";
/// Env var: log verbosity name.
pub const ENV_LOG_LEVEL: &str = "GOPHER_LOG_LEVEL";
/// Env var: runtime environment name.
pub const ENV_ENV: &str = "ENV";

/// Env var: Heroku app id (dyno metadata).
pub const ENV_HEROKU_APP_ID: &str = "HEROKU_APP_ID";
/// Env var: Heroku app name (dyno metadata).
pub const ENV_HEROKU_APP_NAME: &str = "HEROKU_APP_NAME";
/// Env var: Heroku dyno id (dyno metadata).
pub const ENV_HEROKU_DYNO_ID: &str = "HEROKU_DYNO_ID";
/// Env var: deployed commit (dyno metadata).
pub const ENV_HEROKU_SLUG_COMMIT: &str = "HEROKU_SLUG_COMMIT";

/// Env var: Slack app id.
pub const ENV_SLACK_APP_ID: &str = "GOPHER_SLACK_APP_ID";
/// Env var: Slack workspace the app is deployed to.
pub const ENV_SLACK_TEAM_ID: &str = "GOPHER_SLACK_TEAM_ID";
/// Env var: Slack OAuth client id.
pub const ENV_SLACK_CLIENT_ID: &str = "GOPHER_SLACK_CLIENT_ID";
/// Env var: Slack verification token.
// gitleaks:allow
pub const ENV_SLACK_REQUEST_TOKEN: &str = "GOPHER_SLACK_REQUEST_TOKEN";
/// Env var: Slack OAuth client secret (scrubbed after read).
// gitleaks:allow
pub const ENV_SLACK_CLIENT_SECRET: &str = "GOPHER_SLACK_CLIENT_SECRET";
/// Env var: Slack request-signing secret (scrubbed after read).
// gitleaks:allow
pub const ENV_SLACK_REQUEST_SECRET: &str = "GOPHER_SLACK_REQUEST_SECRET";
/// Env var: Slack bot access token (scrubbed after read).
// gitleaks:allow
pub const ENV_SLACK_BOT_ACCESS_TOKEN: &str = "GOPHER_SLACK_BOT_ACCESS_TOKEN";

/// Variables removed from the environment once they have been read.
pub const SCRUBBED_VARS: [&str; 3] = [
    ENV_SLACK_CLIENT_SECRET,
    ENV_SLACK_REQUEST_SECRET,
    ENV_SLACK_BOT_ACCESS_TOKEN,
];

/// Every variable the assembler consults.
pub const KNOWN_VARS: [&str; 17] = [
    ENV_PORT,
    ENV_REDIS_URL,
    ENV_REDIS_INSECURE,
    ENV_REDIS_SKIPVERIFY,
    ENV_LOG_LEVEL,
    ENV_ENV,
    ENV_HEROKU_APP_ID,
    ENV_HEROKU_APP_NAME,
    ENV_HEROKU_DYNO_ID,
    ENV_HEROKU_SLUG_COMMIT,
    ENV_SLACK_APP_ID,
    ENV_SLACK_TEAM_ID,
    ENV_SLACK_CLIENT_ID,
    ENV_SLACK_REQUEST_TOKEN,
    ENV_SLACK_CLIENT_SECRET,
    ENV_SLACK_REQUEST_SECRET,
    ENV_SLACK_BOT_ACCESS_TOKEN,
];

/// Failure to remove a variable from an environment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScrubError {
    /// The name cannot exist in a process environment.
    #[error("cannot unset {name:?}: invalid variable name")]
    InvalidName {
        /// Offending variable name.
        name: String,
    },
    /// The environment refused the removal.
    #[error("cannot unset {name}: {reason}")]
    Denied {
        /// Variable name.
        name: String,
        /// Reason reported by the environment.
        reason: String,
    },
}

/// Read and scrub access to a set of environment variables.
pub trait EnvSource {
    /// Raw value of `name`, if set.
    fn get(&self, name: &str) -> Option<String>;

    /// Remove `name`. Removing an unset variable succeeds.
    fn unset(&mut self, name: &str) -> Result<(), ScrubError>;
}

/// The real process environment.
///
/// Removal is only honored while a configuration assembly holds the
/// start-up lock; outside of it `unset` fails with [`ScrubError::Denied`].
#[derive(Debug)]
pub struct ProcessEnv {
    _private: (),
}

impl ProcessEnv {
    /// Handle to the process environment.
    ///
    /// # Safety
    ///
    /// The handle may remove variables from the process environment. While it
    /// is in use no other thread may read or write the environment, including
    /// through libc `getenv`/`setenv`. Create it during single-threaded
    /// start-up.
    #[allow(
        unsafe_code,
        reason = "the handle can remove environment variables; the caller vouches for single-threaded start-up"
    )]
    #[must_use]
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl EnvSource for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        if !is_valid_var_name(name) {
            return None;
        }
        std::env::var_os(name).map(lossy)
    }

    #[allow(
        unsafe_code,
        reason = "std::env::remove_var is unsafe in edition 2024"
    )]
    fn unset(&mut self, name: &str) -> Result<(), ScrubError> {
        if !is_valid_var_name(name) {
            return Err(ScrubError::InvalidName {
                name: name.to_owned(),
            });
        }
        if !assembly_in_progress() {
            return Err(ScrubError::Denied {
                name: name.to_owned(),
                reason: "outside configuration assembly".to_owned(),
            });
        }
        // SAFETY: the handle was created under the single-threaded start-up
        // contract of `ProcessEnv::new`, and assemblies are serialized by the
        // start-up lock checked above.
        unsafe { std::env::remove_var(name) };
        Ok(())
    }
}

/// In-memory environment backed by a sorted map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapEnv {
    vars: BTreeMap<String, String>,
}

impl MapEnv {
    /// Empty environment.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vars: BTreeMap::new(),
        }
    }

    /// Environment holding exactly the given variables.
    #[must_use]
    pub const fn from_map(vars: BTreeMap<String, String>) -> Self {
        Self { vars }
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Returns true when `name` is present (even if empty).
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

impl EnvSource for MapEnv {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    fn unset(&mut self, name: &str) -> Result<(), ScrubError> {
        self.vars.remove(name);
        Ok(())
    }
}

impl<E: EnvSource + ?Sized> EnvSource for &mut E {
    fn get(&self, name: &str) -> Option<String> {
        (**self).get(name)
    }

    fn unset(&mut self, name: &str) -> Result<(), ScrubError> {
        (**self).unset(name)
    }
}

/// Non-empty value of `name`.
pub(crate) fn read_var<E: EnvSource + ?Sized>(env: &E, name: &str) -> Option<String> {
    env.get(name).filter(|value| !value.is_empty())
}

/// Value of `name`, empty when absent.
pub(crate) fn read_string<E: EnvSource + ?Sized>(env: &E, name: &str) -> String {
    read_var(env, name).unwrap_or_default()
}

/// `true` only for the literal value `"1"`.
pub(crate) fn read_flag<E: EnvSource + ?Sized>(env: &E, name: &str) -> bool {
    env.get(name).as_deref() == Some("1")
}

fn is_valid_var_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['=', '\0'])
}

fn lossy(value: OsString) -> String {
    value
        .into_string()
        .unwrap_or_else(|value| value.to_string_lossy().into_owned())
}
