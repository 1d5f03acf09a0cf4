//! Secret detection and redaction utilities.
//!
//! Provides consistent logic for detecting sensitive variables and keeping
//! their values out of error metadata, logs, and serialized configuration.

use serde::{Serialize, Serializer};

/// The redacted placeholder string.
pub const REDACTED: &str = "[REDACTED]";

/// Checks if a key/variable name likely refers to a secret.
///
/// # Examples
///
/// ```
/// use gopher_shared::is_secret_key;
///
/// assert!(is_secret_key("GOPHER_SLACK_CLIENT_SECRET"));
/// assert!(is_secret_key("GOPHER_SLACK_BOT_ACCESS_TOKEN"));
/// assert!(!is_secret_key("GOPHER_LOG_LEVEL"));
/// ```
pub fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_uppercase();
    key.contains("KEY")
        || key.contains("TOKEN")
        || key.contains("SECRET")
        || key.contains("PASSWORD")
        || key.contains("CREDENTIAL")
}

/// Redacts a value if the key is likely a secret.
///
/// # Examples
///
/// ```
/// use gopher_shared::redact_if_secret;
///
/// assert_eq!(redact_if_secret("GOPHER_SLACK_REQUEST_SECRET", "abc"), "[REDACTED]");
/// assert_eq!(redact_if_secret("PORT", "8080"), "8080");
/// ```
pub fn redact_if_secret(key: &str, value: &str) -> String {
    if is_secret_key(key) {
        REDACTED.to_string()
    } else {
        value.to_string()
    }
}

/// A secret string wrapper that redacts on Display/Debug/Serialize.
///
/// The default value is the empty secret, which still renders redacted.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct SecretString(Box<str>);

impl SecretString {
    /// Wrap a secret value.
    pub fn new(value: impl Into<Box<str>>) -> Self {
        Self(value.into())
    }

    /// Borrow the underlying secret.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true when no secret was provided.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(REDACTED)
    }
}

impl std::fmt::Display for SecretString {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(REDACTED)
    }
}

impl Serialize for SecretString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(REDACTED)
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value.into_boxed_str())
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn detects_credential_variables() {
        assert!(is_secret_key("GOPHER_SLACK_CLIENT_SECRET"));
        assert!(is_secret_key("GOPHER_SLACK_REQUEST_SECRET"));
        assert!(is_secret_key("GOPHER_SLACK_BOT_ACCESS_TOKEN"));
        assert!(is_secret_key("redis_password"));
    }

    #[test]
    fn rejects_non_secret_variables() {
        assert!(!is_secret_key("PORT"));
        assert!(!is_secret_key("ENV"));
        assert!(!is_secret_key("GOPHER_LOG_LEVEL"));
        assert!(!is_secret_key("HEROKU_APP_NAME"));
        assert!(!is_secret_key("GOPHER_REDIS_INSECURE"));
    }

    #[test]
    fn secret_string_redacts_display_and_debug() {
        let secret = SecretString::new("shh");
        assert_eq!(secret.to_string(), REDACTED);
        assert_eq!(format!("{secret:?}"), REDACTED);
        assert_eq!(secret.expose(), "shh");
    }

    #[test]
    fn secret_string_serializes_redacted() -> Result<(), Box<dyn Error>> {
        let secret = SecretString::from("xoxb-123");
        assert_eq!(serde_json::to_string(&secret)?, "\"[REDACTED]\"");
        Ok(())
    }

    #[test]
    fn default_secret_is_empty() {
        assert!(SecretString::default().is_empty());
    }
}
