//! # gopher-shared
//!
//! Shared error and secret-handling types for the gopher workspace.
//!
//! - [`ErrorEnvelope`] is the structured error every surface reports.
//! - [`SecretString`] keeps credentials out of logs and serialized output.
//!
//! This crate only depends on external crates.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod errors;
pub mod redaction;

pub use errors::{ErrorCode, ErrorEnvelope, ErrorKind, ErrorMetadata};
pub use redaction::{REDACTED, SecretString, is_secret_key, redact_if_secret};

/// Returns the shared crate version.
#[must_use]
pub const fn shared_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
