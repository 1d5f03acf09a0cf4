//! Redis client options derived from the runtime configuration.

use crate::schema::RuntimeConfiguration;
use gopher_shared::SecretString;
use serde::Serialize;
use std::time::Duration;

/// Transport used for cache connections.
pub const REDIS_NETWORK: &str = "tcp";
/// Timeout applied to dial, read, write and pool checkout.
pub const REDIS_TIMEOUT: Duration = Duration::from_secs(2);
/// Maximum pooled connections.
pub const REDIS_POOL_SIZE: u32 = 20;
/// Connections kept open while idle.
pub const REDIS_MIN_IDLE_CONNS: u32 = 5;

/// TLS settings for the cache connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TlsOptions {
    /// Accept any server certificate.
    pub skip_verify: bool,
}

/// Connection options for a Redis client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedisClientOptions {
    /// Transport, always `tcp`.
    pub network: &'static str,
    /// `host:port` to dial.
    pub addr: String,
    /// ACL username.
    pub username: String,
    /// ACL password.
    pub password: SecretString,
    /// Connect timeout.
    pub dial_timeout: Duration,
    /// Per-command read timeout.
    pub read_timeout: Duration,
    /// Per-command write timeout.
    pub write_timeout: Duration,
    /// Wait for a free pooled connection.
    pub pool_timeout: Duration,
    /// Maximum pooled connections.
    pub pool_size: u32,
    /// Idle connections kept open.
    pub min_idle_conns: u32,
    /// Present unless the connection is insecure.
    pub tls: Option<TlsOptions>,
}

impl RedisClientOptions {
    /// Options for the configured endpoint.
    ///
    /// Returns `None` when no `REDIS_URL` was provided.
    #[must_use]
    pub fn from_config(config: &RuntimeConfiguration) -> Option<Self> {
        let redis = config.redis();
        if !redis.is_configured() {
            return None;
        }

        let endpoint = &redis.endpoint;
        Some(Self {
            network: REDIS_NETWORK,
            addr: endpoint.address(),
            username: endpoint.username().to_owned(),
            password: endpoint.password().clone(),
            dial_timeout: REDIS_TIMEOUT,
            read_timeout: REDIS_TIMEOUT,
            write_timeout: REDIS_TIMEOUT,
            pool_timeout: REDIS_TIMEOUT,
            pool_size: REDIS_POOL_SIZE,
            min_idle_conns: REDIS_MIN_IDLE_CONNS,
            tls: redis.use_tls().then_some(TlsOptions {
                skip_verify: redis.skip_verify,
            }),
        })
    }
}
