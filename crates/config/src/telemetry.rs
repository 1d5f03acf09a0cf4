//! Process logger setup.
//!
//! Events are written as one JSON object per line. The `timestamp` field is
//! the Unix epoch in milliseconds.

use crate::schema::{LogLevel, RuntimeConfiguration};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::Subscriber;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;

/// Timer rendering the Unix epoch in milliseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixMillis;

impl FormatTime for UnixMillis {
    fn format_time(&self, writer: &mut Writer<'_>) -> fmt::Result {
        write!(writer, "{}", now_epoch_ms())
    }
}

fn now_epoch_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis())
}

/// Max-level filter for a configured [`LogLevel`].
///
/// `fatal` and `panic` have no tracing counterpart and collapse to `ERROR`.
#[must_use]
pub const fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Trace => LevelFilter::TRACE,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Error | LogLevel::Fatal | LogLevel::Panic => LevelFilter::ERROR,
        LogLevel::Disabled => LevelFilter::OFF,
    }
}

/// JSON subscriber writing to `writer`.
pub fn build_subscriber<W>(level: LogLevel, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .json()
        .with_timer(UnixMillis)
        .with_max_level(level_filter(level))
        .with_writer(writer)
        .finish()
}

/// Install the process-wide logger writing to `writer`.
///
/// Returns `false` when a global subscriber is already installed.
pub fn try_init_with_writer<W>(level: LogLevel, writer: W) -> bool
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    tracing::subscriber::set_global_default(build_subscriber(level, writer)).is_ok()
}

/// Install the process-wide logger on stdout at the configured level.
pub fn init_logging(config: &RuntimeConfiguration) -> bool {
    try_init_with_writer(config.log_level(), std::io::stdout)
}
