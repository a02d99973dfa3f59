//! Construction of the log dispatcher handed to [`LoggingMiddleware`].
//!
//! The dispatcher is returned rather than installed globally so each
//! service instance, and each test, owns its log sink.
//!
//! [`LoggingMiddleware`]: crate::task::services::LoggingMiddleware

use crate::config::{LogConfig, LogFormat};
use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, fmt};

const FALLBACK_FILTER: &str = "info";

/// Builds a dispatcher writing to stdout, or discarding everything when
/// `config.silent` is set.
#[must_use]
pub fn build_dispatch(config: &LogConfig) -> Dispatch {
    let writer = if config.silent {
        BoxMakeWriter::new(std::io::sink)
    } else {
        BoxMakeWriter::new(std::io::stdout)
    };
    build_dispatch_with_writer(config, writer)
}

/// Builds a dispatcher writing formatted events to `writer`.
///
/// `RUST_LOG` takes precedence over `config.filter`.
#[must_use]
pub fn build_dispatch_with_writer<W>(config: &LogConfig, writer: W) -> Dispatch
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_FILTER));

    let (text, json) = match config.format {
        LogFormat::Text => (
            Some(fmt::layer().with_ansi(false).with_writer(writer)),
            None,
        ),
        LogFormat::Json => (None, Some(fmt::layer().json().with_writer(writer))),
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(json);
    Dispatch::new(subscriber)
}
