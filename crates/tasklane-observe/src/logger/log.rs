use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter, Layer, fmt, fmt::time::OffsetTime, layer::SubscriberExt, registry::LookupSpan,
    util::SubscriberInitExt,
};

use crate::logger::{config::LoggerConfig, error::LoggerError, format::LoggerFormat};

pub(crate) fn init(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let registry = tracing_subscriber::registry().with(mk_filter(&cfg.level)?);

    match cfg.format {
        LoggerFormat::Text => init_with(registry.with(text_layer(cfg.use_color, cfg.with_targets))),
        LoggerFormat::Json => init_with(registry.with(json_layer(cfg.with_targets))),
        LoggerFormat::Journald => init_journald(registry),
    }
}

fn text_layer<S>(use_color: bool, with_targets: bool) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_ansi(use_color)
        .with_target(with_targets)
        .with_timer(mk_timer())
}

fn json_layer<S>(with_targets: bool) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .json()
        .with_ansi(false)
        .with_current_span(true)
        .with_target(with_targets)
        .with_timer(mk_timer())
}

pub(crate) fn mk_filter(level: &str) -> Result<EnvFilter, LoggerError> {
    EnvFilter::try_new(level).map_err(|_| LoggerError::InvalidLogLevel(level.to_string()))
}

fn mk_timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

fn init_with<S>(subscriber: S) -> Result<(), LoggerError>
where
    S: Subscriber + Send + Sync + 'static,
{
    // `try_init` only fails when a global subscriber or `log` logger is already installed.
    subscriber
        .try_init()
        .map_err(|e| LoggerError::AlreadyInitialized(e.to_string()))
}

#[cfg(all(target_os = "linux", feature = "journald"))]
fn init_journald<S>(subscriber: S) -> Result<(), LoggerError>
where
    S: Subscriber + Send + Sync + for<'a> LookupSpan<'a> + 'static,
{
    let journald = tracing_journald::layer()
        .map_err(|e| LoggerError::InitializationFailed(format!("journald: {e}")))?;
    init_with(subscriber.with(journald))
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
fn init_journald<S>(_subscriber: S) -> Result<(), LoggerError>
where
    S: Subscriber + Send + Sync + for<'a> LookupSpan<'a> + 'static,
{
    Err(LoggerError::JournaldNotSupported)
}
