use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "recipeez_cache_hit_total",
            Unit::Count,
            "Cache lookups answered from a resident entry, labelled by key shape."
        );
        describe_counter!(
            "recipeez_cache_miss_total",
            Unit::Count,
            "Cache lookups that found no usable entry, labelled by key shape."
        );
        describe_counter!(
            "recipeez_cache_evict_total",
            Unit::Count,
            "Cache entries evicted due to capacity, labelled by key shape."
        );
        describe_counter!(
            "recipeez_cache_sync_total",
            Unit::Count,
            "Mutation synchronization passes, labelled by effect."
        );
        describe_counter!(
            "recipeez_session_expired_total",
            Unit::Count,
            "Responses that signalled an expired session."
        );
    });
}
