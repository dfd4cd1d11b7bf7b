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
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
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
            "bookgate_cache_hit_total",
            Unit::Count,
            "Total number of responses served from the response cache."
        );
        describe_counter!(
            "bookgate_cache_miss_total",
            Unit::Count,
            "Total number of response cache misses."
        );
        describe_counter!(
            "bookgate_cache_purged_total",
            Unit::Count,
            "Total number of stale cache entries removed by the background sweep."
        );
        describe_counter!(
            "bookgate_flight_coalesced_total",
            Unit::Count,
            "Total number of requests that waited on an in-flight upstream fetch."
        );
        describe_counter!(
            "bookgate_upstream_requests_total",
            Unit::Count,
            "Total number of requests sent to the upstream API."
        );
        describe_counter!(
            "bookgate_upstream_failures_total",
            Unit::Count,
            "Total number of upstream requests that failed to complete."
        );
        describe_counter!(
            "bookgate_unrecognized_shape_total",
            Unit::Count,
            "Total number of upstream list payloads that matched no known shape."
        );
    });
}
