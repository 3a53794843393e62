//! Tracing and metrics bootstrap.

use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::application::engine::{
    METRIC_COUNT_HIT, METRIC_COUNT_MISS, METRIC_STATUS_HIT, METRIC_STATUS_MISS,
};
use crate::cache::{METRIC_COUNT_EVICT, METRIC_STATUS_EVICT};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install the global tracing subscriber.
///
/// The configured level is the default; `RUST_LOG` directives still take
/// precedence. Callable once per process; a second call reports the
/// already-installed subscriber as an error.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(ErrorLayer::default());

    let result = match logging.format {
        LogFormat::Json => subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_target(true)
                    .boxed(),
            )
            .try_init(),
        LogFormat::Compact => subscriber
            .with(fmt::layer().compact().with_target(true).boxed())
            .try_init(),
    };

    result.map_err(|err| {
        InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
    })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_STATUS_HIT,
            Unit::Count,
            "Total number of status cache hits."
        );
        describe_counter!(
            METRIC_STATUS_MISS,
            Unit::Count,
            "Total number of status cache misses."
        );
        describe_counter!(
            METRIC_COUNT_HIT,
            Unit::Count,
            "Total number of count cache hits."
        );
        describe_counter!(
            METRIC_COUNT_MISS,
            Unit::Count,
            "Total number of count cache misses."
        );
        describe_counter!(
            METRIC_STATUS_EVICT,
            Unit::Count,
            "Total number of status entries evicted by capacity pressure."
        );
        describe_counter!(
            METRIC_COUNT_EVICT,
            Unit::Count,
            "Total number of count entries evicted by capacity pressure."
        );
    });
}
