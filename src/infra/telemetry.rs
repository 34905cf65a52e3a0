use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::application::social::METRIC_SOCIAL_REFRESH;
use crate::application::spotlight::{METRIC_SPOTLIGHT_MS, METRIC_SPOTLIGHT_SAMPLES};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;
use super::http::METRIC_HTTP_REQUEST_MS;
use super::remote::METRIC_REMOTE_REQUEST_MS;

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
            METRIC_SPOTLIGHT_SAMPLES,
            Unit::Count,
            "Total number of spotlight samples, labelled by kind and outcome."
        );
        describe_histogram!(
            METRIC_SPOTLIGHT_MS,
            Unit::Milliseconds,
            "Spotlight sampling and resolution latency in milliseconds."
        );
        describe_counter!(
            METRIC_SOCIAL_REFRESH,
            Unit::Count,
            "Share-count refresh outcomes per post (updated, zero, failed)."
        );
        describe_histogram!(
            METRIC_REMOTE_REQUEST_MS,
            Unit::Milliseconds,
            "Outbound HTTP request latency in milliseconds."
        );
        describe_histogram!(
            METRIC_HTTP_REQUEST_MS,
            Unit::Milliseconds,
            "Inbound API request latency in milliseconds."
        );
    });
}
