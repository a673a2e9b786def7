use anyhow::Context;
use opentelemetry_otlp::WithExportConfig;
use tracing::{Subscriber, subscriber::set_global_default};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt};

use opentelemetry::KeyValue;
use opentelemetry_otlp::SpanExporter;
use opentelemetry_sdk::{Resource, runtime, trace as sdktrace};

use opentelemetry_semantic_conventions::resource::SERVICE_NAME;

/// JSON (bunyan) logs to `sink`, filtered by `RUST_LOG` or `env_filter`.
/// Spans are additionally exported over OTLP when `otlp_endpoint` is set.
pub fn get_subscriber<Sink>(
    name: String,
    env_filter: String,
    sink: Sink,
    otlp_endpoint: Option<&str>,
) -> anyhow::Result<impl Subscriber + Send + Sync>
where
    Sink: for<'a> tracing_subscriber::fmt::MakeWriter<'a> + Sync + Send + 'static,
{
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter));

    let telemetry_layer = match otlp_endpoint {
        Some(endpoint) => {
            let tracer = otlp_tracer(&name, endpoint)?;
            Some(tracing_opentelemetry::layer().with_tracer(tracer))
        }
        None => None,
    };

    Ok(Registry::default()
        .with(env_filter)
        .with(telemetry_layer)
        .with(JsonStorageLayer)
        .with(BunyanFormattingLayer::new(name, sink)))
}

fn otlp_tracer(name: &str, endpoint: &str) -> anyhow::Result<sdktrace::Tracer> {
    let exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .context("Failed to create OTLP exporter")?;

    let resource = Resource::new(vec![KeyValue::new(SERVICE_NAME, name.to_string())]);

    let tracer_provider = sdktrace::TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(resource)
        .build();

    let tracer = opentelemetry::trace::TracerProvider::tracer(&tracer_provider, "user-api-tracer");
    // Registered globally so `shutdown_telemetry` can flush it.
    opentelemetry::global::set_tracer_provider(tracer_provider);
    Ok(tracer)
}

pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) -> anyhow::Result<()> {
    LogTracer::init().context("Failed to initialize env log tracer")?;
    set_global_default(subscriber).context("failed to create subscriber")?;
    Ok(())
}

/// Flushes any spans still buffered for export.
pub fn shutdown_telemetry() {
    opentelemetry::global::shutdown_tracer_provider();
}
