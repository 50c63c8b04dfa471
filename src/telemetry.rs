use std::env;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::anyhow;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{MetricExporter, SpanExporter};
use opentelemetry_sdk::{Resource, metrics::SdkMeterProvider, trace::SdkTracerProvider};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_opentelemetry::{MetricsLayer, OpenTelemetryLayer};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

const SERVICE_NAME: &str = "newsharvest";

/// Exporters are only installed when this is set
const OTLP_ENDPOINT_VAR: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

fn get_resource() -> Resource {
    static RESOURCE: OnceLock<Resource> = OnceLock::new();
    RESOURCE
        .get_or_init(|| Resource::builder().with_service_name(SERVICE_NAME).build())
        .clone()
}

fn init_traces() -> anyhow::Result<SdkTracerProvider> {
    let exporter = SpanExporter::builder()
        .with_http()
        .build()
        .map_err(|e| anyhow!("failed to create trace exporter: {e}"))?;

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(get_resource())
        .build())
}

fn init_metrics() -> anyhow::Result<SdkMeterProvider> {
    let exporter = MetricExporter::builder()
        .with_http()
        .build()
        .map_err(|e| anyhow!("failed to create metric exporter: {e}"))?;

    Ok(SdkMeterProvider::builder()
        .with_periodic_exporter(exporter)
        .with_resource(get_resource())
        .build())
}

/// `RUST_LOG`, or `info` when unset
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

// The OTLP exporter talks HTTP itself; its own events must not be exported again.
fn otel_filter() -> anyhow::Result<EnvFilter> {
    Ok(EnvFilter::new("info")
        .add_directive("hyper=off".parse()?)
        .add_directive("opentelemetry=off".parse()?)
        .add_directive("h2=off".parse()?)
        .add_directive("reqwest=off".parse()?))
}

/// Install the global subscriber and return the guard that flushes it
///
/// Always logs to stderr. Adds a daily rolling log file under `log_dir` when
/// given, and OTLP trace and metric export when the endpoint variable is set.
pub fn init_tracing_subscriber(log_dir: Option<&Path>) -> anyhow::Result<OtelGuard> {
    let (file_writer, file_guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = rolling::daily(dir, "newsharvest.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let otel_enabled = env::var_os(OTLP_ENDPOINT_VAR).is_some();
    let tracer_provider = otel_enabled.then(init_traces).transpose()?;
    let meter_provider = otel_enabled.then(init_metrics).transpose()?;

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(env_filter());

    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(env_filter())
    });

    let trace_layer = match &tracer_provider {
        Some(provider) => Some(
            OpenTelemetryLayer::new(provider.tracer(SERVICE_NAME)).with_filter(otel_filter()?),
        ),
        None => None,
    };

    let metrics_layer = match &meter_provider {
        Some(provider) => Some(MetricsLayer::new(provider.clone()).with_filter(otel_filter()?)),
        None => None,
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(metrics_layer)
        .with(trace_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(OtelGuard {
        tracer_provider,
        meter_provider,
        _file_guard: file_guard,
    })
}

/// Shuts down exporters and flushes the log file when dropped
pub struct OtelGuard {
    tracer_provider: Option<SdkTracerProvider>,
    meter_provider: Option<SdkMeterProvider>,
    _file_guard: Option<WorkerGuard>,
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        if let Some(tracer) = self.tracer_provider.take() {
            if let Err(err) = tracer.shutdown() {
                eprintln!("{err:?}");
            }
        }
        if let Some(meter) = self.meter_provider.take() {
            if let Err(err) = meter.shutdown() {
                eprintln!("{err:?}");
            }
        }
    }
}
