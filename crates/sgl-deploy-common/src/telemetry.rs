use opentelemetry::trace::TracerProvider as TracerProviderTrait;
use opentelemetry::KeyValue;
use opentelemetry_otlp::{WithExportConfig, WithHttpConfig};
use opentelemetry_sdk::trace::TracerProvider;
use opentelemetry_sdk::Resource;
use tracing::dispatcher::SetGlobalDefaultError;
use tracing::Dispatch;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

/// Logging handle built once at startup.
///
/// Holds the subscriber as a `Dispatch` instead of installing it on
/// construction; the binary calls [`Telemetry::install`], tests can use
/// `tracing::dispatcher::with_default` or skip logging entirely.
pub struct Telemetry {
    pub dispatch: Dispatch,
    provider: Option<TracerProvider>,
}

/// Build the fmt subscriber, with optional OTLP span export.
///
/// - `service_name`: reported as `service.name` on exported spans
/// - `default_directive`: filter used when `RUST_LOG` is unset or invalid
/// - `otlp_endpoint`: if `Some`, spans are exported via OTLP/HTTP to this base URL.
///   The exporter appends `/v1/traces`.
/// - `otlp_token`: bearer token sent with the export requests
///
/// OTLP export needs a running tokio runtime.
pub fn build_dispatch(
    service_name: &str,
    default_directive: &str,
    otlp_endpoint: Option<&str>,
    otlp_token: Option<&str>,
) -> Telemetry {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let fmt_layer = tracing_subscriber::fmt::layer();

    let provider = otlp_endpoint.and_then(|endpoint| build_provider(service_name, endpoint, otlp_token));
    let otel_layer = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer(service_name.to_string())));

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_layer);

    Telemetry {
        dispatch: Dispatch::new(subscriber),
        provider,
    }
}

fn build_provider(
    service_name: &str,
    endpoint: &str,
    token: Option<&str>,
) -> Option<TracerProvider> {
    let mut headers = std::collections::HashMap::new();
    if let Some(token) = token {
        if !token.is_empty() {
            headers.insert("Authorization".to_string(), format!("Bearer {token}"));
        }
    }

    let exporter = match opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .with_headers(headers)
        .build()
    {
        Ok(e) => e,
        Err(err) => {
            // no subscriber exists yet, so this cannot go through tracing
            eprintln!("failed to create OTLP exporter: {err}, falling back to stdout only");
            return None;
        }
    };

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .with_resource(Resource::new([KeyValue::new(
            "service.name",
            service_name.to_string(),
        )]))
        .build();
    Some(provider)
}

impl Telemetry {
    pub fn otlp_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Make this the process-wide subscriber. Fails if one is already set.
    pub fn install(&self) -> Result<(), SetGlobalDefaultError> {
        tracing::dispatcher::set_global_default(self.dispatch.clone())
    }

    /// Flush pending spans. Call before the process exits.
    pub fn shutdown(self) {
        if let Some(provider) = self.provider {
            if let Err(e) = provider.shutdown() {
                eprintln!("failed to shut down OTLP tracer provider: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_without_otlp() {
        let telemetry = build_dispatch("test", "info", None, None);
        assert!(!telemetry.otlp_enabled());
        tracing::dispatcher::with_default(&telemetry.dispatch, || {
            tracing::info!(port = 30000, "scoped subscriber accepts events");
        });
        telemetry.shutdown();
    }
}
