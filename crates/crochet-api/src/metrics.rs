//! Prometheus metrics for incidents and HTTP requests.

use std::{sync::Arc, time::Instant};

use axum::{
  extract::{MatchedPath, Request, State},
  http::header,
  middleware::Next,
  response::{IntoResponse, Response},
};
use prometheus_client::{
  encoding::EncodeLabelSet,
  metrics::{
    counter::Counter,
    family::Family,
    histogram::{Histogram, exponential_buckets},
  },
  registry::Registry,
};

use crate::error::ApiError;

/// Content-Type for `OpenMetrics` text exposition format.
const OPENMETRICS_CONTENT_TYPE: &str =
  "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// Buckets for incident durations, in seconds.
const INCIDENT_DURATION_BUCKETS: [f64; 8] =
  [10.0, 60.0, 120.0, 300.0, 600.0, 1800.0, 3600.0, 7200.0];

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct HttpLabels {
  pub code:   String,
  pub method: String,
  pub path:   String,
}

/// Registry and handles for every metric the service exports.
///
/// All metric types use atomics, so recording only requires `&self`.
pub struct Metrics {
  registry:              Registry,
  incidents_created:     Counter,
  incidents_duration:    Histogram,
  http_request_duration: Family<HttpLabels, Histogram>,
}

impl Metrics {
  pub fn new() -> Self {
    let mut registry = Registry::with_prefix("crochet");

    let incidents_created = Counter::default();
    registry.register(
      "incidents",
      "Total number of incidents",
      incidents_created.clone(),
    );

    let incidents_duration =
      Histogram::new(INCIDENT_DURATION_BUCKETS.into_iter());
    registry.register(
      "incidents_duration_seconds",
      "Duration of incidents",
      incidents_duration.clone(),
    );

    let http_request_duration =
      Family::<HttpLabels, Histogram>::new_with_constructor(|| {
        Histogram::new(exponential_buckets(0.001, 2.0, 14))
      });
    registry.register(
      "http_requests_duration_seconds",
      "Histogram of HTTP request latencies",
      http_request_duration.clone(),
    );

    Self {
      registry,
      incidents_created,
      incidents_duration,
      http_request_duration,
    }
  }

  /// A merge opened a new incident.
  pub fn record_incident_created(&self) { self.incidents_created.inc(); }

  /// A resolved incident was removed after lasting `seconds`.
  pub fn record_incident_resolved(&self, seconds: f64) {
    self.incidents_duration.observe(seconds);
  }

  pub fn observe_http_request(&self, labels: &HttpLabels, seconds: f64) {
    self
      .http_request_duration
      .get_or_create(labels)
      .observe(seconds);
  }

  /// Encode all registered metrics to `OpenMetrics` text format.
  pub fn encode(&self) -> Result<String, std::fmt::Error> {
    let mut buffer = String::new();
    prometheus_client::encoding::text::encode(&mut buffer, &self.registry)?;
    Ok(buffer)
  }
}

impl Default for Metrics {
  fn default() -> Self { Self::new() }
}

// ─── Handlers ────────────────────────────────────────────────────────────────

/// `GET /metrics`
pub async fn handler(
  State(metrics): State<Arc<Metrics>>,
) -> Result<impl IntoResponse, ApiError> {
  let body = metrics.encode()?;
  Ok(([(header::CONTENT_TYPE, OPENMETRICS_CONTENT_TYPE)], body))
}

/// Middleware recording request latency by status code, method and route.
pub async fn track_http(
  State(metrics): State<Arc<Metrics>>,
  request: Request,
  next: Next,
) -> Response {
  let started = Instant::now();
  let method = request.method().to_string();
  let path = request
    .extensions()
    .get::<MatchedPath>()
    .map(|p| p.as_str().to_owned())
    .unwrap_or_else(|| request.uri().path().to_owned());

  let response = next.run(request).await;

  let labels = HttpLabels {
    code: response.status().as_u16().to_string(),
    method,
    path,
  };
  metrics.observe_http_request(&labels, started.elapsed().as_secs_f64());
  response
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn incident_counter_appears_in_output() {
    let metrics = Metrics::new();
    metrics.record_incident_created();
    metrics.record_incident_created();

    let encoded = metrics.encode().unwrap();
    assert!(encoded.contains("crochet_incidents_total 2"), "{encoded}");
  }

  #[test]
  fn incident_duration_uses_fixed_buckets() {
    let metrics = Metrics::new();
    metrics.record_incident_resolved(60.0);

    let encoded = metrics.encode().unwrap();
    assert!(encoded.contains("crochet_incidents_duration_seconds_count 1"));
    assert!(encoded.contains("le=\"7200"), "{encoded}");
  }

  #[test]
  fn http_histogram_is_labelled() {
    let metrics = Metrics::new();
    metrics.observe_http_request(
      &HttpLabels {
        code:   "200".into(),
        method: "POST".into(),
        path:   "/api/notifications/".into(),
      },
      0.002,
    );

    let encoded = metrics.encode().unwrap();
    assert!(encoded.contains("crochet_http_requests_duration_seconds"));
    assert!(encoded.contains("method=\"POST\""));
    assert!(encoded.contains("path=\"/api/notifications/\""));
  }
}
