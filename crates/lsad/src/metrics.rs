//! Prometheus metrics for the recovery endpoint
//!
//! Exposed on `GET /metrics` by the main router:
//!   lsa_recoveries_total{kind,outcome}
//!   lsa_recovery_bytes_total{kind}
//!   lsa_recovery_duration_seconds{kind}

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use prometheus_client::{
    encoding::text::encode,
    metrics::{counter::Counter, family::Family, histogram::Histogram},
    registry::Registry,
};
use std::sync::Arc;

use crate::server::AppState;

type Labels = Vec<(String, String)>;

#[derive(Clone)]
pub struct RecoveryMetrics {
    recoveries: Family<Labels, Counter>,
    bytes: Family<Labels, Counter>,
    duration: Family<Labels, Histogram>,
}

impl RecoveryMetrics {
    pub fn new(registry: &mut Registry) -> Self {
        let recoveries = Family::default();
        let bytes = Family::default();
        let duration = Family::<Labels, Histogram>::new_with_constructor(|| {
            Histogram::new([0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0])
        });

        registry.register(
            "lsa_recoveries",
            "Recovery requests by container kind and outcome",
            recoveries.clone(),
        );
        registry.register(
            "lsa_recovery_bytes",
            "Container bytes accepted for recovery",
            bytes.clone(),
        );
        registry.register(
            "lsa_recovery_duration_seconds",
            "Time spent in the recovery pipeline",
            duration.clone(),
        );

        Self {
            recoveries,
            bytes,
            duration,
        }
    }

    /// Record one request. `outcome` is `"ok"` or a rejection reason.
    pub fn observe(&self, kind: &str, outcome: &str, len: usize, secs: f64) {
        self.recoveries
            .get_or_create(&vec![
                ("kind".to_string(), kind.to_string()),
                ("outcome".to_string(), outcome.to_string()),
            ])
            .inc();
        let kind_labels = vec![("kind".to_string(), kind.to_string())];
        self.bytes.get_or_create(&kind_labels).inc_by(len as u64);
        self.duration.get_or_create(&kind_labels).observe(secs);
    }
}

/// Registry plus the metric handles registered in it
pub fn new_registry() -> (Arc<Registry>, RecoveryMetrics) {
    let mut registry = Registry::default();
    let metrics = RecoveryMetrics::new(&mut registry);
    (Arc::new(registry), metrics)
}

pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut body = String::new();
    match encode(&mut body, &state.registry) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            body,
        ),
        Err(e) => {
            tracing::error!("metrics encode failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                e.to_string(),
            )
        }
    }
}
