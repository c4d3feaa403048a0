//! Metrics collection with Prometheus
//!
//! This module provides Prometheus metrics for SessionLink:
//! - HTTP request counts by route and status
//! - Codec operation counts by outcome
//! - Codec failures by error type
//! - Codec latency histograms

use prometheus::{CounterVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Metrics collector for SessionLink
#[derive(Clone)]
pub struct Metrics {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// HTTP requests served
    pub http_requests_total: CounterVec,

    /// Codec operations (extract, decode, build, parse)
    pub codec_operations_total: CounterVec,
    /// Codec failures by error kind
    pub codec_failures_total: CounterVec,
    /// Codec operation duration
    pub codec_duration_seconds: HistogramVec,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total = CounterVec::new(
            Opts::new(
                "sessionlink_http_requests_total",
                "Total number of HTTP requests",
            ),
            &["route", "status"],
        )?;

        let codec_operations_total = CounterVec::new(
            Opts::new(
                "sessionlink_codec_operations_total",
                "Total number of codec operations",
            ),
            &["operation", "outcome"],
        )?;

        let codec_failures_total = CounterVec::new(
            Opts::new(
                "sessionlink_codec_failures_total",
                "Total number of failed codec operations",
            ),
            &["operation", "error_type"],
        )?;

        // Codec work is pure string processing, so buckets stay small
        let codec_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "sessionlink_codec_duration_seconds",
                "Codec operation duration in seconds",
            )
            .buckets(vec![
                0.00001, 0.000025, 0.00005, 0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.01,
            ]),
            &["operation"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(codec_operations_total.clone()))?;
        registry.register(Box::new(codec_failures_total.clone()))?;
        registry.register(Box::new(codec_duration_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            http_requests_total,
            codec_operations_total,
            codec_failures_total,
            codec_duration_seconds,
        })
    }

    /// Get the Prometheus registry for exporting metrics
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all metrics in the Prometheus text format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }

    /// Record a served HTTP request
    pub fn record_http_request(&self, route: &str, status: u16) {
        let status = status.to_string();
        self.http_requests_total
            .with_label_values(&[route, status.as_str()])
            .inc();
    }

    /// Record a successful codec operation
    pub fn record_codec_success(&self, operation: &str, duration_secs: f64) {
        self.codec_operations_total
            .with_label_values(&[operation, "success"])
            .inc();
        self.codec_duration_seconds
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    /// Record a failed codec operation
    pub fn record_codec_failure(&self, operation: &str, error_type: &str, duration_secs: f64) {
        self.codec_operations_total
            .with_label_values(&[operation, "failure"])
            .inc();
        self.codec_failures_total
            .with_label_values(&[operation, error_type])
            .inc();
        self.codec_duration_seconds
            .with_label_values(&[operation])
            .observe(duration_secs);
    }
}
