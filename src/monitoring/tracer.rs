/*!
 * Structured Tracing
 * Logging setup and operation spans built on the tracing crate
 *
 * Features:
 * - Trace ID generation for correlating a handle's lifecycle events
 * - JSON-formatted logs for structured parsing
 * - Operation spans that report their duration on drop
 */

use crate::core::limits::{ENV_TRACE_JSON, SLOW_OPERATION_THRESHOLD};
use std::time::Instant;
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use uuid::Uuid;

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - DHANDLE_TRACE_JSON: Enable JSON output (default: false)
///
/// Does nothing if a global subscriber is already installed.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(ENV_TRACE_JSON)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        info!(json = use_json, "Structured tracing initialized");
    }
}

/// Generate a unique trace ID for lifecycle correlation
pub fn generate_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span for operation tracing with structured fields
pub struct OperationSpan {
    span: tracing::Span,
    start: Instant,
    trace_id: String,
}

impl OperationSpan {
    pub fn new(operation: &str) -> Self {
        let trace_id = generate_trace_id();

        let span = span!(
            Level::DEBUG,
            "operation",
            trace_id = %trace_id,
            operation = operation,
            duration_us = tracing::field::Empty,
            duration_ms = tracing::field::Empty,
            result = tracing::field::Empty,
            error = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            trace_id,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Record the operation result
    pub fn record_result(&self, success: bool) {
        self.span
            .record("result", if success { "success" } else { "error" });
    }

    /// Record an error
    pub fn record_error(&self, error: &str) {
        self.span.record("error", error);
        self.span.record("result", "error");
    }
}

impl Drop for OperationSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();

        if duration > SLOW_OPERATION_THRESHOLD {
            self.span.record("duration_ms", duration.as_millis() as u64);
            warn!(
                trace_id = %self.trace_id,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow operation detected"
            );
        } else {
            self.span.record("duration_us", duration.as_micros() as u64);
            debug!(
                trace_id = %self.trace_id,
                duration_us = duration.as_micros() as u64,
                "operation completed"
            );
        }
    }
}

/// Helper to create an operation span
#[inline]
pub fn span_operation(name: &str) -> OperationSpan {
    OperationSpan::new(name)
}
