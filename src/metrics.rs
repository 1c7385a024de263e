// src/metrics.rs

#[cfg(feature = "observability")]
pub use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};

// NOTE: When observability feature is disabled, provide stub implementations
#[cfg(not(feature = "observability"))]
pub enum Unit {
    Count,
    Seconds,
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! counter {
    ($name:expr, $value:expr $(, $label:expr => $label_value:expr)* $(,)?) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! histogram {
    ($name:expr, $value:expr $(, $label:expr => $label_value:expr)* $(,)?) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! describe_counter {
    ($name:expr, $unit:expr, $desc:expr) => {};
    ($name:expr, $desc:expr) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! describe_histogram {
    ($name:expr, $unit:expr, $desc:expr) => {};
    ($name:expr, $desc:expr) => {};
}

#[cfg(not(feature = "observability"))]
use crate::{counter, describe_counter, describe_histogram, histogram};

/// Registers descriptions for every metric emitted by the guard.
/// Call once at startup, after installing a recorder.
pub fn describe_metrics() {
    describe_counter!(
        "price_guard_rpc_calls_total",
        Unit::Count,
        "Outbound JSON-RPC calls, labeled by method."
    );
    describe_counter!(
        "price_guard_rpc_endpoint_failures_total",
        Unit::Count,
        "Failed attempts against a single endpoint (the call fell back to the next one)."
    );
    describe_counter!(
        "price_guard_rpc_all_endpoints_failed_total",
        Unit::Count,
        "Calls for which every configured endpoint failed."
    );
    describe_histogram!(
        "price_guard_rpc_call_latency_seconds",
        Unit::Seconds,
        "Latency of successful JSON-RPC calls, fallback included."
    );
    describe_counter!(
        "price_guard_validation_failures_total",
        Unit::Count,
        "Rejected prices, labeled by field and failure kind."
    );
    describe_counter!(
        "price_guard_prices_released_total",
        Unit::Count,
        "Prices that passed validation and were returned to the caller."
    );
}

pub fn increment_rpc_call(method: &str) {
    counter!("price_guard_rpc_calls_total", 1, "method" => method.to_string());
}

pub fn increment_endpoint_failure(endpoint: &str, reason: &str) {
    counter!("price_guard_rpc_endpoint_failures_total", 1,
             "endpoint" => endpoint.to_string(),
             "reason" => reason.to_string());
}

pub fn increment_all_endpoints_failed(method: &str) {
    counter!("price_guard_rpc_all_endpoints_failed_total", 1, "method" => method.to_string());
}

pub fn record_rpc_call_latency(method: &str, duration: std::time::Duration) {
    histogram!("price_guard_rpc_call_latency_seconds", duration.as_secs_f64(),
               "method" => method.to_string());
}

pub fn increment_validation_failure(field: &str, kind: &str) {
    counter!("price_guard_validation_failures_total", 1,
             "field" => field.to_string(),
             "kind" => kind.to_string());
}

pub fn increment_price_released(feed: &str) {
    counter!("price_guard_prices_released_total", 1, "feed" => feed.to_string());
}
