use prometheus::{IntCounter, IntCounterVec, Opts, Registry};
use std::sync::LazyLock;

pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// Request counters
pub static REQUESTS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("roastmycv_requests_total", "Total number of requests"),
        &["endpoint", "status"],
    )
    .unwrap()
});

// Payment counters
pub static PAYMENT_ATTEMPTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "roastmycv_payment_attempts_total",
            "Payment gate decisions by channel and outcome",
        ),
        &["channel", "outcome"],
    )
    .unwrap()
});

// Review counters
pub static REVIEWS_GENERATED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new("roastmycv_reviews_generated_total", "Reviews returned to payers").unwrap()
});

pub static CRITIQUE_FALLBACKS: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "roastmycv_critique_fallbacks_total",
        "Reviews answered with the placeholder critique",
    )
    .unwrap()
});

pub fn record_request(endpoint: &str, status: u16) {
    REQUESTS_TOTAL
        .with_label_values(&[endpoint, &status.to_string()])
        .inc();
}

pub fn record_payment(channel: &str, outcome: &str) {
    PAYMENT_ATTEMPTS.with_label_values(&[channel, outcome]).inc();
}

/// Register all metrics with the registry. Safe to call more than once.
pub fn register_metrics() {
    let collectors: [Box<dyn prometheus::core::Collector>; 4] = [
        Box::new(REQUESTS_TOTAL.clone()),
        Box::new(PAYMENT_ATTEMPTS.clone()),
        Box::new(REVIEWS_GENERATED.clone()),
        Box::new(CRITIQUE_FALLBACKS.clone()),
    ];
    for collector in collectors {
        if let Err(e) = REGISTRY.register(collector) {
            tracing::debug!(error = %e, "metric already registered");
        }
    }
}
