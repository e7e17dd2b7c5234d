//! Telemetry logic.
//! Support logging and metrics.
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

const DEFAULT_FILTER: &str = "info";

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` overrides `default`. Calling twice is harmless.
pub fn setup_logging(default: Option<&str>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(default.unwrap_or(DEFAULT_FILTER))
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::NONE)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Record a successful authentication.
pub fn record_auth_success(user_id: &str, role: &str) {
    tracing::info!(user_id, role, "authentication successful");
    metrics::counter!("auth_attempts_total", "outcome" => "success")
        .increment(1);
}

/// Record a failed authentication attempt.
pub fn record_auth_failure(reason: &'static str) {
    tracing::warn!(reason, "authentication failed");
    metrics::counter!("auth_attempts_total", "outcome" => reason).increment(1);
}

/// Record a new account creation.
pub fn record_account_created(user_id: &str) {
    tracing::info!(user_id, "account created");
    metrics::counter!("accounts_created_total").increment(1);
}

/// Record a new order.
pub fn record_order_created(order_id: &str, category: &'static str, price: f64) {
    tracing::info!(order_id, category, price, "order created");
    metrics::counter!("orders_created_total", "category" => category)
        .increment(1);
}

/// Record an admin edit on an order.
pub fn record_order_updated(order_id: &str, admin_id: &str) {
    tracing::info!(order_id, admin_id, "order updated");
    metrics::counter!("orders_updated_total").increment(1);
}
