//! Tracing setup

use crate::config::CashConfig;
use tracing::Subscriber;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::FmtSubscriber;

/// Filter from `RUST_LOG`, else `config.log_filter`, else `info`
pub fn env_filter(config: &CashConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// The fmt subscriber used by `init_tracing`, not yet installed
pub fn subscriber(config: &CashConfig) -> impl Subscriber + Send + Sync {
    FmtSubscriber::builder()
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_env_filter(env_filter(config))
        .with_thread_ids(true)
        .finish()
}

/// Install the global fmt subscriber.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_tracing(config: &CashConfig) -> bool {
    tracing::subscriber::set_global_default(subscriber(config)).is_ok()
}
