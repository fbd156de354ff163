//! Tracing setup for hosts embedding `chart-binding`.
//!
//! The crate only emits `tracing` events. Installing a subscriber is left to
//! the host, or to `init_default_tracing` when the `telemetry` feature is on.

/// Installs a compact `fmt` subscriber filtered by `RUST_LOG`
/// (defaulting to `chart_binding=info`).
///
/// Returns `false` when the feature is disabled or a global subscriber is
/// already installed.
#[must_use]
pub fn init_default_tracing() -> bool {
    #[cfg(feature = "telemetry")]
    {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("chart_binding=info"));

        return tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .compact()
            .try_init()
            .is_ok();
    }

    #[cfg(not(feature = "telemetry"))]
    {
        false
    }
}
