use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize structured logging with environment-based filtering.
///
/// Defaults to `info,order_service=debug`; override with `RUST_LOG`, e.g.
/// `RUST_LOG=order_service=trace`.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,order_service=debug")),
        )
        .init();
}
