//! Tracing setup for the detector CLI.
//!
//! Progress messages (graphs analyzed, leaks found, report submission) are the
//! tool's output in CI logs, so the default level is `info`. `RUST_LOG`
//! overrides it; output goes to stderr in compact format.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// # Example
/// ```bash
/// RUST_LOG=leaks_detector=debug leaks-detector --process-name App -e file \
///     -d Dangerfile.leaksReport -f Diagnostics
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}
