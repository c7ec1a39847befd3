//! Tracing bootstrap for tests.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Initializes a tracing subscriber for test runs.
///
/// Safe to call from every test; only the first call installs the subscriber. The filter
/// honors `RUST_LOG` and defaults to `info`.
pub fn init_test_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}
