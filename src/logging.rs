//! Logging setup for the command-line drivers.
//!
//! The library only emits `tracing` events. Binaries call [`init`] once to
//! print them to stderr. `RUST_LOG` takes precedence over the default level:
//!
//! ```bash
//! RUST_LOG=debug cluster -d original.idx ...
//! RUST_LOG=hashclust::clustering=debug search ...
//! ```

use std::sync::Once;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: Once = Once::new();

/// Default level when `RUST_LOG` is not set.
pub const DEFAULT_LEVEL: &str = "warn";

/// Install a stderr subscriber filtered at `default_level` unless `RUST_LOG`
/// is set. Only the first call has an effect.
pub fn init_with_level(default_level: &str) {
    INIT.call_once(|| {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(default_level)
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_filter(filter);

        tracing_subscriber::registry().with(fmt_layer).init();
    });
}

/// Install the stderr subscriber at [`DEFAULT_LEVEL`].
pub fn init() {
    init_with_level(DEFAULT_LEVEL);
}
