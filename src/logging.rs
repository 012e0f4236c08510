use std::io;
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install the stderr tracing subscriber for the command line tools.
///
/// Does nothing unless `RUST_LOG` is set, e.g. `RUST_LOG=finch=debug` or
/// `RUST_LOG=finch=trace`. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr).with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
