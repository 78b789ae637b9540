use std::env;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Variable holding the log filter, e.g. `BURROW_LOG=burrow_ops=debug`.
pub const LOG_ENV: &str = "BURROW_LOG";

/// Install a stderr subscriber so stdout stays clean for command output.
pub fn init_logger() {
    let filter = env::var(LOG_ENV).unwrap_or_else(|_| "warn".to_string());
    let filter_layer = EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .without_time(),
        )
        .with(filter_layer)
        .init();
}
