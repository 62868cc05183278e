// Tracing initialization for the command line tool.
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Returns the default filter directive for the given debug flag.
pub fn default_level(debug: bool) -> &'static str {
    if debug { "debug" } else { "info" }
}

pub fn init_tracing(debug: bool) {
    // Prefer RUST_LOG from env, otherwise use the default level.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(default_level(debug)));

    // Logs go to stderr; stdout carries the token.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
