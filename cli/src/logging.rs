//! Console logging for the CLI.
//!
//! Events go to stderr so that stdout carries only the GeoJSON output.
//! `RUST_LOG` takes precedence; otherwise `-v` flags raise the level from
//! `warn` through `info` and `debug` to `trace`.

use tracing_subscriber::EnvFilter;

/// Default filter directive for a `-v` count.
fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber.  Safe to call once per process.
pub fn init(verbose: u8) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
