//! Log output setup.

use tracing_error::ErrorLayer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. Logs go to stderr so stdout stays usable for command output.
///
/// `RUST_LOG` wins over `verbose`. `DEBUG_START_HOOK=true` additionally turns on
/// the start hook's debug output.
pub fn init(verbose: u8, ansi: bool) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let mut filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    if std::env::var("DEBUG_START_HOOK").is_ok_and(|v| v == "true") {
        match "mcdr_launch::hook=debug".parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => eprintln!("invalid hook log directive: {e}"),
        }
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(ansi),
        )
        .with(ErrorLayer::default())
        .init();
}
