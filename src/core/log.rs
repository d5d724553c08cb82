//! Logging setup for the command line binary.

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, filter::Targets, fmt, prelude::*};

const CRATE_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Installs the global subscriber. Diagnostics go to stderr, so tables
/// printed on stdout stay clean.
///
/// `verbose` raises this crate to `debug`; otherwise only warnings and errors
/// are shown. `RUST_LOG` narrows or widens other targets.
pub fn init_logging(verbose: bool) -> Result<()> {
    let crate_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let crate_filter = Targets::new()
        .with_target(CRATE_TARGET, crate_level)
        .with_default(LevelFilter::WARN);
    let env_filter = EnvFilter::builder()
        .with_default_directive(crate_level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .pretty()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(crate_filter)
        .with(env_filter)
        .try_init()?;
    Ok(())
}
