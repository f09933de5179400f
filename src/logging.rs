//! Sets up `tracing` output for the command line tools.

use std::{fs::OpenOptions, io, path::Path, sync::Arc};

use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

/// The log level for the terminal when `RUST_LOG` is not set.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Install the global subscriber.
///
/// Events at [DEFAULT_LOG_LEVEL] and above are written to stderr, which
/// `RUST_LOG` can override. If `log_file` is given, every event at the debug
/// level and above is also appended to that file.
///
/// # Errors
/// Returns an error if the log file cannot be opened or a global subscriber
/// has already been installed.
pub fn setup_logging(log_file: Option<&Path>) -> Result<(), io::Error> {
    let stderr_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));
    let stderr_log = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_filter(stderr_filter);

    let debug_log = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;

            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(file))
                    .with_filter(LevelFilter::DEBUG),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_log)
        .with(debug_log)
        .try_init()
        .map_err(io::Error::other)?;

    tracing::debug!("Logging initialised");

    Ok(())
}
