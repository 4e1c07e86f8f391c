/*!
 * Logging setup for the havoc binary
 *
 * One global subscriber: an `EnvFilter` (from `RUST_LOG`, or built from the
 * `[logging]` section) plus either a compact stderr layer or a JSON-lines file
 * layer. Injected faults are logged by the engine under the
 * `havoc_core_chaos` target, so both crates share the same filter.
 */

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::config::LoggingConfig;
use crate::error::{HavocError, Result};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Level used when `RUST_LOG` is not set
pub fn effective_level(config: &LoggingConfig) -> Level {
    if config.verbose {
        Level::DEBUG
    } else {
        config.log_level.to_tracing_level()
    }
}

/// Filter directive for the shell and engine targets
pub fn default_directive(config: &LoggingConfig) -> String {
    let level = effective_level(config);
    format!("havoc={level},havoc_core_chaos={level}")
}

/// Install the global subscriber described by `config`
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directive(config))
            .map_err(|e| HavocError::Config(format!("bad log filter: {}", e)))?,
    };

    let output = match config.log_file.as_deref() {
        Some(path) => json_file_layer(path)?,
        None => stderr_layer(),
    };

    tracing_subscriber::registry()
        .with(output)
        .with(filter)
        .try_init()
        .map_err(|e| HavocError::Config(format!("logging already initialized: {}", e)))
}

/// Compact, human-readable events on stderr; stdout stays free for reports
fn stderr_layer() -> BoxedLayer {
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(FmtSpan::NONE)
        .compact()
        .boxed()
}

/// JSON lines appended to `path`, with thread and source location fields
fn json_file_layer(path: &Path) -> Result<BoxedLayer> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            HavocError::Config(format!("cannot open log file {}: {}", path.display(), e))
        })?;

    Ok(fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .json()
        .boxed())
}

/// Route events to the test harness' captured output
#[cfg(test)]
pub fn init_test_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("havoc=debug,havoc_core_chaos=debug"));
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_test_writer().compact())
            .with(filter)
            .try_init();
    });
}
