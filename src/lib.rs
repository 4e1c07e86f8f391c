/*!
 * Havoc - chaos-monkey failure injection for Rust functions
 *
 * Wraps ordinary functions so that, with a configurable probability, a call
 * is replaced by an injected failure:
 * - Returned error values or raised errors
 * - Absent results (`Ok(None)`)
 * - Delays before the real call, or timeouts instead of it
 * - Abrupt exits of the calling thread or task
 *
 * The decision logic lives in `havoc-core-chaos`; this crate adds config
 * files, logging, the function registry, and the `havoc` probe CLI.
 *
 * Author: Shane Wall <shaneawall@gmail.com>
 */

pub mod config;
pub mod error;
pub mod logging;
pub mod probe;
pub mod registry;

// Re-export commonly used types
pub use config::{FunctionProfile, HavocConfig, LogLevel, LoggingConfig};
pub use error::{HavocError, Result};
pub use probe::{ProbeReport, ProbeRequest};
pub use registry::{FunctionId, Registry, WrappedFunction};

pub use havoc_core_chaos as chaos;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }
}
