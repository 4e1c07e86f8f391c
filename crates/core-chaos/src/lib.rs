//! Havoc Core Chaos: Pure-logic failure injection
//!
//! # Overview
//!
//! This crate injects controlled, probabilistic failures into arbitrary
//! zero-argument operations so that error-handling and resilience paths can be
//! exercised on demand. It includes:
//!
//! - **Random Gate**: Bernoulli trial against a failure rate
//! - **Selection Helper**: "one value or a list of candidates" resolution
//! - **Delay Resolver**: fixed, ranged, or default-window waits
//! - **Failure Dispatcher**: materializes `Error`, `Raise`, `Delay`, `Timeout`, `Null` or `Exit`
//! - **Injection Gateway**: the explicit-wrap entry point tying it all together
//! - **Settings Store**: hot-reloadable global defaults with snapshot reads
//!
//! # Key Principles
//!
//! This crate is **pure logic** with zero knowledge of:
//! - Configuration files or CLIs
//! - Logging subscribers (it only emits `tracing` events)
//! - How callers register or name their functions
//!
//! When injection is disabled the only work done per call is one atomic load.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Your Application                │
//! └─────────────┬───────────────────────────┘
//!               │ maybe_inject(op, opts)
//!               ▼
//! ┌─────────────────────────────────────────┐
//! │       Injection Gateway                 │  ← enabled? rate? kind?
//! │  (ChaosConfig snapshot + options)       │
//! └─────────────┬───────────────────────────┘
//!               │
//!               ▼
//! ┌─────────────────────────────────────────┐
//! │       Random Gate                       │  ← should_fail(rate)
//! └──────┬──────────────────────┬───────────┘
//!        │ no                   │ yes
//!        ▼                      ▼
//!   op() unchanged   ┌─────────────────────────────┐
//!                    │   Failure Dispatcher        │
//!                    │ (Selection Helper, Delay    │
//!                    │  Resolver, ChaosExit)       │
//!                    └─────────────────────────────┘
//! ```
//!
//! # Usage Example
//!
//! ```
//! use havoc_core_chaos::prelude::*;
//! use std::sync::Arc;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! enum RepoError {
//!     NotFound,
//!     Chaos(ChaosError),
//! }
//!
//! impl From<ChaosError> for RepoError {
//!     fn from(err: ChaosError) -> Self {
//!         RepoError::Chaos(err)
//!     }
//! }
//!
//! # fn main() -> Result<(), ChaosError> {
//! let config = Arc::new(ChaosConfig::new(ChaosSettings::enabled())?);
//! let injector = Injector::new(config);
//!
//! let opts = InvocationOptions::new()
//!     .with_failure_rate(1.0)
//!     .with_failure_types(vec![FailureKind::Error, FailureKind::Null])
//!     .with_error(RepoError::NotFound)
//!     .with_caller("repo", "load_user");
//!
//! let outcome = injector.maybe_inject(|| Ok::<_, RepoError>("alice"), &opts);
//! assert!(matches!(outcome, Err(RepoError::NotFound) | Ok(None)));
//! # Ok(())
//! # }
//! ```

pub mod choice;
pub mod delay;
pub mod dispatch;
pub mod error;
pub mod exit;
pub mod gate;
pub mod gateway;
pub mod kind;
pub mod options;
pub mod settings;

// Re-export main types for convenience
pub use choice::OneOrMany;
pub use delay::{resolve_delay, DelaySpec, DEFAULT_DELAY_MAX_MS, DEFAULT_DELAY_MIN_MS};
pub use dispatch::{dispatch, dispatch_async, Fault};
pub use error::{ChaosError, ChaosFailure, DEFAULT_FAILURE_MESSAGE};
pub use exit::{catch_exit, ChaosExit, DEFAULT_EXIT_REASON};
pub use gate::{should_fail, validate_rate};
pub use gateway::Injector;
pub use kind::FailureKind;
pub use options::InvocationOptions;
pub use settings::{ChaosConfig, ChaosSettings};

/// Prelude module for convenient imports
///
/// # Example
/// ```
/// use havoc_core_chaos::prelude::*;
/// ```
pub mod prelude {
    pub use super::choice::OneOrMany;
    pub use super::delay::DelaySpec;
    pub use super::error::{ChaosError, ChaosFailure};
    pub use super::exit::{catch_exit, ChaosExit};
    pub use super::gateway::Injector;
    pub use super::kind::FailureKind;
    pub use super::options::InvocationOptions;
    pub use super::settings::{ChaosConfig, ChaosSettings};
}
