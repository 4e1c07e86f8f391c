//! Injection gateway: the single entry point for wrapped calls
//!
//! For each call the gateway checks the global switch, resolves the failure
//! rate and kind (per-call options first, then the global defaults from one
//! settings snapshot), rolls the gate, and either runs the operation
//! untouched or hands over to the dispatcher.

use crate::dispatch::{dispatch, dispatch_async};
use crate::error::ChaosError;
use crate::gate::should_fail;
use crate::kind::FailureKind;
use crate::options::InvocationOptions;
use crate::settings::ChaosConfig;
use std::future::Future;
use std::sync::Arc;

/// Explicit-wrap entry point
///
/// Cloning is cheap; every clone shares the same [`ChaosConfig`].
///
/// # Example
/// ```
/// use havoc_core_chaos::{ChaosConfig, ChaosError, ChaosSettings, Injector, InvocationOptions};
/// use std::sync::Arc;
///
/// # fn main() -> Result<(), ChaosError> {
/// let config = Arc::new(ChaosConfig::new(ChaosSettings::enabled())?);
/// let injector = Injector::new(config);
///
/// let opts = InvocationOptions::new().with_failure_rate(0.0);
/// let value = injector.maybe_inject(|| Ok::<_, ChaosError>(42), &opts)?;
/// assert_eq!(value, Some(42));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Injector {
    config: Arc<ChaosConfig>,
}

impl Injector {
    pub fn new(config: Arc<ChaosConfig>) -> Self {
        Self { config }
    }

    /// An injector whose store starts disabled
    pub fn disabled() -> Self {
        Self::new(Arc::new(ChaosConfig::disabled()))
    }

    /// The shared settings store, for reloads and toggles
    pub fn config(&self) -> &Arc<ChaosConfig> {
        &self.config
    }

    /// Decide whether this call fails, and how
    ///
    /// Returns `Ok(None)` when injection is disabled or the roll does not
    /// trigger.
    pub fn decide<E>(&self, opts: &InvocationOptions<E>) -> Result<Option<FailureKind>, ChaosError> {
        if !self.config.is_enabled() {
            return Ok(None);
        }

        let settings = self.config.snapshot();
        let rate = opts.failure_rate.unwrap_or(settings.default_failure_rate);
        let kinds = opts
            .failure_types
            .as_ref()
            .unwrap_or(&settings.default_failure_types);
        let kind = *kinds.select().ok_or(ChaosError::NoFailureKinds)?;

        if should_fail(rate)? {
            Ok(Some(kind))
        } else {
            Ok(None)
        }
    }

    /// Run `op`, possibly replacing it with an injected failure
    ///
    /// Pass-through calls run `op` exactly once and return its result
    /// unchanged as `Ok(Some(value))` or `Err(error)`. `Ok(None)` is the
    /// `Null` outcome.
    pub fn maybe_inject<T, E, F>(&self, op: F, opts: &InvocationOptions<E>) -> Result<Option<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<ChaosError> + Clone,
    {
        match self.decide(opts)? {
            None => op().map(Some),
            Some(kind) => dispatch(kind, op, opts),
        }
    }

    /// Async counterpart of [`maybe_inject`](Self::maybe_inject)
    pub async fn maybe_inject_async<T, E, F, Fut>(
        &self,
        op: F,
        opts: &InvocationOptions<E>,
    ) -> Result<Option<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<ChaosError> + Clone,
    {
        match self.decide(opts)? {
            None => op().await.map(Some),
            Some(kind) => dispatch_async(kind, op, opts).await,
        }
    }
}
