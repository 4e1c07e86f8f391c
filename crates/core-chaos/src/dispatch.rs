//! Failure dispatcher
//!
//! Turning a [`FailureKind`] into behavior happens in two steps:
//! [`Fault::resolve`] picks every random ingredient (error value, delay,
//! exit reason) from the options, then [`Fault::apply`] or
//! [`Fault::apply_async`] acts it out against the wrapped operation.
//!
//! | kind      | operation runs | outcome                                   |
//! |-----------|----------------|-------------------------------------------|
//! | `Error`   | no             | `Err(selected error value)`               |
//! | `Null`    | no             | `Ok(None)`                                |
//! | `Raise`   | no             | `Err(selected raised error)`              |
//! | `Exit`    | no             | unwinds with [`ChaosExit`]                |
//! | `Delay`   | yes            | waits, then the operation's own result    |
//! | `Timeout` | no             | waits, then `Err(selected raised error)`  |

use crate::choice::select_or;
use crate::delay::resolve_delay;
use crate::error::{ChaosError, ChaosFailure, DEFAULT_FAILURE_MESSAGE};
use crate::exit::{ChaosExit, DEFAULT_EXIT_REASON};
use crate::kind::FailureKind;
use crate::options::InvocationOptions;
use std::future::Future;
use std::time::Duration;

/// A fully resolved failure, ready to be applied
#[derive(Debug, Clone, PartialEq)]
pub enum Fault<E> {
    /// Hand back this error value
    Error(E),
    /// Hand back an absent result
    Null,
    /// Fail with this error
    Raise(E),
    /// Unwind with this payload
    Exit(ChaosExit),
    /// Wait this long, then run the operation
    Delay(Duration),
    /// Wait this long, then fail with `error`
    Timeout { after: Duration, error: E },
}

impl<E> Fault<E>
where
    E: From<ChaosError> + Clone,
{
    /// Resolve `kind` against the per-call options
    ///
    /// Fails only on misconfiguration (a negative or reversed delay).
    pub fn resolve(kind: FailureKind, opts: &InvocationOptions<E>) -> Result<Self, ChaosError> {
        let wait = if kind.waits() {
            resolve_delay(opts.delay.as_ref())?
        } else {
            Duration::ZERO
        };
        let fault = match kind {
            FailureKind::Error => Fault::Error(error_value(opts)),
            FailureKind::Null => Fault::Null,
            FailureKind::Raise => Fault::Raise(raised_error(FailureKind::Raise, opts)),
            FailureKind::Exit => Fault::Exit(exit_payload(opts)),
            FailureKind::Delay => Fault::Delay(wait),
            FailureKind::Timeout => Fault::Timeout {
                after: wait,
                error: raised_error(FailureKind::Timeout, opts),
            },
        };
        Ok(fault)
    }
}

impl<E> Fault<E> {
    /// Kind this fault was resolved from
    pub fn kind(&self) -> FailureKind {
        match self {
            Fault::Error(_) => FailureKind::Error,
            Fault::Null => FailureKind::Null,
            Fault::Raise(_) => FailureKind::Raise,
            Fault::Exit(_) => FailureKind::Exit,
            Fault::Delay(_) => FailureKind::Delay,
            Fault::Timeout { .. } => FailureKind::Timeout,
        }
    }

    /// Act the fault out, blocking the calling thread for waits
    pub fn apply<T, F>(self, op: F) -> Result<Option<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        match self {
            Fault::Error(error) | Fault::Raise(error) => Err(error),
            Fault::Null => Ok(None),
            Fault::Exit(exit) => exit.raise(),
            Fault::Delay(wait) => {
                std::thread::sleep(wait);
                op().map(Some)
            }
            Fault::Timeout { after, error } => {
                std::thread::sleep(after);
                Err(error)
            }
        }
    }

    /// Act the fault out on an async operation
    ///
    /// Waits use `tokio::time::sleep`, so only the calling task is held up.
    /// Must run inside a tokio runtime with the time driver enabled.
    pub async fn apply_async<T, F, Fut>(self, op: F) -> Result<Option<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match self {
            Fault::Error(error) | Fault::Raise(error) => Err(error),
            Fault::Null => Ok(None),
            Fault::Exit(exit) => exit.raise(),
            Fault::Delay(wait) => {
                tokio::time::sleep(wait).await;
                op().await.map(Some)
            }
            Fault::Timeout { after, error } => {
                tokio::time::sleep(after).await;
                Err(error)
            }
        }
    }

    /// How long the fault blocks before acting; zero for kinds that don't wait
    pub fn wait(&self) -> Duration {
        match self {
            Fault::Delay(wait) | Fault::Timeout { after: wait, .. } => *wait,
            _ => Duration::ZERO,
        }
    }

    fn trace<X>(&self, opts: &InvocationOptions<X>) {
        let kind = self.kind();
        let function = opts.function.as_deref();
        let module = opts.module.as_deref();
        let runs_operation = kind.executes_operation();
        match self {
            Fault::Exit(exit) => {
                tracing::warn!(%kind, reason = %exit.reason, function, module, "injecting exit");
            }
            _ if kind.waits() => {
                let wait_ms = self.wait().as_millis() as u64;
                tracing::debug!(%kind, wait_ms, runs_operation, function, module, "injecting failure");
            }
            _ => {
                tracing::debug!(%kind, runs_operation, function, module, "injecting failure");
            }
        }
    }
}

/// Dispatch `kind` against a blocking operation
///
/// Misconfiguration surfaces through the caller's error type as a
/// [`ChaosError`].
pub fn dispatch<T, E, F>(kind: FailureKind, op: F, opts: &InvocationOptions<E>) -> Result<Option<T>, E>
where
    F: FnOnce() -> Result<T, E>,
    E: From<ChaosError> + Clone,
{
    let fault = Fault::resolve(kind, opts)?;
    fault.trace(opts);
    fault.apply(op)
}

/// Dispatch `kind` against an async operation
pub async fn dispatch_async<T, E, F, Fut>(
    kind: FailureKind,
    op: F,
    opts: &InvocationOptions<E>,
) -> Result<Option<T>, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<ChaosError> + Clone,
{
    let fault = Fault::resolve(kind, opts)?;
    fault.trace(opts);
    fault.apply_async(op).await
}

fn error_value<E>(opts: &InvocationOptions<E>) -> E
where
    E: From<ChaosError> + Clone,
{
    let sentinel = E::from(ChaosError::Sentinel);
    select_or(opts.errors.as_ref(), &sentinel).clone()
}

fn raised_error<E>(kind: FailureKind, opts: &InvocationOptions<E>) -> E
where
    E: From<ChaosError> + Clone,
{
    let failure = ChaosFailure::new(kind)
        .with_message(opts.message.as_deref().unwrap_or(DEFAULT_FAILURE_MESSAGE))
        .with_caller(opts.module.clone(), opts.function.clone());
    let fallback = E::from(ChaosError::Failure(failure));
    select_or(opts.raised_errors.as_ref(), &fallback).clone()
}

fn exit_payload<E>(opts: &InvocationOptions<E>) -> ChaosExit {
    let fallback = DEFAULT_EXIT_REASON.to_string();
    let reason = select_or(opts.exit_reasons.as_ref(), &fallback);
    ChaosExit::new(reason.as_str()).with_caller(opts.module.clone(), opts.function.clone())
}
