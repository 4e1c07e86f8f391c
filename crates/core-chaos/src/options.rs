//! Per-call invocation options
//!
//! Every field is optional; present fields override the global settings for
//! that call. List-capable fields hold a [`OneOrMany`] and are resolved on
//! each triggering call, never once up front.
//!
//! Config files may use either the singular or plural spelling of each
//! list-capable field (`error` / `errors`, `failure_type` / `failure_types`,
//! `raised_error` / `raised_errors`, `exit_error` / `exit_errors`).

use crate::choice::OneOrMany;
use crate::delay::DelaySpec;
use crate::error::ChaosError;
use crate::gate::validate_rate;
use crate::kind::FailureKind;
use serde::{Deserialize, Serialize};

/// Options for one injected call
///
/// `E` is the caller's error type: values in `errors` and `raised_errors`
/// are handed back through it unchanged.
///
/// # Example
/// ```
/// use havoc_core_chaos::{FailureKind, InvocationOptions};
///
/// let opts: InvocationOptions<String> = InvocationOptions::new()
///     .with_failure_rate(0.25)
///     .with_failure_types(vec![FailureKind::Error, FailureKind::Null])
///     .with_errors(vec!["timeout".to_string(), "refused".to_string()])
///     .with_caller("billing", "charge");
///
/// assert!(opts.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationOptions<E> {
    /// Probability of failure for this call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_rate: Option<f64>,

    /// Kind, or kinds to pick from, when the call fails
    #[serde(default, alias = "failure_type", skip_serializing_if = "Option::is_none")]
    pub failure_types: Option<OneOrMany<FailureKind>>,

    /// Values handed back by the `Error` kind
    #[serde(default, alias = "error", skip_serializing_if = "Option::is_none")]
    pub errors: Option<OneOrMany<E>>,

    /// Errors raised by the `Raise` and `Timeout` kinds
    #[serde(default, alias = "raised_error", skip_serializing_if = "Option::is_none")]
    pub raised_errors: Option<OneOrMany<E>>,

    /// Termination reasons used by the `Exit` kind
    #[serde(
        default,
        rename = "exit_errors",
        alias = "exit_error",
        skip_serializing_if = "Option::is_none"
    )]
    pub exit_reasons: Option<OneOrMany<String>>,

    /// Wait used by the `Delay` and `Timeout` kinds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<DelaySpec>,

    /// Message for the default raised failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Wrapped function name, for diagnostics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,

    /// Owning module name, for diagnostics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

impl<E> Default for InvocationOptions<E> {
    fn default() -> Self {
        Self {
            failure_rate: None,
            failure_types: None,
            errors: None,
            raised_errors: None,
            exit_reasons: None,
            delay: None,
            message: None,
            function: None,
            module: None,
        }
    }
}

impl<E> InvocationOptions<E> {
    /// Options that defer entirely to the global settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = Some(rate);
        self
    }

    pub fn with_failure_type(mut self, kind: FailureKind) -> Self {
        self.failure_types = Some(OneOrMany::One(kind));
        self
    }

    pub fn with_failure_types(mut self, kinds: Vec<FailureKind>) -> Self {
        self.failure_types = Some(OneOrMany::Many(kinds));
        self
    }

    pub fn with_error(mut self, error: E) -> Self {
        self.errors = Some(OneOrMany::One(error));
        self
    }

    pub fn with_errors(mut self, errors: Vec<E>) -> Self {
        self.errors = Some(OneOrMany::Many(errors));
        self
    }

    pub fn with_raised_error(mut self, error: E) -> Self {
        self.raised_errors = Some(OneOrMany::One(error));
        self
    }

    pub fn with_raised_errors(mut self, errors: Vec<E>) -> Self {
        self.raised_errors = Some(OneOrMany::Many(errors));
        self
    }

    pub fn with_exit_reason(mut self, reason: impl Into<String>) -> Self {
        self.exit_reasons = Some(OneOrMany::One(reason.into()));
        self
    }

    pub fn with_exit_reasons<S: Into<String>>(mut self, reasons: Vec<S>) -> Self {
        self.exit_reasons = Some(OneOrMany::Many(
            reasons.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn with_delay(mut self, delay: DelaySpec) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach caller identity (what the wrapping adapter does automatically)
    pub fn with_caller(mut self, module: impl Into<String>, function: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self.function = Some(function.into());
        self
    }

    /// Check the options for configuration mistakes
    ///
    /// Rates must lie in `[0, 1]`, delays must be non-negative with ordered
    /// bounds, and an explicit kind list must not be empty.
    pub fn validate(&self) -> Result<(), ChaosError> {
        if let Some(rate) = self.failure_rate {
            validate_rate(rate)?;
        }
        if let Some(kinds) = &self.failure_types {
            if kinds.is_empty() {
                return Err(ChaosError::NoFailureKinds);
            }
        }
        if let Some(delay) = &self.delay {
            delay.validate()?;
        }
        Ok(())
    }

    /// Convert the error-value type, e.g. from strings read out of a config file
    pub fn map_errors<U, F>(self, mut f: F) -> InvocationOptions<U>
    where
        F: FnMut(E) -> U,
    {
        InvocationOptions {
            failure_rate: self.failure_rate,
            failure_types: self.failure_types,
            errors: self.errors.map(|errors| errors.map(&mut f)),
            raised_errors: self.raised_errors.map(|errors| errors.map(&mut f)),
            exit_reasons: self.exit_reasons,
            delay: self.delay,
            message: self.message,
            function: self.function,
            module: self.module,
        }
    }
}
