//! Error types for the failure injection engine
//!
//! Two families live here. Injected outcomes ([`ChaosError::Sentinel`] and
//! [`ChaosError::Failure`]) are the product: they are what callers asked for.
//! Everything else is misuse (bad rates, bad delays, unknown kinds) and is
//! reported as a configuration error.

use crate::kind::FailureKind;
use std::fmt;
use thiserror::Error;

/// Message carried by [`ChaosFailure`] when the caller supplies none
pub const DEFAULT_FAILURE_MESSAGE: &str = "Chaos monkey induced failure";

/// Error raised by the `Raise` and `Timeout` kinds when no custom error is configured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChaosFailure {
    /// Kind that produced this failure (`Raise` or `Timeout`)
    pub kind: FailureKind,
    /// Human-readable message
    pub message: String,
    /// Name of the wrapped function, when known
    pub function: Option<String>,
    /// Name of the module owning the wrapped function, when known
    pub module: Option<String>,
}

impl ChaosFailure {
    /// Create a failure with the default message and no caller identity
    pub fn new(kind: FailureKind) -> Self {
        Self {
            kind,
            message: DEFAULT_FAILURE_MESSAGE.to_string(),
            function: None,
            module: None,
        }
    }

    /// Replace the message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attach caller identity used in the rendered diagnostic
    pub fn with_caller(mut self, module: Option<String>, function: Option<String>) -> Self {
        self.module = module;
        self.function = function;
        self
    }

    /// Qualified caller name, e.g. `billing.charge`
    pub fn location(&self) -> Option<String> {
        match (&self.module, &self.function) {
            (Some(module), Some(function)) => Some(format!("{}.{}", module, function)),
            (None, Some(function)) => Some(function.clone()),
            (Some(module), None) => Some(module.clone()),
            (None, None) => None,
        }
    }
}

impl fmt::Display for ChaosFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location() {
            Some(location) => write!(f, "{} (in {})", self.message, location),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ChaosFailure {}

/// Errors produced by the injection engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChaosError {
    /// Default value handed back by the `Error` kind
    #[error("chaos monkey error")]
    Sentinel,

    /// Default error raised by the `Raise` and `Timeout` kinds
    #[error(transparent)]
    Failure(#[from] ChaosFailure),

    /// Failure rate is not a number in `[0, 1]`
    #[error("invalid failure rate {0}: expected a number in [0, 1]")]
    InvalidRate(f64),

    /// Failure kind name not recognized
    #[error("unknown failure kind: {0:?}")]
    UnknownKind(String),

    /// A configured delay is negative
    #[error("negative delay: {0}ms")]
    NegativeDelay(i64),

    /// A configured delay range has its bounds reversed
    #[error("invalid delay range: {min}ms..={max}ms")]
    InvalidDelayRange { min: i64, max: i64 },

    /// No failure kind available to pick from
    #[error("no failure kinds configured")]
    NoFailureKinds,
}

impl ChaosError {
    /// Returns true for outcomes deliberately produced by a dispatched fault
    pub fn is_injected(&self) -> bool {
        matches!(self, ChaosError::Sentinel | ChaosError::Failure(_))
    }

    /// Returns true for caller or configuration mistakes
    pub fn is_misconfiguration(&self) -> bool {
        !self.is_injected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_display_with_caller() {
        let failure = ChaosFailure::new(FailureKind::Raise)
            .with_message("boom")
            .with_caller(Some("billing".to_string()), Some("charge".to_string()));
        assert_eq!(failure.to_string(), "boom (in billing.charge)");
    }

    #[test]
    fn test_failure_display_without_caller() {
        let failure = ChaosFailure::new(FailureKind::Timeout);
        assert_eq!(failure.to_string(), DEFAULT_FAILURE_MESSAGE);
        assert_eq!(failure.location(), None);
    }

    #[test]
    fn test_failure_location_function_only() {
        let failure =
            ChaosFailure::new(FailureKind::Raise).with_caller(None, Some("charge".to_string()));
        assert_eq!(failure.location().as_deref(), Some("charge"));
    }

    #[test]
    fn test_classification() {
        assert!(ChaosError::Sentinel.is_injected());
        assert!(ChaosError::from(ChaosFailure::new(FailureKind::Raise)).is_injected());
        assert!(ChaosError::InvalidRate(2.0).is_misconfiguration());
        assert!(ChaosError::NegativeDelay(-5).is_misconfiguration());
        assert!(ChaosError::NoFailureKinds.is_misconfiguration());
    }

    #[test]
    fn test_transparent_failure_display() {
        let err = ChaosError::from(ChaosFailure::new(FailureKind::Raise).with_message("kaput"));
        assert_eq!(err.to_string(), "kaput");
    }

    #[test]
    fn test_misuse_display() {
        assert_eq!(
            ChaosError::InvalidDelayRange { min: 10, max: 5 }.to_string(),
            "invalid delay range: 10ms..=5ms"
        );
        assert_eq!(
            ChaosError::UnknownKind("explode".to_string()).to_string(),
            "unknown failure kind: \"explode\""
        );
    }
}
