//! Process-wide injection settings and their hot-reloadable store
//!
//! The store is an explicit object, shared by `Arc`, rather than ambient
//! global state. Readers take an `Arc` snapshot per decision, so a reload
//! racing with a call never tears the rate/kind pair that call uses.

use crate::choice::OneOrMany;
use crate::error::ChaosError;
use crate::gate::validate_rate;
use crate::kind::FailureKind;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Global defaults consulted by the injection gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChaosSettings {
    /// Master switch; when off every call passes straight through
    #[serde(default)]
    pub enabled: bool,

    /// Failure probability used when a call does not set its own
    #[serde(default = "default_failure_rate")]
    pub default_failure_rate: f64,

    /// Kind, or kinds to pick from, used when a call does not set its own
    #[serde(default = "default_failure_types", alias = "default_failure_type")]
    pub default_failure_types: OneOrMany<FailureKind>,
}

impl Default for ChaosSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            default_failure_rate: default_failure_rate(),
            default_failure_types: default_failure_types(),
        }
    }
}

impl ChaosSettings {
    /// Default settings with injection switched on
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Default::default()
        }
    }

    pub fn with_default_failure_rate(mut self, rate: f64) -> Self {
        self.default_failure_rate = rate;
        self
    }

    pub fn with_default_failure_types(mut self, kinds: OneOrMany<FailureKind>) -> Self {
        self.default_failure_types = kinds;
        self
    }

    /// Reject out-of-range rates and empty kind lists
    pub fn validate(&self) -> Result<(), ChaosError> {
        validate_rate(self.default_failure_rate)?;
        if self.default_failure_types.is_empty() {
            return Err(ChaosError::NoFailureKinds);
        }
        Ok(())
    }
}

fn default_failure_rate() -> f64 {
    0.1
}

fn default_failure_types() -> OneOrMany<FailureKind> {
    OneOrMany::One(FailureKind::Error)
}

/// Shared, reloadable holder for [`ChaosSettings`]
///
/// `enabled` is mirrored into an atomic so the disabled path costs a single
/// load.
#[derive(Debug)]
pub struct ChaosConfig {
    enabled: AtomicBool,
    current: RwLock<Arc<ChaosSettings>>,
}

impl ChaosConfig {
    /// Create a store from validated settings
    pub fn new(settings: ChaosSettings) -> Result<Self, ChaosError> {
        settings.validate()?;
        Ok(Self {
            enabled: AtomicBool::new(settings.enabled),
            current: RwLock::new(Arc::new(settings)),
        })
    }

    /// A store holding the defaults (injection disabled)
    pub fn disabled() -> Self {
        Self {
            enabled: AtomicBool::new(false),
            current: RwLock::new(Arc::new(ChaosSettings::default())),
        }
    }

    /// Whether injection is globally on
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// One consistent view of the settings
    pub fn snapshot(&self) -> Arc<ChaosSettings> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replace the settings after validating them
    ///
    /// On error the previous settings stay in place.
    pub fn update(&self, settings: ChaosSettings) -> Result<(), ChaosError> {
        settings.validate()?;
        let enabled = settings.enabled;
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(settings);
        self.enabled.store(enabled, Ordering::Release);
        tracing::info!(enabled, "chaos settings updated");
        Ok(())
    }

    /// Switch injection on, keeping the other settings
    pub fn enable(&self) {
        self.set_enabled(true);
    }

    /// Switch injection off, keeping the other settings
    pub fn disable(&self) {
        self.set_enabled(false);
    }

    fn set_enabled(&self, enabled: bool) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = ChaosSettings::clone(&guard);
        next.enabled = enabled;
        *guard = Arc::new(next);
        self.enabled.store(enabled, Ordering::Release);
        tracing::info!(enabled, "chaos injection toggled");
    }
}

impl Default for ChaosConfig {
    fn default() -> Self {
        Self::disabled()
    }
}
