//! Delay resolver for the `Delay` and `Timeout` kinds
//!
//! Delays are configured in milliseconds and kept signed so that a negative
//! value in a config file surfaces as [`ChaosError::NegativeDelay`] instead of
//! being silently coerced.

use crate::error::ChaosError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lower bound of the window used when no delay is configured
pub const DEFAULT_DELAY_MIN_MS: u64 = 1_000;

/// Upper bound of the window used when no delay is configured
pub const DEFAULT_DELAY_MAX_MS: u64 = 5_000;

/// Configured delay, in milliseconds
///
/// Deserializes from an integer (`delay = 250`) or a two-element array
/// (`delay = [100, 400]`, both ends inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DelaySpec {
    /// Exactly this many milliseconds
    Fixed(i64),
    /// Uniformly random within `min..=max` milliseconds
    Range(i64, i64),
}

impl DelaySpec {
    /// Reject negative values and reversed ranges
    pub fn validate(&self) -> Result<(), ChaosError> {
        match *self {
            DelaySpec::Fixed(ms) if ms < 0 => Err(ChaosError::NegativeDelay(ms)),
            DelaySpec::Fixed(_) => Ok(()),
            DelaySpec::Range(min, _) if min < 0 => Err(ChaosError::NegativeDelay(min)),
            DelaySpec::Range(_, max) if max < 0 => Err(ChaosError::NegativeDelay(max)),
            DelaySpec::Range(min, max) if min > max => {
                Err(ChaosError::InvalidDelayRange { min, max })
            }
            DelaySpec::Range(_, _) => Ok(()),
        }
    }

    fn resolve_with<R: Rng>(&self, rng: &mut R) -> Result<Duration, ChaosError> {
        self.validate()?;
        let ms = match *self {
            DelaySpec::Fixed(ms) => ms,
            DelaySpec::Range(min, max) => rng.random_range(min..=max),
        };
        Ok(Duration::from_millis(ms as u64))
    }
}

/// Resolve an optional delay spec to a concrete duration
///
/// An absent spec picks uniformly from
/// `DEFAULT_DELAY_MIN_MS..=DEFAULT_DELAY_MAX_MS`.
pub fn resolve_delay(spec: Option<&DelaySpec>) -> Result<Duration, ChaosError> {
    resolve_delay_with(&mut rand::rng(), spec)
}

/// Resolve with the given RNG
pub fn resolve_delay_with<R: Rng>(
    rng: &mut R,
    spec: Option<&DelaySpec>,
) -> Result<Duration, ChaosError> {
    match spec {
        Some(spec) => spec.resolve_with(rng),
        None => Ok(Duration::from_millis(
            rng.random_range(DEFAULT_DELAY_MIN_MS..=DEFAULT_DELAY_MAX_MS),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_uses_default_window() {
        for _ in 0..200 {
            let delay = resolve_delay(None).unwrap();
            assert!(delay >= Duration::from_millis(DEFAULT_DELAY_MIN_MS));
            assert!(delay <= Duration::from_millis(DEFAULT_DELAY_MAX_MS));
        }
    }

    #[test]
    fn test_fixed_is_unchanged() {
        let spec = DelaySpec::Fixed(250);
        assert_eq!(resolve_delay(Some(&spec)).unwrap(), Duration::from_millis(250));
        assert_eq!(
            resolve_delay(Some(&DelaySpec::Fixed(0))).unwrap(),
            Duration::ZERO
        );
    }

    #[test]
    fn test_range_is_inclusive() {
        let spec = DelaySpec::Range(10, 12);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            let ms = resolve_delay(Some(&spec)).unwrap().as_millis();
            assert!((10..=12).contains(&ms));
            seen.insert(ms);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_degenerate_range() {
        let spec = DelaySpec::Range(40, 40);
        assert_eq!(resolve_delay(Some(&spec)).unwrap(), Duration::from_millis(40));
    }

    #[test]
    fn test_negative_delay_is_rejected() {
        assert_eq!(
            resolve_delay(Some(&DelaySpec::Fixed(-1))),
            Err(ChaosError::NegativeDelay(-1))
        );
        assert_eq!(
            resolve_delay(Some(&DelaySpec::Range(-5, 10))),
            Err(ChaosError::NegativeDelay(-5))
        );
    }

    #[test]
    fn test_reversed_range_is_rejected() {
        assert_eq!(
            DelaySpec::Range(50, 10).validate(),
            Err(ChaosError::InvalidDelayRange { min: 50, max: 10 })
        );
    }

    #[test]
    fn test_deserialize_shapes() {
        #[derive(Deserialize)]
        struct Holder {
            delay: DelaySpec,
        }
        let fixed: Holder = toml::from_str("delay = 250").unwrap();
        assert_eq!(fixed.delay, DelaySpec::Fixed(250));
        let range: Holder = toml::from_str("delay = [100, 400]").unwrap();
        assert_eq!(range.delay, DelaySpec::Range(100, 400));
    }
}
