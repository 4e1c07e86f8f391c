//! Random gate: a Bernoulli trial against a failure rate
//!
//! Each call is an independent draw from the thread-local RNG, so concurrent
//! callers never share a counter or a lock.

use crate::error::ChaosError;
use rand::Rng;

/// Roll the gate with the thread-local RNG
///
/// Rates at or below `0.0` never fail and rates at or above `1.0` always
/// fail without consuming entropy. `NaN` is rejected.
///
/// # Example
/// ```
/// use havoc_core_chaos::gate::should_fail;
///
/// assert!(!should_fail(0.0).unwrap());
/// assert!(should_fail(1.0).unwrap());
/// assert!(should_fail(f64::NAN).is_err());
/// ```
pub fn should_fail(rate: f64) -> Result<bool, ChaosError> {
    should_fail_with(&mut rand::rng(), rate)
}

/// Roll the gate with the given RNG
pub fn should_fail_with<R: Rng>(rng: &mut R, rate: f64) -> Result<bool, ChaosError> {
    if rate.is_nan() {
        return Err(ChaosError::InvalidRate(rate));
    }
    if rate <= 0.0 {
        return Ok(false);
    }
    if rate >= 1.0 {
        return Ok(true);
    }
    Ok(rng.random::<f64>() < rate)
}

/// Check that a configured rate is a finite number in `[0, 1]`
pub fn validate_rate(rate: f64) -> Result<f64, ChaosError> {
    if rate.is_finite() && (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(ChaosError::InvalidRate(rate))
    }
}
