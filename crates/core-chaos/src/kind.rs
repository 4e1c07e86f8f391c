//! The closed set of failure behaviors the dispatcher can produce

use crate::error::ChaosError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Failure behavior materialized for a triggering call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Hand back an error value instead of running the operation
    Error,
    /// Fail with a raised error instead of running the operation
    Raise,
    /// Wait, then run the operation normally
    Delay,
    /// Wait, then fail as `Raise` would, without running the operation
    Timeout,
    /// Hand back an absent result without signaling an error
    Null,
    /// Abruptly terminate the calling thread or task
    Exit,
}

impl FailureKind {
    /// Every kind, in declaration order
    pub const ALL: [FailureKind; 6] = [
        FailureKind::Error,
        FailureKind::Raise,
        FailureKind::Delay,
        FailureKind::Timeout,
        FailureKind::Null,
        FailureKind::Exit,
    ];

    /// Lowercase name used in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Error => "error",
            FailureKind::Raise => "raise",
            FailureKind::Delay => "delay",
            FailureKind::Timeout => "timeout",
            FailureKind::Null => "null",
            FailureKind::Exit => "exit",
        }
    }

    /// Whether the wrapped operation still runs when this kind is dispatched
    pub fn executes_operation(&self) -> bool {
        matches!(self, FailureKind::Delay)
    }

    /// Whether dispatching this kind blocks the caller first
    pub fn waits(&self) -> bool {
        matches!(self, FailureKind::Delay | FailureKind::Timeout)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailureKind {
    type Err = ChaosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        FailureKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| ChaosError::UnknownKind(name.to_string()))
    }
}
