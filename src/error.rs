/*!
 * Error types for Havoc
 */

use havoc_core_chaos::ChaosError;
use std::fmt;
use std::io;

pub type Result<T> = std::result::Result<T, HavocError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_PARTIAL: i32 = 1;
pub const EXIT_FATAL: i32 = 2;

#[derive(Debug)]
pub enum HavocError {
    /// I/O error
    Io(io::Error),

    /// Configuration file could not be read, parsed or written
    Config(String),

    /// Invalid injection settings or options
    Chaos(ChaosError),

    /// A function was registered twice
    DuplicateFunction(String),

    /// A probe run could not complete
    Probe(String),
}

impl HavocError {
    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            HavocError::Config(_) | HavocError::Chaos(_) | HavocError::DuplicateFunction(_) => {
                EXIT_FATAL
            }
            HavocError::Io(_) | HavocError::Probe(_) => EXIT_PARTIAL,
        }
    }

    /// Whether this error means the user's configuration is wrong
    pub fn is_configuration(&self) -> bool {
        match self {
            HavocError::Config(_) | HavocError::DuplicateFunction(_) => true,
            HavocError::Chaos(err) => err.is_misconfiguration(),
            HavocError::Io(_) | HavocError::Probe(_) => false,
        }
    }
}

impl fmt::Display for HavocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HavocError::Io(err) => {
                write!(f, "I/O error: {}", err)
            }
            HavocError::Config(msg) => {
                write!(f, "Configuration error: {}", msg)
            }
            HavocError::Chaos(err) => {
                write!(f, "Chaos settings error: {}", err)
            }
            HavocError::DuplicateFunction(name) => {
                write!(f, "Function already registered: {}", name)
            }
            HavocError::Probe(msg) => {
                write!(f, "Probe failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for HavocError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HavocError::Io(err) => Some(err),
            HavocError::Chaos(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for HavocError {
    fn from(err: io::Error) -> Self {
        HavocError::Io(err)
    }
}

impl From<ChaosError> for HavocError {
    fn from(err: ChaosError) -> Self {
        HavocError::Chaos(err)
    }
}

impl From<serde_json::Error> for HavocError {
    fn from(err: serde_json::Error) -> Self {
        HavocError::Config(format!("JSON error: {}", err))
    }
}

impl From<toml::de::Error> for HavocError {
    fn from(err: toml::de::Error) -> Self {
        HavocError::Config(format!("TOML parse error: {}", err))
    }
}

impl From<toml::ser::Error> for HavocError {
    fn from(err: toml::ser::Error) -> Self {
        HavocError::Config(format!("TOML serialize error: {}", err))
    }
}
