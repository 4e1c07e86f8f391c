/*!
 * Configuration types for Havoc
 *
 * A config file has three parts: the global `[chaos]` settings, `[logging]`,
 * and any number of `[[functions]]` profiles giving per-function options.
 *
 * ```toml
 * [chaos]
 * enabled = true
 * default_failure_rate = 0.1
 * default_failure_type = "error"
 *
 * [logging]
 * log_level = "info"
 *
 * [[functions]]
 * module = "billing"
 * function = "charge"
 * failure_rate = 0.25
 * failure_types = ["timeout", "raise"]
 * raised_error = "gateway unavailable"
 * delay = [100, 400]
 * ```
 */

use havoc_core_chaos::{ChaosConfig, ChaosSettings, DelaySpec, FailureKind, InvocationOptions};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{HavocError, Result};

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HavocConfig {
    /// Global injection settings
    #[serde(default)]
    pub chaos: ChaosSettings,

    /// Diagnostic output
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Per-function injection profiles
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<FunctionProfile>,
}

/// Logging section of the config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level for diagnostic output
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log file path (None = stderr)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging (shorthand for log_level = debug)
    #[serde(default)]
    pub verbose: bool,
}

/// Injection options for one named function
///
/// Error values are plain strings here; the registry converts them into the
/// application's error type when the profile is registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionProfile {
    /// Owning module, as reported by `module_path!()`
    pub module: String,

    /// Function name
    pub function: String,

    #[serde(flatten)]
    pub options: InvocationOptions<String>,
}

impl FunctionProfile {
    pub fn new(module: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            function: function.into(),
            options: InvocationOptions::new(),
        }
    }

    pub fn with_options(mut self, options: InvocationOptions<String>) -> Self {
        self.options = options;
        self
    }

    /// `module::function`
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.module, self.function)
    }
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    Warn,

    /// Info, warnings, and errors
    #[default]
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

impl HavocConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: HavocConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Check settings and every profile, and reject repeated functions
    pub fn validate(&self) -> Result<()> {
        self.chaos.validate()?;

        let mut seen = HashSet::new();
        for profile in &self.functions {
            let name = profile.qualified_name();
            profile.options.validate().map_err(|e| {
                HavocError::Config(format!("invalid options for {}: {}", name, e))
            })?;
            if !seen.insert(name.clone()) {
                return Err(HavocError::DuplicateFunction(name));
            }
        }
        Ok(())
    }

    /// Push the `[chaos]` section into a live store
    ///
    /// The store keeps its previous settings if validation fails.
    pub fn reload_into(&self, store: &ChaosConfig) -> Result<()> {
        store.update(self.chaos.clone())?;
        Ok(())
    }

    /// A small, disabled starter config written by `havoc init`
    pub fn starter() -> Self {
        let example = FunctionProfile::new("app::billing", "charge").with_options(
            InvocationOptions::new()
                .with_failure_rate(0.25)
                .with_failure_types(vec![FailureKind::Timeout, FailureKind::Raise])
                .with_raised_error("payment gateway unavailable".to_string())
                .with_delay(DelaySpec::Range(100, 400)),
        );

        Self {
            chaos: ChaosSettings::default(),
            logging: LoggingConfig::default(),
            functions: vec![example],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use havoc_core_chaos::{ChaosError, OneOrMany};

    #[test]
    fn test_default_config() {
        let config = HavocConfig::default();
        assert!(!config.chaos.enabled);
        assert_eq!(config.chaos.default_failure_rate, 0.1);
        assert_eq!(config.logging.log_level, LogLevel::Info);
        assert!(config.functions.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: HavocConfig = toml::from_str("").unwrap();
        assert_eq!(config, HavocConfig::default());
    }

    #[test]
    fn test_readme_config_example() {
        let toml_str = r#"
[chaos]
enabled = true
default_failure_rate = 0.05
default_failure_types = ["error", "null"]

[logging]
log_level = "debug"
verbose = false

[[functions]]
module = "billing"
function = "charge"
failure_rate = 0.25
failure_type = "timeout"
raised_error = "gateway unavailable"
delay = [100, 400]

[[functions]]
module = "users"
function = "load"
errors = ["not found", "locked"]
exit_error = "oom"
"#;
        let config: HavocConfig = toml::from_str(toml_str).unwrap();
        assert!(config.chaos.enabled);
        assert_eq!(config.chaos.default_failure_types.len(), 2);
        assert_eq!(config.logging.log_level, LogLevel::Debug);
        assert_eq!(config.functions.len(), 2);

        let charge = &config.functions[0];
        assert_eq!(charge.qualified_name(), "billing::charge");
        assert_eq!(charge.options.failure_rate, Some(0.25));
        assert_eq!(
            charge.options.failure_types,
            Some(OneOrMany::One(FailureKind::Timeout))
        );
        assert_eq!(charge.options.delay, Some(DelaySpec::Range(100, 400)));

        let load = &config.functions[1];
        assert_eq!(load.options.errors.as_ref().map(OneOrMany::len), Some(2));
        assert_eq!(
            load.options.exit_reasons,
            Some(OneOrMany::One("oom".to_string()))
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_rate() {
        let mut config = HavocConfig::default();
        config.chaos.default_failure_rate = 1.5;
        assert!(matches!(
            config.validate(),
            Err(HavocError::Chaos(ChaosError::InvalidRate(_)))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_profile() {
        let mut config = HavocConfig::default();
        config.functions.push(
            FunctionProfile::new("jobs", "run")
                .with_options(InvocationOptions::new().with_delay(DelaySpec::Range(9, 3))),
        );
        match config.validate() {
            Err(HavocError::Config(msg)) => assert!(msg.contains("jobs::run")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let mut config = HavocConfig::default();
        config.functions.push(FunctionProfile::new("jobs", "run"));
        config.functions.push(FunctionProfile::new("jobs", "run"));
        assert!(matches!(
            config.validate(),
            Err(HavocError::DuplicateFunction(name)) if name == "jobs::run"
        ));
    }

    #[test]
    fn test_reload_into() {
        let store = ChaosConfig::disabled();
        let mut config = HavocConfig::default();
        config.chaos = ChaosSettings::enabled().with_default_failure_rate(0.4);
        config.reload_into(&store).unwrap();
        assert!(store.is_enabled());
        assert_eq!(store.snapshot().default_failure_rate, 0.4);

        config.chaos.default_failure_rate = -1.0;
        assert!(config.reload_into(&store).is_err());
        assert_eq!(store.snapshot().default_failure_rate, 0.4);
    }

    #[test]
    fn test_starter_round_trips() {
        let starter = HavocConfig::starter();
        assert!(!starter.chaos.enabled);
        assert!(starter.validate().is_ok());

        let text = toml::to_string_pretty(&starter).unwrap();
        let parsed: HavocConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, starter);
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(LogLevel::Error.to_tracing_level(), tracing::Level::ERROR);
        assert_eq!(LogLevel::Warn.to_tracing_level(), tracing::Level::WARN);
        assert_eq!(LogLevel::Info.to_tracing_level(), tracing::Level::INFO);
        assert_eq!(LogLevel::Debug.to_tracing_level(), tracing::Level::DEBUG);
        assert_eq!(LogLevel::Trace.to_tracing_level(), tracing::Level::TRACE);
    }
}
