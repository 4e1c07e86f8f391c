/*!
 * Havoc CLI - Command Line Interface
 *
 * Probe a set of injection options, check a config file, or write a starter
 * config.
 *
 * Author: Shane Wall <shaneawall@gmail.com>
 */

use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use havoc::{
    chaos::{
        exit::silence_exit_reports, ChaosConfig, ChaosSettings, DelaySpec, FailureKind, Injector,
        InvocationOptions, OneOrMany,
    },
    config::{HavocConfig, LogLevel},
    error::{HavocError, Result, EXIT_SUCCESS},
    logging,
    probe::ProbeRequest,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "havoc")]
#[command(version, about = "Chaos-monkey failure injection: probe options and manage config files", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); overrides the config file
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevelArg>,

    /// Path to log file (default: stderr)
    #[arg(long, value_name = "FILE", global = true)]
    log: Option<PathBuf>,

    /// Enable verbose logging (equivalent to --log-level=debug)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a synthetic call through the injector many times and tally the outcomes
    ///
    /// Injection is switched on for the probe even if the config file has it
    /// off; other `[chaos]` defaults are taken from the config.
    Probe {
        /// Start from the options of a `[[functions]]` profile (module::function)
        #[arg(long, value_name = "MODULE::FUNCTION")]
        function: Option<String>,

        /// Failure probability in [0, 1]
        #[arg(short, long)]
        rate: Option<f64>,

        /// Failure kinds to pick from (error, raise, delay, timeout, null, exit)
        #[arg(short = 't', long = "type", value_delimiter = ',')]
        types: Vec<FailureKind>,

        /// Error values for the `error` kind (repeatable)
        #[arg(long = "error")]
        errors: Vec<String>,

        /// Errors for the `raise` and `timeout` kinds (repeatable)
        #[arg(long = "raised")]
        raised: Vec<String>,

        /// Reasons for the `exit` kind (repeatable)
        #[arg(long = "exit")]
        exits: Vec<String>,

        /// Delay in milliseconds: `250` or a range `100..400`
        #[arg(long, value_parser = parse_delay)]
        delay: Option<DelaySpec>,

        /// Message for the default raised failure
        #[arg(long)]
        message: Option<String>,

        /// Number of calls
        #[arg(short = 'n', long, default_value = "1000")]
        trials: usize,

        /// Worker threads (0 = one per core)
        #[arg(short, long, default_value = "0")]
        workers: usize,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load and validate a config file, then print its settings and profiles
    Check,

    /// Write a starter config file
    Init {
        /// Where to write the file
        #[arg(short, long, default_value = "havoc.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LogLevel {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Trace => LogLevel::Trace,
        }
    }
}

/// Parse `250` as a fixed delay and `100..400` as a range
fn parse_delay(s: &str) -> std::result::Result<DelaySpec, String> {
    let parse_ms = |part: &str| {
        part.trim()
            .parse::<i64>()
            .map_err(|e| format!("invalid delay {:?}: {}", part, e))
    };
    let spec = match s.split_once("..") {
        Some((min, max)) => DelaySpec::Range(parse_ms(min)?, parse_ms(max.trim_start_matches('='))?),
        None => DelaySpec::Fixed(parse_ms(s)?),
    };
    spec.validate().map_err(|e| e.to_string())?;
    Ok(spec)
}

fn main() {
    let code = match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Some(hint) = error_hint(&e) {
                eprintln!("Hint: {}", hint);
            }
            e.exit_code()
        }
    };
    std::process::exit(code);
}

/// Follow-up advice printed under an error, if any
fn error_hint(err: &HavocError) -> Option<&'static str> {
    err.is_configuration()
        .then_some("run `havoc --config <FILE> check` to validate a config file")
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => HavocConfig::from_file(path)?,
        None => HavocConfig::default(),
    };

    let mut log_config = config.logging.clone();
    if let Some(level) = cli.log_level {
        log_config.log_level = level.into();
    }
    if cli.log.is_some() {
        log_config.log_file = cli.log.clone();
    }
    log_config.verbose |= cli.verbose;
    if let Err(e) = logging::init_logging(&log_config) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    match cli.command {
        Commands::Probe {
            function,
            rate,
            types,
            errors,
            raised,
            exits,
            delay,
            message,
            trials,
            workers,
            json,
        } => {
            let mut options = match function {
                Some(ref name) => profile_options(&config, name)?,
                None => InvocationOptions::new(),
            };
            if let Some(rate) = rate {
                options = options.with_failure_rate(rate);
            }
            if !types.is_empty() {
                options.failure_types = Some(one_or_many(types));
            }
            if !errors.is_empty() {
                options.errors = Some(one_or_many(errors));
            }
            if !raised.is_empty() {
                options.raised_errors = Some(one_or_many(raised));
            }
            if !exits.is_empty() {
                options.exit_reasons = Some(one_or_many(exits));
            }
            if let Some(delay) = delay {
                options = options.with_delay(delay);
            }
            if let Some(message) = message {
                options = options.with_message(message);
            }

            let request = ProbeRequest::new(trials, options).with_workers(workers);
            handle_probe(&config, &request, json)
        }
        Commands::Check => {
            let path = cli.config.as_deref().ok_or_else(|| {
                HavocError::Config("check needs a config file (--config)".to_string())
            })?;
            handle_check(path, &config)
        }
        Commands::Init { output, force } => handle_init(&output, force),
    }
}

fn one_or_many<T>(mut values: Vec<T>) -> OneOrMany<T> {
    if values.len() == 1 {
        if let Some(value) = values.pop() {
            return OneOrMany::One(value);
        }
    }
    OneOrMany::Many(values)
}

fn profile_options(config: &HavocConfig, name: &str) -> Result<InvocationOptions<String>> {
    config
        .functions
        .iter()
        .find(|profile| profile.qualified_name() == name)
        .map(|profile| {
            profile
                .options
                .clone()
                .with_caller(profile.module.clone(), profile.function.clone())
        })
        .ok_or_else(|| HavocError::Config(format!("no profile for function {}", name)))
}

fn handle_probe(config: &HavocConfig, request: &ProbeRequest, json: bool) -> Result<()> {
    let settings = ChaosSettings {
        enabled: true,
        ..config.chaos.clone()
    };
    let injector = Injector::new(Arc::new(ChaosConfig::new(settings)?));

    silence_exit_reports();
    let report = request.run(&injector)?;

    if json {
        println!("{}", report.to_json()?);
    } else {
        println!("{}", report.to_table());
        if !report.within_expected_band() {
            let (low, high) = report.expected_band();
            eprintln!(
                "Warning: {} failures is outside the expected band {}..={}",
                report.failures(),
                low,
                high
            );
        }
    }
    Ok(())
}

fn handle_check(path: &Path, config: &HavocConfig) -> Result<()> {
    config.validate()?;

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Function")
                .fg(Color::Cyan)
                .add_attribute(Attribute::Bold),
            Cell::new("Rate")
                .fg(Color::Cyan)
                .add_attribute(Attribute::Bold),
            Cell::new("Kinds")
                .fg(Color::Cyan)
                .add_attribute(Attribute::Bold),
        ]);

    table.add_row(vec![
        Cell::new("(defaults)").add_attribute(Attribute::Italic),
        Cell::new(config.chaos.default_failure_rate),
        Cell::new(kinds_label(&config.chaos.default_failure_types)),
    ]);
    for profile in &config.functions {
        let rate = profile
            .options
            .failure_rate
            .map(|rate| rate.to_string())
            .unwrap_or_else(|| "default".to_string());
        let kinds = profile
            .options
            .failure_types
            .as_ref()
            .map(kinds_label)
            .unwrap_or_else(|| "default".to_string());
        table.add_row(vec![
            Cell::new(profile.qualified_name()),
            Cell::new(rate),
            Cell::new(kinds),
        ]);
    }

    println!(
        "{}: valid, injection {}",
        path.display(),
        if config.chaos.enabled { "enabled" } else { "disabled" }
    );
    println!("{}", table);
    Ok(())
}

fn kinds_label(kinds: &OneOrMany<FailureKind>) -> String {
    kinds
        .iter()
        .map(FailureKind::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn handle_init(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        return Err(HavocError::Config(format!(
            "{} already exists (use --force to overwrite)",
            output.display()
        )));
    }
    HavocConfig::starter().to_file(output)?;
    tracing::info!(path = %output.display(), "wrote starter config");
    println!("Wrote {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_delay() {
        assert_eq!(parse_delay("250"), Ok(DelaySpec::Fixed(250)));
        assert_eq!(parse_delay("100..400"), Ok(DelaySpec::Range(100, 400)));
        assert_eq!(parse_delay("100..=400"), Ok(DelaySpec::Range(100, 400)));
        assert!(parse_delay("-5").is_err());
        assert!(parse_delay("400..100").is_err());
        assert!(parse_delay("soon").is_err());
    }

    #[test]
    fn test_cli_parses_probe() {
        let cli = Cli::try_parse_from([
            "havoc", "probe", "--rate", "0.5", "--type", "error,null", "--error", "a", "--error",
            "b", "--delay", "10..20", "-n", "50",
        ])
        .unwrap();
        match cli.command {
            Commands::Probe {
                rate,
                types,
                errors,
                delay,
                trials,
                ..
            } => {
                assert_eq!(rate, Some(0.5));
                assert_eq!(types, vec![FailureKind::Error, FailureKind::Null]);
                assert_eq!(errors, vec!["a".to_string(), "b".to_string()]);
                assert_eq!(delay, Some(DelaySpec::Range(10, 20)));
                assert_eq!(trials, 50);
            }
            _ => panic!("expected probe"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_kind() {
        assert!(Cli::try_parse_from(["havoc", "probe", "--type", "custom"]).is_err());
    }

    #[test]
    fn test_one_or_many() {
        assert_eq!(one_or_many(vec![1]), OneOrMany::One(1));
        assert_eq!(one_or_many(vec![1, 2]), OneOrMany::Many(vec![1, 2]));
    }

    #[test]
    fn test_profile_options() {
        let config = HavocConfig::starter();
        let options = profile_options(&config, "app::billing::charge").unwrap();
        assert_eq!(options.failure_rate, Some(0.25));
        assert_eq!(options.function.as_deref(), Some("charge"));
        assert!(profile_options(&config, "app::billing::refund").is_err());
    }

    #[test]
    fn test_error_hint_only_for_configuration_errors() {
        use havoc::chaos::ChaosError;

        assert!(error_hint(&HavocError::Config("bad".to_string())).is_some());
        assert!(error_hint(&HavocError::Chaos(ChaosError::InvalidRate(2.0))).is_some());
        assert!(error_hint(&HavocError::Probe("pool".to_string())).is_none());
        assert!(error_hint(&HavocError::Chaos(ChaosError::Sentinel)).is_none());
    }

    #[test]
    fn test_kinds_label() {
        let kinds = OneOrMany::Many(vec![FailureKind::Timeout, FailureKind::Exit]);
        assert_eq!(kinds_label(&kinds), "timeout, exit");
    }
}
