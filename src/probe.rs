/*!
 * Probe: run a synthetic call through the gateway many times and tally outcomes
 *
 * Useful for checking a set of options before pointing them at real code:
 * how often does it fail, which kinds come up, which error values and exit
 * reasons get picked.
 */

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use havoc_core_chaos::{
    catch_exit, dispatch, ChaosError, FailureKind, Injector, InvocationOptions,
};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use crate::error::{HavocError, Result};

/// Error type of the probed call
///
/// Configured error values come back as `Returned`, configured raised errors
/// as `Raised`, and engine-made failures as `Chaos`.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeFault {
    Returned(String),
    Raised(String),
    Chaos(ChaosError),
}

impl From<ChaosError> for ProbeFault {
    fn from(err: ChaosError) -> Self {
        ProbeFault::Chaos(err)
    }
}

impl fmt::Display for ProbeFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeFault::Returned(value) | ProbeFault::Raised(value) => write!(f, "{}", value),
            ProbeFault::Chaos(err) => write!(f, "{}", err),
        }
    }
}

/// What to probe
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    /// Number of calls to make
    pub trials: usize,

    /// Worker threads (0 = one per core)
    pub workers: usize,

    /// Options for the probed call
    pub options: InvocationOptions<String>,
}

impl Default for ProbeRequest {
    fn default() -> Self {
        Self {
            trials: 1_000,
            workers: 0,
            options: InvocationOptions::new(),
        }
    }
}

/// Result of one trial
enum Trial {
    Passed,
    Injected(FailureKind, Outcome),
    Misconfigured(ChaosError),
}

enum Outcome {
    Ran,
    Null,
    Returned(String),
    Raised(String),
    Exited(String),
}

impl ProbeRequest {
    pub fn new(trials: usize, options: InvocationOptions<String>) -> Self {
        Self {
            trials,
            options,
            ..Default::default()
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Run every trial through `injector` and tally the outcomes
    pub fn run(&self, injector: &Injector) -> Result<ProbeReport> {
        self.options.validate()?;
        let options = self.fault_options();
        let rate = options
            .failure_rate
            .unwrap_or_else(|| injector.config().snapshot().default_failure_rate);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|e| HavocError::Probe(format!("failed to start worker pool: {}", e)))?;

        tracing::info!(trials = self.trials, rate, "starting probe");
        let start = Instant::now();
        let trials: Vec<Trial> = pool.install(|| {
            (0..self.trials)
                .into_par_iter()
                .map(|n| run_trial(injector, &options, n))
                .collect()
        });
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let mut report = ProbeReport {
            trials: self.trials,
            failure_rate: rate,
            elapsed_ms,
            ..Default::default()
        };
        for trial in trials {
            report.record(trial)?;
        }
        tracing::info!(
            failures = report.failures(),
            observed = report.observed_ratio(),
            elapsed_ms,
            "probe finished"
        );
        Ok(report)
    }

    /// The request's options with error values tagged by origin
    fn fault_options(&self) -> InvocationOptions<ProbeFault> {
        let returned = self.options.errors.clone();
        let mut options = self.options.clone().map_errors(ProbeFault::Raised);
        options.errors = returned.map(|errors| errors.map(ProbeFault::Returned));
        if options.function.is_none() {
            options = options.with_caller("havoc::probe", "synthetic");
        }
        options
    }
}

fn run_trial(injector: &Injector, options: &InvocationOptions<ProbeFault>, n: usize) -> Trial {
    let kind = match injector.decide(options) {
        Ok(Some(kind)) => kind,
        Ok(None) => return Trial::Passed,
        Err(err) => return Trial::Misconfigured(err),
    };

    let outcome = match catch_exit(|| dispatch(kind, || Ok::<_, ProbeFault>(n), options)) {
        Err(exit) => Outcome::Exited(exit.reason),
        Ok(Ok(Some(_))) => Outcome::Ran,
        Ok(Ok(None)) => Outcome::Null,
        Ok(Err(ProbeFault::Returned(value))) => Outcome::Returned(value),
        Ok(Err(ProbeFault::Raised(value))) => Outcome::Raised(value),
        Ok(Err(ProbeFault::Chaos(ChaosError::Sentinel))) => {
            Outcome::Returned(ChaosError::Sentinel.to_string())
        }
        Ok(Err(ProbeFault::Chaos(ChaosError::Failure(failure)))) => {
            Outcome::Raised(failure.message)
        }
        Ok(Err(ProbeFault::Chaos(err))) => return Trial::Misconfigured(err),
    };
    Trial::Injected(kind, outcome)
}

/// Tallied outcomes of a probe run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProbeReport {
    pub trials: usize,

    /// Failure rate in effect for the run
    pub failure_rate: f64,

    /// Calls that were not selected for failure
    pub passed: usize,

    /// Triggered failures, by kind
    pub by_kind: BTreeMap<FailureKind, usize>,

    /// Values handed back by `Error`
    pub error_values: BTreeMap<String, usize>,

    /// Errors raised by `Raise` and `Timeout`
    pub raised: BTreeMap<String, usize>,

    /// Reasons given by `Exit`
    pub exits: BTreeMap<String, usize>,

    /// `Null` outcomes
    pub nulls: usize,

    /// Delayed calls that still returned the operation's result
    pub delayed: usize,

    pub elapsed_ms: u64,
}

impl ProbeReport {
    fn record(&mut self, trial: Trial) -> Result<()> {
        let (kind, outcome) = match trial {
            Trial::Passed => {
                self.passed += 1;
                return Ok(());
            }
            Trial::Misconfigured(err) => return Err(err.into()),
            Trial::Injected(kind, outcome) => (kind, outcome),
        };

        *self.by_kind.entry(kind).or_insert(0) += 1;
        match outcome {
            Outcome::Ran => self.delayed += 1,
            Outcome::Null => self.nulls += 1,
            Outcome::Returned(value) => *self.error_values.entry(value).or_insert(0) += 1,
            Outcome::Raised(value) => *self.raised.entry(value).or_insert(0) += 1,
            Outcome::Exited(reason) => *self.exits.entry(reason).or_insert(0) += 1,
        }
        Ok(())
    }

    /// Number of calls the gate selected for failure
    pub fn failures(&self) -> usize {
        self.by_kind.values().sum()
    }

    pub fn observed_ratio(&self) -> f64 {
        if self.trials == 0 {
            return 0.0;
        }
        self.failures() as f64 / self.trials as f64
    }

    /// Failure-count band of four binomial standard deviations around the mean
    pub fn expected_band(&self) -> (usize, usize) {
        let n = self.trials as f64;
        let p = self.failure_rate.clamp(0.0, 1.0);
        let mean = n * p;
        let spread = 4.0 * (n * p * (1.0 - p)).sqrt();
        let low = (mean - spread).max(0.0).floor() as usize;
        let high = (mean + spread).min(n).ceil() as usize;
        (low, high)
    }

    /// Whether the failure count landed inside [`expected_band`](Self::expected_band)
    pub fn within_expected_band(&self) -> bool {
        let (low, high) = self.expected_band();
        (low..=high).contains(&self.failures())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render as a table for the terminal
    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Outcome")
                    .fg(Color::Cyan)
                    .add_attribute(Attribute::Bold),
                Cell::new("Count")
                    .fg(Color::Cyan)
                    .add_attribute(Attribute::Bold),
            ]);

        let (low, high) = self.expected_band();
        let band_color = if self.within_expected_band() {
            Color::Green
        } else {
            Color::Yellow
        };

        table.add_row(vec![Cell::new("trials"), Cell::new(self.trials)]);
        table.add_row(vec![Cell::new("passed"), Cell::new(self.passed)]);
        table.add_row(vec![
            Cell::new("failures"),
            Cell::new(format!(
                "{} ({:.2}% observed, {:.2}% configured)",
                self.failures(),
                self.observed_ratio() * 100.0,
                self.failure_rate * 100.0
            )),
        ]);
        table.add_row(vec![
            Cell::new("expected band"),
            Cell::new(format!("{}..={}", low, high)).fg(band_color),
        ]);
        for (kind, count) in &self.by_kind {
            table.add_row(vec![Cell::new(format!("  kind: {}", kind)), Cell::new(count)]);
        }
        for (value, count) in &self.error_values {
            table.add_row(vec![Cell::new(format!("  error: {}", value)), Cell::new(count)]);
        }
        for (value, count) in &self.raised {
            table.add_row(vec![Cell::new(format!("  raised: {}", value)), Cell::new(count)]);
        }
        for (reason, count) in &self.exits {
            table.add_row(vec![Cell::new(format!("  exit: {}", reason)), Cell::new(count)]);
        }
        table.add_row(vec![
            Cell::new("elapsed"),
            Cell::new(format!("{} ms", self.elapsed_ms)),
        ]);
        table
    }
}
