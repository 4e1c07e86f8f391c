//! Abrupt termination for the `Exit` kind
//!
//! `Exit` unwinds the calling thread (or the task driving an async call) with
//! a [`ChaosExit`] payload. Nothing in this crate converts it into an error
//! value; only a supervising boundary such as [`catch_exit`], a thread join, or
//! a tokio `JoinHandle` observes it.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// Reason used by the `Exit` kind when the caller supplies none
pub const DEFAULT_EXIT_REASON: &str = "chaos_monkey_exit";

/// Panic payload carried by an injected `Exit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChaosExit {
    /// Termination reason
    pub reason: String,
    /// Wrapped function name, when known
    pub function: Option<String>,
    /// Owning module name, when known
    pub module: Option<String>,
}

impl ChaosExit {
    /// Create an exit payload with no caller identity
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            function: None,
            module: None,
        }
    }

    /// Attach the identity of the function that exited
    pub fn with_caller(mut self, module: Option<String>, function: Option<String>) -> Self {
        self.module = module;
        self.function = function;
        self
    }

    /// Unwind the current thread with this payload
    pub fn raise(self) -> ! {
        panic::panic_any(self)
    }

    /// Recover a `ChaosExit` from a caught panic payload
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Result<ChaosExit, Box<dyn Any + Send>> {
        payload.downcast::<ChaosExit>().map(|exit| *exit)
    }
}

impl fmt::Display for ChaosExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chaos exit: {}", self.reason)?;
        match (&self.module, &self.function) {
            (Some(module), Some(function)) => write!(f, " (in {}.{})", module, function),
            (None, Some(function)) => write!(f, " (in {})", function),
            _ => Ok(()),
        }
    }
}

/// Run `f`, turning an injected `Exit` into `Err`
///
/// Any other panic keeps unwinding.
///
/// # Example
/// ```
/// use havoc_core_chaos::exit::{catch_exit, ChaosExit};
///
/// let result: Result<(), ChaosExit> = catch_exit(|| ChaosExit::new("killed").raise());
/// assert_eq!(result.unwrap_err().reason, "killed");
/// ```
pub fn catch_exit<F, R>(f: F) -> Result<R, ChaosExit>
where
    F: FnOnce() -> R,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Ok(value),
        Err(payload) => match ChaosExit::from_panic(payload) {
            Ok(exit) => Err(exit),
            Err(other) => panic::resume_unwind(other),
        },
    }
}

/// Install a panic hook that stays silent for injected exits
///
/// Other panics are reported by whichever hook was installed before.
pub fn silence_exit_reports() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        if info.payload().downcast_ref::<ChaosExit>().is_none() {
            previous(info);
        }
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catch_exit_returns_payload() {
        let exit = ChaosExit::new("shutdown")
            .with_caller(Some("jobs".to_string()), Some("run".to_string()));
        let caught = catch_exit(move || -> u32 { exit.raise() }).unwrap_err();
        assert_eq!(caught.reason, "shutdown");
        assert_eq!(caught.module.as_deref(), Some("jobs"));
    }

    #[test]
    fn test_catch_exit_passes_values_through() {
        assert_eq!(catch_exit(|| 41 + 1), Ok(42));
    }

    #[test]
    fn test_catch_exit_resumes_other_panics() {
        let outer = panic::catch_unwind(|| {
            let _ = catch_exit(|| panic!("real bug"));
        });
        let payload = outer.unwrap_err();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"real bug"));
    }

    #[test]
    fn test_exit_terminates_only_its_thread() {
        let handle = std::thread::spawn(|| -> u8 { ChaosExit::new("bye").raise() });
        let payload = handle.join().unwrap_err();
        let exit = ChaosExit::from_panic(payload).unwrap();
        assert_eq!(exit.reason, "bye");
    }

    #[test]
    fn test_display() {
        let exit = ChaosExit::new("killed")
            .with_caller(Some("db".to_string()), Some("query".to_string()));
        assert_eq!(exit.to_string(), "chaos exit: killed (in db.query)");
        assert_eq!(ChaosExit::new("x").to_string(), "chaos exit: x");
    }
}
