//! End-to-end tests for the injection gateway
//!
//! Drives `Injector` the way an application would: one shared store, several
//! call sites with different options, and both blocking and async callers.

use havoc_core_chaos::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum DbError {
    Deadlock,
    ConnectionReset,
    PoolExhausted,
    Chaos(String),
}

impl From<ChaosError> for DbError {
    fn from(err: ChaosError) -> Self {
        DbError::Chaos(err.to_string())
    }
}

fn injector(settings: ChaosSettings) -> Injector {
    Injector::new(Arc::new(ChaosConfig::new(settings).unwrap()))
}

#[test]
fn test_pass_through_preserves_every_result() {
    let injector = injector(ChaosSettings::default());
    let calls = AtomicUsize::new(0);
    let opts = InvocationOptions::new().with_failure_rate(1.0);

    for i in 0..10_000u32 {
        let result = injector.maybe_inject(
            || {
                calls.fetch_add(1, Ordering::Relaxed);
                if i % 7 == 0 {
                    Err(DbError::Deadlock)
                } else {
                    Ok(i)
                }
            },
            &opts,
        );
        if i % 7 == 0 {
            assert_eq!(result, Err(DbError::Deadlock));
        } else {
            assert_eq!(result, Ok(Some(i)));
        }
    }
    assert_eq!(calls.load(Ordering::Relaxed), 10_000);
}

#[test]
fn test_raise_list_is_covered() {
    let injector = injector(ChaosSettings::enabled());
    let opts = InvocationOptions::new()
        .with_failure_rate(1.0)
        .with_failure_type(FailureKind::Raise)
        .with_raised_errors(vec![
            DbError::Deadlock,
            DbError::ConnectionReset,
            DbError::PoolExhausted,
        ]);

    let mut seen = HashSet::new();
    for _ in 0..300 {
        match injector.maybe_inject(|| Ok::<u8, DbError>(0), &opts) {
            Err(err) => {
                seen.insert(err);
            }
            Ok(value) => panic!("operation should not run, got {:?}", value),
        }
    }
    assert_eq!(seen.len(), 3);
}

#[test]
fn test_timeout_waits_then_fails_without_running() {
    let injector = injector(ChaosSettings::enabled());
    let calls = AtomicUsize::new(0);
    let opts = InvocationOptions::new()
        .with_failure_rate(1.0)
        .with_failure_type(FailureKind::Timeout)
        .with_delay(DelaySpec::Range(20, 40))
        .with_message("query took too long")
        .with_caller("db", "query");

    let start = Instant::now();
    let result = injector.maybe_inject(
        || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<u8, DbError>(1)
        },
        &opts,
    );
    let elapsed = start.elapsed();

    assert!(elapsed >= Duration::from_millis(20));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    match result {
        Err(DbError::Chaos(message)) => {
            assert!(message.contains("query took too long"));
            assert!(message.contains("db.query"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_exit_is_caught_at_the_boundary() {
    havoc_core_chaos::exit::silence_exit_reports();
    let injector = injector(ChaosSettings::enabled());
    let opts = InvocationOptions::<DbError>::new()
        .with_failure_rate(1.0)
        .with_failure_type(FailureKind::Exit)
        .with_exit_reasons(vec!["sigterm", "oom"]);

    let mut reasons = HashSet::new();
    for _ in 0..100 {
        let exit = catch_exit(|| injector.maybe_inject(|| Ok::<u8, DbError>(1), &opts)).unwrap_err();
        reasons.insert(exit.reason);
    }
    assert_eq!(
        reasons,
        HashSet::from(["sigterm".to_string(), "oom".to_string()])
    );
}

#[test]
fn test_shared_injector_across_threads() {
    let injector = injector(ChaosSettings::enabled().with_default_failure_rate(0.5));
    let failures = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let injector = injector.clone();
            let failures = Arc::clone(&failures);
            std::thread::spawn(move || {
                let opts = InvocationOptions::new();
                for _ in 0..1_000 {
                    if injector.maybe_inject(|| Ok::<u8, DbError>(1), &opts).is_err() {
                        failures.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // 8000 trials at p = 0.5: mean 4000, sd ~44.7
    let count = failures.load(Ordering::Relaxed);
    assert!((3_800..=4_200).contains(&count), "failures = {}", count);
}

#[test]
fn test_async_null_on_current_thread_runtime() {
    let injector = injector(ChaosSettings::enabled());
    let opts = InvocationOptions::new()
        .with_failure_rate(1.0)
        .with_failure_type(FailureKind::Null);

    let result = tokio_test::block_on(
        injector.maybe_inject_async(|| async { Ok::<_, DbError>("row") }, &opts),
    );
    assert_eq!(result, Ok(None));
}

#[tokio::test(start_paused = true)]
async fn test_async_default_delay_window() {
    let injector = injector(ChaosSettings::enabled());
    let opts = InvocationOptions::new()
        .with_failure_rate(1.0)
        .with_failure_type(FailureKind::Delay);

    let start = tokio::time::Instant::now();
    let result = injector
        .maybe_inject_async(|| async { Ok::<_, DbError>(5) }, &opts)
        .await;
    let waited = start.elapsed();

    assert_eq!(result, Ok(Some(5)));
    assert!(waited >= Duration::from_millis(1_000));
    assert!(waited <= Duration::from_millis(5_001));
}
