#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))] // This is all test code, no need to test it.

//! Private helpers for testing sync_bench.
//!
//! Benchmark units block on locks and channels without any timeout, so a regression in the
//! harness tends to show up as a hang rather than a failure. These helpers turn hangs into
//! test failures, and prove hangs where blocking forever is the expected outcome.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// How long [`with_watchdog()`] lets a test run before failing it.
pub const WATCHDOG_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs `test_fn` on its own thread and fails if it does not finish within
/// [`WATCHDOG_TIMEOUT`].
///
/// Panics from `test_fn` are resumed on the calling thread, so assertions inside the closure
/// fail the test as usual.
///
/// When the `MUTATION_TESTING` environment variable is "1" the watchdog is bypassed, so that
/// mutation testing can detect mutations that cause hangs through its own timeout.
///
/// # Panics
///
/// Panics if the timeout expires. The hung thread is left behind.
///
/// # Example
///
/// ```rust
/// use testing::with_watchdog;
///
/// let answer = with_watchdog(|| 6 * 7);
/// assert_eq!(answer, 42);
/// ```
pub fn with_watchdog<F, R>(test_fn: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    if std::env::var("MUTATION_TESTING").as_deref() == Ok("1") {
        return test_fn();
    }

    let (tx, rx) = mpsc::channel();

    let test_thread = thread::spawn(move || {
        // The receiver is gone if the watchdog already gave up.
        drop(tx.send(test_fn()));
    });

    match rx.recv_timeout(WATCHDOG_TIMEOUT) {
        Ok(result) => {
            test_thread.join().expect("test thread already produced its result");
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            panic!("test did not finish within {WATCHDOG_TIMEOUT:?} - is a benchmark unit stuck?")
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => match test_thread.join() {
            Ok(()) => panic!("test thread exited without producing a result"),
            Err(panic) => std::panic::resume_unwind(panic),
        },
    }
}

/// Asserts that `blocking_fn` is still running after `window` has passed.
///
/// The closure runs on a detached thread that is never joined, so anything it blocks on stays
/// blocked until the test process exits.
///
/// # Panics
///
/// Panics if `blocking_fn` returns or panics within `window`.
pub fn assert_blocks<F>(window: Duration, blocking_fn: F)
where
    F: FnOnce() + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<()>();

    // If the closure panics, `tx` is dropped unsent and the wait below sees a disconnect.
    thread::spawn(move || {
        blocking_fn();
        drop(tx.send(()));
    });

    match rx.recv_timeout(window) {
        Err(mpsc::RecvTimeoutError::Timeout) => {}
        Ok(()) => panic!("expected the closure to block, but it returned within {window:?}"),
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            panic!("expected the closure to block, but it panicked within {window:?}")
        }
    }
}
