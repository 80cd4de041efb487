use std::iter;
use std::thread;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::{Observation, Primitive, Role, SharedState};

/// Runs `readers` reader units and `writers` writer units of `primitive` concurrently, each for
/// `iterations` iterations, and waits for all of them to report completion.
///
/// Every unit is its own thread and reports completion exactly once, when its loop returns.
/// The returned duration spans from just before the first unit is spawned to just after the
/// last completion report arrives.
///
/// There is no timeout. If a unit can never finish (e.g. channel readers without writers),
/// neither does this function.
///
/// # Panics
///
/// Panics if a unit panics, which leaves its completion unreported.
pub fn run_units(
    primitive: Primitive,
    state: &SharedState,
    readers: usize,
    writers: usize,
    iterations: u64,
) -> RunSummary {
    let unit_count = readers
        .checked_add(writers)
        .expect("unit count overflowing usize cannot be scheduled");

    let (done_txs, done_rxs): (Vec<_>, Vec<_>) =
        iter::repeat_with(oneshot::channel::<UnitReport>)
            .take(unit_count)
            .unzip();

    let roles = iter::repeat_n(Role::Reader, readers).chain(iter::repeat_n(Role::Writer, writers));

    thread::scope(|s| {
        let start_time = Instant::now();

        for (unit_index, (role, done_tx)) in roles.zip(done_txs).enumerate() {
            s.spawn(move || {
                let observation = role.perform(primitive, state, iterations);

                trace!(%primitive, %role, unit_index, iterations, "unit finished");

                done_tx
                    .send(UnitReport {
                        role,
                        iterations,
                        observation,
                    })
                    .expect("orchestrator keeps every receiver until its unit reports");
            });
        }

        let reports = done_rxs
            .into_iter()
            .map(|done_rx| {
                done_rx
                    .recv()
                    .expect("unit exited without reporting completion - did it panic?")
            })
            .collect::<Box<[_]>>();

        let elapsed = start_time.elapsed();

        RunSummary { elapsed, reports }
    })
}

/// What one unit reported when it finished.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UnitReport {
    role: Role,
    iterations: u64,
    observation: Option<Observation>,
}

impl UnitReport {
    /// Whether the unit was a reader or a writer.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Iterations the unit executed.
    #[must_use]
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// What a reader observed. Always `None` for writers.
    #[must_use]
    pub fn observation(&self) -> Option<Observation> {
        self.observation
    }
}

/// Outcome of one [`run_units()`] call.
#[derive(Debug)]
#[must_use = "the elapsed time is the whole point of running the units"]
pub struct RunSummary {
    elapsed: Duration,
    reports: Box<[UnitReport]>,
}

impl RunSummary {
    /// Wall-clock time from spawning the first unit to the last completion report.
    #[must_use]
    #[cfg_attr(test, mutants::skip)] // Real timing logic in tests is not desirable.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// One report per unit, in completion-wait order (readers before writers).
    pub fn unit_reports(&self) -> impl Iterator<Item = &UnitReport> {
        self.reports.iter()
    }

    /// Iterations executed by all units together.
    #[must_use]
    pub fn completed_iterations(&self) -> u64 {
        self.iterations_of(|_| true)
    }

    /// Iterations executed by writer units.
    #[must_use]
    pub fn writer_iterations(&self) -> u64 {
        self.iterations_of(|role| role == Role::Writer)
    }

    /// Iterations executed by reader units.
    #[must_use]
    pub fn reader_iterations(&self) -> u64 {
        self.iterations_of(|role| role == Role::Reader)
    }

    /// Wrapping sum of every value received by channel readers.
    #[must_use]
    pub fn observed_sum(&self) -> u64 {
        self.reports
            .iter()
            .filter_map(UnitReport::observation)
            .fold(0, |sum, observation| sum.wrapping_add(observation.sum()))
    }

    fn iterations_of(&self, mut include: impl FnMut(Role) -> bool) -> u64 {
        self.reports
            .iter()
            .filter(|report| include(report.role))
            .fold(0, |total, report| total.saturating_add(report.iterations))
    }
}
