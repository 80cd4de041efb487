use std::fmt;
use std::io::Write;
use std::num::NonZero;
use std::time::Duration;

use num_integer::Integer;
use tracing::{debug, info};

use crate::error::Result;
use crate::{BenchConfig, Layout, Measurement, RunSummary, SharedState, UnitPlan, run_units};

/// Drives a full benchmark: one row per eligible worker count, one measurement per column.
///
/// The benchmark owns the [`SharedState`] that every measurement contends over and resets it
/// before each measurement, so nothing leaks from one measurement into the next.
///
/// # Examples
///
/// ```
/// use sync_bench::{BenchConfig, Benchmark, Layout};
///
/// let config = BenchConfig::with_total_operations(1000, 3, Layout::Mixed).unwrap();
/// let benchmark = Benchmark::new(config);
///
/// let mut report = Vec::new();
/// benchmark.run(&mut report).unwrap();
///
/// let report = String::from_utf8(report).unwrap();
/// assert_eq!(report.lines().count(), 3); // Header plus rows for 1 and 2 workers.
/// ```
#[derive(Debug)]
pub struct Benchmark {
    config: BenchConfig,
    state: SharedState,
}

impl Benchmark {
    /// Creates a benchmark, allocating the shared state it will contend over.
    ///
    /// The bounded channel is sized for the configured operation total up front and reused by
    /// every row.
    #[must_use]
    pub fn new(config: BenchConfig) -> Self {
        Self {
            state: SharedState::new(config.bounded_capacity()),
            config,
        }
    }

    /// The configuration the benchmark runs with.
    #[must_use]
    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// The state contended over by the measurements. After a measurement it still holds that
    /// measurement's final counter values.
    #[must_use]
    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Writes the header followed by one row for every eligible worker count from 1 up to but
    /// excluding the configured maximum.
    ///
    /// Rows are written (and flushed) as soon as they are measured.
    pub fn run(&self, out: &mut impl Write) -> Result<()> {
        let layout = self.config.layout();

        info!(
            total_operations = self.config.total_operations().get(),
            max_workers = self.config.max_workers(),
            ?layout,
            "starting benchmark"
        );

        writeln!(out, "{}", header(layout))?;
        out.flush()?;

        for workers in (1..self.config.max_workers()).filter_map(NonZero::new) {
            if let Some(row) = self.measure_row(workers) {
                writeln!(out, "{row}")?;
                out.flush()?;
            }
        }

        Ok(())
    }

    /// Measures every column of the layout with `workers` workers.
    ///
    /// Returns `None` without measuring anything if `workers` does not evenly divide the
    /// configured operation total.
    #[must_use]
    pub fn measure_row(&self, workers: NonZero<usize>) -> Option<BenchmarkRow> {
        let total_operations = self.config.total_operations().get();
        let divisor =
            u64::try_from(workers.get()).expect("usize always fits in u64 on supported targets");

        let (_, remainder) = total_operations.div_rem(&divisor);
        if remainder != 0 {
            debug!(
                workers = workers.get(),
                total_operations,
                "skipping worker count that does not divide the operation total"
            );
            return None;
        }

        let results = self
            .config
            .layout()
            .measurements()
            .iter()
            .map(|&measurement| self.measure(measurement, workers))
            .collect();

        Some(BenchmarkRow { workers, results })
    }

    /// Resets the shared state and runs a single measurement with `workers` workers.
    #[must_use]
    pub fn measure(&self, measurement: Measurement, workers: NonZero<usize>) -> MeasurementResult {
        let plan = measurement
            .contention()
            .plan(workers, self.config.total_operations());

        self.state.reset();

        let summary = run_units(
            measurement.primitive(),
            &self.state,
            plan.readers(),
            plan.writers(),
            plan.iterations_per_unit(),
        );

        let nanos_per_operation = nanos_per_operation(summary.elapsed(), plan.operations());

        debug!(
            workers = workers.get(),
            column = %measurement.column_name(),
            elapsed = ?summary.elapsed(),
            nanos_per_operation,
            "measurement complete"
        );

        MeasurementResult {
            measurement,
            plan,
            summary,
            nanos_per_operation,
        }
    }
}

/// The header line for `layout`: `Workers` followed by one column name per measurement.
#[must_use]
pub fn header(layout: Layout) -> String {
    let mut line = String::from("Workers");

    for measurement in layout.measurements() {
        line.push('\t');
        line.push_str(&measurement.column_name());
    }

    line
}

#[cfg_attr(test, mutants::skip)] // Difficult to simulate time and therefore set expectations.
fn nanos_per_operation(elapsed: Duration, operations: u64) -> u64 {
    let nanos = elapsed
        .as_nanos()
        .checked_div(u128::from(operations))
        .expect("every measurement has at least one operation");

    u64::try_from(nanos).unwrap_or(u64::MAX)
}

/// One report line: the worker count and the result of every measurement in the layout.
#[derive(Debug)]
pub struct BenchmarkRow {
    workers: NonZero<usize>,
    results: Vec<MeasurementResult>,
}

impl BenchmarkRow {
    /// Worker count the row was measured with.
    #[must_use]
    pub fn workers(&self) -> NonZero<usize> {
        self.workers
    }

    /// Results in report order.
    #[must_use]
    pub fn results(&self) -> &[MeasurementResult] {
        &self.results
    }
}

impl fmt::Display for BenchmarkRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.workers)?;

        for result in &self.results {
            write!(f, "\t{}", result.nanos_per_operation)?;
        }

        Ok(())
    }
}

/// The outcome of one measurement.
#[derive(Debug)]
pub struct MeasurementResult {
    measurement: Measurement,
    plan: UnitPlan,
    summary: RunSummary,
    nanos_per_operation: u64,
}

impl MeasurementResult {
    /// What was measured.
    #[must_use]
    pub fn measurement(&self) -> Measurement {
        self.measurement
    }

    /// How the operations were spread over the units.
    #[must_use]
    pub fn plan(&self) -> UnitPlan {
        self.plan
    }

    /// What the units reported.
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Elapsed nanoseconds divided by the measurement's operation total, truncated.
    #[must_use]
    pub fn nanos_per_operation(&self) -> u64 {
        self.nanos_per_operation
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use new_zealand::nz;

    use super::*;
    use crate::{Contention, Primitive};

    fn benchmark(total_operations: u64, max_workers: usize, layout: Layout) -> Benchmark {
        Benchmark::new(
            BenchConfig::with_total_operations(total_operations, max_workers, layout).unwrap(),
        )
    }

    fn report(benchmark: &Benchmark) -> String {
        let mut out = Vec::new();
        benchmark.run(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn header_lists_every_column() {
        assert_eq!(
            header(Layout::Mixed),
            "Workers\tMutex(ns)\tRwLock(ns)\tRendezvous(ns)\tBounded(ns)\tAtomic(ns)"
        );
        assert_eq!(header(Layout::Full).split('\t').count(), 10);
    }

    #[test]
    fn indivisible_worker_count_is_skipped() {
        let benchmark = benchmark(100, 4, Layout::Mixed);

        assert!(benchmark.measure_row(nz!(3)).is_none());
    }

    #[test]
    fn indivisible_rows_are_absent_from_report() {
        testing::with_watchdog(|| {
            let report = report(&benchmark(100, 5, Layout::Mixed));

            let workers = report
                .lines()
                .skip(1)
                .map(|line| line.split('\t').next().unwrap().to_owned())
                .collect::<Vec<_>>();

            assert_eq!(workers, ["1", "2", "4"]);
        });
    }

    #[test]
    fn small_max_workers_prints_only_header() {
        for max_workers in [0, 1] {
            let report = report(&benchmark(100, max_workers, Layout::Full));

            assert_eq!(report, format!("{}\n", header(Layout::Full)));
        }
    }

    #[test]
    fn rows_have_one_value_per_column() {
        testing::with_watchdog(|| {
            let benchmark = benchmark(1000, 3, Layout::Full);
            let report = report(&benchmark);
            let lines = report.lines().collect::<Vec<_>>();

            assert_eq!(lines.len(), 3);
            for line in lines.iter().skip(1) {
                let fields = line.split('\t').collect::<Vec<_>>();
                assert_eq!(fields.len(), 10, "{line}");
                for field in fields {
                    field.parse::<u64>().unwrap();
                }
            }
        });
    }

    #[test]
    fn row_results_follow_layout() {
        testing::with_watchdog(|| {
            let benchmark = benchmark(1000, 3, Layout::Full);
            let row = benchmark.measure_row(nz!(2)).unwrap();

            assert_eq!(row.workers(), nz!(2));

            let measured = row
                .results()
                .iter()
                .map(MeasurementResult::measurement)
                .collect::<Vec<_>>();
            assert_eq!(measured, Layout::Full.measurements());

            for result in row.results() {
                let plan = result.plan();
                let expected_units = plan.readers() + plan.writers();
                assert_eq!(result.summary().unit_reports().count(), expected_units);
            }
        });
    }

    #[test]
    fn consecutive_measurements_do_not_leak_counter_values() {
        testing::with_watchdog(|| {
            let benchmark = benchmark(1000, 5, Layout::Full);

            for primitive in [Primitive::Mutex, Primitive::RwLock, Primitive::Atomic] {
                let measurement = Measurement::new(primitive, Contention::Mixed);

                for _ in 0..2 {
                    let result = benchmark.measure(measurement, nz!(4));

                    assert_eq!(
                        benchmark.state().counter_value(primitive),
                        Some(result.summary().writer_iterations()),
                        "{primitive}"
                    );
                }
            }
        });
    }

    #[test]
    fn write_only_measurement_counts_every_iteration() {
        testing::with_watchdog(|| {
            let benchmark = benchmark(1000, 5, Layout::Full);
            let measurement = Measurement::new(Primitive::RwLock, Contention::WriteOnly);

            let result = benchmark.measure(measurement, nz!(4));

            assert_eq!(result.summary().writer_iterations(), 2000);
            assert_eq!(benchmark.state().counter_value(Primitive::RwLock), Some(2000));
        });
    }

    #[test]
    fn channel_measurements_leave_channels_drained() {
        testing::with_watchdog(|| {
            let benchmark = benchmark(1000, 5, Layout::Full);

            for primitive in [Primitive::Rendezvous, Primitive::Bounded] {
                let measurement = Measurement::new(primitive, Contention::Mixed);
                let result = benchmark.measure(measurement, nz!(4));

                assert_eq!(
                    result.summary().reader_iterations(),
                    result.summary().writer_iterations()
                );
            }

            assert!(benchmark.state().bounded().1.is_empty());
        });
    }
}
