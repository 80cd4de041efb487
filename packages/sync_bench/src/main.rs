#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))]

//! Binary entry point for the sync_bench tool.
//!
//! This module is excluded from mutation testing because testing process entry/exit behavior
//! is impractical - it requires spawning subprocesses and checking exit codes.

use std::io;
use std::process::ExitCode;

use argh::FromArgs;
use sync_bench::{BenchConfig, Benchmark, Layout};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Measures the per-operation cost of sharing a counter between concurrent readers and writers
/// through a mutex, a reader-writer lock, a rendezvous channel, a bounded channel and an atomic.
#[derive(FromArgs)]
struct Args {
    /// operations per measurement, in millions
    #[argh(positional)]
    millions: u64,

    /// worker counts from 1 up to but excluding this value are measured
    #[argh(positional)]
    max_workers: usize,

    /// only report mixed reader/writer measurements, skipping read-only and write-only columns
    #[argh(switch)]
    mixed_only: bool,

    /// log progress of every measurement to stderr
    #[argh(switch, short = 'v')]
    verbose: bool,
}

// Binary entry point - mutations would require subprocess testing which is impractical.
#[cfg_attr(test, mutants::skip)]
fn main() -> ExitCode {
    // Missing or non-numeric arguments print usage and exit with a failure code.
    let args: Args = argh::from_env();

    setup_logging(args.verbose);

    let layout = if args.mixed_only {
        Layout::Mixed
    } else {
        Layout::Full
    };

    let config = match BenchConfig::new(args.millions, args.max_workers, layout) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let benchmark = Benchmark::new(config);

    match benchmark.run(&mut io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

// The report goes to stdout, so diagnostics must stay on stderr.
#[cfg_attr(test, mutants::skip)]
fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set up logging: {e}");
    }
}
