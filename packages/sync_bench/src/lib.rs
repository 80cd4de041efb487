#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Measures what it costs to share a counter between concurrent readers and writers under
//! different synchronization strategies.
//!
//! Five primitives are compared:
//!
//! - [`Primitive::Mutex`] - exclusive lock around the counter.
//! - [`Primitive::RwLock`] - reader-writer lock around the counter.
//! - [`Primitive::Rendezvous`] - zero-capacity channel carrying values from writers to readers.
//! - [`Primitive::Bounded`] - buffered channel carrying values from writers to readers.
//! - [`Primitive::Atomic`] - lock-free atomic counter.
//!
//! For every worker count from 1 up to a configured maximum, a [`Benchmark`] spawns that many
//! reader and writer threads per primitive, lets them hammer the [`SharedState`] for a fixed
//! total number of operations and reports the wall-clock nanoseconds per operation. Worker
//! counts that do not evenly divide the operation total are skipped.
//!
//! This package is a development tool for choosing a primitive for a hot shared-state path. It
//! makes no attempt at statistical rigor: there is no warm-up, no repetition and no variance
//! estimate, and threads are left to the operating system scheduler.
//!
//! # Example
//!
//! ```
//! use new_zealand::nz;
//! use sync_bench::{Contention, Primitive, SharedState, run_units};
//!
//! let state = SharedState::new(1000);
//! let plan = Contention::Mixed.plan(nz!(2), nz!(1000));
//!
//! let summary = run_units(
//!     Primitive::Mutex,
//!     &state,
//!     plan.readers(),
//!     plan.writers(),
//!     plan.iterations_per_unit(),
//! );
//!
//! assert_eq!(summary.completed_iterations(), 1000);
//! assert_eq!(state.counter_value(Primitive::Mutex), Some(500));
//! println!("took {:?}", summary.elapsed());
//! ```
//!
//! # Hangs
//!
//! Nothing in this package times out. A channel measurement with readers but no writers (or
//! the reverse) never completes, which is why [`Measurement::new()`] refuses to create one.

mod benchmark;
mod config;
mod contention;
mod error;
mod orchestrator;
mod primitive;
mod shared_state;

pub use benchmark::*;
pub use config::*;
pub use contention::*;
pub use error::Error;
pub use orchestrator::*;
pub use primitive::*;
pub use shared_state::SharedState;
