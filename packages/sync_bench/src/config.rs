use std::num::NonZero;

use num_integer::Integer;

use crate::error::{Error, Result};
use crate::{Contention, Primitive};

const OPERATIONS_PER_MILLION: u64 = 1_000_000;

/// Which measurements make up each row of the report.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum Layout {
    /// Mixed reader/writer measurements for every primitive, plus read-only and write-only
    /// measurements for the primitives that can run a single role on its own.
    #[default]
    Full,

    /// Only the mixed reader/writer measurement of each primitive.
    Mixed,
}

impl Layout {
    /// The measurements of one report row, in report order.
    #[must_use]
    pub fn measurements(self) -> &'static [Measurement] {
        match self {
            Self::Full => &FULL_LAYOUT,
            Self::Mixed => &MIXED_LAYOUT,
        }
    }
}

static FULL_LAYOUT: [Measurement; 9] = [
    Measurement::new(Primitive::Mutex, Contention::Mixed),
    Measurement::new(Primitive::RwLock, Contention::Mixed),
    Measurement::new(Primitive::RwLock, Contention::ReadOnly),
    Measurement::new(Primitive::RwLock, Contention::WriteOnly),
    Measurement::new(Primitive::Rendezvous, Contention::Mixed),
    Measurement::new(Primitive::Bounded, Contention::Mixed),
    Measurement::new(Primitive::Atomic, Contention::Mixed),
    Measurement::new(Primitive::Atomic, Contention::ReadOnly),
    Measurement::new(Primitive::Atomic, Contention::WriteOnly),
];

static MIXED_LAYOUT: [Measurement; 5] = [
    Measurement::new(Primitive::Mutex, Contention::Mixed),
    Measurement::new(Primitive::RwLock, Contention::Mixed),
    Measurement::new(Primitive::Rendezvous, Contention::Mixed),
    Measurement::new(Primitive::Bounded, Contention::Mixed),
    Measurement::new(Primitive::Atomic, Contention::Mixed),
];

/// One column of the report: a primitive exercised under a specific reader/writer mix.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Measurement {
    primitive: Primitive,
    contention: Contention,
}

impl Measurement {
    /// Creates a measurement of `primitive` under `contention`.
    ///
    /// # Panics
    ///
    /// Panics if `contention` runs a single role and the primitive cannot complete without
    /// both roles present (the channel primitives would block forever).
    #[must_use]
    pub const fn new(primitive: Primitive, contention: Contention) -> Self {
        assert!(
            primitive.supports_skew() || matches!(contention, Contention::Mixed),
            "channel primitives can only be measured with both readers and writers present"
        );

        Self {
            primitive,
            contention,
        }
    }

    /// The primitive under measurement.
    #[must_use]
    pub fn primitive(&self) -> Primitive {
        self.primitive
    }

    /// The reader/writer mix the primitive is measured under.
    #[must_use]
    pub fn contention(&self) -> Contention {
        self.contention
    }

    /// Report column header, e.g. `RoRwLock(ns)`.
    #[must_use]
    pub fn column_name(&self) -> String {
        format!("{}{}(ns)", self.contention.column_prefix(), self.primitive)
    }
}

/// Validated parameters of a benchmark run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BenchConfig {
    total_operations: NonZero<u64>,
    max_workers: usize,
    layout: Layout,
}

impl BenchConfig {
    /// Creates a configuration for `millions` million operations per measurement, measuring
    /// every worker count from 1 up to but excluding `max_workers`.
    ///
    /// A `max_workers` of 0 or 1 is valid and yields a report with only a header.
    pub fn new(millions: u64, max_workers: usize, layout: Layout) -> Result<Self> {
        let total_operations = millions
            .checked_mul(OPERATIONS_PER_MILLION)
            .ok_or(Error::OperationCountOverflow { millions })?;

        Self::with_total_operations(total_operations, max_workers, layout).map_err(|e| match e {
            Error::OperationCountOverflow { .. } => Error::OperationCountOverflow { millions },
            other => other,
        })
    }

    /// Creates a configuration with an exact operation count instead of a count in millions.
    ///
    /// Small exact counts are mostly useful for tests and quick smoke runs.
    pub fn with_total_operations(
        total_operations: u64,
        max_workers: usize,
        layout: Layout,
    ) -> Result<Self> {
        let total_operations = NonZero::new(total_operations).ok_or(Error::ZeroOperations)?;

        // Skewed measurements double the total and the bounded channel buffers the total.
        let fits = total_operations.get().checked_mul(2).is_some()
            && usize::try_from(total_operations.get()).is_ok();

        if !fits {
            let (millions, _) = total_operations.get().div_rem(&OPERATIONS_PER_MILLION);
            return Err(Error::OperationCountOverflow { millions });
        }

        Ok(Self {
            total_operations,
            max_workers,
            layout,
        })
    }

    /// Total read+write operations of one mixed measurement.
    #[must_use]
    pub fn total_operations(&self) -> NonZero<u64> {
        self.total_operations
    }

    /// Capacity of the bounded channel: large enough that no writer ever waits for space.
    #[must_use]
    pub fn bounded_capacity(&self) -> usize {
        usize::try_from(self.total_operations.get())
            .expect("guarded by the size check when the configuration was created")
    }

    /// Exclusive upper bound of the measured worker counts.
    #[must_use]
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// The measurements that make up each row.
    #[must_use]
    pub fn layout(&self) -> Layout {
        self.layout
    }
}
