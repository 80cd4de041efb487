use std::num::NonZero;

use num_integer::Integer;

use crate::{Observation, Primitive, SharedState};

/// The part a unit plays in a measurement.
#[derive(Clone, Copy, Debug, derive_more::Display, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "a unit either reads or writes, there is nothing else"
)]
pub enum Role {
    /// Runs the primitive's reader operation.
    Reader,

    /// Runs the primitive's writer operation.
    Writer,
}

impl Role {
    /// Runs this role's operation of `primitive` for `iterations` iterations.
    ///
    /// Readers return what they observed, writers return `None`.
    pub fn perform(
        self,
        primitive: Primitive,
        state: &SharedState,
        iterations: u64,
    ) -> Option<Observation> {
        match self {
            Self::Reader => Some(primitive.read(state, iterations)),
            Self::Writer => {
                primitive.write(state, iterations);
                None
            }
        }
    }
}

/// The mix of readers and writers a primitive is measured under.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Contention {
    /// As many readers as writers, sharing the row's operation total.
    Mixed,

    /// Readers only, over twice the row's operation total.
    ReadOnly,

    /// Writers only, over twice the row's operation total.
    WriteOnly,
}

impl Contention {
    pub(crate) const fn column_prefix(self) -> &'static str {
        match self {
            Self::Mixed => "",
            Self::ReadOnly => "Ro",
            Self::WriteOnly => "Wo",
        }
    }

    /// Splits `total_operations` among the units of a row with `workers` workers.
    ///
    /// Single-role measurements run half as many units as mixed ones, so they get twice the
    /// operations to keep the per-unit iteration count comparable. Operations that do not
    /// divide evenly among the units are dropped.
    ///
    /// # Panics
    ///
    /// Panics if the doubled operation total or the unit count overflows.
    #[must_use]
    pub fn plan(self, workers: NonZero<usize>, total_operations: NonZero<u64>) -> UnitPlan {
        let (readers, writers, operations) = match self {
            Self::Mixed => (workers.get(), workers.get(), total_operations.get()),
            Self::ReadOnly => (workers.get(), 0, doubled(total_operations)),
            Self::WriteOnly => (0, workers.get(), doubled(total_operations)),
        };

        let units = readers
            .checked_add(writers)
            .expect("unit count overflowing usize cannot be scheduled");
        let units = u64::try_from(units).expect("usize always fits in u64 on supported targets");

        let (iterations_per_unit, _) = operations.div_rem(&units);

        UnitPlan {
            readers,
            writers,
            operations,
            iterations_per_unit,
        }
    }
}

fn doubled(total_operations: NonZero<u64>) -> u64 {
    total_operations
        .get()
        .checked_mul(2)
        .expect("BenchConfig guarantees the doubled operation total fits")
}

/// How the operations of one measurement are spread over reader and writer units.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UnitPlan {
    readers: usize,
    writers: usize,
    operations: u64,
    iterations_per_unit: u64,
}

impl UnitPlan {
    /// Number of reader units.
    #[must_use]
    pub fn readers(&self) -> usize {
        self.readers
    }

    /// Number of writer units.
    #[must_use]
    pub fn writers(&self) -> usize {
        self.writers
    }

    /// Operations the measurement is reported against. The per-operation cost is the elapsed
    /// time divided by this, even when integer division dropped a remainder.
    #[must_use]
    pub fn operations(&self) -> u64 {
        self.operations
    }

    /// Iterations each unit executes.
    #[must_use]
    pub fn iterations_per_unit(&self) -> u64 {
        self.iterations_per_unit
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use new_zealand::nz;

    use super::*;

    #[test]
    fn mixed_splits_total_across_both_roles() {
        let plan = Contention::Mixed.plan(nz!(4), nz!(1000));

        assert_eq!(plan.readers(), 4);
        assert_eq!(plan.writers(), 4);
        assert_eq!(plan.operations(), 1000);
        assert_eq!(plan.iterations_per_unit(), 125);
    }

    #[test]
    fn skewed_doubles_total_for_single_role() {
        let read_only = Contention::ReadOnly.plan(nz!(4), nz!(1000));
        let write_only = Contention::WriteOnly.plan(nz!(4), nz!(1000));

        assert_eq!((read_only.readers(), read_only.writers()), (4, 0));
        assert_eq!((write_only.readers(), write_only.writers()), (0, 4));

        for plan in [read_only, write_only] {
            assert_eq!(plan.operations(), 2000);
            assert_eq!(plan.iterations_per_unit(), 500);
        }
    }

    #[test]
    fn remainder_is_dropped() {
        // 16 units cannot split 1000 operations evenly.
        let plan = Contention::Mixed.plan(nz!(8), nz!(1000));

        assert_eq!(plan.iterations_per_unit(), 62);
        assert_eq!(plan.operations(), 1000);
    }

    #[test]
    fn writer_role_reports_nothing() {
        let state = SharedState::new(1);

        assert_eq!(Role::Writer.perform(Primitive::Atomic, &state, 5), None);
        assert_eq!(state.counter_value(Primitive::Atomic), Some(5));

        let observed = Role::Reader.perform(Primitive::Atomic, &state, 2).unwrap();
        assert_eq!(observed.last(), 5);
    }

    #[test]
    fn column_prefixes() {
        assert_eq!(Contention::Mixed.column_prefix(), "");
        assert_eq!(Contention::ReadOnly.column_prefix(), "Ro");
        assert_eq!(Contention::WriteOnly.column_prefix(), "Wo");
    }
}
