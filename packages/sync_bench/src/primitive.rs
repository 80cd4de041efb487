use std::hint::black_box;
use std::sync::atomic::Ordering;

use crate::SharedState;
use crate::shared_state::POISONED;

const DISCONNECTED: &str = "shared state owns both channel ends, so the channel cannot disconnect";

/// A synchronization strategy for a shared counter, benchmarked through a pair of reader and
/// writer operations.
///
/// Every operation performs a fixed number of guarded accesses to the primitive's storage in
/// [`SharedState`]. None of them can fail. The channel primitives block whenever the opposite
/// role is missing, so they are only ever measured with both readers and writers present.
#[derive(Clone, Copy, Debug, derive_more::Display, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "the benchmarked set of primitives is fixed"
)]
pub enum Primitive {
    /// Exclusive lock around the counter, taken by readers and writers alike.
    Mutex,

    /// Reader-writer lock around the counter: shared for readers, exclusive for writers.
    RwLock,

    /// Zero-capacity channel: writers send, readers receive, each send waits for its receive.
    Rendezvous,

    /// Buffered channel sized so that writers never wait for capacity.
    Bounded,

    /// Lock-free atomic counter.
    Atomic,
}

impl Primitive {
    /// Every primitive, in report order.
    pub const ALL: [Self; 5] = [
        Self::Mutex,
        Self::RwLock,
        Self::Rendezvous,
        Self::Bounded,
        Self::Atomic,
    ];

    /// Whether the primitive can be measured with only readers or only writers.
    ///
    /// Channel readers wait for writers and vice versa, so a single-role channel measurement
    /// never finishes.
    #[must_use]
    pub const fn supports_skew(self) -> bool {
        !matches!(self, Self::Rendezvous | Self::Bounded)
    }

    /// Performs `iterations` guarded reads, returning what was observed.
    pub fn read(self, state: &SharedState, iterations: u64) -> Observation {
        match self {
            Self::Mutex => observe_last(iterations, || {
                *state.mutex_counter().lock().expect(POISONED)
            }),
            Self::RwLock => observe_last(iterations, || {
                *state.rwlock_counter().read().expect(POISONED)
            }),
            Self::Rendezvous => {
                let (_, rx) = state.rendezvous();
                receive_all(iterations, || rx.recv().expect(DISCONNECTED))
            }
            Self::Bounded => {
                let (_, rx) = state.bounded();
                receive_all(iterations, || rx.recv().expect(DISCONNECTED))
            }
            Self::Atomic => observe_last(iterations, || {
                state.atomic_counter().load(Ordering::Relaxed)
            }),
        }
    }

    /// Performs `iterations` guarded writes.
    ///
    /// Lock and atomic writers increment the counter. Channel writers send `i + 1` for every
    /// iteration `i`, so each of their operations also carries one increment.
    pub fn write(self, state: &SharedState, iterations: u64) {
        match self {
            Self::Mutex => {
                for _ in 0..iterations {
                    let mut counter = state.mutex_counter().lock().expect(POISONED);
                    *counter = counter.wrapping_add(1);
                }
            }
            Self::RwLock => {
                for _ in 0..iterations {
                    let mut counter = state.rwlock_counter().write().expect(POISONED);
                    *counter = counter.wrapping_add(1);
                }
            }
            Self::Rendezvous => {
                let (tx, _) = state.rendezvous();
                for value in 1..=iterations {
                    tx.send(value).expect(DISCONNECTED);
                }
            }
            Self::Bounded => {
                let (tx, _) = state.bounded();
                for value in 1..=iterations {
                    tx.send(value).expect(DISCONNECTED);
                }
            }
            Self::Atomic => {
                for _ in 0..iterations {
                    state.atomic_counter().fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }
}

/// What a reader saw during its iterations.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Observation {
    last: u64,
    sum: u64,
}

impl Observation {
    /// The value seen by the final iteration, or 0 if there were no iterations.
    #[must_use]
    pub fn last(&self) -> u64 {
        self.last
    }

    /// Wrapping sum of every value received from a channel.
    ///
    /// Lock and atomic readers only keep the last value, so this is 0 for them.
    #[must_use]
    pub fn sum(&self) -> u64 {
        self.sum
    }
}

#[inline]
fn observe_last(iterations: u64, mut read_once: impl FnMut() -> u64) -> Observation {
    let mut observation = Observation::default();

    for _ in 0..iterations {
        observation.last = black_box(read_once());
    }

    observation
}

// Every received value is a distinct message, summed so callers can check that none was lost
// or duplicated.
#[inline]
fn receive_all(iterations: u64, mut receive_once: impl FnMut() -> u64) -> Observation {
    let mut observation = Observation::default();

    for _ in 0..iterations {
        let value = black_box(receive_once());
        observation.last = value;
        observation.sum = observation.sum.wrapping_add(value);
    }

    observation
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn lock_and_atomic_writers_count_iterations() {
        for primitive in [Primitive::Mutex, Primitive::RwLock, Primitive::Atomic] {
            let state = SharedState::new(1);

            primitive.write(&state, 250);

            assert_eq!(state.counter_value(primitive), Some(250), "{primitive}");
        }
    }

    #[test]
    fn lock_and_atomic_readers_keep_only_last_value() {
        for primitive in [Primitive::Mutex, Primitive::RwLock, Primitive::Atomic] {
            let state = SharedState::new(1);
            primitive.write(&state, 7);

            let observation = primitive.read(&state, 3);

            assert_eq!(observation.last(), 7, "{primitive}");
            assert_eq!(observation.sum(), 0, "{primitive}");
            assert_eq!(state.counter_value(primitive), Some(7), "{primitive}");
        }
    }

    #[test]
    fn zero_iterations_touch_nothing() {
        for primitive in Primitive::ALL {
            let state = SharedState::new(1);

            primitive.write(&state, 0);
            let observation = primitive.read(&state, 0);

            assert_eq!(observation, Observation::default(), "{primitive}");
        }
    }

    #[test]
    fn bounded_writer_sends_incrementing_values() {
        let state = SharedState::new(10);

        Primitive::Bounded.write(&state, 4);
        let observation = Primitive::Bounded.read(&state, 4);

        assert_eq!(observation.last(), 4);
        assert_eq!(observation.sum(), 1 + 2 + 3 + 4);
    }

    #[test]
    fn rendezvous_pairs_every_send_with_a_receive() {
        testing::with_watchdog(|| {
            let state = SharedState::new(1);

            let observation = thread::scope(|s| {
                s.spawn(|| Primitive::Rendezvous.write(&state, 100));
                s.spawn(|| Primitive::Rendezvous.read(&state, 100))
                    .join()
                    .unwrap()
            });

            assert_eq!(observation.last(), 100);
            assert_eq!(observation.sum(), 5050);
        });
    }

    #[test]
    fn only_channels_refuse_skew() {
        let skewable = Primitive::ALL
            .into_iter()
            .filter(|p| p.supports_skew())
            .collect::<Vec<_>>();

        assert_eq!(
            skewable,
            [Primitive::Mutex, Primitive::RwLock, Primitive::Atomic]
        );
    }

    #[test]
    fn display_names() {
        let names = Primitive::ALL.map(|p| p.to_string());

        assert_eq!(names, ["Mutex", "RwLock", "Rendezvous", "Bounded", "Atomic"]);
    }
}
