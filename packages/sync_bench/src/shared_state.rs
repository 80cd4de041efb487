#![allow(
    clippy::mutex_integer,
    reason = "a lock around a plain counter is the thing being measured"
)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use crossbeam::channel::{self, Receiver, Sender};
use tracing::warn;

use crate::Primitive;

pub(crate) const POISONED: &str = "a benchmark unit panicked while holding the lock";

/// The state contended over by the units of a measurement.
///
/// Each primitive has its own storage: the counter behind the mutex, the counter behind the
/// reader-writer lock, the atomic counter and the two transport channels. Only the storage of
/// the primitive under measurement is touched while a measurement runs.
///
/// The owner resets the counters before every measurement. The channels are not reset because
/// every measurement drains what it sends.
#[derive(Debug)]
pub struct SharedState {
    mutex_counter: Mutex<u64>,
    rwlock_counter: RwLock<u64>,
    atomic_counter: AtomicU64,

    rendezvous_tx: Sender<u64>,
    rendezvous_rx: Receiver<u64>,

    bounded_tx: Sender<u64>,
    bounded_rx: Receiver<u64>,
}

impl SharedState {
    /// Creates zeroed shared state whose bounded channel can buffer `bounded_capacity` values.
    ///
    /// The rendezvous channel has no buffer at all: every send waits for a matching receive.
    #[must_use]
    pub fn new(bounded_capacity: usize) -> Self {
        let (rendezvous_tx, rendezvous_rx) = channel::bounded(0);
        let (bounded_tx, bounded_rx) = channel::bounded(bounded_capacity);

        Self {
            mutex_counter: Mutex::new(0),
            rwlock_counter: RwLock::new(0),
            atomic_counter: AtomicU64::new(0),
            rendezvous_tx,
            rendezvous_rx,
            bounded_tx,
            bounded_rx,
        }
    }

    /// Sets every counter back to zero, each through its own primitive.
    ///
    /// Must not be called while a measurement is running.
    pub fn reset(&self) {
        *self.mutex_counter.lock().expect(POISONED) = 0;
        *self.rwlock_counter.write().expect(POISONED) = 0;
        self.atomic_counter.store(0, Ordering::Relaxed);

        if !self.bounded_rx.is_empty() {
            warn!(
                leftover = self.bounded_rx.len(),
                "bounded channel was not drained by the previous measurement"
            );
        }
    }

    /// Current value of the counter owned by `primitive`, read through that primitive.
    ///
    /// Returns `None` for the channel primitives, which carry values instead of owning a counter.
    #[must_use]
    pub fn counter_value(&self, primitive: Primitive) -> Option<u64> {
        match primitive {
            Primitive::Mutex => Some(*self.mutex_counter.lock().expect(POISONED)),
            Primitive::RwLock => Some(*self.rwlock_counter.read().expect(POISONED)),
            Primitive::Atomic => Some(self.atomic_counter.load(Ordering::Relaxed)),
            Primitive::Rendezvous | Primitive::Bounded => None,
        }
    }

    /// How many values the bounded channel can hold before senders block.
    #[must_use]
    pub fn bounded_capacity(&self) -> usize {
        self.bounded_tx
            .capacity()
            .expect("bounded channel always reports its capacity")
    }

    pub(crate) fn mutex_counter(&self) -> &Mutex<u64> {
        &self.mutex_counter
    }

    pub(crate) fn rwlock_counter(&self) -> &RwLock<u64> {
        &self.rwlock_counter
    }

    pub(crate) fn atomic_counter(&self) -> &AtomicU64 {
        &self.atomic_counter
    }

    pub(crate) fn rendezvous(&self) -> (&Sender<u64>, &Receiver<u64>) {
        (&self.rendezvous_tx, &self.rendezvous_rx)
    }

    pub(crate) fn bounded(&self) -> (&Sender<u64>, &Receiver<u64>) {
        (&self.bounded_tx, &self.bounded_rx)
    }
}
