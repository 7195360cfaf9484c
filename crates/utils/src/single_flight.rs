// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::{
    collections::HashMap,
    future::Future,
    hash::Hash,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex, MutexGuard,
    },
};

use futures::{
    future::{BoxFuture, Shared},
    FutureExt,
};
use tracing::trace;

use crate::CancelToken;

type Flight<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;

struct Entry<T, E> {
    id: u64,
    waiters: usize,
    cancel: CancelToken,
    flight: Flight<T, E>,
}

/// Collapses concurrent calls for the same key into one underlying computation.
///
/// The first caller for a key starts the flight: its future is boxed, shared and parked in
/// the registry. Every caller that arrives while that flight is outstanding awaits the same
/// shared future and observes the same outcome. Once the flight settles the entry is
/// removed, so neither successes nor failures are memoised here. Callers that want to keep
/// a successful result hold on to it themselves.
///
/// The flight belongs to no caller. Each caller may stop waiting (drop its future) without
/// affecting the others. When the last waiter leaves before the flight settles, the flight's
/// own [`CancelToken`] fires, the computation is dropped and the key is free again.
pub struct SingleFlight<K, T, E> {
    flights: Mutex<HashMap<K, Entry<T, E>>>,
    next_id: AtomicU64,
}

impl<K, T, E> Default for SingleFlight<K, T, E> {
    fn default() -> Self {
        Self {
            flights: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }
}

/// Registration of one caller on one flight. Leaves the flight when dropped.
struct Waiter<'a, K, T, E>
where
    K: Eq + Hash,
{
    owner: &'a SingleFlight<K, T, E>,
    key: K,
    id: u64,
    settled: bool,
}

impl<K, T, E> Drop for Waiter<'_, K, T, E>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        let mut flights = self.owner.lock();
        let Some(entry) = flights.get_mut(&self.key) else {
            return;
        };
        if entry.id != self.id {
            return;
        }
        if self.settled {
            flights.remove(&self.key);
            return;
        }
        entry.waiters -= 1;
        if entry.waiters == 0 {
            trace!("last waiter left flight {}, abandoning it", self.id);
            if let Some(abandoned) = flights.remove(&self.key) {
                abandoned.cancel.cancel();
            }
        }
    }
}

impl<K, T, E> SingleFlight<K, T, E>
where
    K: Eq + Hash + Clone + Send + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `start` unless a flight for `key` is already outstanding, in which case the
    /// caller joins it. `start` is only invoked for a new flight and must not block; it
    /// receives the flight's token, which fires once nobody is waiting any more.
    pub async fn run<F, Fut>(&self, key: K, start: F) -> Result<T, E>
    where
        F: FnOnce(CancelToken) -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (flight, mut waiter) = {
            let mut flights = self.lock();
            let (id, flight) = match flights.get_mut(&key) {
                Some(entry) => {
                    trace!("joining outstanding flight {}", entry.id);
                    entry.waiters += 1;
                    (entry.id, entry.flight.clone())
                }
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let cancel = CancelToken::new();
                    let flight = start(cancel.clone()).boxed().shared();
                    flights.insert(
                        key.clone(),
                        Entry {
                            id,
                            waiters: 1,
                            cancel,
                            flight: flight.clone(),
                        },
                    );
                    (id, flight)
                }
            };
            let waiter = Waiter {
                owner: self,
                key,
                id,
                settled: false,
            };
            (flight, waiter)
        };

        let outcome = flight.await;
        waiter.settled = true;
        outcome
    }

    /// True while a flight for `key` is outstanding.
    pub fn is_pending(&self, key: &K) -> bool {
        self.lock().contains_key(key)
    }

    /// Number of outstanding flights across all keys.
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Detaches the outstanding flight for `key` so the next caller starts afresh.
    /// Callers already awaiting the detached flight still receive its outcome.
    pub fn forget(&self, key: &K) {
        self.lock().remove(key);
    }
}

impl<K, T, E> SingleFlight<K, T, E> {
    fn lock(&self) -> MutexGuard<'_, HashMap<K, Entry<T, E>>> {
        self.flights
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
