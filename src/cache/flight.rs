//! Single-flight coordination for cache misses.
//!
//! The first caller for a key becomes the leader and runs the work; callers
//! arriving while it is in flight subscribe and receive a clone of the
//! leader's result. A leader that is dropped before finishing closes the
//! channel, and each waiting follower then runs the work itself.

use std::future::Future;
use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use metrics::counter;
use tokio::sync::broadcast;
use tracing::debug;

pub struct SingleFlight<T> {
    inflight: Arc<DashMap<String, broadcast::Sender<T>>>,
}

impl<T> Clone for SingleFlight<T> {
    fn clone(&self) -> Self {
        Self {
            inflight: Arc::clone(&self.inflight),
        }
    }
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            inflight: Arc::new(DashMap::new()),
        }
    }
}

enum Role<T> {
    Leader(broadcast::Sender<T>),
    Follower(broadcast::Receiver<T>),
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn run<F, Fut>(&self, key: &str, work: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let role = match self.inflight.entry(key.to_string()) {
            Entry::Occupied(entry) => Role::Follower(entry.get().subscribe()),
            Entry::Vacant(entry) => {
                let (sender, _) = broadcast::channel(1);
                entry.insert(sender.clone());
                Role::Leader(sender)
            }
        };

        match role {
            Role::Leader(sender) => {
                let guard = LeaderGuard {
                    inflight: &self.inflight,
                    key,
                    sender: &sender,
                };
                let value = work().await;
                drop(guard);
                let _ = sender.send(value.clone());
                value
            }
            Role::Follower(mut receiver) => {
                counter!("bookgate_flight_coalesced_total").increment(1);
                match receiver.recv().await {
                    Ok(value) => value,
                    Err(_) => {
                        debug!(key, "single-flight leader vanished; fetching directly");
                        work().await
                    }
                }
            }
        }
    }

    pub fn is_in_flight(&self, key: &str) -> bool {
        self.inflight.contains_key(key)
    }

    /// Number of followers currently waiting on `key`.
    pub fn waiters(&self, key: &str) -> usize {
        self.inflight
            .get(key)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

// Unregisters the leader's channel on every exit path, including cancellation.
struct LeaderGuard<'a, T> {
    inflight: &'a DashMap<String, broadcast::Sender<T>>,
    key: &'a str,
    sender: &'a broadcast::Sender<T>,
}

impl<T> Drop for LeaderGuard<'_, T> {
    fn drop(&mut self) {
        self.inflight
            .remove_if(self.key, |_, registered| registered.same_channel(self.sender));
    }
}
