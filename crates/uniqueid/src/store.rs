use core::{convert::Infallible, future::Future};
use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;

/// An external store that can atomically increment an integer counter.
///
/// This is the only capability a
/// [`SharedCounterGenerator`](crate::SharedCounterGenerator) needs. The store
/// must be linearizable per key: two concurrent increments of the same key
/// never observe the same result.
///
/// # Contract
///
/// `increment` adds one to the integer stored at `key` and returns the new
/// value. A missing key is initialized to `0` before incrementing, so the
/// first call returns `Some(1)`. `Ok(None)` means the store answered without
/// a value.
///
/// # Example
///
/// ```
/// use uniqueid::{CounterStore, MemoryCounterStore};
///
/// # tokio_test_block_on(async {
/// let store = MemoryCounterStore::new();
/// assert_eq!(store.increment("ORDER:id").await.unwrap(), Some(1));
/// assert_eq!(store.increment("ORDER:id").await.unwrap(), Some(2));
/// # });
/// # fn tokio_test_block_on<F: core::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
pub trait CounterStore: Send + Sync {
    /// The error returned when the store cannot be reached or rejects the
    /// command.
    type Err: std::error::Error + Send + Sync + 'static;

    /// Atomically increments the counter at `key` by one and returns the new
    /// value.
    fn increment(&self, key: &str) -> impl Future<Output = Result<Option<i64>, Self::Err>> + Send;
}

impl<S> CounterStore for Arc<S>
where
    S: CounterStore,
{
    type Err = S::Err;

    fn increment(&self, key: &str) -> impl Future<Output = Result<Option<i64>, Self::Err>> + Send {
        (**self).increment(key)
    }
}

/// An in-process [`CounterStore`].
///
/// Counters live only as long as the store and are not shared between
/// processes, so this is meant for tests and single-node deployments.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    counters: Mutex<HashMap<String, i64>>,
}

impl MemoryCounterStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current value at `key` without incrementing it.
    pub fn get(&self, key: &str) -> Option<i64> {
        self.counters.lock().get(key).copied()
    }
}

impl CounterStore for MemoryCounterStore {
    type Err = Infallible;

    fn increment(&self, key: &str) -> impl Future<Output = Result<Option<i64>, Self::Err>> + Send {
        let value = {
            let mut counters = self.counters.lock();
            let counter = counters.entry(key.to_owned()).or_insert(0);
            let next = counter.checked_add(1);
            if let Some(next) = next {
                *counter = next;
            }
            next
        };
        core::future::ready(Ok(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn keys_are_independent() {
        let store = MemoryCounterStore::new();
        assert_eq!(store.increment("A").await, Ok(Some(1)));
        assert_eq!(store.increment("A").await, Ok(Some(2)));
        assert_eq!(store.increment("B").await, Ok(Some(1)));
        assert_eq!(store.get("A"), Some(2));
        assert_eq!(store.get("C"), None);
    }

    #[tokio::test]
    async fn exhausted_counter_yields_no_value() {
        let store = MemoryCounterStore::new();
        store.counters.lock().insert("A".to_owned(), i64::MAX);

        assert_eq!(store.increment("A").await, Ok(None));
        assert_eq!(store.increment("A").await, Ok(None));
        assert_eq!(store.get("A"), Some(i64::MAX));
        assert_eq!(store.increment("B").await, Ok(Some(1)));
    }

    #[tokio::test]
    async fn arc_forwards_to_inner_store() {
        let store = Arc::new(MemoryCounterStore::new());
        let shared = Arc::clone(&store);
        assert_eq!(shared.increment("A").await, Ok(Some(1)));
        assert_eq!(store.get("A"), Some(1));
    }
}
