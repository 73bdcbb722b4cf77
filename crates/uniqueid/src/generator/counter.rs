#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    error::{Error, Result},
    registry::KeyRegistry,
    store::CounterStore,
};

/// Suffix appended to the upper-cased partition key to form the storage key.
pub const KEY_SUFFIX: &str = ":id";

/// A generator that issues sequential IDs from an external counter store,
/// one counter per partition key.
///
/// The generator holds no mutable state. It validates the partition key
/// against a [`KeyRegistry`], derives the storage key and asks the
/// [`CounterStore`] for an atomic increment. Uniqueness within a partition is
/// exactly as strong as the store's atomicity.
///
/// IDs from this generator are plain counters and share nothing with
/// [`SnowflakeId`](crate::SnowflakeId)s; the two spaces must not be mixed.
///
/// # Example
/// ```
/// use uniqueid::{KeyRegistry, MemoryCounterStore, SharedCounterGenerator};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let registry: KeyRegistry = "order,user".parse()?;
/// let generator = SharedCounterGenerator::new(registry, MemoryCounterStore::new());
///
/// assert_eq!(generator.generate("order").await?, 1);
/// assert_eq!(generator.generate("order").await?, 2);
/// assert_eq!(generator.generate("user").await?, 1);
/// # Ok::<(), uniqueid::Error>(())
/// # }).unwrap();
/// ```
#[derive(Debug)]
pub struct SharedCounterGenerator<S> {
    registry: KeyRegistry,
    store: S,
}

impl<S> SharedCounterGenerator<S>
where
    S: CounterStore,
{
    /// Creates a generator over `store` that accepts the keys in `registry`.
    pub fn new(registry: KeyRegistry, store: S) -> Self {
        Self { registry, store }
    }

    /// The registry used to validate partition keys.
    pub fn registry(&self) -> &KeyRegistry {
        &self.registry
    }

    /// The backing counter store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Derives the storage key for a partition key: `ORDER` -> `ORDER:id`.
    pub fn storage_key(partition_key: &str) -> String {
        let mut key = partition_key.to_uppercase();
        key.push_str(KEY_SUFFIX);
        key
    }

    /// Issues the next ID for `partition_key`.
    ///
    /// # Errors
    /// - [`Error::InvalidKey`] if the key is empty or not registered; the store
    ///   is not contacted
    /// - [`Error::BackendUnavailable`] if the store call fails
    /// - [`Error::InconsistentResult`] if the store returns no value, or a
    ///   value that is not a positive integer
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self), err))]
    pub async fn generate(&self, partition_key: &str) -> Result<u64> {
        if partition_key.is_empty() || !self.registry.is_valid(partition_key) {
            return Err(Error::InvalidKey {
                key: partition_key.to_owned(),
            });
        }

        let key = Self::storage_key(partition_key);
        let value = match self.store.increment(&key).await {
            Ok(value) => value,
            Err(source) => {
                return Err(Error::BackendUnavailable {
                    key,
                    source: Box::new(source),
                });
            }
        };

        value
            .and_then(|v| u64::try_from(v).ok())
            .filter(|&v| v > 0)
            .ok_or_else(|| Error::InconsistentResult {
                key: partition_key.to_owned(),
            })
    }
}
