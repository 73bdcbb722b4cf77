/// Represents the result of polling a generator for a new ID.
///
/// - [`Poll::Ready`] indicates a new ID was successfully generated.
/// - [`Poll::Pending`] means the generator cannot produce an ID until the clock
///   advances, either because the sequence is exhausted for the current
///   millisecond or because the clock stepped back within the configured
///   tolerance.
///
/// This allows non-blocking generation loops and custom backoff strategies.
///
/// # Example
///
/// ```
/// use uniqueid::{EPOCH_MILLIS, MachineId, Poll, SnowflakeGenerator, TimeSource};
///
/// struct FixedTime;
/// impl TimeSource<u64> for FixedTime {
///     fn current_millis(&self) -> u64 {
///         EPOCH_MILLIS + 1
///     }
/// }
///
/// let machine_id = MachineId::try_from(1).unwrap();
/// let generator = SnowflakeGenerator::new(machine_id, FixedTime);
/// match generator.try_poll_id().unwrap() {
///     Poll::Ready { id } => println!("ID: {}", id.timestamp()),
///     Poll::Pending { yield_for } => println!("Back off for: {yield_for}ms"),
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll<T> {
    /// A unique ID was generated and is ready to use.
    Ready {
        /// The generated ID.
        id: T,
    },
    /// No ID could be generated yet.
    ///
    /// Wait roughly `yield_for` milliseconds before polling again.
    Pending {
        /// Milliseconds until the clock is expected to allow a new ID.
        yield_for: u64,
    },
}
