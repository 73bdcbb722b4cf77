use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Custom epoch: Sunday, January 1, 2023 00:00:00 UTC
///
/// Every [`SnowflakeId`](crate::SnowflakeId) stores its timestamp relative to
/// this instant. Changing it breaks decoding of every ID already issued.
pub const EPOCH: Duration = Duration::from_millis(EPOCH_MILLIS);

/// [`EPOCH`] as milliseconds since the Unix epoch.
pub const EPOCH_MILLIS: u64 = 1_672_531_200_000;

/// A trait for time sources that return a wall-clock timestamp.
///
/// This abstraction allows you to plug in the real system clock or a mocked
/// time source in tests.
///
/// The unit is **milliseconds since the Unix epoch**. Generators subtract
/// [`EPOCH`] themselves, so a clock that is behind the epoch can be detected
/// and rejected.
///
/// # Example
///
/// ```
/// use uniqueid::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource<u64> for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// let time = FixedTime;
/// assert_eq!(time.current_millis(), 1234);
/// ```
pub trait TimeSource<T> {
    /// Returns the current time in milliseconds since the Unix epoch.
    fn current_millis(&self) -> T;
}

impl<T, S> TimeSource<T> for &S
where
    S: TimeSource<T> + ?Sized,
{
    fn current_millis(&self) -> T {
        (**self).current_millis()
    }
}

impl<T, S> TimeSource<T> for std::sync::Arc<S>
where
    S: TimeSource<T> + ?Sized,
{
    fn current_millis(&self) -> T {
        (**self).current_millis()
    }
}

/// A time source backed by [`SystemTime`].
///
/// This clock follows NTP steps and manual adjustments, so it can move
/// backwards; the generator detects that and refuses to issue IDs.
///
/// A clock set before the Unix epoch reads as `0`, which a generator then
/// rejects as being before [`EPOCH`].
#[derive(Clone, Copy, Debug, Default)]
pub struct WallClock;

impl WallClock {
    /// Creates a new wall clock.
    pub const fn new() -> Self {
        Self
    }

    /// Milliseconds since the Unix epoch, saturating at `0`.
    pub fn unix_millis() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

impl TimeSource<u64> for WallClock {
    fn current_millis(&self) -> u64 {
        Self::unix_millis()
    }
}
