use core::cmp::Ordering;

use parking_lot::Mutex;
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    error::{Error, Result},
    generator::Poll,
    id::SnowflakeId,
    time::{EPOCH_MILLIS, TimeSource},
};

/// A machine identifier that is known to fit the 10-bit field of a
/// [`SnowflakeId`].
///
/// The only way to obtain one is through [`TryFrom`], so a
/// [`SnowflakeGenerator`] can never be built with an out-of-range value.
///
/// ```
/// use uniqueid::{Error, MachineId};
///
/// assert!(MachineId::try_from(1023).is_ok());
/// assert!(matches!(MachineId::try_from(1024), Err(Error::Configuration { .. })));
/// assert!(matches!(MachineId::try_from(-1), Err(Error::Configuration { .. })));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MachineId(u16);

impl MachineId {
    /// Largest accepted machine ID.
    pub const MAX: u64 = SnowflakeId::MAX_MACHINE_ID;

    /// Returns the machine ID as stored in the packed layout.
    pub const fn get(self) -> u64 {
        self.0 as u64
    }
}

impl TryFrom<i64> for MachineId {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        u16::try_from(value)
            .ok()
            .filter(|&id| u64::from(id) <= Self::MAX)
            .map(Self)
            .ok_or_else(|| out_of_range(value))
    }
}

impl TryFrom<i32> for MachineId {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        Self::try_from(i64::from(value))
    }
}

impl TryFrom<u64> for MachineId {
    type Error = Error;

    fn try_from(value: u64) -> Result<Self> {
        i64::try_from(value)
            .map_err(|_| out_of_range(value))
            .and_then(Self::try_from)
    }
}

fn out_of_range(value: impl core::fmt::Display) -> Error {
    Error::configuration(format!(
        "Machine ID must be between 0 and {}, got {value}",
        MachineId::MAX
    ))
}

impl core::fmt::Display for MachineId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A lock-based Snowflake ID generator suitable for multi-threaded
/// environments.
///
/// The last issued ID (which carries both the last timestamp and the sequence)
/// lives behind a [`Mutex`]. Every poll reads the clock, compares it to that
/// state and writes the new state inside one critical section, so IDs from a
/// single instance are strictly increasing in the order callers observe them.
///
/// ## Clock behavior
/// - Same millisecond: the sequence is incremented. Once all 4096 values are
///   used the generator reports [`Poll::Pending`] until the clock moves on.
/// - Later millisecond: the sequence resets to zero.
/// - Earlier millisecond: [`Error::ClockSkew`] is returned and no ID is
///   issued. A tolerance can be opted into with
///   [`SnowflakeGenerator::with_max_backward_skew`]; regressions within it are
///   reported as [`Poll::Pending`] instead.
/// - Before [`EPOCH`](crate::EPOCH): [`Error::ClockBeforeEpoch`] is returned
///   and no ID is issued.
///
/// ## See Also
/// - [`SharedCounterGenerator`](crate::SharedCounterGenerator)
pub struct SnowflakeGenerator<T>
where
    T: TimeSource<u64>,
{
    state: Mutex<Option<SnowflakeId>>,
    machine_id: MachineId,
    max_backward_skew: u64,
    time: T,
}

impl<T> SnowflakeGenerator<T>
where
    T: TimeSource<u64>,
{
    /// Creates a new [`SnowflakeGenerator`] for the given machine.
    ///
    /// No ID has been issued yet, so the first call always starts a fresh
    /// millisecond with sequence `0`.
    ///
    /// # Example
    /// ```
    /// use uniqueid::{MachineId, SnowflakeGenerator, WallClock};
    ///
    /// let generator = SnowflakeGenerator::new(MachineId::try_from(7)?, WallClock::new());
    /// let id = generator.generate()?;
    /// assert_eq!(id.machine_id(), 7);
    /// # Ok::<(), uniqueid::Error>(())
    /// ```
    pub fn new(machine_id: MachineId, time: T) -> Self {
        Self {
            state: Mutex::new(None),
            machine_id,
            max_backward_skew: 0,
            time,
        }
    }

    /// Creates a new ID generator from explicit component values.
    ///
    /// The generator behaves as if it had just issued the ID made of
    /// `timestamp` and `sequence`. This is useful for restoring state or for
    /// tests that need to start at a specific point of the sequence space.
    pub fn from_components(timestamp: u64, machine_id: MachineId, sequence: u64, time: T) -> Self {
        let id = SnowflakeId::from_components(timestamp, machine_id.get(), sequence);
        Self {
            state: Mutex::new(Some(id)),
            machine_id,
            max_backward_skew: 0,
            time,
        }
    }

    /// Tolerates backwards clock jumps of up to `millis` milliseconds.
    ///
    /// Within the bound the generator waits for the clock to catch up instead
    /// of failing. The default is `0`: any backwards jump is an error.
    #[must_use]
    pub fn with_max_backward_skew(mut self, millis: u64) -> Self {
        self.max_backward_skew = millis;
        self
    }

    /// The machine ID embedded in every ID from this generator.
    pub const fn machine_id(&self) -> MachineId {
        self.machine_id
    }

    /// The configured backwards clock tolerance, in milliseconds.
    pub const fn max_backward_skew(&self) -> u64 {
        self.max_backward_skew
    }

    /// Generates a new ID, spinning while the generator is pending.
    ///
    /// # Errors
    /// - [`Error::ClockSkew`] if the clock moved backwards beyond the tolerance
    /// - [`Error::ClockBeforeEpoch`] if the clock reads earlier than
    ///   [`EPOCH`](crate::EPOCH)
    /// - [`Error::TimestampOverflow`] if the clock is past the 41-bit range
    pub fn generate(&self) -> Result<SnowflakeId> {
        self.next_id(|_| core::hint::spin_loop())
    }

    /// Generates a new ID, calling `f` with the suggested wait (in
    /// milliseconds) every time the generator is pending.
    ///
    /// The lock is released between polls and the clock is re-validated
    /// against the latest state on every attempt.
    ///
    /// # Example
    /// ```
    /// use uniqueid::{MachineId, SnowflakeGenerator, WallClock};
    ///
    /// let generator = SnowflakeGenerator::new(MachineId::try_from(0)?, WallClock::new());
    /// let id = generator.next_id(|_| std::thread::yield_now())?;
    /// assert!(id.is_valid());
    /// # Ok::<(), uniqueid::Error>(())
    /// ```
    ///
    /// # Errors
    /// Same as [`Self::generate`].
    pub fn next_id(&self, mut f: impl FnMut(u64)) -> Result<SnowflakeId> {
        loop {
            match self.try_poll_id()? {
                Poll::Ready { id } => break Ok(id),
                Poll::Pending { yield_for } => f(yield_for),
            }
        }
    }

    /// Attempts to generate the next available ID without waiting.
    ///
    /// # Returns
    /// - `Ok(Poll::Ready { id })`: A new ID is available
    /// - `Ok(Poll::Pending { yield_for })`: The time to wait (in
    ///   milliseconds) before trying again
    ///
    /// # Errors
    /// - [`Error::ClockSkew`] if the clock moved backwards beyond the tolerance
    /// - [`Error::ClockBeforeEpoch`] if the clock reads earlier than
    ///   [`EPOCH`](crate::EPOCH)
    /// - [`Error::TimestampOverflow`] if the clock is past the 41-bit range
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_poll_id(&self) -> Result<Poll<SnowflakeId>> {
        let mut last = self.state.lock();
        // The clock is read while holding the lock; a reading taken before
        // acquiring it could be older than a timestamp a racing caller has
        // just stored.
        let unix_millis = self.time.current_millis();
        let Some(now) = unix_millis.checked_sub(EPOCH_MILLIS) else {
            return Err(Error::ClockBeforeEpoch { unix_millis });
        };

        if now > SnowflakeId::MAX_TIMESTAMP {
            return Err(Error::TimestampOverflow { millis: now });
        }

        let Some(prev) = *last else {
            let id = SnowflakeId::from_components(now, self.machine_id.get(), 0);
            *last = Some(id);
            return Ok(Poll::Ready { id });
        };

        let current_ts = prev.timestamp();
        match now.cmp(&current_ts) {
            Ordering::Equal => {
                if prev.has_sequence_room() {
                    let id = prev.increment_sequence();
                    *last = Some(id);
                    Ok(Poll::Ready { id })
                } else {
                    Ok(Poll::Pending { yield_for: 1 })
                }
            }
            Ordering::Greater => {
                let id = prev.rollover_to_timestamp(now);
                *last = Some(id);
                Ok(Poll::Ready { id })
            }
            Ordering::Less => self.cold_clock_behind(now, current_ts),
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(&self, now: u64, current_ts: u64) -> Result<Poll<SnowflakeId>> {
        let skew_ms = current_ts - now;
        if skew_ms <= self.max_backward_skew {
            return Ok(Poll::Pending { yield_for: skew_ms });
        }

        #[cfg(feature = "tracing")]
        tracing::warn!(
            skew_ms,
            machine_id = self.machine_id.get(),
            "clock moved backwards, refusing to generate id"
        );
        Err(Error::ClockSkew { skew_ms })
    }
}

impl<T> core::fmt::Debug for SnowflakeGenerator<T>
where
    T: TimeSource<u64>,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SnowflakeGenerator")
            .field("machine_id", &self.machine_id)
            .field("max_backward_skew", &self.max_backward_skew)
            .field("last", &*self.state.lock())
            .finish_non_exhaustive()
    }
}
