//! Error types for ID generation.
//!
//! Every failure that either generator can produce is a variant of [`Error`].
//! None of them are caught or retried inside the crate: they are returned from
//! the generating call and it is up to the caller to decide what to do.

/// A boxed error coming from a counter store implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Crate-wide result type.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `uniqueid` can emit.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A generator or registry was constructed from invalid configuration.
    ///
    /// Raised at construction time only (e.g. a machine ID outside
    /// `0..=1023`, or an empty key prefix list).
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    /// The clock reported a time earlier than the last issued timestamp.
    ///
    /// `skew_ms` is how far the clock moved backwards. No ID was issued.
    #[error("Clock moved backwards, refusing to generate ID for {skew_ms} milliseconds")]
    ClockSkew { skew_ms: u64 },

    /// The clock reported a time earlier than [`EPOCH`](crate::EPOCH).
    ///
    /// `unix_millis` is the raw reading. No ID was issued.
    #[error("Clock reads {unix_millis}ms since the Unix epoch, which is before the ID epoch")]
    ClockBeforeEpoch { unix_millis: u64 },

    /// The clock reading no longer fits in the 41-bit timestamp field.
    ///
    /// This happens roughly 69 years after [`EPOCH`](crate::EPOCH).
    #[error("Timestamp {millis}ms exceeds the 41-bit range of the epoch")]
    TimestampOverflow { millis: u64 },

    /// The partition key was empty or is not in the registry.
    #[error("Invalid keyPrefix: {key}")]
    InvalidKey { key: String },

    /// The counter store could not be reached or the increment failed.
    #[error("Counter store unavailable for key {key}: {source}")]
    BackendUnavailable {
        key: String,
        #[source]
        source: BoxError,
    },

    /// The counter store answered an increment without a usable value.
    #[error("ID generation failed for keyPrefix: {key}")]
    InconsistentResult { key: String },
}

impl Error {
    /// Returns a short, stable label for this error, suitable for log fields
    /// and metric attributes.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration",
            Self::ClockSkew { .. } => "clock_skew",
            Self::ClockBeforeEpoch { .. } => "clock_before_epoch",
            Self::TimestampOverflow { .. } => "timestamp_overflow",
            Self::InvalidKey { .. } => "invalid_key",
            Self::BackendUnavailable { .. } => "backend_unavailable",
            Self::InconsistentResult { .. } => "inconsistent_result",
        }
    }

    pub(crate) fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }
}
