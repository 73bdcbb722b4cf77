use core::future::Future;

use redis::{Client, RedisError, aio::ConnectionManager};
use uniqueid::CounterStore;

/// A [`CounterStore`] backed by Redis `INCR`.
///
/// `INCR` is atomic on the server, so any number of service instances can
/// share one Redis and still never hand out the same value for a key. The
/// [`ConnectionManager`] multiplexes requests over one connection and
/// reconnects on its own after failures; a request that hits a broken
/// connection fails instead of being retried here.
#[derive(Clone)]
pub struct RedisCounterStore {
    conn: ConnectionManager,
}

impl RedisCounterStore {
    /// Opens a managed connection to `url`.
    ///
    /// Fails if the URL is malformed or the server cannot be reached right
    /// now.
    pub async fn connect(url: &str) -> Result<Self, RedisError> {
        let client = Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

impl CounterStore for RedisCounterStore {
    type Err = RedisError;

    fn increment(&self, key: &str) -> impl Future<Output = Result<Option<i64>, Self::Err>> + Send {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("INCR");
        cmd.arg(key);
        async move { cmd.query_async::<Option<i64>>(&mut conn).await }
    }
}

impl core::fmt::Debug for RedisCounterStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RedisCounterStore").finish_non_exhaustive()
    }
}
