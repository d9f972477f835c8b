//! The client: pool ownership and lifecycle.
//!
//! A `Client` is handed to services by whoever owns process wiring;
//! there is no process-global instance. Cloning shares the pool.

use tracing::info;

use crate::error::Result;
use crate::kv::{Dialer, Pool, PoolConfig, PooledSession};

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub pool: PoolConfig,
}

/// Handle to the store. Implements every contract trait in
/// [`crate::provider`].
#[derive(Clone)]
pub struct Client {
    pool: Pool,
}

impl Client {
    /// Build the pool and verify one session before handing the client
    /// out; later sessions dial lazily.
    pub async fn connect(config: ClientConfig, dialer: Box<dyn Dialer>) -> Result<Self> {
        let pool = Pool::new(config.pool, dialer);
        {
            let mut session = pool.acquire().await?;
            session.ping()?;
        }
        info!("store client connected");
        Ok(Client { pool })
    }

    /// Tear down the pool. Idempotent; operations after close fail
    /// with a transport `Closed` error.
    pub fn close(&self) {
        self.pool.close();
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    pub(crate) async fn session(&self) -> Result<PooledSession> {
        Ok(self.pool.acquire().await?)
    }
}
