//! Connection pool.
//!
//! Sessions are dialed lazily through an injected [`Dialer`]. Idle
//! sessions are reused after a liveness `ping` and redialed when the
//! probe fails. `max_active` bounds total checked-out sessions;
//! acquisition blocks up to `acquire_timeout` when the pool is
//! exhausted. `close` is idempotent and fails later acquisitions fast.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info, warn};

use super::{KvError, Session};

/// Produces fresh sessions. Injected so tests dial the in-memory
/// engine and production code dials a wire transport.
pub trait Dialer: Send + Sync + 'static {
    fn dial(&self) -> Result<Box<dyn Session>, KvError>;
}

#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Idle sessions retained for reuse; surplus are dropped on return.
    pub max_idle: usize,
    /// Total sessions allowed out at once.
    pub max_active: usize,
    /// Deadline for dialing one session.
    pub connect_timeout: Duration,
    /// How long `acquire` waits for a free slot before `Timeout`.
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            max_idle: 8,
            max_active: 64,
            connect_timeout: Duration::from_secs(5),
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

struct PoolInner {
    dialer: Box<dyn Dialer>,
    config: PoolConfig,
    idle: Mutex<Vec<Box<dyn Session>>>,
    slots: Arc<Semaphore>,
    closed: AtomicBool,
}

/// Shared session pool. Cloning shares the pool.
#[derive(Clone)]
pub struct Pool {
    inner: Arc<PoolInner>,
}

impl Pool {
    pub fn new(config: PoolConfig, dialer: Box<dyn Dialer>) -> Self {
        let slots = Arc::new(Semaphore::new(config.max_active));
        Pool {
            inner: Arc::new(PoolInner {
                dialer,
                config,
                idle: Mutex::new(Vec::new()),
                slots,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Check out a session, reusing a live idle one or dialing fresh.
    pub async fn acquire(&self) -> Result<PooledSession, KvError> {
        let inner = &self.inner;
        if inner.closed.load(Ordering::Acquire) {
            return Err(KvError::Closed);
        }

        let permit = tokio::time::timeout(
            inner.config.acquire_timeout,
            Arc::clone(&inner.slots).acquire_owned(),
        )
        .await
        .map_err(|_| KvError::Timeout)?
        // The semaphore only closes when the pool does.
        .map_err(|_| KvError::Closed)?;

        while let Some(mut session) = self.pop_idle() {
            match session.ping() {
                Ok(()) => {
                    return Ok(PooledSession {
                        session: Some(session),
                        pool: Arc::clone(inner),
                        _permit: permit,
                    })
                }
                Err(err) => {
                    debug!(error = %err, "idle session failed liveness probe, redialing");
                }
            }
        }

        let session = self.dial().await?;
        Ok(PooledSession {
            session: Some(session),
            pool: Arc::clone(inner),
            _permit: permit,
        })
    }

    async fn dial(&self) -> Result<Box<dyn Session>, KvError> {
        let inner = Arc::clone(&self.inner);
        let dialed = tokio::time::timeout(
            inner.config.connect_timeout,
            tokio::task::spawn_blocking(move || inner.dialer.dial()),
        )
        .await
        .map_err(|_| KvError::Timeout)?
        .map_err(|err| KvError::Backend(format!("dial task failed: {err}")))??;
        debug!("dialed new store session");
        Ok(dialed)
    }

    fn pop_idle(&self) -> Option<Box<dyn Session>> {
        match self.inner.idle.lock() {
            Ok(mut idle) => idle.pop(),
            Err(_) => None,
        }
    }

    /// Close the pool: drop idle sessions and fail later acquisitions
    /// with [`KvError::Closed`]. Safe to call repeatedly.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.slots.close();
        match self.inner.idle.lock() {
            Ok(mut idle) => {
                let dropped = idle.len();
                idle.clear();
                info!(idle_dropped = dropped, "store pool closed");
            }
            Err(_) => warn!("store pool closed with poisoned idle list"),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

/// A checked-out session; returns to the idle list on drop.
pub struct PooledSession {
    session: Option<Box<dyn Session>>,
    pool: Arc<PoolInner>,
    _permit: OwnedSemaphorePermit,
}

impl Deref for PooledSession {
    type Target = dyn Session;

    fn deref(&self) -> &Self::Target {
        // Present from construction until drop.
        self.session.as_deref().expect("live pooled session")
    }
}

impl DerefMut for PooledSession {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.session.as_deref_mut().expect("live pooled session")
    }
}

impl Drop for PooledSession {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        if self.pool.closed.load(Ordering::Acquire) {
            return;
        }
        if let Ok(mut idle) = self.pool.idle.lock() {
            if idle.len() < self.pool.config.max_idle {
                idle.push(session);
            }
        }
    }
}
