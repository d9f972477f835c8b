//! The session trait: one logical connection to the store.

use super::{KvError, Order, Script, ScriptOutput, Tx};

/// Inclusive score bound; `None` is open-ended (-inf for a minimum,
/// +inf for a maximum).
pub type ScoreBound = Option<i64>;

/// A single connection to the primitive store.
///
/// Methods are synchronous; the async surface lives a layer up, where
/// sessions are checked out of the [`super::Pool`]. Implementations
/// must make [`Session::exec`] atomic: all ops apply or none do, and
/// guards observe the snapshot the ops would mutate.
pub trait Session: Send {
    /// Liveness probe, used by the pool before reusing an idle session.
    fn ping(&mut self) -> Result<(), KvError>;

    fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>, KvError>;

    /// Bulk fetch; missing keys yield `None` at their position. The
    /// caller chunks at [`super::ARG_CHUNK`].
    fn mget(&mut self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>, KvError>;

    fn exists(&mut self, key: &str) -> Result<bool, KvError>;

    fn hget(&mut self, key: &str, field: &str) -> Result<Option<String>, KvError>;

    fn hexists(&mut self, key: &str, field: &str) -> Result<bool, KvError>;

    fn smembers(&mut self, key: &str) -> Result<Vec<String>, KvError>;

    /// Members present in every listed set.
    fn sinter(&mut self, keys: &[String]) -> Result<Vec<String>, KvError>;

    /// Members present in any listed set.
    fn sunion(&mut self, keys: &[String]) -> Result<Vec<String>, KvError>;

    fn zcard(&mut self, key: &str) -> Result<u64, KvError>;

    fn zscore(&mut self, key: &str, member: &str) -> Result<Option<f64>, KvError>;

    /// Members by rank. Negative indices count from the tail; indices
    /// clamp to the set bounds. `Order::Desc` ranks from the highest
    /// score down.
    fn zrange(
        &mut self,
        key: &str,
        start: i64,
        stop: i64,
        order: Order,
    ) -> Result<Vec<String>, KvError>;

    /// Members with score in `[min, max]`, ascending, at most `limit`
    /// when given.
    fn zrange_by_score(
        &mut self,
        key: &str,
        min: ScoreBound,
        max: ScoreBound,
        limit: Option<usize>,
    ) -> Result<Vec<String>, KvError>;

    /// Apply a guarded batch atomically.
    fn exec(&mut self, tx: Tx) -> Result<(), KvError>;

    /// Run a server-side atomic program.
    fn run(&mut self, script: Script) -> Result<ScriptOutput, KvError>;
}
