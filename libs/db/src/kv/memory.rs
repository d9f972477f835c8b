//! In-memory store engine.
//!
//! One lock around the whole keyspace gives transaction atomicity and
//! script snapshot semantics for free. This is the test backend and the
//! reference implementation of the primitive semantics; a wire-backed
//! engine plugs in through the same [`Dialer`]/[`Session`] seam.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{
    Dialer, Guard, KvError, Order, ScoreBound, Script, ScriptOutput, Session, Tx, WriteOp,
    ARG_CHUNK,
};

#[derive(Debug, Clone)]
enum Value {
    Blob(Vec<u8>),
    Zset(HashMap<String, f64>),
    Set(HashSet<String>),
    Hash(HashMap<String, String>),
}

#[derive(Debug, Default, Clone)]
struct Keyspace {
    keys: HashMap<String, Value>,
}

fn wrong_type(key: &str) -> KvError {
    KvError::Backend(format!("key {key} holds a value of the wrong shape"))
}

impl Keyspace {
    fn blob(&self, key: &str) -> Result<Option<&Vec<u8>>, KvError> {
        match self.keys.get(key) {
            None => Ok(None),
            Some(Value::Blob(b)) => Ok(Some(b)),
            Some(_) => Err(wrong_type(key)),
        }
    }

    fn zset(&self, key: &str) -> Result<Option<&HashMap<String, f64>>, KvError> {
        match self.keys.get(key) {
            None => Ok(None),
            Some(Value::Zset(z)) => Ok(Some(z)),
            Some(_) => Err(wrong_type(key)),
        }
    }

    fn set(&self, key: &str) -> Result<Option<&HashSet<String>>, KvError> {
        match self.keys.get(key) {
            None => Ok(None),
            Some(Value::Set(s)) => Ok(Some(s)),
            Some(_) => Err(wrong_type(key)),
        }
    }

    fn hash(&self, key: &str) -> Result<Option<&HashMap<String, String>>, KvError> {
        match self.keys.get(key) {
            None => Ok(None),
            Some(Value::Hash(h)) => Ok(Some(h)),
            Some(_) => Err(wrong_type(key)),
        }
    }

    /// Members of the sorted set ordered by (score, member).
    fn zsorted(&self, key: &str) -> Result<Vec<(String, f64)>, KvError> {
        let mut pairs: Vec<(String, f64)> = match self.zset(key)? {
            Some(z) => z.iter().map(|(m, s)| (m.clone(), *s)).collect(),
            None => Vec::new(),
        };
        pairs.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        Ok(pairs)
    }

    fn check(&self, guard: &Guard) -> Result<bool, KvError> {
        match guard {
            Guard::HashFieldAbsent { key, field } => {
                Ok(!self.hash(key)?.map_or(false, |h| h.contains_key(field)))
            }
            Guard::KeyExists { key } => Ok(self.keys.contains_key(key)),
        }
    }

    fn apply(&mut self, op: WriteOp) -> Result<(), KvError> {
        match op {
            WriteOp::Set { key, value } => {
                self.keys.insert(key, Value::Blob(value));
            }
            WriteOp::Unlink { key } => {
                self.keys.remove(&key);
            }
            WriteOp::ZAdd { key, score, member } => {
                match self.keys.entry(key.clone()).or_insert_with(|| Value::Zset(HashMap::new())) {
                    Value::Zset(z) => {
                        z.insert(member, score);
                    }
                    _ => return Err(wrong_type(&key)),
                }
            }
            WriteOp::ZRem { key, member } => {
                if let Some(Value::Zset(z)) = self.keys.get_mut(&key) {
                    z.remove(&member);
                    if z.is_empty() {
                        self.keys.remove(&key);
                    }
                }
            }
            WriteOp::SAdd { key, member } => {
                match self.keys.entry(key.clone()).or_insert_with(|| Value::Set(HashSet::new())) {
                    Value::Set(s) => {
                        s.insert(member);
                    }
                    _ => return Err(wrong_type(&key)),
                }
            }
            WriteOp::SRem { key, member } => {
                if let Some(Value::Set(s)) = self.keys.get_mut(&key) {
                    s.remove(&member);
                    if s.is_empty() {
                        self.keys.remove(&key);
                    }
                }
            }
            WriteOp::HSet { key, field, value } => {
                match self.keys.entry(key.clone()).or_insert_with(|| Value::Hash(HashMap::new())) {
                    Value::Hash(h) => {
                        h.insert(field, value);
                    }
                    _ => return Err(wrong_type(&key)),
                }
            }
            WriteOp::HDel { key, field } => {
                if let Some(Value::Hash(h)) = self.keys.get_mut(&key) {
                    h.remove(&field);
                    if h.is_empty() {
                        self.keys.remove(&key);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Shared in-memory keyspace. Cloning shares the underlying data;
/// every dialed session sees the same keyspace.
#[derive(Debug, Clone, Default)]
pub struct MemoryEngine {
    keyspace: Arc<RwLock<Keyspace>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        MemoryEngine::default()
    }

    /// Open a session directly, bypassing any pool.
    pub fn session(&self) -> MemorySession {
        MemorySession {
            keyspace: Arc::clone(&self.keyspace),
        }
    }

    /// Number of live keys, any shape. Test observability.
    pub fn key_count(&self) -> usize {
        match self.keyspace.read() {
            Ok(ks) => ks.keys.len(),
            Err(_) => 0,
        }
    }
}

impl Dialer for MemoryEngine {
    fn dial(&self) -> Result<Box<dyn Session>, KvError> {
        Ok(Box::new(self.session()))
    }
}

/// A session over the shared in-memory keyspace.
pub struct MemorySession {
    keyspace: Arc<RwLock<Keyspace>>,
}

impl MemorySession {
    fn read(&self) -> Result<RwLockReadGuard<'_, Keyspace>, KvError> {
        self.keyspace
            .read()
            .map_err(|_| KvError::Backend("keyspace lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Keyspace>, KvError> {
        self.keyspace
            .write()
            .map_err(|_| KvError::Backend("keyspace lock poisoned".into()))
    }
}

/// Clamp `start..=stop` rank indices (tail-relative when negative) to
/// `len`, returning `None` when the window is empty.
fn clamp_ranks(start: i64, stop: i64, len: usize) -> Option<(usize, usize)> {
    let n = len as i64;
    let mut start = if start < 0 { start + n } else { start };
    let mut stop = if stop < 0 { stop + n } else { stop };
    if start < 0 {
        start = 0;
    }
    if stop >= n {
        stop = n - 1;
    }
    if n == 0 || start > stop || start >= n || stop < 0 {
        return None;
    }
    Some((start as usize, stop as usize))
}

impl Session for MemorySession {
    fn ping(&mut self) -> Result<(), KvError> {
        self.read().map(|_| ())
    }

    fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        Ok(self.read()?.blob(key)?.cloned())
    }

    fn mget(&mut self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>, KvError> {
        let ks = self.read()?;
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            // Wrong-shape keys read as absent, as the wire GET does.
            out.push(match ks.keys.get(key) {
                Some(Value::Blob(b)) => Some(b.clone()),
                _ => None,
            });
        }
        Ok(out)
    }

    fn exists(&mut self, key: &str) -> Result<bool, KvError> {
        Ok(self.read()?.keys.contains_key(key))
    }

    fn hget(&mut self, key: &str, field: &str) -> Result<Option<String>, KvError> {
        Ok(self
            .read()?
            .hash(key)?
            .and_then(|h| h.get(field).cloned()))
    }

    fn hexists(&mut self, key: &str, field: &str) -> Result<bool, KvError> {
        Ok(self
            .read()?
            .hash(key)?
            .map_or(false, |h| h.contains_key(field)))
    }

    fn smembers(&mut self, key: &str) -> Result<Vec<String>, KvError> {
        Ok(self
            .read()?
            .set(key)?
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn sinter(&mut self, keys: &[String]) -> Result<Vec<String>, KvError> {
        let ks = self.read()?;
        let mut iter = keys.iter();
        let mut acc: HashSet<String> = match iter.next() {
            Some(k) => ks.set(k)?.cloned().unwrap_or_default(),
            None => return Ok(Vec::new()),
        };
        for k in iter {
            let next = ks.set(k)?.cloned().unwrap_or_default();
            acc.retain(|m| next.contains(m));
            if acc.is_empty() {
                break;
            }
        }
        Ok(acc.into_iter().collect())
    }

    fn sunion(&mut self, keys: &[String]) -> Result<Vec<String>, KvError> {
        let ks = self.read()?;
        let mut acc: HashSet<String> = HashSet::new();
        for k in keys {
            if let Some(s) = ks.set(k)? {
                acc.extend(s.iter().cloned());
            }
        }
        Ok(acc.into_iter().collect())
    }

    fn zcard(&mut self, key: &str) -> Result<u64, KvError> {
        Ok(self.read()?.zset(key)?.map_or(0, |z| z.len() as u64))
    }

    fn zscore(&mut self, key: &str, member: &str) -> Result<Option<f64>, KvError> {
        Ok(self.read()?.zset(key)?.and_then(|z| z.get(member).copied()))
    }

    fn zrange(
        &mut self,
        key: &str,
        start: i64,
        stop: i64,
        order: Order,
    ) -> Result<Vec<String>, KvError> {
        let mut pairs = self.read()?.zsorted(key)?;
        if order == Order::Desc {
            pairs.reverse();
        }
        let Some((lo, hi)) = clamp_ranks(start, stop, pairs.len()) else {
            return Ok(Vec::new());
        };
        Ok(pairs[lo..=hi].iter().map(|(m, _)| m.clone()).collect())
    }

    fn zrange_by_score(
        &mut self,
        key: &str,
        min: ScoreBound,
        max: ScoreBound,
        limit: Option<usize>,
    ) -> Result<Vec<String>, KvError> {
        let pairs = self.read()?.zsorted(key)?;
        let mut out: Vec<String> = pairs
            .into_iter()
            .filter(|(_, s)| {
                min.map_or(true, |lo| *s >= lo as f64) && max.map_or(true, |hi| *s <= hi as f64)
            })
            .map(|(m, _)| m)
            .collect();
        if let Some(n) = limit {
            out.truncate(n);
        }
        Ok(out)
    }

    fn exec(&mut self, tx: Tx) -> Result<(), KvError> {
        let mut ks = self.write()?;
        for (i, guard) in tx.guards.iter().enumerate() {
            if !ks.check(guard)? {
                return Err(KvError::TxnAborted { guard: i });
            }
        }
        // Stage on a copy so an op failing mid-batch (wrong-shape
        // target) leaves the keyspace untouched.
        let mut staged = (*ks).clone();
        for op in tx.ops {
            staged.apply(op)?;
        }
        *ks = staged;
        Ok(())
    }

    fn run(&mut self, script: Script) -> Result<ScriptOutput, KvError> {
        match script {
            Script::RangeFilter {
                range_key,
                filter_key,
                start,
                stop,
            } => {
                let ks = self.read()?;
                let pairs = ks.zsorted(&range_key)?;
                let Some((lo, hi)) = clamp_ranks(start, stop, pairs.len()) else {
                    return Ok(ScriptOutput::Members(Vec::new()));
                };
                let filter = ks.zset(&filter_key)?;
                let members = pairs[lo..=hi]
                    .iter()
                    .filter(|(m, _)| filter.map_or(false, |f| f.contains_key(m)))
                    .map(|(m, _)| m.clone())
                    .collect();
                Ok(ScriptOutput::Members(members))
            }
            Script::UnlinkZsetMembers { key } => {
                let mut ks = self.write()?;
                let members: Vec<String> =
                    ks.zset(&key)?.map_or_else(Vec::new, |z| z.keys().cloned().collect());
                let mut removed = 0u64;
                for chunk in members.chunks(ARG_CHUNK) {
                    for member in chunk {
                        if ks.keys.remove(member).is_some() {
                            removed += 1;
                        }
                    }
                }
                if ks.keys.remove(&key).is_some() {
                    removed += 1;
                }
                Ok(ScriptOutput::Unlinked(removed))
            }
            Script::UnlinkMatching { prefix } => {
                let mut ks = self.write()?;
                let matched: Vec<String> = ks
                    .keys
                    .keys()
                    .filter(|k| k.starts_with(&prefix))
                    .cloned()
                    .collect();
                let mut removed = 0u64;
                for chunk in matched.chunks(ARG_CHUNK) {
                    for key in chunk {
                        if ks.keys.remove(key).is_some() {
                            removed += 1;
                        }
                    }
                }
                Ok(ScriptOutput::Unlinked(removed))
            }
        }
    }
}
