//! Mutation commands, transaction guards, and server-side scripts.

/// Transport-level store failure.
#[derive(Debug, thiserror::Error)]
pub enum KvError {
    /// The pool or session has been closed.
    #[error("store connection closed")]
    Closed,

    /// Dialing or acquiring a session exceeded its deadline.
    #[error("store operation timed out")]
    Timeout,

    /// A transaction guard failed; no ops were applied. The index
    /// identifies the failing guard within `Tx::guards`.
    #[error("transaction aborted by guard {guard}")]
    TxnAborted { guard: usize },

    /// Any other backend failure, including type mismatches on keys.
    #[error("store backend: {0}")]
    Backend(String),
}

/// A primitive write against the keyspace.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Store a blob under `key`.
    Set { key: String, value: Vec<u8> },
    /// Remove `key` of any shape.
    Unlink { key: String },
    /// Add or rescore `member` in the sorted set at `key`.
    ZAdd { key: String, score: f64, member: String },
    /// Remove `member` from the sorted set at `key`.
    ZRem { key: String, member: String },
    /// Add `member` to the set at `key`.
    SAdd { key: String, member: String },
    /// Remove `member` from the set at `key`.
    SRem { key: String, member: String },
    /// Set `field` in the hash at `key`.
    HSet { key: String, field: String, value: String },
    /// Remove `field` from the hash at `key`.
    HDel { key: String, field: String },
}

/// A precondition evaluated atomically with the ops of its [`Tx`], on
/// the same snapshot the ops mutate. A failing guard aborts the whole
/// transaction with zero mutations applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Guard {
    /// The hash at `key` must not contain `field`. A missing hash
    /// passes. Backs uniqueness enforcement.
    HashFieldAbsent { key: String, field: String },
    /// `key` must exist in any shape. Backs reference validation.
    KeyExists { key: String },
}

/// An atomic guarded batch; the MULTI/EXEC unit.
#[derive(Debug, Clone, Default)]
pub struct Tx {
    pub guards: Vec<Guard>,
    pub ops: Vec<WriteOp>,
}

impl Tx {
    pub fn new() -> Self {
        Tx::default()
    }

    pub fn guard(&mut self, guard: Guard) -> &mut Self {
        self.guards.push(guard);
        self
    }

    pub fn push(&mut self, op: WriteOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    /// Fold another transaction into this one, preserving order.
    pub fn merge(&mut self, other: Tx) -> &mut Self {
        self.guards.extend(other.guards);
        self.ops.extend(other.ops);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty() && self.ops.is_empty()
    }
}

/// Sorted-set traversal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

/// A server-side atomic program. Scripts see a consistent snapshot and
/// chunk their own bulk calls at [`super::ARG_CHUNK`] arguments.
#[derive(Debug, Clone)]
pub enum Script {
    /// Range over `range_key`, keeping only members that carry a score
    /// in `filter_key`, in range order.
    RangeFilter {
        range_key: String,
        filter_key: String,
        start: i64,
        stop: i64,
    },
    /// Unlink every member of the sorted set at `key` (each member is
    /// itself a key), then the set.
    UnlinkZsetMembers { key: String },
    /// Cursor-scan the keyspace and unlink every key matching
    /// `prefix*`.
    UnlinkMatching { prefix: String },
}

/// Script results.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptOutput {
    /// Member ids, for `RangeFilter`.
    Members(Vec<String>),
    /// Number of keys removed, for the unlink scripts.
    Unlinked(u64),
}

impl ScriptOutput {
    pub fn into_members(self) -> Vec<String> {
        match self {
            ScriptOutput::Members(m) => m,
            ScriptOutput::Unlinked(_) => Vec::new(),
        }
    }
}
