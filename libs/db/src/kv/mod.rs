//! Primitive key-value store abstraction.
//!
//! The backing store understands four shapes under one flat keyspace:
//! opaque blobs, sorted sets, unordered sets, and hash maps. Everything
//! document-like (secondary indexes, uniqueness, cascades) is
//! synthesized above this module from the primitives exposed here.
//!
//! A [`Session`] is one logical connection. Mutations travel as a
//! [`Tx`]: a guarded batch that applies atomically or not at all.
//! Multi-step maintenance that must not interleave with other clients
//! runs as a [`Script`] on the store side.

mod command;
mod memory;
mod pool;
mod session;

#[cfg(test)]
mod tests;

pub use command::{Guard, KvError, Order, Script, ScriptOutput, Tx, WriteOp};
pub use memory::MemoryEngine;
pub use pool::{Dialer, Pool, PoolConfig, PooledSession};
pub use session::{ScoreBound, Session};

/// Argument-count bound of the store's scripting and bulk-fetch calls.
/// Scripts and mget batches chunk at this size.
pub const ARG_CHUNK: usize = 4096;
