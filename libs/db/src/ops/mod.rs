//! Operation families, one module per service domain. Each implements
//! its contract trait for [`crate::Client`], delegating the generic
//! work to `mutation`/`query` and adding only cascade specifics.

mod data;
mod export;
mod metadata;
mod notifications;
mod scheduler;

#[cfg(test)]
mod tests;

use crate::error::Result;
use crate::kv::{Script, Session};

/// Drop a whole collection: every member blob through the primary
/// sorted set, then every `c:*` index key by prefix scan.
pub(crate) fn scrub_collection(session: &mut dyn Session, collection: &str) -> Result<()> {
    session.run(Script::UnlinkZsetMembers { key: collection.to_string() })?;
    session.run(Script::UnlinkMatching { prefix: format!("{collection}:") })?;
    Ok(())
}
