//! Generic document queries. Operation modules delegate here; only the
//! key names differ per collection.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::kv::{Order, ScoreBound, Script, Session, ARG_CHUNK};
use crate::schema;

/// Fetch and decode one document by id.
pub(crate) fn get_by_id<D: Document>(session: &mut dyn Session, id: &str) -> Result<D> {
    let blob = session.get(id)?.ok_or(Error::NotFound)?;
    D::decode(&blob)
}

/// Fetch one document through its collection's uniqueness hash.
pub(crate) fn get_by_name<D: Document>(session: &mut dyn Session, name: &str) -> Result<D> {
    let id = session
        .hget(&schema::name_hash(D::COLLECTION), name)?
        .ok_or(Error::NotFound)?;
    get_by_id(session, &id)
}

/// Bulk fetch documents by id, chunked at the argument bound. Ids whose
/// blob has vanished (a concurrent delete between index read and fetch)
/// are skipped rather than failing the whole query.
pub(crate) fn fetch_many<D: Document>(
    session: &mut dyn Session,
    ids: &[String],
) -> Result<Vec<D>> {
    let mut out = Vec::with_capacity(ids.len());
    for chunk in ids.chunks(ARG_CHUNK) {
        for blob in session.mget(chunk)?.into_iter().flatten() {
            out.push(D::decode(&blob)?);
        }
    }
    Ok(out)
}

/// Documents in a set index.
pub(crate) fn by_set<D: Document>(session: &mut dyn Session, key: &str) -> Result<Vec<D>> {
    let ids = session.smembers(key)?;
    fetch_many(session, &ids)
}

/// Documents present in every listed set index.
pub(crate) fn by_intersection<D: Document>(
    session: &mut dyn Session,
    keys: &[String],
) -> Result<Vec<D>> {
    let ids = session.sinter(keys)?;
    fetch_many(session, &ids)
}

/// Documents present in any listed set index, trimmed to `limit`.
pub(crate) fn by_union<D: Document>(
    session: &mut dyn Session,
    keys: &[String],
    limit: Option<usize>,
) -> Result<Vec<D>> {
    let mut ids = session.sunion(keys)?;
    if let Some(n) = limit {
        ids.truncate(n);
    }
    fetch_many(session, &ids)
}

/// Documents by rank window over a sorted-set key.
pub(crate) fn by_range<D: Document>(
    session: &mut dyn Session,
    key: &str,
    start: i64,
    stop: i64,
    order: Order,
) -> Result<Vec<D>> {
    let ids = session.zrange(key, start, stop, order)?;
    fetch_many(session, &ids)
}

/// Documents by score window over a sorted-set key.
pub(crate) fn by_score<D: Document>(
    session: &mut dyn Session,
    key: &str,
    min: ScoreBound,
    max: ScoreBound,
    limit: Option<usize>,
) -> Result<Vec<D>> {
    let ids = session.zrange_by_score(key, min, max, limit)?;
    fetch_many(session, &ids)
}

/// Documents in a rank window of `range_key` that also appear in
/// `filter_key`, in range order.
pub(crate) fn by_range_filtered<D: Document>(
    session: &mut dyn Session,
    range_key: &str,
    filter_key: &str,
    start: i64,
    stop: i64,
) -> Result<Vec<D>> {
    let ids = session
        .run(Script::RangeFilter {
            range_key: range_key.to_string(),
            filter_key: filter_key.to_string(),
            start,
            stop,
        })?
        .into_members();
    fetch_many(session, &ids)
}

/// The whole collection, insertion-key ordered.
pub(crate) fn all<D: Document>(session: &mut dyn Session) -> Result<Vec<D>> {
    by_range(session, D::COLLECTION, 0, -1, Order::Asc)
}

/// The collection trimmed to `limit` entries. A zero limit is an
/// explicit empty result, never "everything".
pub(crate) fn all_limited<D: Document>(session: &mut dyn Session, limit: usize) -> Result<Vec<D>> {
    if limit == 0 {
        return Ok(Vec::new());
    }
    by_range(session, D::COLLECTION, 0, limit as i64 - 1, Order::Asc)
}

/// Rank-window helper honoring the zero-limit rule.
pub(crate) fn head<D: Document>(
    session: &mut dyn Session,
    key: &str,
    limit: usize,
    order: Order,
) -> Result<Vec<D>> {
    if limit == 0 {
        return Ok(Vec::new());
    }
    by_range(session, key, 0, limit as i64 - 1, order)
}
