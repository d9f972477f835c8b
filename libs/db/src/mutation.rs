//! Generic document mutation: guarded transaction assembly for insert,
//! update, and delete. Operation modules delegate here and only add
//! their cascade specifics.

use tracing::debug;

use verdin_core::{timestamp_ms, ObjectId};

use crate::document::{merge_over, Document, IndexKind};
use crate::error::{Error, Result};
use crate::kv::{Guard, KvError, Session, Tx, WriteOp};
use crate::query;
use crate::schema;

/// Validate or assign the id, then stamp timestamps. A fresh `created`
/// is only applied when the caller left it zero.
pub(crate) fn prepare_new<D: Document>(doc: &mut D, now: i64) -> Result<()> {
    if doc.id().is_empty() {
        doc.set_id(ObjectId::generate().into_string());
    } else {
        ObjectId::parse(doc.id())?;
    }
    if doc.created() == 0 {
        doc.set_created(now);
    }
    doc.set_modified(now);
    Ok(())
}

/// Harden every reference the document carries.
///
/// An empty id with a name resolves the id through the referenced
/// collection's uniqueness hash and writes it back. Either way the
/// final id is pinned with an existence guard in the caller's
/// transaction, so the reference still holds when the write commits.
pub(crate) fn harden_references<D: Document>(
    session: &mut dyn Session,
    doc: &mut D,
    tx: &mut Tx,
) -> Result<()> {
    for reference in doc.references() {
        let id = if reference.id.is_empty() {
            if reference.name.is_empty() {
                return Err(Error::InvalidReference(format!(
                    "{} names no {}",
                    reference.field, reference.collection
                )));
            }
            let id = session
                .hget(&schema::name_hash(reference.collection), &reference.name)?
                .ok_or_else(|| {
                    Error::InvalidReference(format!(
                        "no {} named {}",
                        reference.collection, reference.name
                    ))
                })?;
            doc.apply_reference(reference.field, &id);
            id
        } else {
            reference.id.clone()
        };
        tx.guard(Guard::KeyExists { key: id });
    }
    Ok(())
}

/// The full write set for one document: blob, primary membership,
/// uniqueness hash entry, and every secondary index entry.
pub(crate) fn insert_tx<D: Document>(doc: &D, guard_unique: bool) -> Result<Tx> {
    let id = doc.id().to_string();
    let mut tx = Tx::new();
    tx.push(WriteOp::Set { key: id.clone(), value: doc.encode()? });
    tx.push(WriteOp::ZAdd {
        key: D::COLLECTION.to_string(),
        score: 0.0,
        member: id.clone(),
    });
    if let Some(name) = doc.unique_name() {
        let key = schema::name_hash(D::COLLECTION);
        if guard_unique {
            tx.guard(Guard::HashFieldAbsent { key: key.clone(), field: name.clone() });
        }
        tx.push(WriteOp::HSet { key, field: name, value: id.clone() });
    }
    for entry in doc.index_entries() {
        tx.push(match entry.kind {
            IndexKind::Zset(score) => WriteOp::ZAdd {
                key: entry.key,
                score: score as f64,
                member: id.clone(),
            },
            IndexKind::Set => WriteOp::SAdd { key: entry.key, member: id.clone() },
        });
    }
    Ok(tx)
}

/// The exact mirror of [`insert_tx`], computed from the stored copy.
pub(crate) fn remove_ops<D: Document>(doc: &D) -> Tx {
    let id = doc.id().to_string();
    let mut tx = Tx::new();
    tx.push(WriteOp::Unlink { key: id.clone() });
    tx.push(WriteOp::ZRem { key: D::COLLECTION.to_string(), member: id.clone() });
    if let Some(name) = doc.unique_name() {
        tx.push(WriteOp::HDel { key: schema::name_hash(D::COLLECTION), field: name });
    }
    for entry in doc.index_entries() {
        tx.push(match entry.kind {
            IndexKind::Zset(_) => WriteOp::ZRem { key: entry.key, member: id.clone() },
            IndexKind::Set => WriteOp::SRem { key: entry.key, member: id.clone() },
        });
    }
    tx
}

/// Execute a guarded transaction, translating a guard abort into the
/// taxonomy error it stands for.
pub(crate) fn exec_guarded(session: &mut dyn Session, tx: Tx) -> Result<()> {
    let guards = tx.guards.clone();
    match session.exec(tx) {
        Ok(()) => Ok(()),
        Err(KvError::TxnAborted { guard }) => Err(match guards.get(guard) {
            Some(Guard::HashFieldAbsent { field, .. }) => Error::NotUnique(field.clone()),
            Some(Guard::KeyExists { key }) => {
                Error::InvalidReference(format!("missing referenced entity {key}"))
            }
            None => Error::Transport(KvError::TxnAborted { guard }),
        }),
        Err(err) => Err(err.into()),
    }
}

/// Insert a document with no cascade.
pub(crate) fn add_doc<D: Document>(session: &mut dyn Session, mut doc: D) -> Result<D> {
    prepare_new(&mut doc, timestamp_ms())?;
    let mut tx = Tx::new();
    harden_references(session, &mut doc, &mut tx)?;
    tx.merge(insert_tx(&doc, true)?);
    exec_guarded(session, tx)?;
    debug!(collection = D::COLLECTION, id = %doc.id(), "document added");
    Ok(doc)
}

/// Merge-update a document with no cascade: fetch the stored copy,
/// merge incoming fields over it, then delete and reinsert in one
/// transaction. Uniqueness is re-asserted whenever the merged business
/// key differs from the stored one.
pub(crate) fn update_doc<D: Document>(session: &mut dyn Session, incoming: D) -> Result<D> {
    ObjectId::parse(incoming.id())?;
    let stored: D = query::get_by_id(session, incoming.id())?;
    let mut merged = merge_over(&incoming, &stored)?;
    merged.set_modified(timestamp_ms());

    let mut tx = Tx::new();
    harden_references(session, &mut merged, &mut tx)?;
    tx.merge(remove_ops(&stored));
    let renamed = merged.unique_name() != stored.unique_name();
    tx.merge(insert_tx(&merged, renamed)?);
    exec_guarded(session, tx)?;
    debug!(collection = D::COLLECTION, id = %merged.id(), "document updated");
    Ok(merged)
}

/// Delete a document with no cascade, returning the stored copy.
pub(crate) fn delete_doc<D: Document>(session: &mut dyn Session, id: &str) -> Result<D> {
    ObjectId::parse(id)?;
    let stored: D = query::get_by_id(session, id)?;
    exec_guarded(session, remove_ops(&stored))?;
    debug!(collection = D::COLLECTION, id = %id, "document deleted");
    Ok(stored)
}
