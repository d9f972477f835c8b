//! The document trait: how an entity maps onto the keyspace.
//!
//! One interface drives everything generic in this crate. An entity
//! declares its collection, its business-unique key, the secondary
//! index memberships derived from its fields, and the foreign
//! references that must hold at insert time. The mutation, query, and
//! resolver layers never special-case an entity type.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

/// One secondary index membership for an entity.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct IndexEntry {
    pub key: String,
    pub kind: IndexKind,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum IndexKind {
    /// Sorted-set membership with the given score.
    Zset(i64),
    /// Plain set membership.
    Set,
}

impl IndexEntry {
    pub fn zset(key: String, score: i64) -> Self {
        IndexEntry { key, kind: IndexKind::Zset(score) }
    }

    pub fn set(key: String) -> Self {
        IndexEntry { key, kind: IndexKind::Set }
    }
}

/// A foreign reference carried by an entity.
///
/// Before an insert commits, each reference is hardened: an empty id
/// with a name looks the id up through the referenced collection's
/// uniqueness hash; a present id is pinned with an existence guard in
/// the same transaction that writes the entity.
#[derive(Debug, Clone)]
pub(crate) struct Reference {
    /// Field label, for the byte written back and for error text.
    pub field: &'static str,
    /// Collection the reference points into.
    pub collection: &'static str,
    pub id: String,
    pub name: String,
}

/// An entity the engine can persist.
pub(crate) trait Document:
    Clone + Send + Sync + Serialize + DeserializeOwned + 'static
{
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);

    fn created(&self) -> i64;
    fn set_created(&mut self, ts: i64);
    fn set_modified(&mut self, ts: i64);

    /// The business-unique key, when the collection enforces one.
    fn unique_name(&self) -> Option<String> {
        None
    }

    /// Secondary index memberships derived from current field values.
    /// Insert adds exactly these; delete removes exactly the entries
    /// computed from the stored copy.
    fn index_entries(&self) -> Vec<IndexEntry>;

    /// Foreign references to validate and harden at insert time.
    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }

    /// Write a hardened reference id back onto the entity.
    fn apply_reference(&mut self, _field: &'static str, _id: &str) {}

    /// Encode the stored form. Entities with reference fields override
    /// this to persist `(id, name)` projections instead of the full
    /// referenced entity.
    fn encode(&self) -> Result<Vec<u8>> {
        to_blob(self)
    }

    /// Decode the stored form. Reference fields come back as stubs
    /// carrying only `(id, name)`; the resolver completes them.
    fn decode(bytes: &[u8]) -> Result<Self> {
        from_blob(bytes)
    }
}

pub(crate) fn to_blob<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(value).map_err(|err| Error::Codec(err.to_string()))
}

pub(crate) fn from_blob<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    rmp_serde::from_slice(bytes).map_err(|err| Error::Codec(err.to_string()))
}

/// Merge incoming field values over a stored entity.
///
/// Unset fields of the incoming entity (null, empty string, zero,
/// false, empty list) keep the stored value; everything else wins.
/// Nested objects merge field-wise. `created` always survives from the
/// stored copy regardless.
pub(crate) fn merge_over<D: Document>(incoming: &D, stored: &D) -> Result<D> {
    let new = serde_json::to_value(incoming).map_err(|err| Error::Codec(err.to_string()))?;
    let old = serde_json::to_value(stored).map_err(|err| Error::Codec(err.to_string()))?;
    let merged = merge_value(new, old);
    let mut doc: D =
        serde_json::from_value(merged).map_err(|err| Error::Codec(err.to_string()))?;
    doc.set_created(stored.created());
    Ok(doc)
}

fn is_unset(v: &serde_json::Value) -> bool {
    match v {
        serde_json::Value::Null => true,
        serde_json::Value::Bool(b) => !b,
        serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
        serde_json::Value::String(s) => s.is_empty(),
        serde_json::Value::Array(a) => a.is_empty(),
        serde_json::Value::Object(o) => o.is_empty(),
    }
}

fn merge_value(new: serde_json::Value, old: serde_json::Value) -> serde_json::Value {
    match (new, old) {
        (serde_json::Value::Object(new_map), serde_json::Value::Object(mut old_map)) => {
            let mut out = serde_json::Map::new();
            for (k, new_v) in new_map {
                let merged = match old_map.remove(&k) {
                    Some(old_v) if is_unset(&new_v) => old_v,
                    Some(old_v) => merge_value(new_v, old_v),
                    None => new_v,
                };
                out.insert(k, merged);
            }
            // Fields only the stored copy has (older writer) survive.
            for (k, old_v) in old_map {
                out.insert(k, old_v);
            }
            serde_json::Value::Object(out)
        }
        (new_v, old_v) => {
            if is_unset(&new_v) {
                old_v
            } else {
                new_v
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdin_core::models::ValueDescriptor;

    #[test]
    fn merge_keeps_stored_values_for_unset_fields() {
        let stored = ValueDescriptor {
            id: "vd-1".into(),
            name: "temperature".into(),
            value_type: "Float".into(),
            uom_label: "celsius".into(),
            created: 100,
            modified: 100,
            ..Default::default()
        };
        let incoming = ValueDescriptor {
            id: "vd-1".into(),
            uom_label: "kelvin".into(),
            ..Default::default()
        };

        let merged = merge_over(&incoming, &stored).unwrap();
        assert_eq!(merged.name, "temperature");
        assert_eq!(merged.value_type, "Float");
        assert_eq!(merged.uom_label, "kelvin");
        assert_eq!(merged.created, 100);
    }

    #[test]
    fn merge_overwrites_set_fields() {
        let stored = ValueDescriptor {
            id: "vd-1".into(),
            name: "temperature".into(),
            labels: vec!["env".into()],
            ..Default::default()
        };
        let incoming = ValueDescriptor {
            id: "vd-1".into(),
            name: "temp".into(),
            labels: vec!["weather".into(), "env".into()],
            ..Default::default()
        };

        let merged = merge_over(&incoming, &stored).unwrap();
        assert_eq!(merged.name, "temp");
        assert_eq!(merged.labels, vec!["weather".to_string(), "env".to_string()]);
    }
}
