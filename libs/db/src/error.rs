//! The error taxonomy callers match on. Variants, not strings, carry
//! the semantics.

use crate::kv::KvError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity does not exist.
    #[error("not found")]
    NotFound,

    /// Structurally malformed identifier (neither UUID nor 24-hex).
    #[error("invalid object id: {0}")]
    InvalidIdentifier(String),

    /// The entity's business-unique key is already taken.
    #[error("name is not unique: {0}")]
    NotUnique(String),

    /// A referenced entity could not be validated or resolved.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// The entity is still referenced by another and cannot be removed.
    #[error("still in use: {0}")]
    StillInUse(String),

    /// Transport or store failure.
    #[error(transparent)]
    Transport(#[from] KvError),

    /// A stored blob failed to decode or an entity failed to encode.
    #[error("codec: {0}")]
    Codec(String),
}

impl From<verdin_core::IdError> for Error {
    fn from(err: verdin_core::IdError) -> Self {
        Error::InvalidIdentifier(err.0)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
