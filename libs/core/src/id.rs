//! Object identifiers.
//!
//! Two forms are accepted: hyphenated lowercase UUID strings (the
//! generated form) and 24-character lowercase hex strings carried over
//! from legacy data. Validation is purely structural; existence is a
//! storage question.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

/// Identifier validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid object id: {0}")]
pub struct IdError(pub String);

/// A validated object identifier.
///
/// # Example
///
/// ```rust
/// use verdin_core::ObjectId;
///
/// let generated = ObjectId::generate();
/// assert!(ObjectId::parse(generated.as_str()).is_ok());
/// assert!(ObjectId::parse("5aae1f4fe4b0d019b26a56b8").is_ok());
/// assert!(ObjectId::parse("not-an-id").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectId(String);

impl ObjectId {
    /// Generate a fresh v4 UUID identifier.
    pub fn generate() -> Self {
        ObjectId(Uuid::new_v4().to_string())
    }

    /// Validate an identifier string: hyphenated lowercase UUID or
    /// 24-char lowercase hex. Other UUID spellings (simple, braced,
    /// urn, uppercase) are rejected so one entity has one key form.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        let lower_hex = |b: u8| b.is_ascii_digit() || (b'a'..=b'f').contains(&b);
        if s.len() == 36
            && Uuid::try_parse(s).is_ok()
            && !s.bytes().any(|b| b.is_ascii_uppercase())
        {
            return Ok(ObjectId(s.to_string()));
        }
        if s.len() == 24 && s.bytes().all(lower_hex) {
            return Ok(ObjectId(s.to_string()));
        }
        Err(IdError(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl FromStr for ObjectId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectId::parse(s)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_uuid_and_legacy_hex() {
        let id = ObjectId::generate();
        assert!(ObjectId::parse(id.as_str()).is_ok());
        assert!(ObjectId::parse("5aae1f4fe4b0d019b26a56b8").is_ok());
    }

    #[test]
    fn rejects_malformed() {
        for bad in [
            "",
            "abc",
            "5aae1f4fe4b0d019b26a56b", // 23 chars
            "5aae1f4fe4b0d019b26a56bZ", // non-hex
            "not-a-uuid-at-all-really",
        ] {
            assert!(ObjectId::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn rejects_alternate_spellings() {
        for bad in [
            "5AAE1F4FE4B0D019B26A56B8",               // uppercase hex
            "67e5504410b1426f9247bb680e5fe0c8",       // simple-form uuid
            "{67e55044-10b1-426f-9247-bb680e5fe0c8}", // braced
            "urn:uuid:67e55044-10b1-426f-9247-bb680e5fe0c8",
            "67E55044-10B1-426F-9247-BB680E5FE0C8",   // uppercase uuid
        ] {
            assert!(ObjectId::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn round_trips_display() {
        let id = ObjectId::generate();
        let again: ObjectId = id.as_str().parse().unwrap();
        assert_eq!(id, again);
    }
}
