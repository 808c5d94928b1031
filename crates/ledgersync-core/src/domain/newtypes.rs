//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for domain identifiers.
//! Each newtype ensures data validity at construction time.
//!
//! The central type is [`EntityId`]: a tagged union distinguishing
//! server-assigned identifiers from client-generated provisional ones,
//! so "is this entity confirmed by the server" is a type-level question
//! rather than a string-prefix check scattered through the engine.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

/// Reserved prefix identifying a provisional (never-synced) id on the wire
/// and in durable storage.
const PENDING_PREFIX: &str = "temp_";

// ============================================================================
// UserKey
// ============================================================================

/// Opaque identifier of the owning principal, stable across sessions
///
/// Every entity collection, snapshot, and queued mutation is partitioned
/// by this key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserKey(String);

impl UserKey {
    /// Create a new UserKey
    ///
    /// # Errors
    /// Returns `DomainError::InvalidUserKey` if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, DomainError> {
        let key = key.into();
        if key.is_empty() {
            return Err(DomainError::InvalidUserKey(
                "User key cannot be empty".to_string(),
            ));
        }
        Ok(Self(key))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for UserKey {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<UserKey> for String {
    fn from(key: UserKey) -> Self {
        key.0
    }
}

// ============================================================================
// EntityId
// ============================================================================

/// Identifier of a synchronized entity
///
/// - `Persisted` carries the opaque id assigned by the remote service and
///   is the only canonical form.
/// - `Pending` carries a client-generated placeholder created while a new
///   entity has not yet been confirmed by the server (typically because it
///   was created offline). Pending ids are valid foreign-key targets for
///   new local mutations, but they are excluded from any snapshot written
///   after a successful authoritative refetch.
///
/// The serialized form of a pending id is `temp_<local>`; parsing that
/// prefix back yields the `Pending` variant, so the wire format of the
/// original system round-trips losslessly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EntityId {
    /// Server-assigned canonical id
    Persisted(String),
    /// Client-generated provisional id, not yet confirmed by the server
    Pending(String),
}

impl EntityId {
    /// Create a fresh provisional id for an entity created locally
    #[must_use]
    pub fn new_pending() -> Self {
        Self::Pending(Uuid::new_v4().simple().to_string())
    }

    /// Wrap a server-assigned id
    ///
    /// # Errors
    /// Returns `DomainError::InvalidId` if the id is empty or carries the
    /// reserved provisional prefix (a server must never assign one).
    pub fn persisted(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DomainError::InvalidId("id cannot be empty".to_string()));
        }
        if id.starts_with(PENDING_PREFIX) {
            return Err(DomainError::InvalidId(format!(
                "server id cannot use reserved prefix: {id}"
            )));
        }
        Ok(Self::Persisted(id))
    }

    /// Parse an id from its wire/storage form
    ///
    /// # Errors
    /// Returns `DomainError::InvalidId` if the string is empty or a bare
    /// provisional prefix.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        if s.is_empty() {
            return Err(DomainError::InvalidId("id cannot be empty".to_string()));
        }
        match s.strip_prefix(PENDING_PREFIX) {
            Some(local) if local.is_empty() => Err(DomainError::InvalidId(
                "provisional id has no local part".to_string(),
            )),
            Some(local) => Ok(Self::Pending(local.to_string())),
            None => Ok(Self::Persisted(s.to_string())),
        }
    }

    /// Returns true if this id is still provisional (never synced)
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Returns true if this id has been assigned by the server
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted(_))
    }

    /// The wire/storage form of this id
    #[must_use]
    pub fn to_wire(&self) -> String {
        match self {
            Self::Persisted(id) => id.clone(),
            Self::Pending(local) => format!("{PENDING_PREFIX}{local}"),
        }
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Persisted(id) => write!(f, "{id}"),
            Self::Pending(local) => write!(f, "{PENDING_PREFIX}{local}"),
        }
    }
}

impl FromStr for EntityId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EntityId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.to_wire()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod user_key_tests {
        use super::*;

        #[test]
        fn test_new_valid() {
            let key = UserKey::new("user@example.com").unwrap();
            assert_eq!(key.as_str(), "user@example.com");
        }

        #[test]
        fn test_empty_fails() {
            assert!(UserKey::new("").is_err());
        }

        #[test]
        fn test_serde_roundtrip() {
            let key = UserKey::new("user-1").unwrap();
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, "\"user-1\"");
            let parsed: UserKey = serde_json::from_str(&json).unwrap();
            assert_eq!(key, parsed);
        }
    }

    mod entity_id_tests {
        use super::*;

        #[test]
        fn test_new_pending_is_unique() {
            let a = EntityId::new_pending();
            let b = EntityId::new_pending();
            assert_ne!(a, b);
            assert!(a.is_pending());
            assert!(!a.is_persisted());
        }

        #[test]
        fn test_persisted() {
            let id = EntityId::persisted("srv-42").unwrap();
            assert!(id.is_persisted());
            assert_eq!(id.to_wire(), "srv-42");
        }

        #[test]
        fn test_persisted_rejects_reserved_prefix() {
            assert!(EntityId::persisted("temp_abc").is_err());
        }

        #[test]
        fn test_persisted_rejects_empty() {
            assert!(EntityId::persisted("").is_err());
        }

        #[test]
        fn test_parse_pending_prefix() {
            let id = EntityId::parse("temp_1234").unwrap();
            assert!(id.is_pending());
            assert_eq!(id.to_wire(), "temp_1234");
        }

        #[test]
        fn test_parse_bare_prefix_fails() {
            assert!(EntityId::parse("temp_").is_err());
        }

        #[test]
        fn test_parse_server_id() {
            let id = EntityId::parse("abc123").unwrap();
            assert!(id.is_persisted());
        }

        #[test]
        fn test_display_matches_wire() {
            let id = EntityId::new_pending();
            assert_eq!(id.to_string(), id.to_wire());
            assert!(id.to_string().starts_with("temp_"));
        }

        #[test]
        fn test_serde_roundtrip() {
            let id = EntityId::parse("temp_deadbeef").unwrap();
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, "\"temp_deadbeef\"");
            let parsed: EntityId = serde_json::from_str(&json).unwrap();
            assert_eq!(id, parsed);
        }

        #[test]
        fn test_from_str() {
            let id: EntityId = "srv-9".parse().unwrap();
            assert!(id.is_persisted());

            let result: Result<EntityId, _> = "".parse();
            assert!(result.is_err());
        }
    }
}
