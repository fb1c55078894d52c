use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

/// A polymorphic `(type, id)` reference to a host record or a principal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MorphRef {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MorphRefError {
    #[error("Reference '{0}' must look like '<type>:<id>'")]
    Malformed(String),
    #[error("Reference type cannot be empty")]
    EmptyKind,
    #[error("Reference id '{0}' is not an integer")]
    InvalidId(String),
}

impl MorphRef {
    pub fn new(kind: impl Into<String>, id: i64) -> Self {
        Self {
            kind: kind.into(),
            id,
        }
    }
}

impl fmt::Display for MorphRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl FromStr for MorphRef {
    type Err = MorphRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .trim()
            .rsplit_once(':')
            .ok_or_else(|| MorphRefError::Malformed(s.to_string()))?;
        if kind.is_empty() {
            return Err(MorphRefError::EmptyKind);
        }
        let id = id
            .parse::<i64>()
            .map_err(|_| MorphRefError::InvalidId(id.to_string()))?;
        Ok(Self::new(kind, id))
    }
}

/// Name and address a guest leaves instead of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct GuestIdentity {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email, length(min = 1, max = 255))]
    pub email: String,
}

impl GuestIdentity {
    pub fn new(name: &str, email: &str) -> Result<Self, ValidationErrors> {
        let guest = Self {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
        };
        guest.validate()?;
        Ok(guest)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Author {
    Commenter(MorphRef),
    Guest(GuestIdentity),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub author: Author,
    pub commentable: MorphRef,
    pub body: String,
    pub approved: bool,
    /// The comment this one replies to (`child_id` column).
    pub parent_id: Option<i64>,
    pub deleted_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Comment {
    pub fn commenter(&self) -> Option<&MorphRef> {
        match &self.author {
            Author::Commenter(r) => Some(r),
            Author::Guest(_) => None,
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self.author, Author::Guest(_))
    }

    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }

    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_morph_ref_parse() {
        let r: MorphRef = "users:42".parse().unwrap();
        assert_eq!(r, MorphRef::new("users", 42));
        assert_eq!(r.to_string(), "users:42");

        let namespaced: MorphRef = "app::Post:7".parse().unwrap();
        assert_eq!(namespaced.kind, "app::Post");
        assert_eq!(namespaced.id, 7);
    }

    #[test]
    fn test_morph_ref_rejects_garbage() {
        assert!(matches!(
            "users".parse::<MorphRef>(),
            Err(MorphRefError::Malformed(_))
        ));
        assert_eq!(":1".parse::<MorphRef>(), Err(MorphRefError::EmptyKind));
        assert!(matches!(
            "users:abc".parse::<MorphRef>(),
            Err(MorphRefError::InvalidId(_))
        ));
    }

    #[test]
    fn test_guest_identity_validation() {
        let guest = GuestIdentity::new("  Ada ", "ada@example.org").unwrap();
        assert_eq!(guest.name, "Ada");

        assert!(GuestIdentity::new("", "ada@example.org").is_err());
        assert!(GuestIdentity::new("Ada", "").is_err());
        assert!(GuestIdentity::new("Ada", "not-an-email").is_err());
        assert!(GuestIdentity::new(&"a".repeat(256), "ada@example.org").is_err());
    }

    #[test]
    fn test_author_serialization() {
        let author = Author::Commenter(MorphRef::new("users", 1));
        let json = serde_json::to_value(&author).unwrap();
        assert_eq!(json, serde_json::json!({ "commenter": { "type": "users", "id": 1 } }));
    }
}
