use serde::{Deserialize, Serialize};
use std::fmt;

/// A SQL identifier safe to splice into a query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableName(String);

impl TableName {
    pub fn new(s: impl Into<String>) -> Result<Self, String> {
        let s = s.into();
        if s.is_empty() {
            return Err("Table name cannot be empty.".to_string());
        }
        if s.len() > 64 {
            return Err("Table name is too long (max 64 chars).".to_string());
        }
        let mut chars = s.chars();
        let starts_ok = chars
            .next()
            .map(|c| c.is_ascii_alphabetic() || c == '_')
            .unwrap_or(false);
        if !starts_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(format!("Table name '{}' contains invalid characters.", s));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TableName {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<TableName> for String {
    fn from(t: TableName) -> Self {
        t.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for TableName {
    fn default() -> Self {
        Self("comments".to_string())
    }
}

/// Switches for the comment lifecycle, built once and handed to the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentsConfig {
    /// Table backing the comment entity. Migrations only create `comments`;
    /// any other table must be created by the host with the same columns.
    pub model: TableName,
    /// When false, posting requires a principal that passes the create rule.
    pub guest_commenting: bool,
    /// When true, new comments and replies start unapproved.
    pub approval_required: bool,
    /// When true, `destroy` marks rows deleted instead of removing them.
    pub soft_deletes: bool,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            model: TableName::default(),
            guest_commenting: true,
            approval_required: false,
            soft_deletes: true,
        }
    }
}

impl CommentsConfig {
    pub fn approved_by_default(&self) -> bool {
        !self.approval_required
    }
}
