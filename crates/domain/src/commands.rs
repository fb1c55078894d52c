use crate::models::MorphRef;
use serde::Deserialize;

/// Payload for posting a new top-level comment.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreComment {
    pub commentable_type: String,
    pub commentable_id: i64,
    pub message: String,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
}

impl StoreComment {
    pub fn new(commentable: &MorphRef, message: impl Into<String>) -> Self {
        Self {
            commentable_type: commentable.kind.clone(),
            commentable_id: commentable.id,
            message: message.into(),
            guest_name: None,
            guest_email: None,
        }
    }

    pub fn as_guest(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.guest_name = Some(name.into());
        self.guest_email = Some(email.into());
        self
    }

    pub fn commentable(&self) -> MorphRef {
        MorphRef::new(self.commentable_type.clone(), self.commentable_id)
    }
}
