use crate::models::{Comment, MorphRef};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "comment", rename_all = "snake_case")]
pub enum CommentEvent {
    Created(Comment),
    Updated(Comment),
    Deleted(Comment),
}

impl CommentEvent {
    pub fn comment(&self) -> &Comment {
        match self {
            CommentEvent::Created(c) | CommentEvent::Updated(c) | CommentEvent::Deleted(c) => c,
        }
    }

    pub fn commentable(&self) -> &MorphRef {
        &self.comment().commentable
    }

    pub fn name(&self) -> &'static str {
        match self {
            CommentEvent::Created(_) => "comment_created",
            CommentEvent::Updated(_) => "comment_updated",
            CommentEvent::Deleted(_) => "comment_deleted",
        }
    }
}
