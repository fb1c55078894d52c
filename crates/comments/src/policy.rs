use domain::{Comment, MorphRef};
use std::fmt;

/// The rules a principal can be checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ability {
    Create,
    Update,
    Delete,
    Reply,
}

impl Ability {
    /// Gate rule name as host applications register it.
    pub fn rule_name(&self) -> &'static str {
        match self {
            Ability::Create => "create-comment",
            Ability::Update => "edit-comment",
            Ability::Delete => "delete-comment",
            Ability::Reply => "reply-to-comment",
        }
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self {
            Ability::Create => "create comments",
            Ability::Update => "edit this comment",
            Ability::Delete => "delete this comment",
            Ability::Reply => "reply to this comment",
        };
        f.write_str(action)
    }
}

/// Answers "may this principal do X to this comment".
///
/// Hosts needing moderator roles or group ownership implement this
/// themselves and hand it to [`crate::CommentService::with_policy`].
pub trait CommentPolicy: Send + Sync {
    fn create(&self, principal: Option<&MorphRef>) -> bool;
    fn update(&self, principal: &MorphRef, comment: &Comment) -> bool;
    fn delete(&self, principal: &MorphRef, comment: &Comment) -> bool;
    fn reply(&self, principal: &MorphRef, comment: &Comment) -> bool;

    /// Gate entry point. Anything but `Create` needs both a principal and a comment.
    fn allows(
        &self,
        ability: Ability,
        principal: Option<&MorphRef>,
        comment: Option<&Comment>,
    ) -> bool {
        match (ability, principal, comment) {
            (Ability::Create, principal, _) => self.create(principal),
            (Ability::Update, Some(p), Some(c)) => self.update(p, c),
            (Ability::Delete, Some(p), Some(c)) => self.delete(p, c),
            (Ability::Reply, Some(p), Some(c)) => self.reply(p, c),
            _ => false,
        }
    }
}

/// Owners edit and delete their own comments and reply to everyone else's.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCommentPolicy;

impl CommentPolicy for DefaultCommentPolicy {
    fn create(&self, _principal: Option<&MorphRef>) -> bool {
        true
    }

    fn update(&self, principal: &MorphRef, comment: &Comment) -> bool {
        comment.commenter() == Some(principal)
    }

    fn delete(&self, principal: &MorphRef, comment: &Comment) -> bool {
        comment.commenter() == Some(principal)
    }

    fn reply(&self, principal: &MorphRef, comment: &Comment) -> bool {
        comment.commenter() != Some(principal)
    }
}
