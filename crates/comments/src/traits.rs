use anyhow::Result as HookResult;
use async_trait::async_trait;
use domain::{Comment, MorphRef};
use sqlx::SqliteConnection;
use storage::CommentStore;

use crate::error::Result;

/// Callbacks a host record can opt into. Each runs on the connection of the
/// open transaction; returning an error rolls the whole operation back.
#[async_trait]
pub trait CommentHooks: Send + Sync {
    async fn after_create(&self, _conn: &mut SqliteConnection, _comment: &Comment) -> HookResult<()> {
        Ok(())
    }

    async fn after_update(&self, _conn: &mut SqliteConnection, _comment: &Comment) -> HookResult<()> {
        Ok(())
    }

    async fn before_delete(&self, _conn: &mut SqliteConnection, _comment: &Comment) -> HookResult<()> {
        Ok(())
    }

    async fn after_delete(&self, _conn: &mut SqliteConnection, _comment: &Comment) -> HookResult<()> {
        Ok(())
    }

    /// Replies count as created comments unless the host says otherwise.
    async fn after_reply(&self, conn: &mut SqliteConnection, reply: &Comment) -> HookResult<()> {
        self.after_create(conn, reply).await
    }
}

/// A host record comments can be attached to.
#[async_trait]
pub trait Commentable: Send + Sync {
    fn commentable_ref(&self) -> MorphRef;

    /// Override to return `Some(self)` when the type implements [`CommentHooks`].
    fn hooks(&self) -> Option<&dyn CommentHooks> {
        None
    }

    /// Every live comment on this record, oldest first.
    async fn comments(&self, store: &CommentStore) -> Result<Vec<Comment>> {
        Ok(store
            .list_for_commentable(&self.commentable_ref(), None)
            .await?)
    }

    async fn approved_comments(&self, store: &CommentStore, approved: bool) -> Result<Vec<Comment>> {
        Ok(store
            .list_for_commentable(&self.commentable_ref(), Some(approved))
            .await?)
    }
}

/// A principal that authors comments.
#[async_trait]
pub trait Commenter: Send + Sync {
    fn commenter_ref(&self) -> MorphRef;

    async fn comments(&self, store: &CommentStore) -> Result<Vec<Comment>> {
        Ok(store.list_for_commenter(&self.commenter_ref(), None).await?)
    }

    /// `None` skips the approval filter and returns everything.
    async fn approved_comments(
        &self,
        store: &CommentStore,
        approved: Option<bool>,
    ) -> Result<Vec<Comment>> {
        Ok(store
            .list_for_commenter(&self.commenter_ref(), approved)
            .await?)
    }
}

impl Commentable for MorphRef {
    fn commentable_ref(&self) -> MorphRef {
        self.clone()
    }
}

impl Commenter for MorphRef {
    fn commenter_ref(&self) -> MorphRef {
        self.clone()
    }
}
