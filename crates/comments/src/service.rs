use chrono::Utc;
use domain::{Author, Comment, CommentEvent, CommentsConfig, GuestIdentity, MorphRef, StoreComment};
use sqlx::{Sqlite, SqliteConnection, Transaction};
use std::sync::Arc;
use storage::{CommentStore, Db, NewComment};
use tracing::{info, warn};

use crate::error::{CommentError, Result};
use crate::events::EventSink;
use crate::policy::{Ability, CommentPolicy, DefaultCommentPolicy};
use crate::registry::CommentableRegistry;
use crate::traits::Commentable;

/// Creates, edits, deletes and answers comments.
///
/// Every mutating call runs in a single transaction: authorization and
/// payload checks happen before it opens, host hooks run inside it, and
/// events go out only after it commits.
pub struct CommentService {
    repo: CommentStore,
    config: CommentsConfig,
    policy: Arc<dyn CommentPolicy>,
    registry: Arc<dyn CommentableRegistry>,
    events: Arc<dyn EventSink>,
}

impl CommentService {
    pub fn new(
        db: Db,
        config: CommentsConfig,
        registry: Arc<dyn CommentableRegistry>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let repo = CommentStore::new(db, config.model.clone());
        Self {
            repo,
            config,
            policy: Arc::new(DefaultCommentPolicy),
            registry,
            events,
        }
    }

    pub fn with_policy(mut self, policy: Arc<dyn CommentPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn repo(&self) -> &CommentStore {
        &self.repo
    }

    pub fn config(&self) -> &CommentsConfig {
        &self.config
    }

    pub async fn store(
        &self,
        principal: Option<&MorphRef>,
        request: StoreComment,
    ) -> Result<Comment> {
        if !self.config.guest_commenting {
            // without guest commenting the create rule needs someone to check
            if principal.is_none() {
                return Err(self.deny(Ability::Create, None));
            }
            self.authorize(Ability::Create, principal, None)?;
        }

        let author = match principal {
            Some(p) => Author::Commenter(p.clone()),
            None => Author::Guest(guest_identity(
                request.guest_name.as_deref(),
                request.guest_email.as_deref(),
            )?),
        };
        validate_message(&request.message)?;

        let new = NewComment {
            author,
            commentable: request.commentable(),
            body: request.message,
            approved: self.config.approved_by_default(),
            parent_id: None,
        };

        let mut tx = self.repo.db().begin().await?;
        let result = self.store_in(&mut tx, &new).await;
        let comment = settle(tx, result).await?;

        info!("Comment {} created on {}", comment.id, comment.commentable);
        self.events.dispatch(CommentEvent::Created(comment.clone()));
        Ok(comment)
    }

    async fn store_in(&self, conn: &mut SqliteConnection, new: &NewComment) -> Result<Comment> {
        let host = self.resolve(conn, &new.commentable).await?;
        let comment = self.repo.insert(conn, new).await?;
        if let Some(hooks) = host.hooks() {
            hooks
                .after_create(conn, &comment)
                .await
                .map_err(CommentError::hook("after_create"))?;
        }
        Ok(comment)
    }

    pub async fn update(
        &self,
        principal: &MorphRef,
        comment: &Comment,
        message: &str,
    ) -> Result<Comment> {
        self.authorize(Ability::Update, Some(principal), Some(comment))?;
        validate_message(message)?;

        let mut tx = self.repo.db().begin().await?;
        let result = self.update_in(&mut tx, comment, message).await;
        let updated = settle(tx, result).await?;

        info!("Comment {} updated by {}", updated.id, principal);
        self.events.dispatch(CommentEvent::Updated(updated.clone()));
        Ok(updated)
    }

    async fn update_in(
        &self,
        conn: &mut SqliteConnection,
        comment: &Comment,
        message: &str,
    ) -> Result<Comment> {
        let updated = self
            .repo
            .update_body(conn, comment.id, message)
            .await?
            .ok_or_else(|| CommentError::NotFound(format!("comment {}", comment.id)))?;

        if let Some(host) = self.registry.resolve(conn, &updated.commentable).await? {
            if let Some(hooks) = host.hooks() {
                hooks
                    .after_update(conn, &updated)
                    .await
                    .map_err(CommentError::hook("after_update"))?;
            }
        }
        Ok(updated)
    }

    pub async fn destroy(&self, principal: &MorphRef, comment: &Comment) -> Result<()> {
        self.authorize(Ability::Delete, Some(principal), Some(comment))?;

        let mut tx = self.repo.db().begin().await?;
        let result = self.destroy_in(&mut tx, comment).await;
        let deleted = settle(tx, result).await?;

        info!(
            "Comment {} deleted by {} (soft: {})",
            deleted.id, principal, self.config.soft_deletes
        );
        self.events.dispatch(CommentEvent::Deleted(deleted));
        Ok(())
    }

    async fn destroy_in(&self, conn: &mut SqliteConnection, comment: &Comment) -> Result<Comment> {
        let host = self.registry.resolve(conn, &comment.commentable).await?;
        let hooks = host.as_deref().and_then(|h| h.hooks());

        if let Some(hooks) = hooks {
            hooks
                .before_delete(conn, comment)
                .await
                .map_err(CommentError::hook("before_delete"))?;
        }

        let deleted = self
            .remove(conn, comment)
            .await?
            .ok_or_else(|| CommentError::NotFound(format!("comment {}", comment.id)))?;

        if let Some(hooks) = hooks {
            hooks
                .after_delete(conn, comment)
                .await
                .map_err(CommentError::hook("after_delete"))?;
        }
        Ok(deleted)
    }

    pub async fn reply(
        &self,
        principal: &MorphRef,
        parent: &Comment,
        message: &str,
    ) -> Result<Comment> {
        self.authorize(Ability::Reply, Some(principal), Some(parent))?;
        validate_message(message)?;
        if self.repo.find(parent.id).await?.is_none() {
            return Err(CommentError::NotFound(format!("comment {}", parent.id)));
        }

        let new = NewComment {
            author: Author::Commenter(principal.clone()),
            commentable: parent.commentable.clone(),
            body: message.to_string(),
            approved: self.config.approved_by_default(),
            parent_id: Some(parent.id),
        };

        let mut tx = self.repo.db().begin().await?;
        let result = self.reply_in(&mut tx, &new).await;
        let reply = settle(tx, result).await?;

        info!("Comment {} replied to {} by {}", reply.id, parent.id, principal);
        self.events.dispatch(CommentEvent::Created(reply.clone()));
        Ok(reply)
    }

    async fn reply_in(&self, conn: &mut SqliteConnection, new: &NewComment) -> Result<Comment> {
        let host = self.resolve(conn, &new.commentable).await?;
        let reply = self.repo.insert(conn, new).await?;
        if let Some(hooks) = host.hooks() {
            hooks
                .after_reply(conn, &reply)
                .await
                .map_err(CommentError::hook("after_reply"))?;
        }
        Ok(reply)
    }

    /// Call when a host record is deleted. Each of its comments is deleted on
    /// its own, so replies follow their parents. Returns how many comments
    /// this call removed itself.
    pub async fn commentable_deleted(&self, host: &dyn Commentable) -> Result<usize> {
        let target = host.commentable_ref();

        let mut tx = self.repo.db().begin().await?;
        let result = self.purge_in(&mut tx, &target).await;
        let removed = settle(tx, result).await?;

        info!("Removed {} comment(s) of deleted {}", removed.len(), target);
        let count = removed.len();
        for comment in removed {
            self.events.dispatch(CommentEvent::Deleted(comment));
        }
        Ok(count)
    }

    async fn purge_in(&self, conn: &mut SqliteConnection, target: &MorphRef) -> Result<Vec<Comment>> {
        let mut comments = self.repo.list_for_commentable_in(conn, target, None).await?;
        // a reply always has a larger id than its parent, so newest-first
        // removes every reply on its own before its parent can take it along
        comments.sort_by(|a, b| b.id.cmp(&a.id));

        let mut removed = Vec::with_capacity(comments.len());
        for comment in comments {
            if let Some(deleted) = self.remove(conn, &comment).await? {
                removed.push(deleted);
            }
        }
        Ok(removed)
    }

    /// Soft or hard delete per configuration; `None` if nothing was left to delete.
    async fn remove(&self, conn: &mut SqliteConnection, comment: &Comment) -> Result<Option<Comment>> {
        let affected = if self.config.soft_deletes {
            self.repo.soft_delete(conn, comment.id).await?
        } else {
            self.repo.force_delete(conn, comment.id).await?
        };
        if affected == 0 {
            return Ok(None);
        }

        let mut deleted = comment.clone();
        if self.config.soft_deletes {
            deleted.deleted_at = Some(Utc::now().naive_utc());
        }
        Ok(Some(deleted))
    }

    pub async fn find(&self, id: i64) -> Result<Comment> {
        self.repo
            .find(id)
            .await?
            .ok_or_else(|| CommentError::NotFound(format!("comment {}", id)))
    }

    pub async fn find_with_trashed(&self, id: i64) -> Result<Comment> {
        self.repo
            .find_with_trashed(id)
            .await?
            .ok_or_else(|| CommentError::NotFound(format!("comment {}", id)))
    }

    pub async fn replies(&self, comment: &Comment) -> Result<Vec<Comment>> {
        Ok(self.repo.replies(comment.id).await?)
    }

    pub async fn parent(&self, comment: &Comment) -> Result<Option<Comment>> {
        match comment.parent_id {
            Some(id) => Ok(self.repo.find(id).await?),
            None => Ok(None),
        }
    }

    async fn resolve(
        &self,
        conn: &mut SqliteConnection,
        target: &MorphRef,
    ) -> Result<Box<dyn Commentable>> {
        self.registry
            .resolve(conn, target)
            .await?
            .ok_or_else(|| CommentError::NotFound(format!("commentable {}", target)))
    }

    fn authorize(
        &self,
        ability: Ability,
        principal: Option<&MorphRef>,
        comment: Option<&Comment>,
    ) -> Result<()> {
        if self.policy.allows(ability, principal, comment) {
            Ok(())
        } else {
            Err(self.deny(ability, principal))
        }
    }

    fn deny(&self, ability: Ability, principal: Option<&MorphRef>) -> CommentError {
        match principal {
            Some(p) => warn!("Denied {} for {}", ability.rule_name(), p),
            None => warn!("Denied {} for guest", ability.rule_name()),
        }
        CommentError::Authorization(ability)
    }
}

async fn settle<T>(tx: Transaction<'static, Sqlite>, result: Result<T>) -> Result<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!("Rollback failed after '{}': {}", e, rollback_err);
            }
            Err(e)
        }
    }
}

fn guest_identity(name: Option<&str>, email: Option<&str>) -> Result<GuestIdentity> {
    let (Some(name), Some(email)) = (name, email) else {
        return Err(CommentError::Validation(
            "guest_name and guest_email are required when not signed in".to_string(),
        ));
    };
    Ok(GuestIdentity::new(name, email)?)
}

fn validate_message(message: &str) -> Result<()> {
    if message.trim().is_empty() {
        return Err(CommentError::Validation("message is required".to_string()));
    }
    Ok(())
}
