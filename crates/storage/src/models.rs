use chrono::NaiveDateTime;
use domain::{Author, Comment, GuestIdentity, MorphRef};
use sqlx::FromRow;

pub(crate) const COMMENT_COLUMNS: &str = "id, commenter_type, commenter_id, \
    commentable_type, commentable_id, guest_name, guest_email, comment, \
    approved, child_id, deleted_at, created_at, updated_at";

#[derive(FromRow)]
pub struct SqlComment {
    pub id: i64,
    pub commenter_type: Option<String>,
    pub commenter_id: Option<i64>,
    pub commentable_type: String,
    pub commentable_id: i64,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    pub comment: String,
    pub approved: bool,
    pub child_id: Option<i64>,
    pub deleted_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<SqlComment> for Comment {
    fn from(sql: SqlComment) -> Self {
        let author = match (sql.commenter_type, sql.commenter_id) {
            (Some(kind), Some(id)) => Author::Commenter(MorphRef::new(kind, id)),
            _ => Author::Guest(GuestIdentity {
                name: sql.guest_name.unwrap_or_default(),
                email: sql.guest_email.unwrap_or_default(),
            }),
        };
        Comment {
            id: sql.id,
            author,
            commentable: MorphRef::new(sql.commentable_type, sql.commentable_id),
            body: sql.comment,
            approved: sql.approved,
            parent_id: sql.child_id,
            deleted_at: sql.deleted_at,
            created_at: sql.created_at,
            updated_at: sql.updated_at,
        }
    }
}

/// A comment row about to be inserted.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub author: Author,
    pub commentable: MorphRef,
    pub body: String,
    pub approved: bool,
    pub parent_id: Option<i64>,
}
