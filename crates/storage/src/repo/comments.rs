use crate::{
    models::{NewComment, SqlComment, COMMENT_COLUMNS},
    Db,
};
use chrono::Utc;
use domain::{Author, Comment, MorphRef, TableName};
use sqlx::SqliteConnection;
use tracing::debug;

/// All SQL touching the comments table.
///
/// Writes take the caller's connection so they join whatever transaction
/// the caller has open. Reads on `&self` go through the pool and skip
/// soft-deleted rows unless the method says otherwise.
#[derive(Clone)]
pub struct CommentStore {
    db: Db,
    table: TableName,
}

impl CommentStore {
    pub fn new(db: Db, table: TableName) -> Self {
        Self { db, table }
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    pub async fn insert(
        &self,
        conn: &mut SqliteConnection,
        new: &NewComment,
    ) -> sqlx::Result<Comment> {
        let now = Utc::now().naive_utc();
        let (commenter, guest) = match &new.author {
            Author::Commenter(r) => (Some(r), None),
            Author::Guest(g) => (None, Some(g)),
        };

        let sql = format!(
            r#"
            INSERT INTO {} (
                commenter_type, commenter_id,
                commentable_type, commentable_id,
                guest_name, guest_email,
                comment, approved, child_id,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            self.table, COMMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, SqlComment>(&sql)
            .bind(commenter.map(|r| r.kind.as_str()))
            .bind(commenter.map(|r| r.id))
            .bind(&new.commentable.kind)
            .bind(new.commentable.id)
            .bind(guest.map(|g| g.name.as_str()))
            .bind(guest.map(|g| g.email.as_str()))
            .bind(&new.body)
            .bind(new.approved)
            .bind(new.parent_id)
            .bind(now)
            .bind(now)
            .fetch_one(&mut *conn)
            .await?;

        Ok(row.into())
    }

    /// Replaces the body of a live comment. `None` when the row is gone.
    pub async fn update_body(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
        body: &str,
    ) -> sqlx::Result<Option<Comment>> {
        let sql = format!(
            r#"
            UPDATE {}
            SET comment = ?, updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            RETURNING {}
            "#,
            self.table, COMMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, SqlComment>(&sql)
            .bind(body)
            .bind(Utc::now().naive_utc())
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Marks a comment and every reply below it as deleted.
    /// Returns how many rows were newly marked.
    pub async fn soft_delete(&self, conn: &mut SqliteConnection, id: i64) -> sqlx::Result<u64> {
        let sql = format!(
            r#"
            WITH RECURSIVE subtree(id) AS (
                SELECT id FROM {t} WHERE id = ?
                UNION ALL
                SELECT c.id FROM {t} c JOIN subtree s ON c.child_id = s.id
            )
            UPDATE {t}
            SET deleted_at = ?
            WHERE id IN (SELECT id FROM subtree) AND deleted_at IS NULL
            "#,
            t = self.table
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(Utc::now().naive_utc())
            .execute(&mut *conn)
            .await?;

        debug!("Soft-deleted {} row(s) under comment {}", result.rows_affected(), id);
        Ok(result.rows_affected())
    }

    /// Removes the row for good; replies go with it through the foreign key.
    pub async fn force_delete(&self, conn: &mut SqliteConnection, id: i64) -> sqlx::Result<u64> {
        let sql = format!("DELETE FROM {} WHERE id = ?", self.table);
        let result = sqlx::query(&sql).bind(id).execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }

    /// Live comments of a host record, read on the caller's connection.
    pub async fn list_for_commentable_in(
        &self,
        conn: &mut SqliteConnection,
        target: &MorphRef,
        approved: Option<bool>,
    ) -> sqlx::Result<Vec<Comment>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM {}
            WHERE commentable_type = ? AND commentable_id = ?
              AND deleted_at IS NULL
              AND (? IS NULL OR approved = ?)
            ORDER BY created_at ASC, id ASC
            "#,
            COMMENT_COLUMNS, self.table
        );
        let rows = sqlx::query_as::<_, SqlComment>(&sql)
            .bind(&target.kind)
            .bind(target.id)
            .bind(approved)
            .bind(approved)
            .fetch_all(&mut *conn)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn list_for_commentable(
        &self,
        target: &MorphRef,
        approved: Option<bool>,
    ) -> sqlx::Result<Vec<Comment>> {
        let mut conn = self.db.pool.acquire().await?;
        self.list_for_commentable_in(&mut conn, target, approved).await
    }

    pub async fn list_for_commenter(
        &self,
        commenter: &MorphRef,
        approved: Option<bool>,
    ) -> sqlx::Result<Vec<Comment>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM {}
            WHERE commenter_type = ? AND commenter_id = ?
              AND deleted_at IS NULL
              AND (? IS NULL OR approved = ?)
            ORDER BY created_at ASC, id ASC
            "#,
            COMMENT_COLUMNS, self.table
        );
        let rows = sqlx::query_as::<_, SqlComment>(&sql)
            .bind(&commenter.kind)
            .bind(commenter.id)
            .bind(approved)
            .bind(approved)
            .fetch_all(&self.db.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn replies(&self, parent_id: i64) -> sqlx::Result<Vec<Comment>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM {}
            WHERE child_id = ? AND deleted_at IS NULL
            ORDER BY created_at ASC, id ASC
            "#,
            COMMENT_COLUMNS, self.table
        );
        let rows = sqlx::query_as::<_, SqlComment>(&sql)
            .bind(parent_id)
            .fetch_all(&self.db.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn find(&self, id: i64) -> sqlx::Result<Option<Comment>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ? AND deleted_at IS NULL",
            COMMENT_COLUMNS, self.table
        );
        let row = sqlx::query_as::<_, SqlComment>(&sql)
            .bind(id)
            .fetch_optional(&self.db.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    pub async fn find_with_trashed(&self, id: i64) -> sqlx::Result<Option<Comment>> {
        let sql = format!("SELECT {} FROM {} WHERE id = ?", COMMENT_COLUMNS, self.table);
        let row = sqlx::query_as::<_, SqlComment>(&sql)
            .bind(id)
            .fetch_optional(&self.db.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    pub async fn count(&self, with_trashed: bool) -> sqlx::Result<i64> {
        let sql = if with_trashed {
            format!("SELECT COUNT(*) FROM {}", self.table)
        } else {
            format!("SELECT COUNT(*) FROM {} WHERE deleted_at IS NULL", self.table)
        };
        sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&self.db.pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::GuestIdentity;

    async fn store() -> CommentStore {
        let db = Db::new("sqlite::memory:").await.unwrap();
        CommentStore::new(db, TableName::default())
    }

    fn by_user(id: i64, body: &str, parent_id: Option<i64>) -> NewComment {
        NewComment {
            author: Author::Commenter(MorphRef::new("users", id)),
            commentable: MorphRef::new("posts", 1),
            body: body.to_string(),
            approved: true,
            parent_id,
        }
    }

    #[tokio::test]
    async fn test_insert_round_trips_guest_fields() {
        let store = store().await;
        let mut conn = store.db().pool().acquire().await.unwrap();

        let guest = GuestIdentity {
            name: "Ada".into(),
            email: "ada@example.org".into(),
        };
        let saved = store
            .insert(
                &mut conn,
                &NewComment {
                    author: Author::Guest(guest.clone()),
                    commentable: MorphRef::new("posts", 1),
                    body: "hello".into(),
                    approved: false,
                    parent_id: None,
                },
            )
            .await
            .unwrap();
        drop(conn);

        let loaded = store.find(saved.id).await.unwrap().unwrap();
        assert_eq!(loaded.author, Author::Guest(guest));
        assert!(!loaded.approved);
        assert_eq!(loaded.body, "hello");
        assert!(loaded.commenter().is_none());
    }

    #[tokio::test]
    async fn test_soft_delete_marks_whole_subtree() {
        let store = store().await;
        let mut conn = store.db().pool().acquire().await.unwrap();

        let root = store.insert(&mut conn, &by_user(1, "root", None)).await.unwrap();
        let child = store
            .insert(&mut conn, &by_user(2, "child", Some(root.id)))
            .await
            .unwrap();
        let grandchild = store
            .insert(&mut conn, &by_user(1, "grandchild", Some(child.id)))
            .await
            .unwrap();
        let sibling = store.insert(&mut conn, &by_user(3, "sibling", None)).await.unwrap();

        assert_eq!(store.soft_delete(&mut conn, root.id).await.unwrap(), 3);
        assert_eq!(store.soft_delete(&mut conn, root.id).await.unwrap(), 0);
        drop(conn);

        assert!(store.find(grandchild.id).await.unwrap().is_none());
        assert!(store
            .find_with_trashed(grandchild.id)
            .await
            .unwrap()
            .unwrap()
            .is_trashed());
        assert!(store.find(sibling.id).await.unwrap().is_some());
        assert_eq!(store.count(false).await.unwrap(), 1);
        assert_eq!(store.count(true).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_force_delete_cascades_through_foreign_key() {
        let store = store().await;
        let mut conn = store.db().pool().acquire().await.unwrap();

        let root = store.insert(&mut conn, &by_user(1, "root", None)).await.unwrap();
        let child = store
            .insert(&mut conn, &by_user(2, "child", Some(root.id)))
            .await
            .unwrap();
        store
            .insert(&mut conn, &by_user(1, "grandchild", Some(child.id)))
            .await
            .unwrap();

        assert_eq!(store.force_delete(&mut conn, root.id).await.unwrap(), 1);
        drop(conn);

        assert_eq!(store.count(true).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_listing_filters_by_approval_and_keeps_order() {
        let store = store().await;
        let mut conn = store.db().pool().acquire().await.unwrap();

        let mut hidden = by_user(2, "second", None);
        hidden.approved = false;
        let first = store.insert(&mut conn, &by_user(1, "first", None)).await.unwrap();
        store.insert(&mut conn, &hidden).await.unwrap();
        let third = store.insert(&mut conn, &by_user(1, "third", None)).await.unwrap();
        drop(conn);

        let post = MorphRef::new("posts", 1);
        let all = store.list_for_commentable(&post, None).await.unwrap();
        assert_eq!(
            all.iter().map(|c| c.body.as_str()).collect::<Vec<_>>(),
            vec!["first", "second", "third"]
        );

        let approved = store.list_for_commentable(&post, Some(true)).await.unwrap();
        assert_eq!(
            approved.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![first.id, third.id]
        );

        let mine = store
            .list_for_commenter(&MorphRef::new("users", 1), None)
            .await
            .unwrap();
        assert_eq!(mine.len(), 2);
        let unapproved = store
            .list_for_commenter(&MorphRef::new("users", 2), Some(false))
            .await
            .unwrap();
        assert_eq!(unapproved.len(), 1);
    }
}
