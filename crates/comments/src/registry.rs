use async_trait::async_trait;
use domain::{MorphRef, TableName};
use sqlx::SqliteConnection;
use std::collections::HashMap;
use tracing::debug;

use crate::traits::Commentable;

/// Turns a `(type, id)` reference into the live host record, if it exists.
#[async_trait]
pub trait CommentableRegistry: Send + Sync {
    async fn resolve(
        &self,
        conn: &mut SqliteConnection,
        target: &MorphRef,
    ) -> sqlx::Result<Option<Box<dyn Commentable>>>;
}

/// Registry for hosts whose records live in plain tables keyed by `id`.
/// Resolved records carry no hooks.
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    tables: HashMap<String, TableName>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, kind: impl Into<String>, table: TableName) -> Self {
        self.tables.insert(kind.into(), table);
        self
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }
}

#[async_trait]
impl CommentableRegistry for TableRegistry {
    async fn resolve(
        &self,
        conn: &mut SqliteConnection,
        target: &MorphRef,
    ) -> sqlx::Result<Option<Box<dyn Commentable>>> {
        let Some(table) = self.tables.get(&target.kind) else {
            debug!("No table registered for commentable type '{}'", target.kind);
            return Ok(None);
        };

        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)", table);
        let exists = sqlx::query_scalar::<_, i64>(&sql)
            .bind(target.id)
            .fetch_one(&mut *conn)
            .await?;

        Ok((exists != 0).then(|| Box::new(target.clone()) as Box<dyn Commentable>))
    }
}
