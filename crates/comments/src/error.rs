use crate::policy::Ability;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not allowed to {0}")]
    Authorization(Ability),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("Hook {hook} failed: {source}")]
    Hook {
        hook: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl CommentError {
    pub(crate) fn hook(hook: &'static str) -> impl FnOnce(anyhow::Error) -> Self {
        move |source| CommentError::Hook { hook, source }
    }
}

impl From<validator::ValidationErrors> for CommentError {
    fn from(errors: validator::ValidationErrors) -> Self {
        CommentError::Validation(errors.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CommentError>;
