mod commands;
mod config;
mod events;
mod models;

pub use commands::StoreComment;
pub use config::{CommentsConfig, TableName};
pub use events::CommentEvent;
pub use models::{Author, Comment, GuestIdentity, MorphRef, MorphRefError};
