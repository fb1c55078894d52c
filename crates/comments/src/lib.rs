mod error;
mod events;
mod policy;
mod registry;
mod service;
mod traits;

pub use error::{CommentError, Result};
pub use events::EventSink;
pub use policy::{Ability, CommentPolicy, DefaultCommentPolicy};
pub use registry::{CommentableRegistry, TableRegistry};
pub use service::CommentService;
pub use traits::{CommentHooks, Commentable, Commenter};

pub use domain::{Author, Comment, CommentEvent, CommentsConfig, GuestIdentity, MorphRef, StoreComment};
pub use storage::{CommentStore, Db, SqliteConnection};
