pub mod access;
mod commands;
pub mod editor;
mod error;
mod events;
mod models;
pub mod relative;

pub use commands::{CommentPatch, NewComment, SubscribeToUpdates};
pub use error::CommentError;
pub use events::{CommentEvent, CommentEventKind};
pub use models::{
    Comment, CommentSubscription, Like, Post, Role, UpgradeGuide, User, Viewer, ADMIN_ROLE_ID,
};
