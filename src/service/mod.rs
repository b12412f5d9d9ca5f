//! Service layer
//!
//! The feed engine: cursor resolution, engagement decoration, repost
//! expansion and feed assembly. Separated from HTTP handlers and reading
//! storage only through the contracts in [`store`].

mod author;
mod context;
mod cursor;
mod engagement;
mod feed;
mod repost;
pub mod store;

#[cfg(test)]
mod testing;

pub use author::AuthorDirectory;
pub use context::{CancelHandle, CancelReason, FeedContext};
pub use cursor::{Cursor, CursorResolver};
pub use engagement::{Engagement, EngagementDecorator};
pub use feed::{DecoratedPost, FeedAssembler, FeedError, FeedMode, FeedPage, ModeRejection};
pub use repost::RepostResolver;
pub use store::{EngagementStore, IdentityStore, PostStore};
