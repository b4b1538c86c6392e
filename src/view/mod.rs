pub mod cache;
pub mod render;

pub use cache::{Entry, InsertAt, LocalViewCache, UndoEntry};
pub use render::{group_conversations, render, ConversationPair, Row, View};
