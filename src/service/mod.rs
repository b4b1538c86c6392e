pub mod admin_service;
pub mod editor;
pub mod poller;

pub use admin_service::AdminPanel;
pub use editor::{CollectionEditor, Notice, Snapshot};
pub use poller::poll;
