//! Back-office client for the Sofimar website: remote collections edited
//! optimistically through a local view cache.

pub mod api;
pub mod collections;
pub mod config;
pub mod errors;
pub mod models;
pub mod service;
pub mod session;
pub mod view;

pub use config::AdminConfig;
pub use errors::AdminError;
pub use service::{AdminPanel, CollectionEditor, Notice, Snapshot};
pub use session::{Session, SessionState};
