//! Remote collection client: the only code that talks HTTP.

pub mod client;
pub mod collection_client;

use async_trait::async_trait;

use crate::errors::AdminError;
use crate::models::CollectionItem;

pub use client::ApiClient;
pub use collection_client::HttpCollectionClient;

/// CRUD access to one remote collection.
///
/// The editor is generic over this seam so it can run against the HTTP
/// backend or an in-memory stand-in.
#[async_trait]
pub trait CollectionApi<P>: Send + Sync {
    /// Server order is preserved; malformed elements are skipped.
    async fn list(&self) -> Result<Vec<CollectionItem<P>>, AdminError>;

    /// Placeholder ids are rejected before any request is made.
    async fn remove(&self, id: &str) -> Result<(), AdminError>;

    async fn remove_all(&self) -> Result<(), AdminError>;

    /// Returns the id the server assigned.
    async fn add(&self, payload: &P) -> Result<String, AdminError>;

    /// Overwrites the item `id` and returns the id it is known by afterwards.
    async fn update(&self, id: &str, payload: &P) -> Result<String, AdminError>;
}
