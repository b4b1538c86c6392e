use std::marker::PhantomData;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::CollectionApi;
use crate::collections::Collection;
use crate::errors::AdminError;
use crate::models::is_placeholder_id;
use crate::view::{render, Entry, LocalViewCache, View};

/// Transient message shown next to a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Error(String),
    Info(String),
}

/// What a subscriber renders: the current view plus an optional notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub view: View,
    pub notice: Option<Notice>,
}

/// Optimistic editor for one remote collection.
///
/// Every change is applied to the local cache and published before the
/// network call starts, then confirmed or rolled back. `&mut self` keeps one
/// mutation in flight per editor.
pub struct CollectionEditor<C: Collection, A> {
    api: A,
    cache: LocalViewCache<C::Payload>,
    snapshots: watch::Sender<Snapshot>,
    _collection: PhantomData<fn() -> C>,
}

impl<C, A> CollectionEditor<C, A>
where
    C: Collection,
    A: CollectionApi<C::Payload>,
{
    pub fn new(api: A) -> Self {
        let (snapshots, _) = watch::channel(Snapshot { view: render::<C>(&[]), notice: None });
        Self { api, cache: LocalViewCache::new(), snapshots, _collection: PhantomData }
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    pub fn view(&self) -> View {
        render::<C>(self.cache.entries())
    }

    pub fn entries(&self) -> &[Entry<C::Payload>] {
        self.cache.entries()
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn publish(&self, notice: Option<Notice>) {
        self.snapshots.send_replace(Snapshot { view: self.view(), notice });
    }

    /// Notice for a rolled-back operation; none when the session is gone.
    fn rollback_notice(err: &AdminError, text: &str) -> Option<Notice> {
        if err.is_unauthorized() {
            None
        } else {
            Some(Notice::Error(text.to_string()))
        }
    }

    /// Reloads from the server. A failed load never leaves a stale list.
    pub async fn refresh(&mut self) -> Result<(), AdminError> {
        match self.api.list().await {
            Ok(items) => {
                debug!("Loaded {} {} items", items.len(), C::NAME);
                self.cache.replace(items);
                self.publish(None);
                Ok(())
            }
            Err(e) => {
                warn!("Loading {} failed: {e}", C::NAME);
                self.cache.clear();
                self.publish(Self::rollback_notice(&e, C::texts().load_failed));
                Err(e)
            }
        }
    }

    /// Deletes the rendered row containing `id`; for chatbot conversations
    /// that is the whole pair.
    pub async fn delete(&mut self, id: &str) -> Result<(), AdminError> {
        if is_placeholder_id(id) {
            return Err(AdminError::InvalidId { id: id.to_string(), reason: "not confirmed by the server" });
        }
        let ids = match self.view().find(id) {
            Some(row) => row.ids.clone(),
            None => return Err(AdminError::InvalidId { id: id.to_string(), reason: "not in the current view" }),
        };
        let Some(undo) = self.cache.remove_ids(&ids) else {
            return Err(AdminError::InvalidId { id: id.to_string(), reason: "not in the current view" });
        };
        self.publish(None);

        for member in &ids {
            match self.api.remove(member).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => debug!("{member} was already gone from {}", C::NAME),
                Err(e) => {
                    warn!("Deleting {member} from {} failed, restoring {} item(s): {e}", C::NAME, undo.len());
                    self.cache.restore(undo);
                    self.publish(Self::rollback_notice(&e, C::texts().delete_failed));
                    return Err(e);
                }
            }
        }
        info!("Deleted {} item(s) from {}", ids.len(), C::NAME);
        Ok(())
    }

    /// Shows `payload` as pending, then asks the server to store it.
    pub async fn add(&mut self, payload: C::Payload) -> Result<String, AdminError> {
        C::validate(&payload)?;
        if let Some(key) = C::natural_key(&payload) {
            if self.cache.contains(&key) {
                self.publish(Some(Notice::Error(C::texts().duplicate.to_string())));
                return Err(AdminError::Duplicate { key });
            }
        }

        let placeholder = self.cache.insert_placeholder(payload.clone(), C::INSERT_AT);
        self.publish(None);

        match self.api.add(&payload).await {
            Ok(id) => {
                if let Err(e) = self.reload_after_add().await {
                    warn!("Reload after adding to {} failed: {e}", C::NAME);
                    self.cache.promote(&placeholder, id.clone());
                    self.publish(None);
                }
                Ok(id)
            }
            Err(e) => {
                warn!("Adding to {} failed: {e}", C::NAME);
                self.cache.discard(&placeholder);
                let text = if matches!(e, AdminError::Duplicate { .. }) {
                    C::texts().duplicate
                } else {
                    C::texts().add_failed
                };
                self.publish(Self::rollback_notice(&e, text));
                Err(e)
            }
        }
    }

    /// Shows the edited `payload` in place of `id`, then asks the server to
    /// overwrite it. Returns the id the item has afterwards.
    pub async fn update(&mut self, id: &str, payload: C::Payload) -> Result<String, AdminError> {
        if is_placeholder_id(id) {
            return Err(AdminError::InvalidId { id: id.to_string(), reason: "not confirmed by the server" });
        }
        C::validate(&payload)?;
        if let Some(key) = C::natural_key(&payload) {
            if key != id && self.cache.contains(&key) {
                self.publish(Some(Notice::Error(C::texts().duplicate.to_string())));
                return Err(AdminError::Duplicate { key });
            }
        }

        let Some(previous) = self.cache.replace_payload(id, payload.clone()) else {
            return Err(AdminError::InvalidId { id: id.to_string(), reason: "not in the current view" });
        };
        self.publish(None);

        match self.api.update(id, &payload).await {
            Ok(new_id) => {
                if new_id != id {
                    self.cache.rename(id, new_id.clone());
                    self.publish(None);
                }
                info!("Updated {id} in {}", C::NAME);
                Ok(new_id)
            }
            Err(e) => {
                warn!("Updating {id} in {} failed, restoring it: {e}", C::NAME);
                self.cache.replace_payload(id, previous);
                let text = if matches!(e, AdminError::Duplicate { .. }) {
                    C::texts().duplicate
                } else {
                    C::texts().update_failed
                };
                self.publish(Self::rollback_notice(&e, text));
                Err(e)
            }
        }
    }

    async fn reload_after_add(&mut self) -> Result<(), AdminError> {
        let items = self.api.list().await?;
        self.cache.replace(items);
        self.publish(None);
        Ok(())
    }

    /// Clears the collection once the server confirms; nothing is hidden
    /// before that.
    pub async fn clear_all(&mut self) -> Result<(), AdminError> {
        match self.api.remove_all().await {
            Ok(()) => {
                self.cache.clear();
                self.publish(Some(Notice::Info(C::texts().cleared.to_string())));
                Ok(())
            }
            Err(e) => {
                warn!("Clearing {} failed: {e}", C::NAME);
                self.publish(Self::rollback_notice(&e, C::texts().clear_failed));
                Err(e)
            }
        }
    }
}
