use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::CollectionApi;
use crate::collections::Collection;
use crate::service::editor::CollectionEditor;

/// Keeps the active collection fresh until `shutdown` flips to `true` or the
/// session is rejected.
///
/// Each tick waits for the editor lock, so a refresh never overlaps a
/// mutation in flight; it simply lands after it.
pub async fn poll<C, A>(
    editor: Arc<Mutex<CollectionEditor<C, A>>>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) where
    C: Collection,
    A: CollectionApi<C::Payload>,
{
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!("Polling {} every {}s", C::NAME, every.as_secs_f32());

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let mut editor = editor.lock().await;
                match editor.refresh().await {
                    Ok(()) => debug!("Polled {}", C::NAME),
                    Err(e) if e.is_unauthorized() => {
                        warn!("Polling {} stopped: session rejected", C::NAME);
                        return;
                    }
                    Err(e) => warn!("Polling {} failed: {e}", C::NAME),
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("Polling {} stopped", C::NAME);
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::collections::Partners;
    use crate::errors::AdminError;
    use crate::models::{CollectionItem, Partner};

    #[derive(Default)]
    struct CountingApi {
        lists: AtomicUsize,
        reject_after: Option<usize>,
    }

    #[async_trait]
    impl CollectionApi<Partner> for Arc<CountingApi> {
        async fn list(&self) -> Result<Vec<CollectionItem<Partner>>, AdminError> {
            let n = self.lists.fetch_add(1, Ordering::SeqCst) + 1;
            if self.reject_after.is_some_and(|limit| n > limit) {
                return Err(AdminError::Unauthorized);
            }
            Ok(vec![CollectionItem::new(n.to_string(), Partner { title: format!("P{n}"), image: None })])
        }

        async fn remove(&self, _id: &str) -> Result<(), AdminError> {
            Ok(())
        }

        async fn remove_all(&self) -> Result<(), AdminError> {
            Ok(())
        }

        async fn add(&self, _payload: &Partner) -> Result<String, AdminError> {
            Ok("1".into())
        }

        async fn update(&self, id: &str, _payload: &Partner) -> Result<String, AdminError> {
            Ok(id.to_string())
        }
    }

    #[tokio::test]
    async fn refreshes_until_shutdown() {
        let api = Arc::new(CountingApi::default());
        let editor = Arc::new(Mutex::new(CollectionEditor::<Partners, _>::new(api.clone())));
        let mut snapshots = editor.lock().await.subscribe();
        let (stop, shutdown) = watch::channel(false);

        let task = tokio::spawn(poll(editor.clone(), Duration::from_millis(10), shutdown));
        snapshots.changed().await.unwrap();
        snapshots.changed().await.unwrap();
        stop.send(true).unwrap();
        task.await.unwrap();

        assert!(api.lists.load(Ordering::SeqCst) >= 2);
        assert_eq!(editor.lock().await.view().len(), 1);
    }

    #[tokio::test]
    async fn stops_when_session_is_rejected() {
        let api = Arc::new(CountingApi { reject_after: Some(1), ..Default::default() });
        let editor = Arc::new(Mutex::new(CollectionEditor::<Partners, _>::new(api.clone())));
        let (_stop, shutdown) = watch::channel(false);

        poll(editor, Duration::from_millis(5), shutdown).await;
        assert_eq!(api.lists.load(Ordering::SeqCst), 2);
    }
}
