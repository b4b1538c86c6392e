use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::api::{ApiClient, CollectionApi, HttpCollectionClient};
use crate::collections::{Collection, Messages};
use crate::config::AdminConfig;
use crate::errors::AdminError;
use crate::models::{CollectionItem, ContactMessage, SiteTexts, Stats};
use crate::service::editor::CollectionEditor;
use crate::session::Session;

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Entry point of the back-office: session handling, per-collection editors
/// and the dashboard counters.
pub struct AdminPanel {
    config: AdminConfig,
    api: ApiClient,
    stats: watch::Sender<Option<Stats>>,
}

impl AdminPanel {
    pub fn new(config: AdminConfig, session: Session) -> Self {
        let api = ApiClient::new(config.api_base_url.clone(), session);
        let (stats, _) = watch::channel(None);
        Self { config, api, stats }
    }

    /// Picks up a token persisted by an earlier run.
    pub fn from_config(config: AdminConfig) -> Self {
        let session = Session::with_token_file(&config.token_file);
        Self::new(config, session)
    }

    pub fn config(&self) -> &AdminConfig {
        &self.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> &Session {
        self.api.session()
    }

    // ── Session ──────────────────────────────────────────────────────────────

    pub async fn login(&self, username: &str, password: &str) -> Result<(), AdminError> {
        if username.trim().is_empty() {
            return Err(AdminError::empty_field("username"));
        }
        if password.is_empty() {
            return Err(AdminError::empty_field("password"));
        }
        self.api.login(username, password).await?;
        self.refresh_stats().await;
        Ok(())
    }

    pub fn logout(&self) {
        self.session().teardown();
        self.stats.send_replace(None);
    }

    /// True when a stored token is still accepted; a rejected one is dropped.
    pub async fn restore_session(&self) -> Result<bool, AdminError> {
        if !self.session().is_active() {
            return Ok(false);
        }
        if self.api.validate().await? {
            info!("Restored stored session");
            Ok(true)
        } else {
            self.session().teardown();
            Ok(false)
        }
    }

    // ── Collections ──────────────────────────────────────────────────────────

    pub fn editor<C: Collection>(&self) -> CollectionEditor<C, HttpCollectionClient<C>> {
        CollectionEditor::new(HttpCollectionClient::new(self.api.clone()))
    }

    pub async fn delete<C, A>(&self, editor: &mut CollectionEditor<C, A>, id: &str) -> Result<(), AdminError>
    where
        C: Collection,
        A: CollectionApi<C::Payload>,
    {
        editor.delete(id).await?;
        self.refresh_stats().await;
        Ok(())
    }

    pub async fn add<C, A>(&self, editor: &mut CollectionEditor<C, A>, payload: C::Payload) -> Result<String, AdminError>
    where
        C: Collection,
        A: CollectionApi<C::Payload>,
    {
        let id = editor.add(payload).await?;
        self.refresh_stats().await;
        Ok(id)
    }

    pub async fn clear_all<C, A>(&self, editor: &mut CollectionEditor<C, A>) -> Result<(), AdminError>
    where
        C: Collection,
        A: CollectionApi<C::Payload>,
    {
        editor.clear_all().await?;
        self.refresh_stats().await;
        Ok(())
    }

    // ── Dashboard ────────────────────────────────────────────────────────────

    pub fn stats(&self) -> Option<Stats> {
        self.stats.borrow().clone()
    }

    pub fn subscribe_stats(&self) -> watch::Receiver<Option<Stats>> {
        self.stats.subscribe()
    }

    /// A failed refresh keeps the previous counters.
    pub async fn refresh_stats(&self) -> Option<Stats> {
        match self.api.stats().await {
            Ok(stats) => {
                self.stats.send_replace(Some(stats.clone()));
                Some(stats)
            }
            Err(e) => {
                warn!("Could not refresh stats: {e}");
                self.stats()
            }
        }
    }

    // ── Messages export ──────────────────────────────────────────────────────

    /// Writes every contact message to `dir` and returns the file path.
    pub async fn export_messages(&self, dir: &Path) -> Result<PathBuf, AdminError> {
        let messages = HttpCollectionClient::<Messages>::new(self.api.clone()).list().await?;
        write_export(dir, Utc::now().date_naive(), &messages)
    }

    // ── Settings ─────────────────────────────────────────────────────────────

    pub async fn change_password(&self, current: &str, new: &str, confirm: &str) -> Result<(), AdminError> {
        check_new_password(current, new, confirm)?;
        self.api.change_password(current, new).await
    }

    pub async fn site_texts(&self) -> Result<SiteTexts, AdminError> {
        self.api.site_texts().await
    }

    pub async fn save_site_texts(&self, texts: &SiteTexts) -> Result<(), AdminError> {
        self.api.save_site_texts(texts).await
    }
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("sofimar-messages-{}.json", date.format("%Y-%m-%d"))
}

pub fn write_export(
    dir: &Path,
    date: NaiveDate,
    messages: &[CollectionItem<ContactMessage>],
) -> Result<PathBuf, AdminError> {
    if messages.is_empty() {
        return Err(AdminError::NothingToExport);
    }
    let path = dir.join(export_file_name(date));
    let body = serde_json::to_string_pretty(messages).map_err(|e| AdminError::decode("messages", e))?;
    fs::write(&path, body).map_err(|e| AdminError::io(&path, e))?;
    info!("Exported {} messages to {}", messages.len(), path.display());
    Ok(path)
}

fn check_new_password(current: &str, new: &str, confirm: &str) -> Result<(), AdminError> {
    if current.is_empty() {
        return Err(AdminError::empty_field("currentPassword"));
    }
    if new != confirm {
        return Err(AdminError::FieldMismatch { field_name: "newPassword".into() });
    }
    let actual_length = new.chars().count();
    if actual_length < MIN_PASSWORD_LENGTH {
        return Err(AdminError::FieldTooShort {
            field_name: "newPassword".into(),
            min_length: MIN_PASSWORD_LENGTH,
            actual_length,
        });
    }
    Ok(())
}
