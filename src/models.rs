use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Id prefixes that only ever exist on the client.
pub const PLACEHOLDER_PREFIXES: [&str; 2] = ["pending-", "temp-"];

/// True for ids that must never reach a remote delete.
pub fn is_placeholder_id(id: &str) -> bool {
    id.trim().is_empty() || PLACEHOLDER_PREFIXES.iter().any(|p| id.starts_with(p))
}

/// Reads an `id` the backend may send as a string or as a number.
pub fn id_from_json(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ── Identity ─────────────────────────────────────────────────────────────────

/// Identity of one cached element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemKey {
    /// Assigned by the server; eligible for remote mutation.
    Confirmed(String),
    /// Client-only, pending confirmation or missing a server id.
    Placeholder(Uuid),
}

impl ItemKey {
    pub fn placeholder() -> Self {
        ItemKey::Placeholder(Uuid::new_v4())
    }

    /// Server items without a usable id become placeholders so they still render.
    pub fn from_server(id: Option<String>) -> Self {
        match id {
            Some(id) if !is_placeholder_id(&id) => ItemKey::Confirmed(id),
            _ => ItemKey::placeholder(),
        }
    }

    pub fn confirmed_id(&self) -> Option<&str> {
        match self {
            ItemKey::Confirmed(id) => Some(id),
            ItemKey::Placeholder(_) => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, ItemKey::Placeholder(_))
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKey::Confirmed(id) => f.write_str(id),
            ItemKey::Placeholder(uuid) => write!(f, "pending-{uuid}"),
        }
    }
}

/// One record of a remote collection as the server returned it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionItem<P> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub payload: P,
}

impl<P> CollectionItem<P> {
    pub fn new(id: impl Into<String>, payload: P) -> Self {
        Self { id: Some(id.into()), payload }
    }
}

// ── Timestamps ───────────────────────────────────────────────────────────────

/// Accepts RFC 3339 and the backend's naive ISO form (read as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

pub fn format_timestamp(raw: Option<&str>) -> String {
    match raw {
        Some(raw) => parse_timestamp(raw)
            .map(|dt| dt.format("%d.%m.%Y %H:%M").to_string())
            .unwrap_or_else(|| raw.to_string()),
        None => String::new(),
    }
}

// ── Contact messages ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactMessage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

// ── Chatbot ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
    #[serde(other)]
    Other,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Bot => "bot",
            Role::Other => "other",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One chatbot widget turn, stored flat by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatbotTurn {
    #[serde(rename = "type")]
    pub role: Role,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ChatbotTurn {
    pub fn new(role: Role, message: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self { role, message: message.into(), timestamp: Some(timestamp.into()) }
    }

    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_deref().and_then(parse_timestamp)
    }
}

/// Keyword-triggered canned answer; the backend keys these by keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatbotResponse {
    pub keyword: String,
    pub response: String,
}

impl ChatbotResponse {
    /// Keywords are matched lower-cased by the widget.
    pub fn new(keyword: &str, response: &str) -> Self {
        Self {
            keyword: keyword.trim().to_lowercase(),
            response: response.trim().to_string(),
        }
    }
}

// ── Certificates and partners ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateKind {
    #[default]
    Certificat,
    Acreditare,
}

impl CertificateKind {
    pub fn label(&self) -> &'static str {
        match self {
            CertificateKind::Certificat => "Certificat",
            CertificateKind::Acreditare => "Acreditare",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Remote URL or a `data:` URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: CertificateKind,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Partner {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

// ── Reviews ──────────────────────────────────────────────────────────────────

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default, alias = "name")]
    pub author: String,
    #[serde(default = "default_rating", deserialize_with = "lenient_rating")]
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default)]
    pub approved: bool,
}

impl Review {
    /// Dated today (UTC), the way the site stamps fresh reviews.
    pub fn new(author: &str, rating: i64, comment: &str, approved: bool) -> Self {
        Self {
            author: author.trim().to_string(),
            rating: clamp_rating(rating),
            comment: comment.trim().to_string(),
            date: Some(Utc::now().format("%Y-%m-%d").to_string()),
            approved,
        }
    }
}

fn default_rating() -> u8 {
    MAX_RATING
}

fn clamp_rating(raw: i64) -> u8 {
    raw.clamp(MIN_RATING as i64, MAX_RATING as i64) as u8
}

/// Ratings arrive as numbers or numeric strings; garbage reads as the minimum.
fn lenient_rating<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    Ok(raw.map(clamp_rating).unwrap_or(MIN_RATING))
}

// ── Locations and videos ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    /// `[latitude, longitude]`
    #[serde(default)]
    pub coordinates: [f64; 2],
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TikTokVideo(pub String);

// ── Auth, stats, settings ────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PasswordChange {
    #[serde(rename = "currentPassword")]
    pub current_password: String,
    #[serde(rename = "newPassword")]
    pub new_password: String,
}

/// Dashboard counters served by `GET /stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub messages: u64,
    #[serde(default)]
    pub tiktok: u64,
    #[serde(default)]
    pub certificates: u64,
    #[serde(default)]
    pub chatbot_messages: u64,
    #[serde(default)]
    pub locations: u64,
    #[serde(default)]
    pub partners: u64,
    #[serde(default)]
    pub reviews: u64,
    #[serde(default)]
    pub chatbot_responses: u64,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mesaje:             {}", self.messages)?;
        writeln!(f, "Conversații chatbot: {}", self.chatbot_messages)?;
        writeln!(f, "Răspunsuri chatbot: {}", self.chatbot_responses)?;
        writeln!(f, "Video-uri TikTok:   {}", self.tiktok)?;
        writeln!(f, "Certificate:        {}", self.certificates)?;
        writeln!(f, "Parteneri:          {}", self.partners)?;
        writeln!(f, "Recenzii:           {}", self.reviews)?;
        write!(f, "Locații:            {}", self.locations)
    }
}

/// Editable site copy, keyed by field name.
pub type SiteTexts = BTreeMap<String, String>;
