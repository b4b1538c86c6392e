//! Descriptors for every remote collection the panel edits.
//!
//! A descriptor is a unit type implementing [`Collection`]: it names the
//! endpoint, the wire shape, where new items appear, the localized texts and
//! how one cached entry becomes a [`Row`].

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::AdminError;
use crate::models::{
    format_timestamp, Certificate, ChatbotResponse, ChatbotTurn, ContactMessage, Location,
    Partner, Review, Role, TikTokVideo,
};
use crate::view::render::group_conversations;
use crate::view::{Entry, InsertAt, Row};

/// How the backend exposes a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// JSON array; items carry an `id`, mutated one by one.
    Array,
    /// JSON object `{key: value}`; the key is the id.
    Keyed {
        key_field: &'static str,
        value_field: &'static str,
    },
    /// JSON array without ids, written back whole as `{field: [...]}`.
    WholeList { field: &'static str },
}

/// User-facing strings of one collection.
#[derive(Debug)]
pub struct CollectionTexts {
    pub empty: &'static str,
    pub load_failed: &'static str,
    pub delete_failed: &'static str,
    pub add_failed: &'static str,
    pub update_failed: &'static str,
    pub duplicate: &'static str,
    pub clear_failed: &'static str,
    pub cleared: &'static str,
}

pub trait Collection: Send + Sync + 'static {
    type Payload: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static;

    const NAME: &'static str;
    /// Endpoint relative to the API base URL.
    const PATH: &'static str;
    const SHAPE: Shape = Shape::Array;
    /// Query parameter naming the item on `DELETE`.
    const ID_PARAM: &'static str = "id";
    const INSERT_AT: InsertAt = InsertAt::Tail;
    const CLEARABLE: bool = false;

    fn texts() -> &'static CollectionTexts;

    fn row(entry: &Entry<Self::Payload>) -> Row;

    fn layout(entries: &[Entry<Self::Payload>]) -> Vec<Row> {
        entries.iter().map(Self::row).collect()
    }

    /// Identity for collections whose wire format has no id.
    fn natural_key(_payload: &Self::Payload) -> Option<String> {
        None
    }

    fn validate(_payload: &Self::Payload) -> Result<(), AdminError> {
        Ok(())
    }
}

fn require(field_name: &str, value: &str) -> Result<(), AdminError> {
    if value.trim().is_empty() {
        Err(AdminError::empty_field(field_name))
    } else {
        Ok(())
    }
}

fn require_finite(field_name: &str, value: f64) -> Result<(), AdminError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(AdminError::NotFinite { field_name: field_name.to_string() })
    }
}

fn describe_image(image: Option<&str>) -> String {
    match image {
        Some(src) if src.starts_with("data:image") => "🖼️ imagine încorporată".to_string(),
        Some(src) if !src.trim().is_empty() => format!("🖼️ {src}"),
        _ => "📷 Fără imagine".to_string(),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}…", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}

// ── Contact messages ─────────────────────────────────────────────────────────

pub struct Messages;

static MESSAGE_TEXTS: CollectionTexts = CollectionTexts {
    empty: "Nu există mesaje.",
    load_failed: "Eroare la încărcarea mesajelor.",
    delete_failed: "Eroare: mesajul nu a putut fi șters. Încearcă din nou.",
    add_failed: "Eroare: mesajul nu a fost trimis.",
    update_failed: "Eroare: mesajul nu a putut fi actualizat.",
    duplicate: "Mesajul există deja.",
    clear_failed: "Eroare: mesajele nu au fost șterse.",
    cleared: "Toate mesajele au fost șterse.",
};

impl Collection for Messages {
    type Payload = ContactMessage;

    const NAME: &'static str = "messages";
    const PATH: &'static str = "messages";
    const CLEARABLE: bool = true;

    fn texts() -> &'static CollectionTexts {
        &MESSAGE_TEXTS
    }

    fn row(entry: &Entry<ContactMessage>) -> Row {
        let msg = &entry.payload;
        Row::for_entry(entry, msg.name.clone())
            .meta(format!("📞 {} | 📧 {}", msg.phone, msg.email))
            .meta(format!("📅 {}", format_timestamp(msg.timestamp.as_deref())))
            .body(msg.message.clone())
    }

    fn validate(msg: &ContactMessage) -> Result<(), AdminError> {
        require("name", &msg.name)?;
        require("message", &msg.message)
    }
}

// ── Chatbot conversations ────────────────────────────────────────────────────

pub struct Chatbot;

static CHATBOT_TEXTS: CollectionTexts = CollectionTexts {
    empty: "Nu există conversații.",
    load_failed: "Eroare la încărcarea conversațiilor.",
    delete_failed: "Eroare: conversația nu a putut fi ștearsă. Încearcă din nou.",
    add_failed: "Eroare: mesajul nu a fost salvat.",
    update_failed: "Eroare: mesajul nu a putut fi actualizat.",
    duplicate: "Mesajul există deja.",
    clear_failed: "Eroare: conversațiile nu au fost șterse.",
    cleared: "Toate conversațiile au fost șterse cu succes!",
};

impl Collection for Chatbot {
    type Payload = ChatbotTurn;

    const NAME: &'static str = "chatbot";
    const PATH: &'static str = "chatbot";
    const CLEARABLE: bool = true;

    fn texts() -> &'static CollectionTexts {
        &CHATBOT_TEXTS
    }

    fn row(entry: &Entry<ChatbotTurn>) -> Row {
        let speaker = match entry.payload.role {
            Role::User => "👤 Utilizator",
            Role::Bot => "🤖 Bot",
            Role::Other => "💬 Mesaj",
        };
        Row::for_entry(entry, format!("📅 {}", format_timestamp(entry.payload.timestamp.as_deref())))
            .body(format!("{speaker}: {}", entry.payload.message))
    }

    /// One row per conversation pair: the user turn's row with the bot's
    /// reply appended.
    fn layout(entries: &[Entry<ChatbotTurn>]) -> Vec<Row> {
        group_conversations(entries)
            .into_iter()
            .map(|pair| {
                let mut row = Self::row(pair.user);
                if let Some(bot) = pair.bot {
                    let reply = Self::row(bot);
                    row.body.extend(reply.body);
                    row.pending |= reply.pending;
                }
                row.ids = pair.ids();
                row
            })
            .collect()
    }

    fn validate(turn: &ChatbotTurn) -> Result<(), AdminError> {
        require("message", &turn.message)
    }
}

// ── Chatbot keyword responses ────────────────────────────────────────────────

pub struct ChatbotResponses;

static RESPONSE_TEXTS: CollectionTexts = CollectionTexts {
    empty: "Nu există răspunsuri configurate. Folosește \"Adaugă Răspuns\" pentru a adăuga unul nou.",
    load_failed: "Eroare la încărcarea răspunsurilor.",
    delete_failed: "Eroare la ștergerea răspunsului. Te rugăm să încerci din nou.",
    add_failed: "Eroare la salvarea răspunsului. Te rugăm să încerci din nou.",
    update_failed: "Eroare la salvarea răspunsului. Te rugăm să încerci din nou.",
    duplicate: "Există deja un răspuns pentru acest cuvânt cheie.",
    clear_failed: "Eroare: răspunsurile nu au fost șterse.",
    cleared: "Toate răspunsurile au fost șterse.",
};

impl Collection for ChatbotResponses {
    type Payload = ChatbotResponse;

    const NAME: &'static str = "responses";
    const PATH: &'static str = "chatbot-responses";
    const SHAPE: Shape = Shape::Keyed { key_field: "keyword", value_field: "response" };
    const ID_PARAM: &'static str = "keyword";

    fn texts() -> &'static CollectionTexts {
        &RESPONSE_TEXTS
    }

    fn row(entry: &Entry<ChatbotResponse>) -> Row {
        Row::for_entry(entry, format!("🔑 {}", entry.payload.keyword)).body(entry.payload.response.clone())
    }

    fn natural_key(payload: &ChatbotResponse) -> Option<String> {
        Some(payload.keyword.clone()).filter(|k| !k.is_empty())
    }

    fn validate(payload: &ChatbotResponse) -> Result<(), AdminError> {
        require("keyword", &payload.keyword)?;
        require("response", &payload.response)
    }
}

// ── TikTok videos ────────────────────────────────────────────────────────────

pub struct TikTokVideos;

static VIDEO_TEXTS: CollectionTexts = CollectionTexts {
    empty: "Nu există video-uri adăugate. Folosește \"Adaugă Video\" pentru a adăuga unul nou.",
    load_failed: "Eroare la încărcarea video-urilor.",
    delete_failed: "Eroare: video-ul nu a putut fi șters. Încearcă din nou.",
    add_failed: "Eroare: video-ul nu a fost adăugat.",
    update_failed: "Eroare: video-ul nu a putut fi actualizat.",
    duplicate: "Acest video este deja adăugat!",
    clear_failed: "Eroare: video-urile nu au fost șterse.",
    cleared: "Toate video-urile au fost șterse.",
};

impl Collection for TikTokVideos {
    type Payload = TikTokVideo;

    const NAME: &'static str = "videos";
    const PATH: &'static str = "tiktok-videos";
    const SHAPE: Shape = Shape::WholeList { field: "videos" };

    fn texts() -> &'static CollectionTexts {
        &VIDEO_TEXTS
    }

    fn row(entry: &Entry<TikTokVideo>) -> Row {
        Row::for_entry(entry, format!("🎬 {}", entry.payload.0))
    }

    fn natural_key(payload: &TikTokVideo) -> Option<String> {
        Some(payload.0.trim().to_string()).filter(|id| !id.is_empty())
    }

    fn validate(payload: &TikTokVideo) -> Result<(), AdminError> {
        require("videoId", &payload.0)
    }
}

// ── Certificates ─────────────────────────────────────────────────────────────

pub struct Certificates;

static CERTIFICATE_TEXTS: CollectionTexts = CollectionTexts {
    empty: "Nu există certificate adăugate. Folosește \"Adaugă Certificat\" pentru a adăuga unul nou.",
    load_failed: "Eroare la încărcarea certificatelor.",
    delete_failed: "Eroare: certificatul nu a putut fi șters. Încearcă din nou.",
    add_failed: "Eroare: certificatul nu a fost salvat.",
    update_failed: "Eroare: certificatul nu a putut fi actualizat.",
    duplicate: "Certificatul există deja.",
    clear_failed: "Eroare: certificatele nu au fost șterse.",
    cleared: "Toate certificatele au fost șterse.",
};

impl Collection for Certificates {
    type Payload = Certificate;

    const NAME: &'static str = "certificates";
    const PATH: &'static str = "certificates";
    const CLEARABLE: bool = true;

    fn texts() -> &'static CollectionTexts {
        &CERTIFICATE_TEXTS
    }

    fn row(entry: &Entry<Certificate>) -> Row {
        let cert = &entry.payload;
        let title = if cert.title.trim().is_empty() {
            "Certificat fără titlu".to_string()
        } else {
            cert.title.clone()
        };
        Row::for_entry(entry, title)
            .meta(cert.kind.label())
            .meta(describe_image(cert.image.as_deref()))
            .body(cert.description.clone().unwrap_or_default())
    }

    fn validate(cert: &Certificate) -> Result<(), AdminError> {
        require("title", &cert.title)
    }
}

// ── Partners ─────────────────────────────────────────────────────────────────

pub struct Partners;

static PARTNER_TEXTS: CollectionTexts = CollectionTexts {
    empty: "Nu există parteneri adăugați. Folosește \"Adaugă Partener\" pentru a adăuga unul nou.",
    load_failed: "Eroare la încărcarea partenerilor.",
    delete_failed: "Eroare: partenerul nu a putut fi șters. Încearcă din nou.",
    add_failed: "Eroare: partenerul nu a fost salvat.",
    update_failed: "Eroare: partenerul nu a putut fi actualizat.",
    duplicate: "Partenerul există deja.",
    clear_failed: "Eroare: partenerii nu au fost șterși.",
    cleared: "Toți partenerii au fost șterși.",
};

impl Collection for Partners {
    type Payload = Partner;

    const NAME: &'static str = "partners";
    const PATH: &'static str = "partners";

    fn texts() -> &'static CollectionTexts {
        &PARTNER_TEXTS
    }

    fn row(entry: &Entry<Partner>) -> Row {
        Row::for_entry(entry, entry.payload.title.clone()).meta(describe_image(entry.payload.image.as_deref()))
    }

    fn validate(partner: &Partner) -> Result<(), AdminError> {
        require("title", &partner.title)
    }
}

// ── Reviews ──────────────────────────────────────────────────────────────────

pub struct Reviews;

const REVIEW_PREVIEW_CHARS: usize = 300;

static REVIEW_TEXTS: CollectionTexts = CollectionTexts {
    empty: "Nu există recenzii. Folosește \"Adaugă recenzie\" pentru a adăuga una.",
    load_failed: "Eroare la încărcarea recenziilor.",
    delete_failed: "Eroare la ștergere.",
    add_failed: "Eroare la salvarea recenziei.",
    update_failed: "Eroare la salvarea recenziei.",
    duplicate: "Recenzia există deja.",
    clear_failed: "Eroare: recenziile nu au fost șterse.",
    cleared: "Toate recenziile au fost șterse.",
};

impl Collection for Reviews {
    type Payload = Review;

    const NAME: &'static str = "reviews";
    const PATH: &'static str = "admin/reviews";
    const INSERT_AT: InsertAt = InsertAt::Head;

    fn texts() -> &'static CollectionTexts {
        &REVIEW_TEXTS
    }

    fn row(entry: &Entry<Review>) -> Row {
        let review = &entry.payload;
        let approval = if review.approved { "✓ Aprobat" } else { "(în așteptare)" };
        Row::for_entry(entry, review.author.clone())
            .meta(format!("📅 {} {approval}", review.date.as_deref().unwrap_or_default()))
            .meta("⭐".repeat(review.rating as usize))
            .body(truncate(&review.comment, REVIEW_PREVIEW_CHARS))
    }

    fn validate(review: &Review) -> Result<(), AdminError> {
        require("author", &review.author)?;
        require("comment", &review.comment)
    }
}

// ── Office locations ─────────────────────────────────────────────────────────

pub struct Locations;

static LOCATION_TEXTS: CollectionTexts = CollectionTexts {
    empty: "Nu există locații adăugate. Folosește \"Adaugă Locație\" pentru a adăuga una nouă.",
    load_failed: "Eroare la încărcarea locațiilor.",
    delete_failed: "Eroare: locația nu a putut fi ștearsă. Încearcă din nou.",
    add_failed: "Eroare: locațiile nu au fost salvate.",
    update_failed: "Eroare la salvarea locației. Te rugăm să încerci din nou.",
    duplicate: "Există deja o locație cu acest nume.",
    clear_failed: "Eroare: locațiile nu au fost șterse.",
    cleared: "Toate locațiile au fost șterse.",
};

impl Collection for Locations {
    type Payload = Location;

    const NAME: &'static str = "locations";
    const PATH: &'static str = "locations";
    const SHAPE: Shape = Shape::WholeList { field: "locations" };

    fn texts() -> &'static CollectionTexts {
        &LOCATION_TEXTS
    }

    fn row(entry: &Entry<Location>) -> Row {
        let loc = &entry.payload;
        Row::for_entry(entry, format!("📍 {}", loc.name))
            .meta(loc.description.clone())
            .meta(format!("📍 {}", loc.address))
            .meta(format!("📞 {}", loc.phone))
            .meta(format!("🌐 Coordonate: {}, {}", loc.coordinates[0], loc.coordinates[1]))
    }

    fn natural_key(loc: &Location) -> Option<String> {
        Some(loc.name.trim().to_string()).filter(|name| !name.is_empty())
    }

    fn validate(loc: &Location) -> Result<(), AdminError> {
        require("name", &loc.name)?;
        require("description", &loc.description)?;
        require("address", &loc.address)?;
        require("phone", &loc.phone)?;
        require_finite("latitude", loc.coordinates[0])?;
        require_finite("longitude", loc.coordinates[1])
    }
}
