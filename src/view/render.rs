use std::fmt;

use chrono::{DateTime, Utc};

use crate::collections::Collection;
use crate::models::{ChatbotTurn, Role};
use crate::view::cache::Entry;

/// One displayable line item, independent of any UI toolkit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Stable display key (the first member's key).
    pub key: String,
    /// Confirmed ids a delete of this row removes.
    pub ids: Vec<String>,
    pub title: String,
    pub meta: Vec<String>,
    pub body: Vec<String>,
    /// Client-side placeholder awaiting confirmation.
    pub pending: bool,
}

impl Row {
    pub fn for_entry<P>(entry: &Entry<P>, title: impl Into<String>) -> Self {
        Self {
            key: entry.key.to_string(),
            ids: entry.confirmed_id().map(str::to_string).into_iter().collect(),
            title: title.into(),
            meta: Vec::new(),
            body: Vec::new(),
            pending: entry.key.is_placeholder(),
        }
    }

    pub fn meta(mut self, line: impl Into<String>) -> Self {
        let line = line.into();
        if !line.trim().is_empty() {
            self.meta.push(line);
        }
        self
    }

    pub fn body(mut self, line: impl Into<String>) -> Self {
        let line = line.into();
        if !line.trim().is_empty() {
            self.body.push(line);
        }
        self
    }

    pub fn deletable(&self) -> bool {
        !self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|i| i == id)
    }
}

/// Rendered state of one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// Nothing to show; carries the collection's placeholder text.
    Empty { notice: String },
    Rows(Vec<Row>),
}

impl View {
    pub fn rows(&self) -> &[Row] {
        match self {
            View::Empty { .. } => &[],
            View::Rows(rows) => rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, View::Empty { .. })
    }

    /// The row a delete of `id` acts on.
    pub fn find(&self, id: &str) -> Option<&Row> {
        self.rows().iter().find(|row| row.contains(id))
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Empty { notice } => writeln!(f, "{notice}"),
            View::Rows(rows) => {
                for row in rows {
                    let status = if row.pending { " (în așteptare)" } else { "" };
                    writeln!(f, "[{}] {}{status}", row.key, row.title)?;
                    for line in &row.meta {
                        writeln!(f, "    {line}")?;
                    }
                    for line in &row.body {
                        writeln!(f, "    {line}")?;
                    }
                }
                Ok(())
            }
        }
    }
}

/// Pure snapshot → view mapping: same entries, same view.
pub fn render<C: Collection>(entries: &[Entry<C::Payload>]) -> View {
    let rows = C::layout(entries);
    if rows.is_empty() {
        View::Empty { notice: C::texts().empty.to_string() }
    } else {
        View::Rows(rows)
    }
}

// ── Chatbot conversations ────────────────────────────────────────────────────

/// A user turn and the bot turn that immediately answered it.
#[derive(Debug, Clone, Copy)]
pub struct ConversationPair<'a> {
    pub user: &'a Entry<ChatbotTurn>,
    pub bot: Option<&'a Entry<ChatbotTurn>>,
}

impl ConversationPair<'_> {
    pub fn ids(&self) -> Vec<String> {
        std::iter::once(self.user)
            .chain(self.bot)
            .filter_map(|e| e.confirmed_id().map(str::to_string))
            .collect()
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.user.payload.parsed_timestamp()
    }
}

/// Groups turns by adjacency, newest conversation first.
///
/// Bot turns without a user turn right before them are left out of the
/// display; they stay in the cache and on the server.
pub fn group_conversations(entries: &[Entry<ChatbotTurn>]) -> Vec<ConversationPair<'_>> {
    let mut pairs = Vec::new();
    let mut i = 0;
    while i < entries.len() {
        let entry = &entries[i];
        if entry.payload.role == Role::User {
            let bot = entries.get(i + 1).filter(|next| next.payload.role == Role::Bot);
            if bot.is_some() {
                i += 1;
            }
            pairs.push(ConversationPair { user: entry, bot });
        }
        i += 1;
    }
    // Stable: equal or missing timestamps keep scan order.
    pairs.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::{Chatbot, Messages};
    use crate::models::{CollectionItem, ContactMessage};
    use crate::view::cache::LocalViewCache;

    fn turns(rows: &[(&str, Role, &str)]) -> LocalViewCache<ChatbotTurn> {
        let mut cache = LocalViewCache::new();
        cache.replace(
            rows.iter()
                .map(|(id, role, ts)| {
                    CollectionItem::new(*id, ChatbotTurn::new(*role, format!("text {id}"), *ts))
                })
                .collect(),
        );
        cache
    }

    fn keys(pairs: &[ConversationPair<'_>]) -> Vec<(String, Option<String>)> {
        pairs
            .iter()
            .map(|p| (p.user.key.to_string(), p.bot.map(|b| b.key.to_string())))
            .collect()
    }

    #[test]
    fn user_bot_user_yields_two_pairs() {
        let cache = turns(&[
            ("u1", Role::User, "2024-05-01T10:00:00"),
            ("b1", Role::Bot, "2024-05-01T10:00:01"),
            ("u2", Role::User, "2024-05-01T11:00:00"),
        ]);
        let pairs = group_conversations(cache.entries());
        assert_eq!(
            keys(&pairs),
            vec![
                ("u2".to_string(), None),
                ("u1".to_string(), Some("b1".to_string())),
            ]
        );
        assert_eq!(pairs[1].ids(), ["u1", "b1"]);
    }

    #[test]
    fn leading_bot_turn_is_dropped_from_display_only() {
        let cache = turns(&[
            ("b0", Role::Bot, "2024-05-01T09:00:00"),
            ("u1", Role::User, "2024-05-01T10:00:00"),
        ]);
        let pairs = group_conversations(cache.entries());
        assert_eq!(keys(&pairs), vec![("u1".to_string(), None)]);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn consumed_bot_turn_is_rendered_once() {
        let cache = turns(&[
            ("u1", Role::User, "2024-05-01T10:00:00"),
            ("b1", Role::Bot, "2024-05-01T10:00:01"),
            ("b2", Role::Bot, "2024-05-01T10:00:02"),
        ]);
        let view = render::<Chatbot>(cache.entries());
        assert_eq!(view.len(), 1);
        assert_eq!(view.rows()[0].ids, ["u1", "b1"]);
        assert!(view.find("b2").is_none());
    }

    #[test]
    fn sort_is_newest_first_and_leaves_cache_order() {
        let cache = turns(&[
            ("u1", Role::User, "2024-05-01T08:00:00"),
            ("u2", Role::User, "not a date"),
            ("u3", Role::User, "2024-05-02T08:00:00Z"),
        ]);
        let pairs = group_conversations(cache.entries());
        assert_eq!(
            keys(&pairs).into_iter().map(|(u, _)| u).collect::<Vec<_>>(),
            ["u3", "u1", "u2"]
        );
        assert_eq!(cache.entries()[0].key.to_string(), "u1");
    }

    #[test]
    fn empty_snapshot_renders_placeholder_state() {
        let view = render::<Messages>(&[]);
        assert!(view.is_empty());
        assert_eq!(view.to_string(), "Nu există mesaje.\n");
    }

    #[test]
    fn rendering_is_deterministic() {
        let mut cache = LocalViewCache::new();
        cache.replace(vec![CollectionItem::new(
            "m1",
            ContactMessage {
                name: "Ion".into(),
                phone: "0722".into(),
                email: "ion@example.ro".into(),
                message: "Gândaci în bucătărie".into(),
                timestamp: Some("2024-05-01T10:00:00".into()),
            },
        )]);
        let first = render::<Messages>(cache.entries());
        let second = render::<Messages>(cache.entries());
        assert_eq!(first, second);
        assert_eq!(first.to_string(), second.to_string());
        assert!(first.to_string().starts_with("[m1] Ion\n"));
    }
}
