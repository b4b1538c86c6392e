use crate::models::{CollectionItem, ItemKey};

/// Where a collection shows freshly added items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertAt {
    Head,
    Tail,
}

/// One cached element of a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<P> {
    pub key: ItemKey,
    pub payload: P,
}

impl<P> Entry<P> {
    pub fn confirmed_id(&self) -> Option<&str> {
        self.key.confirmed_id()
    }
}

impl<P> From<CollectionItem<P>> for Entry<P> {
    fn from(item: CollectionItem<P>) -> Self {
        Self { key: ItemKey::from_server(item.id), payload: item.payload }
    }
}

/// What an optimistic removal took out of the cache, with original indices
/// in ascending order.
#[derive(Debug, Clone)]
pub struct UndoEntry<P> {
    removed: Vec<(usize, Entry<P>)>,
}

impl<P> UndoEntry<P> {
    pub fn len(&self) -> usize {
        self.removed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }
}

/// Last known server state of one collection, in server order.
///
/// The cache has no authority: it is replaced wholesale by every successful
/// fetch and every optimistic change is either confirmed or undone.
#[derive(Debug, Clone)]
pub struct LocalViewCache<P> {
    entries: Vec<Entry<P>>,
}

impl<P> Default for LocalViewCache<P> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<P> LocalViewCache<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, items: Vec<CollectionItem<P>>) {
        self.entries = items.into_iter().map(Entry::from).collect();
    }

    pub fn entries(&self) -> &[Entry<P>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.confirmed_id() == Some(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Removes every entry named by `ids`, or nothing at all if one is missing.
    pub fn remove_ids(&mut self, ids: &[String]) -> Option<UndoEntry<P>> {
        let mut positions = Vec::with_capacity(ids.len());
        for id in ids {
            let pos = self.position(id)?;
            if !positions.contains(&pos) {
                positions.push(pos);
            }
        }
        if positions.is_empty() {
            return None;
        }
        positions.sort_unstable();

        let mut removed: Vec<(usize, Entry<P>)> = positions
            .iter()
            .rev()
            .map(|&pos| (pos, self.entries.remove(pos)))
            .collect();
        removed.reverse();
        Some(UndoEntry { removed })
    }

    /// Puts removed entries back where they were.
    pub fn restore(&mut self, undo: UndoEntry<P>) {
        for (pos, entry) in undo.removed {
            let pos = pos.min(self.entries.len());
            self.entries.insert(pos, entry);
        }
    }

    pub fn insert_placeholder(&mut self, payload: P, at: InsertAt) -> ItemKey {
        let key = ItemKey::placeholder();
        let entry = Entry { key: key.clone(), payload };
        match at {
            InsertAt::Head => self.entries.insert(0, entry),
            InsertAt::Tail => self.entries.push(entry),
        }
        key
    }

    pub fn discard(&mut self, key: &ItemKey) -> Option<Entry<P>> {
        let pos = self.entries.iter().position(|e| &e.key == key)?;
        Some(self.entries.remove(pos))
    }

    /// Turns a placeholder into a confirmed entry in place.
    pub fn promote(&mut self, key: &ItemKey, id: impl Into<String>) -> bool {
        match self.entries.iter_mut().find(|e| &e.key == key) {
            Some(entry) => {
                entry.key = ItemKey::Confirmed(id.into());
                true
            }
            None => false,
        }
    }

    /// Swaps the payload of a confirmed entry in place, returning the old one.
    pub fn replace_payload(&mut self, id: &str, payload: P) -> Option<P> {
        let pos = self.position(id)?;
        Some(std::mem::replace(&mut self.entries[pos].payload, payload))
    }

    /// Re-keys a confirmed entry whose identity changed on the server.
    pub fn rename(&mut self, id: &str, new_id: impl Into<String>) -> bool {
        match self.position(id) {
            Some(pos) => {
                self.entries[pos].key = ItemKey::Confirmed(new_id.into());
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(ids: &[&str]) -> LocalViewCache<String> {
        let mut cache = LocalViewCache::new();
        cache.replace(
            ids.iter()
                .map(|id| CollectionItem::new(*id, format!("body of {id}")))
                .collect(),
        );
        cache
    }

    fn ids(cache: &LocalViewCache<String>) -> Vec<String> {
        cache.entries().iter().map(|e| e.key.to_string()).collect()
    }

    fn owned(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn remove_then_restore_is_identity() {
        let mut c = cache(&["a", "b", "c", "d", "e"]);
        let before = c.entries().to_vec();

        let undo = c.remove_ids(&owned(&["d", "b"])).unwrap();
        assert_eq!(undo.len(), 2);
        assert_eq!(ids(&c), ["a", "c", "e"]);

        c.restore(undo);
        assert_eq!(c.entries(), before.as_slice());
    }

    #[test]
    fn remove_is_all_or_nothing() {
        let mut c = cache(&["a", "b"]);
        assert!(c.remove_ids(&owned(&["a", "zzz"])).is_none());
        assert_eq!(ids(&c), ["a", "b"]);
        assert!(c.remove_ids(&[]).is_none());
    }

    #[test]
    fn placeholders_are_never_found_by_id() {
        let mut c = cache(&["a"]);
        let key = c.insert_placeholder("draft".to_string(), InsertAt::Head);
        assert_eq!(c.entries()[0].key, key);
        assert!(!c.contains(&key.to_string()));

        c.discard(&key).unwrap();
        assert_eq!(ids(&c), ["a"]);
    }

    #[test]
    fn promote_confirms_placeholder_in_place() {
        let mut c = cache(&["a", "b"]);
        let key = c.insert_placeholder("new".to_string(), InsertAt::Tail);
        assert!(c.promote(&key, "c"));
        assert_eq!(ids(&c), ["a", "b", "c"]);
        assert!(!c.promote(&key, "d"));
    }

    #[test]
    fn items_without_id_become_placeholders() {
        let mut c: LocalViewCache<String> = LocalViewCache::new();
        c.replace(vec![
            CollectionItem { id: None, payload: "legacy".into() },
            CollectionItem::new("7", "fresh".to_string()),
        ]);
        assert!(c.entries()[0].key.is_placeholder());
        assert_eq!(c.position("7"), Some(1));
    }

    #[test]
    fn replaced_payload_can_be_put_back() {
        let mut c = cache(&["a", "b", "c"]);
        let before = c.entries().to_vec();

        let old = c.replace_payload("b", "edited".to_string()).unwrap();
        assert_eq!(old, "body of b");
        assert_eq!(c.entries()[1].payload, "edited");
        assert_eq!(ids(&c), ["a", "b", "c"]);

        c.replace_payload("b", old);
        assert_eq!(c.entries(), before.as_slice());
        assert!(c.replace_payload("zzz", "x".to_string()).is_none());
    }

    #[test]
    fn rename_keeps_position() {
        let mut c = cache(&["a", "b"]);
        assert!(c.rename("a", "z"));
        assert_eq!(ids(&c), ["z", "b"]);
        assert!(!c.rename("a", "y"));
    }
}
