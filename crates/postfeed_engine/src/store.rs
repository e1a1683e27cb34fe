//! Ordered, keyed store of the posts on the loaded page.

use crate::record::PostRecord;
use postfeed_protocol::PostId;

/// The posts the current page shows.
///
/// # Invariants
///
/// - IDs are unique
/// - Order is display order; creations go to the front
/// - `total_count` is the last known size of the remote collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostStore {
    records: Vec<PostRecord>,
    total_count: u64,
}

impl PostStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards the current content and installs `records` in order.
    ///
    /// Later duplicates of an ID already installed are dropped.
    pub fn replace_all(&mut self, records: Vec<PostRecord>, total_count: u64) {
        self.records.clear();
        for record in records {
            if !self.contains(&record.id) {
                self.records.push(record);
            }
        }
        self.total_count = total_count;
    }

    /// Inserts at the front unless the ID is already present.
    ///
    /// Returns true if the record was inserted.
    pub fn insert_front(&mut self, record: PostRecord) -> bool {
        if self.contains(&record.id) {
            return false;
        }
        self.records.insert(0, record);
        self.total_count += 1;
        true
    }

    /// Replaces the record with the same ID in place.
    ///
    /// The creation time of the loaded record is kept. Returns false if no
    /// such record is loaded.
    pub fn replace_by_id(&mut self, mut record: PostRecord) -> bool {
        match self.position(&record.id) {
            Some(index) => {
                record.created_at = self.records[index].created_at;
                self.records[index] = record;
                true
            }
            None => false,
        }
    }

    /// Removes the record with the given ID.
    ///
    /// The total count is left alone; only a page reload knows the new
    /// remote size.
    pub fn remove_by_id(&mut self, id: &PostId) -> Option<PostRecord> {
        self.position(id).map(|index| self.records.remove(index))
    }

    /// Returns the record with the given ID.
    pub fn get(&self, id: &PostId) -> Option<&PostRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    /// Returns true if a record with the given ID is loaded.
    pub fn contains(&self, id: &PostId) -> bool {
        self.position(id).is_some()
    }

    /// Returns the records in display order.
    pub fn records(&self) -> &[PostRecord] {
        &self.records
    }

    /// Returns the IDs in display order.
    pub fn ids(&self) -> Vec<PostId> {
        self.records.iter().map(|r| r.id.clone()).collect()
    }

    /// Returns the number of loaded records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no records are loaded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the last known size of the remote collection.
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    fn position(&self, id: &PostId) -> Option<usize> {
        self.records.iter().position(|r| &r.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::UNKNOWN_AUTHOR;
    use chrono::{DateTime, Utc};

    fn record(id: &str, title: &str) -> PostRecord {
        PostRecord {
            id: PostId::new(id),
            title: title.into(),
            content: String::new(),
            image_ref: None,
            image_url: None,
            author_name: UNKNOWN_AUTHOR.into(),
            creator_id: None,
            created_at: "2024-01-12T10:00:00Z".parse().unwrap(),
        }
    }

    fn ids(store: &PostStore) -> Vec<&str> {
        store.records().iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn replace_all_installs_in_order() {
        let mut store = PostStore::new();
        store.replace_all(vec![record("2", "a"), record("1", "b")], 5);

        assert_eq!(ids(&store), ["2", "1"]);
        assert_eq!(store.total_count(), 5);

        store.replace_all(vec![record("9", "c")], 4);
        assert_eq!(ids(&store), ["9"]);
        assert_eq!(store.total_count(), 4);
    }

    #[test]
    fn replace_all_drops_duplicate_ids() {
        let mut store = PostStore::new();
        store.replace_all(vec![record("1", "a"), record("1", "b")], 2);

        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].title, "a");
    }

    #[test]
    fn insert_front_is_idempotent() {
        let mut store = PostStore::new();
        store.replace_all(vec![record("1", "a")], 1);

        assert!(store.insert_front(record("2", "b")));
        assert!(!store.insert_front(record("2", "b")));

        assert_eq!(ids(&store), ["2", "1"]);
        assert_eq!(store.total_count(), 2);
    }

    #[test]
    fn replace_by_id_preserves_position() {
        let mut store = PostStore::new();
        store.replace_all(vec![record("3", "a"), record("2", "b"), record("1", "c")], 3);

        assert!(store.replace_by_id(record("2", "edited")));
        assert_eq!(ids(&store), ["3", "2", "1"]);
        assert_eq!(store.get(&PostId::new("2")).unwrap().title, "edited");
    }

    #[test]
    fn replace_by_id_keeps_creation_time() {
        let mut store = PostStore::new();
        store.replace_all(vec![record("1", "a")], 1);

        let mut edited = record("1", "b");
        edited.created_at = "2030-06-01T00:00:00Z".parse().unwrap();
        assert!(store.replace_by_id(edited));

        let kept = store.get(&PostId::new("1")).unwrap();
        assert_eq!(kept.title, "b");
        assert_eq!(kept.created_at, "2024-01-12T10:00:00Z".parse::<DateTime<Utc>>().unwrap());
    }

    #[test]
    fn replace_by_id_ignores_unknown() {
        let mut store = PostStore::new();
        store.replace_all(vec![record("1", "a")], 1);
        let before = store.clone();

        assert!(!store.replace_by_id(record("42", "elsewhere")));
        assert_eq!(store, before);
    }

    #[test]
    fn remove_by_id() {
        let mut store = PostStore::new();
        store.replace_all(vec![record("2", "a"), record("1", "b")], 2);

        assert_eq!(store.remove_by_id(&PostId::new("2")).unwrap().title, "a");
        assert!(store.remove_by_id(&PostId::new("2")).is_none());
        assert_eq!(ids(&store), ["1"]);
        assert_eq!(store.total_count(), 2);
    }
}
