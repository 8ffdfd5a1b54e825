use indexmap::IndexMap;
use seicon_types::{IconRecord, RecordId};

/// Records waiting for the next flush, keyed by record id.
///
/// Last write wins per id; an id keeps the position of its first insertion,
/// so a flush applies records in the order they were first queued.
#[derive(Debug, Default)]
pub struct PendingUpdates {
    records: IndexMap<RecordId, IconRecord>,
}

impl PendingUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a record. Returns `true` if its id was not pending yet.
    pub fn insert(&mut self, record: IconRecord) -> bool {
        self.records.insert(record.id.clone(), record).is_none()
    }

    pub fn get(&self, id: &RecordId) -> Option<&IconRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.records.contains_key(id)
    }

    pub fn values(&self) -> impl Iterator<Item = &IconRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seicon_types::AttachmentMeta;

    fn record(id: &str, last_modified: u64) -> IconRecord {
        IconRecord::new(id, [id], 16, AttachmentMeta::new("image/png"), last_modified)
    }

    #[test]
    fn last_write_wins_per_id() {
        let mut pending = PendingUpdates::new();
        assert!(pending.insert(record("a", 1)));
        assert!(!pending.insert(record("a", 3)));
        assert_eq!(pending.len(), 1);
        assert_eq!(pending.get(&RecordId::new("a")).unwrap().last_modified, 3);
    }

    #[test]
    fn keeps_first_insertion_order() {
        let mut pending = PendingUpdates::new();
        pending.insert(record("a", 1));
        pending.insert(record("b", 1));
        pending.insert(record("a", 2));

        let ids: Vec<&str> = pending.values().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn clear_empties() {
        let mut pending = PendingUpdates::new();
        pending.insert(record("a", 1));
        assert!(pending.contains(&RecordId::new("a")));
        pending.clear();
        assert!(pending.is_empty());
    }
}
