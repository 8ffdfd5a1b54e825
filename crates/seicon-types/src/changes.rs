use serde::{Deserialize, Serialize};

use crate::record::IconRecord;

/// One updated record as reported by the collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordUpdate {
    #[serde(default)]
    pub old: Option<IconRecord>,
    #[serde(default)]
    pub new: Option<IconRecord>,
}

impl RecordUpdate {
    pub fn new(old: IconRecord, new: IconRecord) -> Self {
        Self {
            old: Some(old),
            new: Some(new),
        }
    }
}

/// A batch of changes pushed by the remote collection after a sync.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordChanges {
    #[serde(default)]
    pub created: Vec<IconRecord>,
    #[serde(default)]
    pub updated: Vec<RecordUpdate>,
    #[serde(default)]
    pub deleted: Vec<IconRecord>,
}

impl RecordChanges {
    pub fn created(records: Vec<IconRecord>) -> Self {
        Self {
            created: records,
            ..Default::default()
        }
    }

    pub fn updated(updates: Vec<RecordUpdate>) -> Self {
        Self {
            updated: updates,
            ..Default::default()
        }
    }

    /// Records that carry new content: every created record followed by the
    /// new value of every update. Deletions are not included.
    pub fn incoming(&self) -> impl Iterator<Item = &IconRecord> {
        self.created
            .iter()
            .chain(self.updated.iter().filter_map(|u| u.new.as_ref()))
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }
}
