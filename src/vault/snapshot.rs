//! The complete plaintext unit that is sealed, persisted and synced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::Record;

/// All records plus sync metadata.  There is no per-record persistence:
/// the whole snapshot is written every time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultSnapshot {
    /// Records in insertion order.
    #[serde(default)]
    pub records: Vec<Record>,

    /// When this snapshot was last pushed to the remote store.
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,
}

impl VaultSnapshot {
    pub fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Records matching `query` case-insensitively, in stored order.
    /// An empty query matches everything.
    pub fn search(&self, query: &str) -> Vec<&Record> {
        if query.is_empty() {
            return self.records.iter().collect();
        }

        let needle = query.to_lowercase();
        self.records.iter().filter(|r| r.matches(&needle)).collect()
    }

    /// Best-effort wipe of every record's sensitive fields.
    pub(crate) fn wipe(&mut self) {
        for record in &mut self.records {
            record.wipe();
        }
        self.records.clear();
        self.last_sync = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::record::{Category, RecordDraft};

    fn snapshot() -> VaultSnapshot {
        let now = Utc::now();
        let records = vec![
            Record::from_draft("a".into(), &RecordDraft::new("Bank"), now),
            Record::from_draft(
                "b".into(),
                &RecordDraft::new("Mail")
                    .category(Category::Credential)
                    .username("banker"),
                now,
            ),
            Record::from_draft("c".into(), &RecordDraft::new("Recipes"), now),
        ];
        VaultSnapshot {
            records,
            last_sync: None,
        }
    }

    #[test]
    fn empty_query_returns_all_in_order() {
        let snap = snapshot();
        let ids: Vec<_> = snap.search("").iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let snap = snapshot();
        let ids: Vec<_> = snap.search("BANK").iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn missing_fields_deserialize_to_empty_snapshot() {
        let snap: VaultSnapshot = serde_json::from_str("{}").unwrap();
        assert!(snap.records.is_empty());
        assert!(snap.last_sync.is_none());
    }

    #[test]
    fn wipe_clears_everything() {
        let mut snap = snapshot();
        snap.wipe();
        assert!(snap.records.is_empty());
    }
}
