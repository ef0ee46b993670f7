//! In-memory stand-in for the search cluster, used by unit tests

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde_json::Value;

/// Records mirrored documents in memory and answers free-text queries with a
/// case-insensitive substring match over their JSON serialization. `*`
/// matches every record, like the real query-string syntax.
#[derive(Debug, Default)]
pub struct MockSearchClient {
    records: Mutex<BTreeMap<(String, i64), Value>>,
}

impl MockSearchClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index_value(&self, index: &str, id: i64, doc: Value) {
        self.records
            .lock()
            .unwrap()
            .insert((index.to_owned(), id), doc);
    }

    pub fn delete_value(&self, index: &str, id: i64) {
        self.records.lock().unwrap().remove(&(index.to_owned(), id));
    }

    pub fn search_values(&self, index: &str, query: &str) -> Vec<Value> {
        let query = query.to_lowercase();
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|((i, _), _)| i == index)
            .filter(|(_, doc)| query == "*" || doc.to_string().to_lowercase().contains(&query))
            .map(|(_, doc)| doc.clone())
            .collect()
    }

    /// Whether a record is currently mirrored, for test assertions
    pub fn contains(&self, index: &str, id: i64) -> bool {
        self.records
            .lock()
            .unwrap()
            .contains_key(&(index.to_owned(), id))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn mirrored_records_are_searchable() {
        let mock = MockSearchClient::new();
        mock.index_value("person", 1, json!({"id": 1, "model": "archivist"}));
        mock.index_value("person", 2, json!({"id": 2, "model": "clerk"}));

        let hits = mock.search_values("person", "ARCHIVIST");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["id"], 1);

        assert_eq!(mock.search_values("person", "*").len(), 2);
        assert_eq!(mock.search_values("document", "archivist").len(), 0);
    }

    #[test]
    fn deleted_records_stop_matching() {
        let mock = MockSearchClient::new();
        mock.index_value("content", 7, json!({"id": 7, "data": "aGVsbG8="}));
        assert!(mock.contains("content", 7));

        mock.delete_value("content", 7);
        assert!(!mock.contains("content", 7));
        assert_eq!(mock.search_values("content", "*").len(), 0);
    }
}
