//! Per-document graph cache.
//!
//! Entries are the JSON encoding of [`GraphPayload`] under
//! `mindmap:graph:<documentId>`. They never expire; a forced refresh
//! simply overwrites them.

use super::storage::KeyValueStore;
use crate::error::Result;
use crate::graph::GraphPayload;

const KEY_PREFIX: &str = "mindmap:graph:";

pub struct GraphCache<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> GraphCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn key(document_id: &str) -> String {
        format!("{KEY_PREFIX}{document_id}")
    }

    /// Cached graph for a document. Unreadable or undecodable entries are
    /// logged and reported as a miss.
    pub fn get(&self, document_id: &str) -> Option<GraphPayload> {
        let raw = match self.store.get(&Self::key(document_id)) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                log::debug!("cache miss for {document_id}");
                return None;
            }
            Err(err) => {
                log::warn!("cache read for {document_id} failed: {err}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(payload) => {
                log::debug!("cache hit for {document_id}");
                Some(payload)
            }
            Err(err) => {
                log::warn!("discarding undecodable cache entry for {document_id}: {err}");
                None
            }
        }
    }

    /// Store (or overwrite) the graph for a document.
    pub fn put(&mut self, document_id: &str, payload: &GraphPayload) -> Result<()> {
        let raw = serde_json::to_string(payload)?;
        self.store.set(&Self::key(document_id), &raw)
    }

    pub fn invalidate(&mut self, document_id: &str) -> Result<()> {
        self.store.remove(&Self::key(document_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::graph::{RawEdge, RawNode};

    fn sample() -> GraphPayload {
        GraphPayload::new(
            vec![RawNode::new("root", "Doc"), RawNode::new("a", "Topic A")],
            vec![RawEdge::new("root", "a").with_relation("has")],
        )
    }

    #[test]
    fn test_put_then_get() {
        let mut cache = GraphCache::new(MemoryStore::new());
        assert_eq!(cache.get("doc1"), None);
        cache.put("doc1", &sample()).unwrap();
        assert_eq!(cache.get("doc1"), Some(sample()));
        assert_eq!(cache.get("doc2"), None);
    }

    #[test]
    fn test_put_overwrites() {
        let mut cache = GraphCache::new(MemoryStore::new());
        cache.put("doc1", &sample()).unwrap();
        let replacement = GraphPayload::fallback("doc1.pdf");
        cache.put("doc1", &replacement).unwrap();
        assert_eq!(cache.get("doc1"), Some(replacement));
        assert_eq!(cache.store.len(), 1);
    }

    #[test]
    fn test_key_format() {
        let mut cache = GraphCache::new(MemoryStore::new());
        cache.put("doc1", &sample()).unwrap();
        assert!(cache.store.get("mindmap:graph:doc1").unwrap().is_some());
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let mut store = MemoryStore::new();
        store.set(&GraphCache::<MemoryStore>::key("doc1"), "{not json").unwrap();
        let cache = GraphCache::new(store);
        assert_eq!(cache.get("doc1"), None);
    }

    #[test]
    fn test_invalidate() {
        let mut cache = GraphCache::new(MemoryStore::new());
        cache.put("doc1", &sample()).unwrap();
        cache.invalidate("doc1").unwrap();
        assert_eq!(cache.get("doc1"), None);
    }
}
