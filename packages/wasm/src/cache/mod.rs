//! Persistence cache for fetched document graphs.

mod graph_cache;
mod storage;

pub use graph_cache::GraphCache;
pub use storage::{BrowserStorage, KeyValueStore, MemoryStore};
