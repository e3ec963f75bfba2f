//! Persisted state for LiteChat: a small async key-value store and the
//! title versioner that keeps per-title "Part N" counters in it.
//!
//! `JsonFileStore` keeps every key in one JSON document on disk
//! (`data/storage.json`); `MemoryStore` is the in-process equivalent.

pub mod kv;
pub mod versioner;

pub use kv::{JsonFileStore, KeyValueStore, MemoryStore};
pub use versioner::{
    format_versioned, parse_title, TitleIndex, TitleRecord, TitleVersioner, VersionInfo,
    TITLE_INDEX_KEY,
};
