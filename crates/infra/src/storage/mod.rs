//! Key/value storage adapters for the session snapshot

pub mod file_store;
pub mod memory_store;

pub use file_store::FileKeyValueStorage;
pub use memory_store::MemoryKeyValueStorage;
