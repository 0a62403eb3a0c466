//! Storage and persistence layer
//!
//! - Durable key-value backends (in-memory, file system)
//! - Redacting snapshot persistence

mod backend;
mod file_system;
mod persist;

pub use backend::{MemoryStorage, StorageBackend};
pub use file_system::FileStorage;
pub use persist::{PersistedSnapshot, SnapshotPersister};
