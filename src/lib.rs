//! Cross-context session controller for an embedded browser wallet
//!
//! A wallet can run in several browser contexts at once (main window,
//! iframes, popups) that share no memory. This crate keeps them consistent:
//!
//! - `state` - the authoritative replica snapshot and its derived views
//! - `storage` - redacting persistence that survives reloads
//! - `broadcast` - instance-scoped, fire-and-forget event channels between
//!   sibling contexts
//! - `dispatcher` - the RPC method table exposed to the embedding page
//! - `session` - lifecycle: instance identity, init, logout, communication
//!
//! The wallet engine (keys, RPC connections, balances) and the upstream
//! identity provider are external collaborators reached through the traits
//! in `engine`.

pub mod broadcast;
pub mod comm;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod notify;
pub mod session;
pub mod state;
pub mod storage;

pub use config::{ContextKind, ProviderConfig, SessionConfig};
pub use engine::{EngineConfig, EngineEvent, EngineFactory, IdentityProvider, WalletEngine};
pub use error::{SessionError, StorageError};
pub use session::{LifecyclePhase, SessionController};
pub use state::{StateStore, WalletState};
pub use storage::{FileStorage, MemoryStorage, PersistedSnapshot, SnapshotPersister, StorageBackend};
