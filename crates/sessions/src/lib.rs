//! Session store implementations for Parley.
//!
//! All backends implement [`parley_core::SessionStore`]:
//! - [`SqliteSessionStore`]: the default, one WAL-mode database file
//! - [`JsonlSessionStore`]: one JSON-lines file per session
//! - [`InMemorySessionStore`]: not durable, for tests and throwaway chats

pub mod in_memory;
pub mod jsonl;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use in_memory::InMemorySessionStore;
pub use jsonl::JsonlSessionStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteSessionStore;

use parley_core::error::StoreError;
use parley_core::session::SessionStore;
use std::path::Path;
use std::sync::Arc;

/// Open the store named by `backend` ("sqlite", "jsonl" or "memory").
pub async fn open(backend: &str, path: &Path) -> Result<Arc<dyn SessionStore>, StoreError> {
    match backend {
        #[cfg(feature = "sqlite")]
        "sqlite" => Ok(Arc::new(SqliteSessionStore::open(path).await?)),
        "jsonl" => Ok(Arc::new(JsonlSessionStore::open(path)?)),
        "memory" => Ok(Arc::new(InMemorySessionStore::new())),
        other => Err(StoreError::Storage(format!(
            "unsupported session backend '{other}'"
        ))),
    }
}
