//! SQLite session store.
//!
//! Uses a single SQLite database file with one `messages` table. Each row
//! is one message; `seq` (an autoincrement rowid alias) fixes the append
//! order across all sessions, and `(session_id, seq)` is indexed for loads.
//!
//! The full message is kept as JSON in `payload`; `role` and `message_id`
//! are broken out for inspection with the sqlite3 shell.

use parley_core::locks::SessionLocks;
use async_trait::async_trait;
use parley_core::error::StoreError;
use parley_core::message::{Message, SessionId};
use parley_core::session::SessionStore;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

/// Durable session store backed by one SQLite database.
pub struct SqliteSessionStore {
    pool: SqlitePool,
    locks: SessionLocks,
}

impl SqliteSessionStore {
    /// Open (creating if missing) the database at `path`.
    ///
    /// The schema is created automatically.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Storage(format!("Failed to create database directory: {e}"))
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self::from_pool(pool).await?;
        info!("SQLite session store initialized at {}", path.display());
        Ok(store)
    }

    /// Ephemeral database for tests. A single connection, since every
    /// `:memory:` connection would otherwise see its own empty database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new().in_memory(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;
        Self::from_pool(pool).await
    }

    /// Create from an existing pool.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self {
            pool,
            locks: SessionLocks::default(),
        };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                seq          INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id   TEXT NOT NULL,
                message_id   TEXT UNIQUE NOT NULL,
                role         TEXT NOT NULL,
                payload      TEXT NOT NULL,
                created_at   TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Migration(format!("messages table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_session_seq ON messages(session_id, seq)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Migration(format!("session index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn append(&self, session: &SessionId, message: &Message) -> Result<(), StoreError> {
        let payload = serde_json::to_string(message)
            .map_err(|e| StoreError::Storage(format!("Message serialization: {e}")))?;

        let _guard = self.locks.acquire(session).await;

        // One INSERT is one implicit transaction: the row lands whole or not at all
        sqlx::query(
            r#"
            INSERT INTO messages (session_id, message_id, role, payload, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(session.as_str())
        .bind(&message.id)
        .bind(message.role.as_str())
        .bind(&payload)
        .bind(message.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("INSERT failed: {e}")))?;

        debug!(session = %session, message_id = %message.id, role = message.role.as_str(), "Appended message");
        Ok(())
    }

    async fn load(&self, session: &SessionId) -> Result<Vec<Message>, StoreError> {
        let rows = sqlx::query("SELECT payload FROM messages WHERE session_id = ?1 ORDER BY seq")
            .bind(session.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("SELECT failed: {e}")))?;

        rows.iter()
            .map(|row| {
                let payload: String = row
                    .try_get("payload")
                    .map_err(|e| StoreError::Storage(format!("payload column: {e}")))?;
                serde_json::from_str(&payload).map_err(|e| StoreError::Corrupt {
                    session: session.to_string(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    async fn list_session_ids(&self) -> Result<BTreeSet<SessionId>, StoreError> {
        let rows = sqlx::query("SELECT DISTINCT session_id FROM messages")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("SELECT failed: {e}")))?;

        rows.iter()
            .map(|row| {
                row.try_get::<String, _>("session_id")
                    .map(SessionId)
                    .map_err(|e| StoreError::Storage(format!("session_id column: {e}")))
            })
            .collect()
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.pool.close().await;
        info!("SQLite session store closed");
        Ok(())
    }
}
