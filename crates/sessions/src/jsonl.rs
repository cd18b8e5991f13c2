//! File-based store — one JSON-lines file per session.
//!
//! Each line is a JSON-encoded [`Message`]. Files live in one directory and
//! are named `s-<hex id>.jsonl`, so any opaque id maps to a safe file name
//! and back. Ids longer than [`MAX_ID_BYTES`] would exceed the file-name
//! limit and are rejected.
//!
//! Human-inspectable and dependency-free, at the cost of reading a whole
//! session file on `load`.

use parley_core::locks::SessionLocks;
use async_trait::async_trait;
use parley_core::error::StoreError;
use parley_core::message::{Message, SessionId};
use parley_core::session::SessionStore;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, warn};

const EXTENSION: &str = "jsonl";
const PREFIX: &str = "s-";

/// Longest session id, in bytes, this backend accepts.
pub const MAX_ID_BYTES: usize = 120;

pub struct JsonlSessionStore {
    dir: PathBuf,
    locks: SessionLocks,
}

impl JsonlSessionStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir).map_err(|e| {
            StoreError::Storage(format!("Failed to create session directory: {e}"))
        })?;
        debug!(path = %dir.display(), "JSONL session store opened");
        Ok(Self {
            dir: dir.to_path_buf(),
            locks: SessionLocks::default(),
        })
    }

    fn file_for(&self, session: &SessionId) -> Result<PathBuf, StoreError> {
        if session.as_str().len() > MAX_ID_BYTES {
            return Err(StoreError::Storage(format!(
                "Session id is {} bytes; the jsonl backend accepts at most {MAX_ID_BYTES}",
                session.as_str().len()
            )));
        }
        Ok(self
            .dir
            .join(format!("{PREFIX}{}.{EXTENSION}", encode_hex(session.as_str()))))
    }
}

#[async_trait]
impl SessionStore for JsonlSessionStore {
    fn name(&self) -> &str {
        "jsonl"
    }

    async fn append(&self, session: &SessionId, message: &Message) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(message)
            .map_err(|e| StoreError::Storage(format!("Failed to serialize message: {e}")))?;
        line.push('\n');

        let path = self.file_for(session)?;
        let _guard = self.locks.acquire(session).await;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open {}: {e}", path.display())))?;

        // A crash mid-write can leave an unterminated last line; start fresh
        // so this record is not glued onto it.
        let len = file
            .metadata()
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to stat session file: {e}")))?
            .len();
        if len > 0 {
            let mut last = [0u8; 1];
            file.seek(std::io::SeekFrom::End(-1))
                .await
                .map_err(|e| StoreError::Storage(format!("Failed to seek session file: {e}")))?;
            file.read_exact(&mut last)
                .await
                .map_err(|e| StoreError::Storage(format!("Failed to read session file: {e}")))?;
            if last[0] != b'\n' {
                line.insert(0, '\n');
            }
        }

        file.write_all(line.as_bytes())
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to write session file: {e}")))?;
        file.sync_data()
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to sync session file: {e}")))?;

        debug!(session = %session, message_id = %message.id, "Appended message");
        Ok(())
    }

    async fn load(&self, session: &SessionId) -> Result<Vec<Message>, StoreError> {
        let path = self.file_for(session)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StoreError::Storage(format!(
                    "Failed to read {}: {e}",
                    path.display()
                )));
            }
        };

        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<Message>(line) {
                Ok(message) => Some(message),
                Err(e) => {
                    warn!(session = %session, error = %e, "Skipping truncated session record");
                    None
                }
            })
            .collect())
    }

    async fn list_session_ids(&self) -> Result<BTreeSet<SessionId>, StoreError> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to list sessions: {e}")))?;

        let mut ids = BTreeSet::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to list sessions: {e}")))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match stem.strip_prefix(PREFIX).and_then(decode_hex) {
                Some(id) => {
                    ids.insert(SessionId(id));
                }
                None => warn!(file = %path.display(), "Ignoring foreign file in session directory"),
            }
        }
        Ok(ids)
    }
}

fn encode_hex(s: &str) -> String {
    s.bytes().map(|b| format!("{b:02x}")).collect()
}

fn decode_hex(s: &str) -> Option<String> {
    if s.len() % 2 != 0 {
        return None;
    }
    let bytes: Option<Vec<u8>> = (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok())
        .collect();
    String::from_utf8(bytes?).ok()
}
