//! Per-session async locks.

use crate::message::SessionId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Hands out one async mutex per session id.
///
/// Work on the same session queues up; different sessions never contend
/// beyond the short map lookup. An entry is dropped as soon as no guard or
/// waiter refers to it, so the map only holds sessions in use.
#[derive(Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<SessionId, Arc<AsyncMutex<()>>>>,
}

impl SessionLocks {
    pub async fn acquire(&self, session: &SessionId) -> SessionGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.entry(session.clone()).or_default().clone()
        };
        SessionGuard {
            owner: self,
            session: session.clone(),
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Number of sessions currently locked or waited on.
    pub fn tracked(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn release(&self, session: &SessionId) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // Clones are only taken under this map lock, so a count of one means
        // nobody holds or awaits the mutex.
        if locks.get(session).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(session);
        }
    }
}

/// Holds a session's lock; releasing it prunes the idle entry.
pub struct SessionGuard<'a> {
    owner: &'a SessionLocks,
    session: SessionId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.owner.release(&self.session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_session_is_exclusive() {
        let locks = SessionLocks::default();
        let id = SessionId::from("a");
        let _guard = locks.acquire(&id).await;

        let second = tokio::time::timeout(Duration::from_millis(50), locks.acquire(&id)).await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn different_sessions_do_not_block() {
        let locks = SessionLocks::default();
        let _a = locks.acquire(&SessionId::from("a")).await;
        let b = tokio::time::timeout(
            Duration::from_millis(50),
            locks.acquire(&SessionId::from("b")),
        )
        .await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn idle_sessions_are_forgotten() {
        let locks = SessionLocks::default();
        for i in 0..100 {
            let _guard = locks.acquire(&SessionId::from(format!("s{i}"))).await;
        }
        assert_eq!(locks.tracked(), 0);
    }

    #[tokio::test]
    async fn waiter_keeps_the_entry_alive() {
        let locks = Arc::new(SessionLocks::default());
        let id = SessionId::from("busy");
        let first = locks.acquire(&id).await;

        let waiter = {
            let locks = locks.clone();
            let id = id.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(&id).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(first);
        assert_eq!(locks.tracked(), 1);
        waiter.await.unwrap();
        assert_eq!(locks.tracked(), 0);
    }
}
