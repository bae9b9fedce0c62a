//! Per-session storage of uploaded tables.
//!
//! Each upload gets its own random id and an `Arc<SensorTable>` that is
//! never mutated, so concurrent requests on one session only ever share
//! read-only data. Sessions are held in memory only: they expire after an
//! idle TTL and the oldest is evicted once the store is full.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::SensorTable;

// ---

struct Session {
    table: Arc<SensorTable>,
    /// Insertion order, used for eviction.
    seq: u64,
    last_access: Instant,
}

pub struct SessionStore {
    // ---
    sessions: RwLock<HashMap<Uuid, Session>>,
    next_seq: AtomicU64,
    max_sessions: usize,
    ttl: Duration,
}

impl SessionStore {
    // ---
    pub fn new(max_sessions: usize, ttl: Duration) -> Self {
        SessionStore {
            sessions: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            max_sessions: max_sessions.max(1),
            ttl,
        }
    }

    /// Store `table` under a fresh id, purging expired sessions first.
    pub async fn insert(&self, table: SensorTable) -> Uuid {
        // ---
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();

        let before = sessions.len();
        sessions.retain(|_, s| now.duration_since(s.last_access) < self.ttl);
        if sessions.len() < before {
            debug!("Purged {} expired sessions", before - sessions.len());
        }

        while sessions.len() >= self.max_sessions {
            let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, s)| s.seq)
                .map(|(id, _)| *id)
            else {
                break;
            };
            sessions.remove(&oldest);
            info!("Session store full, evicted {}", oldest);
        }

        let id = Uuid::new_v4();
        sessions.insert(
            id,
            Session {
                table: Arc::new(table),
                seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                last_access: now,
            },
        );
        id
    }

    /// Table of a live session; refreshes its idle timer.
    pub async fn get(&self, id: &Uuid) -> Option<Arc<SensorTable>> {
        // ---
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();

        let session = sessions.get_mut(id)?;
        if now.duration_since(session.last_access) < self.ttl {
            session.last_access = now;
            return Some(Arc::clone(&session.table));
        }

        sessions.remove(id);
        debug!("Session {} expired", id);
        None
    }

    /// Drop a session. Returns `false` if it did not exist.
    pub async fn remove(&self, id: &Uuid) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
