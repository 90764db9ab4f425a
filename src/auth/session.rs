//! In-memory login sessions

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::AuthConfig;

#[derive(Debug, Clone, Copy)]
struct Session {
    created_at: Instant,
}

impl Session {
    fn is_expired(&self, lifetime: Duration) -> bool {
        self.created_at.elapsed() >= lifetime
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub total_sessions: usize,
    pub expired_sessions: usize,
}

/// Authenticated sessions keyed by the id carried in the session cookie
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
    lifetime: Duration,
    sweep_probability: f64,
}

impl SessionStore {
    pub fn new(lifetime: Duration, sweep_probability: f64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            lifetime,
            sweep_probability,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.session_lifetime(), config.sweep_probability)
    }

    /// Start a new authenticated session
    pub async fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions.write().await.insert(
            id,
            Session {
                created_at: Instant::now(),
            },
        );
        tracing::debug!("Session {} created", id);
        id
    }

    /// Whether the session exists and is younger than the lifetime.
    /// An expired session is dropped on the spot.
    pub async fn is_active(&self, id: &Uuid) -> bool {
        let expired = match self.sessions.read().await.get(id) {
            None => return false,
            Some(session) => session.is_expired(self.lifetime),
        };

        if expired {
            self.sessions.write().await.remove(id);
            tracing::debug!("Session {} expired", id);
        }
        !expired
    }

    /// End a session; returns whether it existed
    pub async fn remove(&self, id: &Uuid) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Drop every expired session, returning how many were removed
    pub async fn sweep_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(self.lifetime));
        let removed = before - sessions.len();

        if removed > 0 {
            tracing::info!("Removed {} expired sessions", removed);
        }
        removed
    }

    /// Sweep with the configured probability
    pub async fn maybe_sweep(&self) -> Option<usize> {
        if rand::random::<f64>() < self.sweep_probability {
            Some(self.sweep_expired().await)
        } else {
            None
        }
    }

    pub async fn stats(&self) -> SessionStats {
        let sessions = self.sessions.read().await;
        SessionStats {
            total_sessions: sessions.len(),
            expired_sessions: sessions
                .values()
                .filter(|s| s.is_expired(self.lifetime))
                .count(),
        }
    }

    /// Sweep expired sessions on a fixed interval until the runtime shuts down
    pub fn spawn_cleanup_task(&self, interval: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let removed = store.sweep_expired().await;
                tracing::debug!("Periodic session sweep removed {}", removed);
            }
        })
    }
}
