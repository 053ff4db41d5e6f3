//! Session registry: maps session ids to live conversation memories.
//!
//! The map itself sits behind an `RwLock` that is only held for lookups,
//! inserts and removals. Each session guards its memory with its own async
//! mutex; a turn holds that mutex for its whole duration so turns on one
//! session are serialized while other sessions proceed independently.
//!
//! A session is removed (ended, discarded, evicted) only by someone holding
//! its mutex, and the remover marks it closed before letting go. A request
//! that was waiting on the mutex checks the flag and re-resolves.

use chrono::{DateTime, TimeZone, Utc};
use docent_core::error::SessionError;
use docent_core::memory::ConversationMemory;
use docent_core::message::SessionId;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const PREVIEW_MAX_CHARS: usize = 100;

/// One registered conversation.
pub struct Session {
    id: SessionId,
    memory: Mutex<ConversationMemory>,
    closed: AtomicBool,
    created_at: DateTime<Utc>,
    last_active_ms: AtomicI64,
}

impl Session {
    fn new(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            memory: Mutex::new(ConversationMemory::new()),
            closed: AtomicBool::new(false),
            created_at: now,
            last_active_ms: AtomicI64::new(now.timestamp_millis()),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Wait for exclusive access to the memory.
    ///
    /// Check [`is_closed`](Self::is_closed) after acquiring: the session
    /// may have ended while this caller was queued.
    pub async fn lock(&self) -> MutexGuard<'_, ConversationMemory> {
        self.memory.lock().await
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn touch(&self) {
        self.touch_at(Utc::now());
    }

    fn touch_at(&self, at: DateTime<Utc>) {
        self.last_active_ms
            .fetch_max(at.timestamp_millis(), Ordering::AcqRel);
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.last_active_ms.load(Ordering::Acquire))
            .single()
            .unwrap_or(self.created_at)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

/// Listing entry for an active session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    /// First question, truncated
    pub title: Option<String>,
    /// Latest answer, truncated
    pub preview: Option<String>,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    idle_timeout: Option<Duration>,
    max_sessions: usize,
}

impl SessionRegistry {
    /// An unbounded registry with no idle expiry.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout: None,
            max_sessions: usize::MAX,
        }
    }

    pub fn from_config(config: &docent_config::SessionConfig) -> Self {
        let idle_timeout = match config.idle_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Self::new()
            .with_idle_timeout(idle_timeout)
            .with_max_sessions(config.max_sessions)
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions.max(1);
        self
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout
    }

    /// Look up `id`, or create a fresh session when it is absent or unknown.
    pub async fn resolve(&self, id: Option<&str>) -> (SessionId, Arc<Session>) {
        if let Some(id) = id {
            if let Some(session) = self.get(id).await {
                session.touch();
                return (session.id().clone(), session);
            }
            debug!(requested = id, "Unknown session id, creating a new session");
        }
        self.create().await
    }

    /// Register a new empty session.
    pub async fn create(&self) -> (SessionId, Arc<Session>) {
        let mut sessions = self.sessions.write().await;

        if sessions.len() >= self.max_sessions {
            evict_least_recent(&mut sessions);
        }

        let mut id = SessionId::new();
        while sessions.contains_key(id.as_str()) {
            id = SessionId::new();
        }

        let session = Arc::new(Session::new(id.clone()));
        sessions.insert(id.to_string(), Arc::clone(&session));
        info!(session_id = %id, active = sessions.len(), "Session created");

        (id, session)
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.sessions.read().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Remove the session and hand back its memory.
    ///
    /// Waits for an in-flight turn on the same session to finish first.
    pub async fn end(&self, id: &str) -> Result<ConversationMemory, SessionError> {
        let session = self
            .get(id)
            .await
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        let mut memory = session.lock().await;
        self.remove_locked(&session, &mut memory).await
    }

    /// Remove a session whose mutex the caller already holds.
    pub async fn remove_locked(
        &self,
        session: &Arc<Session>,
        memory: &mut ConversationMemory,
    ) -> Result<ConversationMemory, SessionError> {
        let id = session.id().as_str();
        if session.is_closed() {
            return Err(SessionError::NotFound(id.to_string()));
        }

        let mut sessions = self.sessions.write().await;
        let registered = sessions
            .get(id)
            .is_some_and(|current| Arc::ptr_eq(current, session));
        if !registered {
            return Err(SessionError::NotFound(id.to_string()));
        }
        sessions.remove(id);
        session.close();

        info!(session_id = %id, turns = memory.len(), "Session ended");
        Ok(std::mem::take(memory))
    }

    /// Snapshot of every active session, most recently active first.
    pub async fn summaries(&self) -> Vec<SessionSummary> {
        let sessions: Vec<Arc<Session>> = self.sessions.read().await.values().cloned().collect();

        let mut summaries: Vec<SessionSummary> =
            futures::future::join_all(sessions.iter().map(|session| async move {
                let memory = session.lock().await;
                if session.is_closed() {
                    return None;
                }
                Some(SessionSummary {
                    session_id: session.id().clone(),
                    title: memory.title(),
                    preview: memory
                        .last_answer()
                        .map(|a| a.chars().take(PREVIEW_MAX_CHARS).collect()),
                    message_count: memory.len(),
                    created_at: session.created_at(),
                    last_active: session.last_active(),
                })
            }))
            .await
            .into_iter()
            .flatten()
            .collect();

        summaries.sort_by(|a, b| b.last_active.cmp(&a.last_active));
        summaries
    }

    /// Remove sessions idle for longer than the idle timeout.
    ///
    /// Sessions with a turn in flight are skipped. Returns how many were removed.
    pub async fn evict_idle(&self, now: DateTime<Utc>) -> usize {
        let Some(timeout) = self.idle_timeout else {
            return 0;
        };

        let mut sessions = self.sessions.write().await;
        let expired: Vec<Arc<Session>> = sessions
            .values()
            .filter(|s| idle_longer_than(s, now, timeout))
            .cloned()
            .collect();

        let mut evicted = 0;
        for session in expired {
            let Ok(_memory) = session.memory.try_lock() else {
                continue;
            };
            session.close();
            sessions.remove(session.id().as_str());
            evicted += 1;
            debug!(session_id = %session.id(), "Idle session evicted");
        }

        if evicted > 0 {
            info!(evicted, active = sessions.len(), "Idle sessions reaped");
        }
        evicted
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn idle_longer_than(session: &Session, now: DateTime<Utc>, timeout: Duration) -> bool {
    (now - session.last_active())
        .to_std()
        .is_ok_and(|idle| idle > timeout)
}

/// Drop the least recently active session that is not mid-turn.
fn evict_least_recent(sessions: &mut HashMap<String, Arc<Session>>) {
    let mut candidates: Vec<Arc<Session>> = sessions.values().cloned().collect();
    candidates.sort_by_key(|s| s.last_active_ms.load(Ordering::Acquire));

    for session in candidates {
        let Ok(_memory) = session.memory.try_lock() else {
            continue;
        };
        session.close();
        sessions.remove(session.id().as_str());
        warn!(session_id = %session.id(), "Session capacity reached, evicted least recently active session");
        return;
    }

    warn!(active = sessions.len(), "Session capacity reached but every session is busy");
}

/// Run [`SessionRegistry::evict_idle`] every `every`.
///
/// Returns `None` when the registry has no idle timeout.
pub fn spawn_reaper(registry: Arc<SessionRegistry>, every: Duration) -> Option<JoinHandle<()>> {
    registry.idle_timeout()?;

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            registry.evict_idle(Utc::now()).await;
        }
    }))
}
