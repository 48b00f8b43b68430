//! Per-session conversation state and the store that owns it.
//!
//! Sessions are created lazily, serialized per session id through their own
//! mutex, and evicted after a configurable idle period (the store sweeps
//! lazily on access; a TTL of zero disables eviction).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::intent::{Intent, RepairContext};
use super::order::{OrderPreview, OrderSummary};
use crate::services::search::ServiceItem;

/// Conversation state machine phase.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversationPhase {
    Greeting,
    Searching,
    Selecting,
    ManualAddition,
    Confirming,
    Completed,
}

impl ConversationPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationPhase::Greeting => "greeting",
            ConversationPhase::Searching => "searching",
            ConversationPhase::Selecting => "selecting",
            ConversationPhase::ManualAddition => "manual_addition",
            ConversationPhase::Confirming => "confirming",
            ConversationPhase::Completed => "completed",
        }
    }
}

/// One user turn in the append-only conversation log.
#[derive(Debug, Clone, Serialize)]
pub struct TurnRecord {
    pub content: String,
    pub intent: Intent,
    pub context: RepairContext,
}

#[derive(Debug)]
pub struct SessionState {
    pub user_name: Option<String>,
    pub phase: ConversationPhase,
    pub context: RepairContext,
    pub suggested_services: Vec<ServiceItem>,
    pub selected_services: Vec<ServiceItem>,
    pub pending_order: Option<OrderPreview>,
    pub completed_order: Option<OrderSummary>,
    pub current_query: Option<String>,
    pub history: Vec<TurnRecord>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            user_name: None,
            phase: ConversationPhase::Greeting,
            context: RepairContext::default(),
            suggested_services: Vec::new(),
            selected_services: Vec::new(),
            pending_order: None,
            completed_order: None,
            current_query: None,
            history: Vec::new(),
        }
    }

    /// Drop everything a cancel should forget. The history log is append-only
    /// and survives.
    pub fn clear_transient(&mut self) {
        self.context = RepairContext::default();
        self.suggested_services.clear();
        self.selected_services.clear();
        self.pending_order = None;
        self.completed_order = None;
        self.current_query = None;
    }
}

/// Read-only projection of a session for inspection endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct SessionOverview {
    pub conversation_state: ConversationPhase,
    pub suggested_services: usize,
    pub selected_services: usize,
    pub has_pending_order: bool,
    pub turns: usize,
}

struct SessionEntry {
    state: Arc<Mutex<SessionState>>,
    last_active: Instant,
}

pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionEntry>>,
    idle_ttl: Duration,
}

impl SessionStore {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_ttl,
        }
    }

    /// Fetch the session for `session_id`, creating it on first contact.
    /// Callers hold the returned mutex for the whole turn, which serializes
    /// concurrent requests on the same session.
    pub async fn get_or_create(&self, session_id: &str) -> Arc<Mutex<SessionState>> {
        let mut sessions = self.sessions.lock().await;
        self.evict_expired(&mut sessions);

        let entry = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionEntry {
                state: Arc::new(Mutex::new(SessionState::new())),
                last_active: Instant::now(),
            });
        entry.last_active = Instant::now();
        entry.state.clone()
    }

    pub async fn overview(&self, session_id: &str) -> Option<SessionOverview> {
        let state = {
            let sessions = self.sessions.lock().await;
            sessions.get(session_id)?.state.clone()
        };
        let session = state.lock().await;
        Some(SessionOverview {
            conversation_state: session.phase,
            suggested_services: session.suggested_services.len(),
            selected_services: session.selected_services.len(),
            has_pending_order: session.pending_order.is_some(),
            turns: session.history.len(),
        })
    }

    /// Remove a session entirely. Returns whether one existed.
    pub async fn reset(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.lock().await;
        sessions.remove(session_id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    fn evict_expired(&self, sessions: &mut HashMap<String, SessionEntry>) {
        if self.idle_ttl.is_zero() {
            return;
        }
        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_active) < self.idle_ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, "evicted idle sessions");
        }
    }
}
