use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

use crate::entity::FilamentDraft;

pub const SESSION_COOKIE: &str = "spooldex_session";

/// Which admin form is shown while admin mode is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdminAction {
    #[default]
    Add,
    Edit,
}

impl std::str::FromStr for AdminAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "add" => Ok(AdminAction::Add),
            "edit" => Ok(AdminAction::Edit),
            _ => Err(format!("Invalid admin action: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Error,
}

/// One-shot message shown on the next render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }
}

/// Per-browser-session UI state. Starts logged out with admin mode hidden.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub authenticated: bool,
    pub admin_visible: bool,
    pub admin_action: AdminAction,
    /// Position selected in the edit selector
    pub edit_index: usize,
    pub flash: Option<Flash>,
    /// Add-form input kept after a rejected submit
    pub pending_draft: Option<FilamentDraft>,
}

/// Upper bound on stored sessions; the least recently seen is evicted first.
pub const MAX_SESSIONS: usize = 10_000;

type SessionCell = Arc<Mutex<SessionState>>;

struct SessionEntry {
    cell: SessionCell,
    last_seen: DateTime<Utc>,
}

/// Exclusive access to one session for the length of a request.
///
/// Requests carrying the same cookie queue up behind each other, so a
/// render that consumes a flash cannot race a mutation that sets one.
pub struct SessionGuard {
    id: Uuid,
    cell: SessionCell,
    state: OwnedMutexGuard<SessionState>,
}

impl SessionGuard {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Deref for SessionGuard {
    type Target = SessionState;

    fn deref(&self) -> &SessionState {
        &self.state
    }
}

impl DerefMut for SessionGuard {
    fn deref_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }
}

/// In-memory session table keyed by the session cookie.
///
/// Only sessions that differ from [`SessionState::default`] are kept, so
/// anonymous traffic never grows the table.
pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, SessionEntry>>,
    idle: Duration,
    capacity: usize,
}

impl SessionStore {
    pub fn new(idle: Duration) -> Self {
        Self::with_capacity(idle, MAX_SESSIONS)
    }

    pub fn with_capacity(idle: Duration, capacity: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle,
            capacity: capacity.max(1),
        }
    }

    /// Lock the session for `id`, starting a fresh one when it is unknown
    /// or has been idle too long. Waits while another request holds it.
    pub async fn load(&self, id: Option<Uuid>) -> SessionGuard {
        self.load_at(id, Utc::now()).await
    }

    async fn load_at(&self, id: Option<Uuid>, now: DateTime<Utc>) -> SessionGuard {
        let (id, cell) = {
            let mut sessions = self.sessions.lock().await;
            let idle = self.idle;
            sessions.retain(|_, entry| now - entry.last_seen <= idle);

            let known = id.and_then(|id| {
                sessions.get_mut(&id).map(|entry| {
                    entry.last_seen = now;
                    (id, Arc::clone(&entry.cell))
                })
            });
            match known {
                Some(found) => found,
                None => {
                    let id = Uuid::new_v4();
                    debug!(session = %id, "starting new session");
                    (id, SessionCell::default())
                }
            }
        };

        // The table lock is released before waiting on the session itself.
        let state = Arc::clone(&cell).lock_owned().await;
        SessionGuard { id, cell, state }
    }

    /// Write the session back and release it.
    ///
    /// Returns whether the session is stored, i.e. whether the browser needs
    /// a cookie for it.
    pub async fn save(&self, session: SessionGuard) -> bool {
        let SessionGuard { id, cell, state } = session;
        let keep = *state != SessionState::default();

        let mut sessions = self.sessions.lock().await;
        if !keep {
            sessions.remove(&id);
            return false;
        }

        let now = Utc::now();
        if !sessions.contains_key(&id) && sessions.len() >= self.capacity {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| *id);
            if let Some(oldest) = oldest {
                debug!(session = %oldest, "evicting least recently seen session");
                sessions.remove(&oldest);
            }
        }
        sessions.insert(
            id,
            SessionEntry {
                cell,
                last_seen: now,
            },
        );
        true
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

/// Pull the session id out of the request's `Cookie` headers.
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// `Set-Cookie` value binding the browser to session `id`.
pub fn session_cookie(id: Uuid) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id)
}
