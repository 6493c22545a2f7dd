use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Role, User};

/// An established session: the bearer credential plus the user it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

impl Session {
    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn user_id(&self) -> &str {
        &self.user.id
    }
}

/// Resolution state of the initial "who am I" probe.
///
/// Surfaces must treat `Unresolved` as a neutral loading state and take no
/// redirect action until the probe completes, so users do not see a flash
/// of the login page while an existing session is being confirmed.
#[derive(Debug, Clone)]
pub enum SessionState {
    Unresolved,
    Anonymous,
    SignedIn(Session),
}

impl SessionState {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, SessionState::Unresolved)
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::SignedIn(session) => Some(session),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.session().map(Session::role)
    }
}

/// Cached result of the current-user probe.
///
/// `invalidate` drops the snapshot so the next read refetches from the
/// server; this is how role-dependent surfaces pick up authoritative state
/// right after login or verification instead of trusting a stale copy.
#[derive(Debug, Default)]
pub struct CurrentUserCache {
    /// `None` = never fetched or invalidated; `Some(None)` = fetched, signed out.
    resolved: Option<Option<User>>,
    fetched_at: Option<DateTime<Utc>>,
}

impl CurrentUserCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the snapshot; the next read must refetch.
    pub fn invalidate(&mut self) {
        self.resolved = None;
        self.fetched_at = None;
    }

    pub fn needs_fetch(&self) -> bool {
        self.resolved.is_none()
    }

    /// Record a completed probe.
    pub fn note_resolved(&mut self, user: Option<User>) {
        self.resolved = Some(user);
        self.fetched_at = Some(Utc::now());
    }

    pub fn user(&self) -> Option<&User> {
        self.resolved.as_ref().and_then(|inner| inner.as_ref())
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    /// Combine the probe state with the credential into the session state
    /// the route guard consumes. A session exists only when both the
    /// credential and the resolved user are present.
    pub fn state(&self, token: Option<String>) -> SessionState {
        match (&self.resolved, token) {
            (None, _) => SessionState::Unresolved,
            (Some(Some(user)), Some(token)) => SessionState::SignedIn(Session {
                token,
                user: user.clone(),
            }),
            (Some(_), _) => SessionState::Anonymous,
        }
    }
}
