//! Session types and auth state notifications.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, Weak};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clinic_contracts::record::{AccessLevel, ActiveStatus};

/// What the caller typed on the sign-in form. `identifier` is a CPF in any
/// punctuation.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub identifier: String,
    pub password: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMetadata {
    pub name: String,
    pub cpf: String,
    pub access_level: AccessLevel,
    pub first_access: bool,
    pub phone: String,
    pub position: String,
    pub status: ActiveStatus,
}

/// The signed-in user as reported to the caller. Carries no password
/// material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub cpf: String,
    pub must_change_password: bool,
    pub metadata: UserMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub expires_at: DateTime<Utc>,
    pub token_type: String,
    pub user: AuthUser,
}

/// Successful sign-in payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignIn {
    pub user: AuthUser,
    pub session: Session,
}

/// A user as listed for administration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub cpf: String,
    pub email: Option<String>,
    pub access_level: AccessLevel,
    pub first_access: bool,
    pub status: ActiveStatus,
    /// True for accounts that came from self-registration.
    pub registered: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    SignedIn { user_id: String },
    SignedOut,
    PasswordUpdated { user_id: String },
}

impl AuthEvent {
    /// The state a listener should assume after this event.
    pub fn state(&self) -> AuthState {
        match self {
            AuthEvent::SignedOut => AuthState::Unauthenticated,
            AuthEvent::SignedIn { .. } | AuthEvent::PasswordUpdated { .. } => {
                AuthState::Authenticated
            }
        }
    }
}

// ── Listener registry ─────────────────────────────────────────────────────────

type Listener = Arc<dyn Fn(&AuthEvent) + Send + Sync>;

#[derive(Default)]
pub(crate) struct Listeners {
    next_id: u64,
    callbacks: BTreeMap<u64, Listener>,
}

pub(crate) type SharedListeners = Arc<Mutex<Listeners>>;

pub(crate) fn subscribe(
    listeners: &SharedListeners,
    callback: impl Fn(&AuthEvent) + Send + Sync + 'static,
) -> Subscription {
    let id = match listeners.lock() {
        Ok(mut guard) => {
            let id = guard.next_id;
            guard.next_id += 1;
            guard.callbacks.insert(id, Arc::new(callback));
            id
        }
        Err(_) => u64::MAX,
    };
    Subscription {
        id,
        listeners: Arc::downgrade(listeners),
    }
}

/// Call every listener in registration order. Callbacks run outside the
/// registry lock so they may subscribe or unsubscribe.
pub(crate) fn emit(listeners: &SharedListeners, event: &AuthEvent) {
    let callbacks: Vec<Listener> = match listeners.lock() {
        Ok(guard) => guard.callbacks.values().cloned().collect(),
        Err(_) => return,
    };
    for callback in callbacks {
        callback(event);
    }
}

/// Handle returned by `on_auth_state_change`. Dropping it keeps the
/// listener registered; call `unsubscribe` to remove it.
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(listeners) = self.listeners.upgrade() {
            if let Ok(mut guard) = listeners.lock() {
                guard.callbacks.remove(&self.id);
            }
        }
    }
}
