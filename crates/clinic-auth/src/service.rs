//! The session simulation.
//!
//! `AuthService` authenticates against the `users` collection of a `Store`
//! and, after that, against approved users in a `PendingUserStore`. It keeps
//! no session of its own: `get_session` always reports none, and callers
//! hold on to the `SignIn` they were given.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{info, warn};

use clinic_contracts::{
    config::AuthSettings,
    envelope::Envelope,
    error::{ClinicError, ClinicResult},
    record::{normalize_cpf, AccessLevel, ActiveStatus, User},
    table::Table,
};
use clinic_core::Store;

use crate::{
    password::{hash_password, validate_strength, verify_password},
    pending::{
        InMemoryPendingStore, JsonFilePendingStore, PendingStatus, PendingUser, PendingUserStore,
    },
    session::{
        emit, subscribe, AuthEvent, AuthUser, Credentials, Session, SharedListeners, SignIn,
        Subscription, UserMetadata, UserSummary,
    },
};

const TOKEN_TYPE: &str = "bearer";
const DEFAULT_POSITION: &str = "Funcionário";
const LOCAL_EMAIL_DOMAIN: &str = "clinica.local";

/// Details collected by the self-registration form.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub cpf: String,
    pub phone: String,
    pub position: String,
    pub password: String,
}

/// Where a sign-in identifier resolved.
enum Account {
    Fixture(User),
    Registered(PendingUser),
}

pub struct AuthService {
    store: Store,
    pending: Arc<dyn PendingUserStore>,
    settings: AuthSettings,
    listeners: SharedListeners,
    /// Serializes load-modify-save cycles on the pending store.
    pending_guard: Mutex<()>,
}

impl AuthService {
    /// Build a service over `store`. The pending store is the JSON file
    /// named in `settings`, or an in-memory list when none is configured.
    pub fn new(store: &Store, settings: AuthSettings) -> Self {
        let pending: Arc<dyn PendingUserStore> = match &settings.pending_users_path {
            Some(path) => Arc::new(JsonFilePendingStore::new(path)),
            None => Arc::new(InMemoryPendingStore::new()),
        };
        Self::with_pending_store(store, settings, pending)
    }

    pub fn with_pending_store(
        store: &Store,
        settings: AuthSettings,
        pending: Arc<dyn PendingUserStore>,
    ) -> Self {
        Self {
            store: store.system(),
            pending,
            settings,
            listeners: SharedListeners::default(),
            pending_guard: Mutex::new(()),
        }
    }

    // ── Session surface ──────────────────────────────────────────────────────

    /// Authenticate by CPF and password.
    ///
    /// A legacy plaintext password that matches is replaced by a salted hash
    /// before the session is issued.
    pub fn sign_in(&self, credentials: &Credentials) -> Envelope<SignIn> {
        let identifier = normalize_cpf(&credentials.identifier);
        let result = self.authenticate(&identifier, &credentials.password);

        match &result {
            Ok(signed_in) => {
                info!(user_id = %signed_in.user.id, "sign-in succeeded");
                emit(
                    &self.listeners,
                    &AuthEvent::SignedIn {
                        user_id: signed_in.user.id.clone(),
                    },
                );
            }
            Err(e) => warn!(identifier = %identifier, error = %e, "sign-in failed"),
        }
        result.into()
    }

    pub fn sign_out(&self) -> Envelope<()> {
        self.simulate_latency(self.settings.sign_out_latency_ms);
        info!("signed out");
        emit(&self.listeners, &AuthEvent::SignedOut);
        Envelope::empty()
    }

    /// Always `None`: nothing is remembered between calls.
    pub fn get_session(&self) -> Option<Session> {
        None
    }

    /// Register `callback` for every later auth event.
    pub fn on_auth_state_change(
        &self,
        callback: impl Fn(&AuthEvent) + Send + Sync + 'static,
    ) -> Subscription {
        subscribe(&self.listeners, callback)
    }

    /// Replace a user's password after checking its strength. Also clears
    /// the first-access flag.
    pub fn update_password(&self, user_id: &str, new_password: &str) -> Envelope<()> {
        self.simulate_latency(self.settings.update_password_latency_ms);

        let result = validate_strength(new_password)
            .and_then(|()| self.store_password(user_id, &hash_password(new_password)));

        match &result {
            Ok(()) => {
                info!(user_id, "password updated");
                emit(
                    &self.listeners,
                    &AuthEvent::PasswordUpdated {
                        user_id: user_id.to_string(),
                    },
                );
            }
            Err(e) => warn!(user_id, error = %e, "password update failed"),
        }
        result.into()
    }

    // ── Administration ───────────────────────────────────────────────────────

    /// Every account that may sign in: fixture users followed by approved
    /// registrations.
    pub fn list_users(&self) -> ClinicResult<Vec<UserSummary>> {
        let mut users: Vec<UserSummary> = self
            .store
            .snapshot(Table::Users)?
            .iter()
            .filter_map(|r| r.as_user())
            .map(|u| UserSummary {
                id: u.id.clone(),
                name: u.name.clone(),
                cpf: u.cpf.clone(),
                email: u.email.clone(),
                access_level: u.access_level,
                first_access: u.first_access,
                status: ActiveStatus::Active,
                registered: false,
            })
            .collect();

        users.extend(
            self.pending
                .load()?
                .into_iter()
                .filter(PendingUser::is_approved)
                .map(|p| UserSummary {
                    access_level: p.effective_access_level(),
                    id: p.id,
                    name: p.name,
                    cpf: p.cpf,
                    email: Some(p.email),
                    first_access: p.first_access,
                    status: ActiveStatus::Active,
                    registered: true,
                }),
        );
        Ok(users)
    }

    /// Registrations, optionally narrowed to one status.
    pub fn pending_users(&self, status: Option<PendingStatus>) -> ClinicResult<Vec<PendingUser>> {
        Ok(self
            .pending
            .load()?
            .into_iter()
            .filter(|p| status.map_or(true, |s| p.status == s))
            .collect())
    }

    /// Record a self-registration awaiting approval. The CPF must not belong
    /// to a fixture user or to a registration that was not rejected.
    pub fn register(&self, registration: Registration) -> ClinicResult<PendingUser> {
        validate_strength(&registration.password)?;
        let cpf = normalize_cpf(&registration.cpf);
        if self.find_fixture_user(&cpf)?.is_some() {
            return Err(duplicate_cpf(&registration.cpf));
        }

        let user = PendingUser {
            id: uuid::Uuid::new_v4().to_string(),
            name: registration.name,
            email: registration.email,
            cpf: registration.cpf,
            phone: registration.phone,
            position: registration.position,
            status: PendingStatus::Pending,
            access_level: None,
            first_access: false,
            password: None,
            password_hash: Some(hash_password(&registration.password)),
            created_at: Utc::now(),
            updated_at: None,
        };

        let stored = user.clone();
        self.modify_pending(move |users| {
            let taken = users
                .iter()
                .any(|p| p.status != PendingStatus::Rejected && normalize_cpf(&p.cpf) == cpf);
            if taken {
                return Err(duplicate_cpf(&stored.cpf));
            }
            users.push(stored);
            Ok(())
        })?;

        info!(pending_id = %user.id, "registration recorded");
        Ok(user)
    }

    pub fn approve(&self, pending_id: &str, level: AccessLevel) -> ClinicResult<PendingUser> {
        let approved = self.set_pending_status(pending_id, PendingStatus::Approved, Some(level))?;
        info!(pending_id, access_level = level.as_str(), "registration approved");
        Ok(approved)
    }

    pub fn reject(&self, pending_id: &str) -> ClinicResult<PendingUser> {
        let rejected = self.set_pending_status(pending_id, PendingStatus::Rejected, None)?;
        info!(pending_id, "registration rejected");
        Ok(rejected)
    }

    // ── Internals ────────────────────────────────────────────────────────────

    fn authenticate(&self, identifier: &str, password: &str) -> ClinicResult<SignIn> {
        let account = match self.find_fixture_user(identifier)? {
            Some(user) => Account::Fixture(user),
            None => self
                .find_approved_registration(identifier)?
                .map(Account::Registered)
                .ok_or(ClinicError::UserNotFound)?,
        };

        let (stored, user_id) = match &account {
            Account::Fixture(u) => (u.password_hash.as_ref().or(u.password.as_ref()), &u.id),
            Account::Registered(p) => (p.password_hash.as_ref().or(p.password.as_ref()), &p.id),
        };
        let check = stored
            .map(|s| verify_password(password, s))
            .filter(|c| c.valid)
            .ok_or(ClinicError::IncorrectPassword)?;

        if check.needs_migration {
            self.store_legacy_migration(&account, &hash_password(password))?;
            info!(user_id = %user_id, "plaintext password migrated to hash");
        }

        let user = auth_user(&account);
        Ok(SignIn {
            session: self.issue_session(&user)?,
            user,
        })
    }

    fn find_fixture_user(&self, cpf: &str) -> ClinicResult<Option<User>> {
        Ok(self
            .store
            .snapshot(Table::Users)?
            .iter()
            .filter_map(|r| r.as_user())
            .find(|u| normalize_cpf(&u.cpf) == cpf)
            .cloned())
    }

    fn find_fixture_user_by_id(&self, id: &str) -> ClinicResult<Option<User>> {
        Ok(self
            .store
            .snapshot(Table::Users)?
            .iter()
            .filter_map(|r| r.as_user())
            .find(|u| u.id == id)
            .cloned())
    }

    fn find_approved_registration(&self, cpf: &str) -> ClinicResult<Option<PendingUser>> {
        Ok(self
            .pending
            .load()?
            .into_iter()
            .find(|p| p.is_approved() && normalize_cpf(&p.cpf) == cpf))
    }

    fn store_legacy_migration(&self, account: &Account, hash: &str) -> ClinicResult<()> {
        match account {
            Account::Fixture(user) => self
                .store
                .from(Table::Users)
                .update(json!({ "password": Value::Null, "password_hash": hash }))
                .eq("id", user.id.as_str())
                .into_result()
                .map(|_| ())
                .map_err(|e| ClinicError::Internal { reason: e.message }),
            Account::Registered(pending) => {
                let id = pending.id.clone();
                let hash = hash.to_string();
                self.modify_pending(move |users| {
                    if let Some(p) = users.iter_mut().find(|p| p.id == id) {
                        p.password = None;
                        p.password_hash = Some(hash);
                    }
                    Ok(())
                })
            }
        }
    }

    /// Write `hash` to the user with `user_id`, looking in the users
    /// collection first and the pending store second.
    fn store_password(&self, user_id: &str, hash: &str) -> ClinicResult<()> {
        if self.find_fixture_user_by_id(user_id)?.is_some() {
            return self
                .store
                .from(Table::Users)
                .update(json!({
                    "password": Value::Null,
                    "password_hash": hash,
                    "first_access": false,
                }))
                .eq("id", user_id)
                .into_result()
                .map(|_| ())
                .map_err(|e| ClinicError::Internal { reason: e.message });
        }

        let id = user_id.to_string();
        let hash = hash.to_string();
        self.modify_pending(move |users| {
            let user = users
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or(ClinicError::UserNotFound)?;
            user.password = None;
            user.password_hash = Some(hash);
            user.first_access = false;
            user.updated_at = Some(Utc::now());
            Ok(())
        })
    }

    fn set_pending_status(
        &self,
        pending_id: &str,
        status: PendingStatus,
        level: Option<AccessLevel>,
    ) -> ClinicResult<PendingUser> {
        let mut changed = None;
        self.modify_pending(|users| {
            let user = users
                .iter_mut()
                .find(|p| p.id == pending_id)
                .ok_or(ClinicError::NotFound)?;
            user.status = status;
            if level.is_some() {
                user.access_level = level;
            }
            user.updated_at = Some(Utc::now());
            changed = Some(user.clone());
            Ok(())
        })?;
        changed.ok_or(ClinicError::NotFound)
    }

    fn modify_pending(
        &self,
        apply: impl FnOnce(&mut Vec<PendingUser>) -> ClinicResult<()>,
    ) -> ClinicResult<()> {
        let _guard = self.pending_guard.lock().map_err(|e| ClinicError::Internal {
            reason: format!("pending guard poisoned: {}", e),
        })?;
        let mut users = self.pending.load()?;
        apply(&mut users)?;
        self.pending.save(&users)
    }

    /// Fails with `ConfigError` when the configured lifetime does not fit a
    /// timestamp.
    fn issue_session(&self, user: &AuthUser) -> ClinicResult<Session> {
        let ttl = self.settings.token_ttl_secs;
        let expires_at = i64::try_from(ttl)
            .ok()
            .and_then(chrono::TimeDelta::try_seconds)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| ClinicError::ConfigError {
                reason: format!("auth.token_ttl_secs = {} is out of range", ttl),
            })?;

        Ok(Session {
            access_token: format!("local-{}", uuid::Uuid::new_v4().simple()),
            refresh_token: format!("local-refresh-{}", uuid::Uuid::new_v4().simple()),
            expires_in: ttl,
            expires_at,
            token_type: TOKEN_TYPE.to_string(),
            user: user.clone(),
        })
    }

    fn simulate_latency(&self, millis: u64) {
        if millis > 0 {
            thread::sleep(Duration::from_millis(millis));
        }
    }
}

fn auth_user(account: &Account) -> AuthUser {
    match account {
        Account::Fixture(u) => AuthUser {
            id: u.id.clone(),
            email: u
                .email
                .clone()
                .unwrap_or_else(|| format!("{}@{}", u.cpf, LOCAL_EMAIL_DOMAIN)),
            cpf: u.cpf.clone(),
            must_change_password: u.first_access,
            metadata: UserMetadata {
                name: u.name.clone(),
                cpf: u.cpf.clone(),
                access_level: u.access_level,
                first_access: u.first_access,
                phone: String::new(),
                position: DEFAULT_POSITION.to_string(),
                status: ActiveStatus::Active,
            },
        },
        Account::Registered(p) => AuthUser {
            id: p.id.clone(),
            email: p.email.clone(),
            cpf: p.cpf.clone(),
            must_change_password: p.first_access,
            metadata: UserMetadata {
                name: p.name.clone(),
                cpf: p.cpf.clone(),
                access_level: p.effective_access_level(),
                first_access: p.first_access,
                phone: p.phone.clone(),
                position: p.position.clone(),
                status: ActiveStatus::Active,
            },
        },
    }
}

fn duplicate_cpf(cpf: &str) -> ClinicError {
    ClinicError::DuplicateId {
        table: "pending_users".to_string(),
        id: cpf.to_string(),
    }
}
