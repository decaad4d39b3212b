//! Self-registered users awaiting approval.
//!
//! Pending users live outside the store's collections. They are kept as a
//! plain JSON array behind the `PendingUserStore` trait, either in memory
//! or in a file on disk. Only `Approved` entries may sign in.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clinic_contracts::{
    error::{ClinicError, ClinicResult},
    record::AccessLevel,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingStatus {
    Pending,
    Approved,
    Rejected,
}

/// A self-registered account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub cpf: String,
    #[serde(default)]
    pub phone: String,
    /// Job title given at registration.
    #[serde(default)]
    pub position: String,
    pub status: PendingStatus,
    /// Set on approval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_level: Option<AccessLevel>,
    #[serde(default)]
    pub first_access: bool,
    /// Legacy plaintext password, cleared on first successful sign-in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PendingUser {
    pub fn is_approved(&self) -> bool {
        self.status == PendingStatus::Approved
    }

    /// Approved users without an explicit level sign in as reception staff.
    pub fn effective_access_level(&self) -> AccessLevel {
        self.access_level.unwrap_or(AccessLevel::Reception)
    }
}

/// Durable storage for pending users. The whole list is read and written
/// at once.
pub trait PendingUserStore: Send + Sync {
    fn load(&self) -> ClinicResult<Vec<PendingUser>>;

    fn save(&self, users: &[PendingUser]) -> ClinicResult<()>;
}

// ── In-memory ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct InMemoryPendingStore {
    users: Mutex<Vec<PendingUser>>,
}

impl InMemoryPendingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: Vec<PendingUser>) -> Self {
        Self {
            users: Mutex::new(users),
        }
    }
}

impl PendingUserStore for InMemoryPendingStore {
    fn load(&self) -> ClinicResult<Vec<PendingUser>> {
        self.users
            .lock()
            .map(|users| users.clone())
            .map_err(|e| storage(format!("pending store lock poisoned: {}", e)))
    }

    fn save(&self, users: &[PendingUser]) -> ClinicResult<()> {
        let mut guard = self
            .users
            .lock()
            .map_err(|e| storage(format!("pending store lock poisoned: {}", e)))?;
        *guard = users.to_vec();
        Ok(())
    }
}

// ── JSON file ─────────────────────────────────────────────────────────────────

/// Pending users kept as a pretty-printed JSON array in one file.
///
/// A missing file reads as an empty list; it is created on first save.
#[derive(Debug, Clone)]
pub struct JsonFilePendingStore {
    path: PathBuf,
}

impl JsonFilePendingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PendingUserStore for JsonFilePendingStore {
    fn load(&self) -> ClinicResult<Vec<PendingUser>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path).map_err(|e| {
            storage(format!("failed to read '{}': {}", self.path.display(), e))
        })?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw).map_err(|e| {
            storage(format!("failed to parse '{}': {}", self.path.display(), e))
        })
    }

    fn save(&self, users: &[PendingUser]) -> ClinicResult<()> {
        let json = serde_json::to_string_pretty(users)
            .map_err(|e| storage(format!("failed to encode pending users: {}", e)))?;
        fs::write(&self.path, json).map_err(|e| {
            storage(format!("failed to write '{}': {}", self.path.display(), e))
        })
    }
}

fn storage(reason: String) -> ClinicError {
    ClinicError::StorageError { reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(id: &str, status: PendingStatus) -> PendingUser {
        PendingUser {
            id: id.to_string(),
            name: "Beatriz Souza".to_string(),
            email: "beatriz@clinica.com".to_string(),
            cpf: "321.654.987-00".to_string(),
            phone: "(11) 91234-5678".to_string(),
            position: "Recepcionista".to_string(),
            status,
            access_level: None,
            first_access: false,
            password: Some("Bia123".to_string()),
            password_hash: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{}-{}.json", name, uuid::Uuid::new_v4()))
    }

    #[test]
    fn approved_without_level_defaults_to_reception() {
        let user = pending("p1", PendingStatus::Approved);
        assert!(user.is_approved());
        assert_eq!(user.effective_access_level(), AccessLevel::Reception);
    }

    #[test]
    fn in_memory_store_replaces_on_save() {
        let store = InMemoryPendingStore::with_users(vec![pending("p1", PendingStatus::Pending)]);
        assert_eq!(store.load().unwrap().len(), 1);

        store
            .save(&[
                pending("p1", PendingStatus::Approved),
                pending("p2", PendingStatus::Pending),
            ])
            .unwrap();
        let users = store.load().unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].status, PendingStatus::Approved);
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let store = JsonFilePendingStore::new(temp_path("pending-missing"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn file_store_survives_a_new_handle() {
        let path = temp_path("pending-roundtrip");
        let users = vec![
            pending("p1", PendingStatus::Approved),
            pending("p2", PendingStatus::Rejected),
        ];
        JsonFilePendingStore::new(&path).save(&users).unwrap();

        let reloaded = JsonFilePendingStore::new(&path).load().unwrap();
        assert_eq!(reloaded, users);

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.trim_start().starts_with('['));
        assert!(raw.contains("\"approved\""));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn corrupt_file_is_a_storage_error() {
        let path = temp_path("pending-corrupt");
        fs::write(&path, "{ not json").unwrap();

        let err = JsonFilePendingStore::new(&path).load().unwrap_err();
        assert!(matches!(err, ClinicError::StorageError { .. }), "{:?}", err);
        fs::remove_file(&path).unwrap();
    }
}
