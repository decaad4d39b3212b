//! The in-memory store.
//!
//! `Store` is a cheap-to-clone handle over the collections of all five
//! tables. Every clone sees the same collections: a mutation made through
//! one handle is visible to the next query made through any other. All state
//! sits behind one `Mutex`, and each terminal query operation takes the lock
//! exactly once, so operations apply in call order.
//!
//! A store is created empty and seeded explicitly, so tests build a fresh
//! instance each time instead of sharing process-wide arrays.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use clinic_contracts::{
    config::IdStrategy,
    error::{ClinicError, ClinicResult},
    policy::{AccessAction, AccessContext, AccessVerdict},
    record::Record,
    table::Table,
};

use crate::{
    filter::{FilterKey, FilterOp, FilterSet},
    query::Query,
    traits::AccessPolicy,
};

/// Role reported to the access policy when a handle has no role bound.
pub const ANONYMOUS_ROLE: &str = "anonymous";

// ── Internal mutable state ────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub(crate) struct Collection {
    pub(crate) rows: Vec<Record>,
    /// Next value the sequential strategy hands out.
    next_id: u64,
}

impl Collection {
    fn contains(&self, id: &str) -> bool {
        self.rows.iter().any(|r| r.id() == id)
    }

    /// Keep the counter ahead of every numeric id seen so far.
    fn observe(&mut self, id: &str) {
        if let Ok(n) = id.parse::<u64>() {
            self.next_id = self.next_id.max(n.saturating_add(1));
        }
    }

    fn allocate(&mut self, strategy: IdStrategy) -> String {
        loop {
            let candidate = match strategy {
                IdStrategy::Sequential => {
                    let n = self.next_id.max(1);
                    self.next_id = n + 1;
                    n.to_string()
                }
                IdStrategy::Uuid => uuid::Uuid::new_v4().to_string(),
            };
            if !self.contains(&candidate) {
                return candidate;
            }
        }
    }

    /// Index of the first row (scan order) whose `column` equals `value`.
    fn position(&self, column: &str, value: &Value) -> Option<usize> {
        let mut probe = FilterSet::new();
        probe.register(FilterKey::new(column, FilterOp::Eq), value.clone());
        self.rows.iter().position(|r| probe.matches(&r.fields()))
    }
}

pub(crate) struct StoreState {
    collections: HashMap<Table, Collection>,
    id_strategy: IdStrategy,
}

impl StoreState {
    fn new(id_strategy: IdStrategy) -> Self {
        let collections = Table::ALL
            .iter()
            .map(|t| (*t, Collection::default()))
            .collect();
        Self {
            collections,
            id_strategy,
        }
    }

    fn collection_mut(&mut self, table: Table) -> &mut Collection {
        self.collections.entry(table).or_default()
    }

    pub(crate) fn rows(&self, table: Table) -> &[Record] {
        self.collections
            .get(&table)
            .map(|c| c.rows.as_slice())
            .unwrap_or_default()
    }

    /// Append a record built from `payload`, synthesizing `id` when absent
    /// and stamping both timestamps.
    pub(crate) fn insert(&mut self, table: Table, payload: Value) -> ClinicResult<Record> {
        let mut object = into_object(table, payload)?;
        let strategy = self.id_strategy;
        let collection = self.collection_mut(table);

        let id = match object.get("id") {
            None | Some(Value::Null) => collection.allocate(strategy),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => {
                return Err(ClinicError::InvalidRecord {
                    table: table.to_string(),
                    reason: format!("id must be a string or number, got {}", other),
                })
            }
        };
        if collection.contains(&id) {
            return Err(ClinicError::DuplicateId {
                table: table.to_string(),
                id,
            });
        }

        let now = timestamp();
        object.insert("id".to_string(), Value::String(id.clone()));
        object.insert("created_at".to_string(), Value::String(now.clone()));
        object.insert("updated_at".to_string(), Value::String(now));

        let record = Record::from_json(table, Value::Object(object))?;
        collection.observe(&id);
        collection.rows.push(record.clone());
        Ok(record)
    }

    /// Merge `patch` onto the first row whose `column` equals `value`.
    ///
    /// `id` and `created_at` in the patch are ignored. The merged row is
    /// re-validated; if it no longer fits the table the row is left as it was.
    pub(crate) fn update_first(
        &mut self,
        table: Table,
        column: &str,
        value: &Value,
        patch: Value,
    ) -> ClinicResult<Record> {
        let patch = into_object(table, patch)?;
        let collection = self.collection_mut(table);
        let index = collection
            .position(column, value)
            .ok_or(ClinicError::NotFound)?;

        let mut merged = collection.rows[index].fields();
        for (key, field) in patch {
            if key == "id" || key == "created_at" {
                continue;
            }
            merged.insert(key, field);
        }
        merged.insert("updated_at".to_string(), Value::String(timestamp()));

        let updated = Record::from_json(table, Value::Object(merged))?;
        collection.rows[index] = updated.clone();
        Ok(updated)
    }

    /// Remove the first row whose `column` equals `value`.
    pub(crate) fn delete_first(
        &mut self,
        table: Table,
        column: &str,
        value: &Value,
    ) -> ClinicResult<Record> {
        let collection = self.collection_mut(table);
        let index = collection
            .position(column, value)
            .ok_or(ClinicError::NotFound)?;
        Ok(collection.rows.remove(index))
    }
}

fn into_object(table: Table, payload: Value) -> ClinicResult<Map<String, Value>> {
    match payload {
        Value::Object(map) => Ok(map),
        _ => Err(ClinicError::InvalidRecord {
            table: table.to_string(),
            reason: "expected a JSON object".to_string(),
        }),
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ── Public handle ─────────────────────────────────────────────────────────────

/// Shared handle to the in-memory collections.
#[derive(Clone)]
pub struct Store {
    state: Arc<Mutex<StoreState>>,
    policy: Option<Arc<dyn AccessPolicy>>,
    role: Option<String>,
}

impl Store {
    /// An empty store with sequential ids.
    pub fn new() -> Self {
        Self::with_strategy(IdStrategy::Sequential)
    }

    pub fn with_strategy(id_strategy: IdStrategy) -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState::new(id_strategy))),
            policy: None,
            role: None,
        }
    }

    /// Attach an access policy. Every handle cloned from the result checks it.
    pub fn with_policy(mut self, policy: Arc<dyn AccessPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// A handle over the same collections that reports `role` to the policy.
    pub fn acting_as(&self, role: impl Into<String>) -> Self {
        Self {
            state: Arc::clone(&self.state),
            policy: self.policy.clone(),
            role: Some(role.into()),
        }
    }

    /// A handle over the same collections that skips the access policy.
    /// For trusted in-process services such as sign-in.
    pub fn system(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            policy: None,
            role: None,
        }
    }

    /// Load fixture records as they are, keeping their ids and timestamps.
    ///
    /// Fails on the first id already present in its table; records before it
    /// stay loaded.
    pub fn seed(&self, records: impl IntoIterator<Item = Record>) -> ClinicResult<usize> {
        let mut state = self.lock()?;
        let mut loaded = 0;
        for record in records {
            let table = record.table();
            let collection = state.collection_mut(table);
            if collection.contains(record.id()) {
                return Err(ClinicError::DuplicateId {
                    table: table.to_string(),
                    id: record.id().to_string(),
                });
            }
            collection.observe(record.id());
            collection.rows.push(record);
            loaded += 1;
        }
        debug!(loaded, "store seeded");
        Ok(loaded)
    }

    /// Start a query against `table`.
    pub fn from(&self, table: Table) -> Query {
        Query::new(self.clone(), table)
    }

    /// Start a query against a table given by name.
    pub fn from_name(&self, name: &str) -> ClinicResult<Query> {
        Ok(self.from(name.parse()?))
    }

    /// Number of rows currently in `table`.
    pub fn len(&self, table: Table) -> ClinicResult<usize> {
        Ok(self.lock()?.rows(table).len())
    }

    /// Copy of every row currently in `table`, in scan order.
    pub fn snapshot(&self, table: Table) -> ClinicResult<Vec<Record>> {
        Ok(self.lock()?.rows(table).to_vec())
    }

    pub(crate) fn lock(&self) -> ClinicResult<MutexGuard<'_, StoreState>> {
        self.state.lock().map_err(|e| ClinicError::Internal {
            reason: format!("store lock poisoned: {}", e),
        })
    }

    /// Ask the attached policy, if any, whether this handle may run `action`.
    pub(crate) fn authorize(&self, action: AccessAction, table: Table) -> ClinicResult<()> {
        let Some(policy) = &self.policy else {
            return Ok(());
        };

        let ctx = AccessContext {
            role: self.role.clone().unwrap_or_else(|| ANONYMOUS_ROLE.to_string()),
            action: action.as_str().to_string(),
            table: table.to_string(),
        };

        match policy.evaluate(&ctx)? {
            AccessVerdict::Allow => Ok(()),
            AccessVerdict::Deny { reason } => {
                warn!(
                    role = %ctx.role,
                    action = %ctx.action,
                    table = %ctx.table,
                    reason = %reason,
                    "access denied"
                );
                Err(ClinicError::AccessDenied { reason })
            }
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use serde_json::json;

    use clinic_contracts::{config::IdStrategy, error::ClinicError, record::Record, table::Table};

    use super::Store;

    fn service(id: &str, name: &str) -> Record {
        Record::from_json(
            Table::Services,
            json!({
                "id": id,
                "name": name,
                "price": 100.0,
                "duration_min": 30,
                "created_at": "2024-01-01T00:00:00Z",
                "updated_at": "2024-01-01T00:00:00Z"
            }),
        )
        .unwrap()
    }

    #[test]
    fn new_store_has_every_table_empty() {
        let store = Store::new();
        for table in Table::ALL {
            assert_eq!(store.len(table).unwrap(), 0);
        }
    }

    #[test]
    fn seed_rejects_duplicate_ids() {
        let store = Store::new();
        let err = store
            .seed([service("1", "Consulta"), service("1", "Retorno")])
            .unwrap_err();
        assert!(matches!(err, ClinicError::DuplicateId { .. }));
        assert_eq!(store.len(Table::Services).unwrap(), 1);
    }

    #[test]
    fn sequential_ids_continue_after_seeded_max() {
        let store = Store::new();
        store.seed([service("1", "A"), service("7", "B")]).unwrap();

        let inserted = store
            .from(Table::Services)
            .insert(json!({ "name": "C", "price": 10.0, "duration_min": 15 }))
            .into_result()
            .unwrap()
            .unwrap();
        assert_eq!(inserted.id(), "8");
    }

    #[test]
    fn sequential_ids_skip_caller_supplied_ids() {
        let store = Store::new();
        store
            .from(Table::Services)
            .insert(json!({ "id": "abc", "name": "A", "price": 1.0, "duration_min": 5 }))
            .into_result()
            .unwrap();
        store
            .from(Table::Services)
            .insert(json!({ "id": 2, "name": "B", "price": 1.0, "duration_min": 5 }))
            .into_result()
            .unwrap();

        let ids: Vec<String> = (0..3)
            .map(|i| {
                store
                    .from(Table::Services)
                    .insert(json!({ "name": format!("S{i}"), "price": 1.0, "duration_min": 5 }))
                    .into_result()
                    .unwrap()
                    .unwrap()
                    .id()
                    .to_string()
            })
            .collect();
        assert_eq!(ids, ["3", "4", "5"]);
    }

    #[test]
    fn uuid_strategy_produces_distinct_ids() {
        let store = Store::with_strategy(IdStrategy::Uuid);
        let mut seen = HashSet::new();
        for i in 0..50 {
            let record = store
                .from(Table::Services)
                .insert(json!({ "name": format!("S{i}"), "price": 1.0, "duration_min": 5 }))
                .into_result()
                .unwrap()
                .unwrap();
            assert_eq!(record.id().len(), 36);
            assert!(seen.insert(record.id().to_string()));
        }
    }

    #[test]
    fn clones_share_collections() {
        let store = Store::new();
        let other = store.clone();
        other.seed([service("1", "A")]).unwrap();
        assert_eq!(store.len(Table::Services).unwrap(), 1);
        assert_eq!(store.system().len(Table::Services).unwrap(), 1);
    }

    #[test]
    fn from_name_rejects_unknown_table() {
        let store = Store::new();
        assert!(store.from_name("servicos").is_ok());
        assert!(matches!(
            store.from_name("invoices"),
            Err(ClinicError::UnknownTable { .. })
        ));
    }
}
