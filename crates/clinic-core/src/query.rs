//! The fluent query builder.
//!
//! A `Query` is created by `Store::from` and carries its own transient
//! state: accumulated filters, sort keys, an inclusive range, a projection
//! and a count mode. Chain methods consume and return the query, so they
//! compose in any order. Nothing touches the store until a terminal method
//! runs:
//!
//! - `execute()`: filter, sort, paginate, project; returns the rows
//! - `single()`: first filtered row, or no data
//! - `insert()`: append one record
//! - `update(patch).eq(column, value)`: merge into the first match
//! - `delete().eq(column, value)`: remove the first match
//!
//! Terminal methods always return an `Envelope`; failures are reported in
//! its `error` field, never as `Err`.

use std::cmp::Ordering;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use clinic_contracts::{
    envelope::Envelope,
    error::{ClinicError, ClinicResult},
    policy::AccessAction,
    record::Record,
    table::Table,
};

use crate::{
    filter::{compare_values, FilterKey, FilterOp, FilterSet},
    store::Store,
};

/// How the envelope's `count` is populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountMode {
    /// Number of rows matching the filters, before `range` is applied.
    Exact,
}

#[derive(Debug, Clone, PartialEq)]
struct SortKey {
    column: String,
    ascending: bool,
}

/// A query against one table. See the module docs for the terminal methods.
pub struct Query {
    store: Store,
    table: Table,
    filters: FilterSet,
    sort: Vec<SortKey>,
    range: Option<(usize, usize)>,
    columns: Option<Vec<String>>,
    count: Option<CountMode>,
}

impl Query {
    pub(crate) fn new(store: Store, table: Table) -> Self {
        Self {
            store,
            table,
            filters: FilterSet::new(),
            sort: Vec::new(),
            range: None,
            columns: None,
            count: None,
        }
    }

    pub fn table(&self) -> Table {
        self.table
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    // ── Chain methods ─────────────────────────────────────────────────────────

    /// Project returned rows onto a comma-separated column list. `"*"` or an
    /// empty list returns whole rows. Columns a row lacks are left out.
    pub fn select(mut self, columns: &str) -> Self {
        let list: Vec<String> = columns
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from)
            .collect();
        self.columns = if list.is_empty() || list.iter().any(|c| c == "*") {
            None
        } else {
            Some(list)
        };
        self
    }

    pub fn count(mut self, mode: CountMode) -> Self {
        self.count = Some(mode);
        self
    }

    /// Sort by `column`. Later calls add tie-breaking keys. Rows lacking the
    /// column sort last in either direction.
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.sort.push(SortKey {
            column: column.to_string(),
            ascending,
        });
        self
    }

    /// Keep rows `from..=to` of the filtered, sorted result.
    pub fn range(mut self, from: usize, to: usize) -> Self {
        self.range = Some((from, to));
        self
    }

    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.push(column, FilterOp::Eq, value.into())
    }

    pub fn neq(self, column: &str, value: impl Into<Value>) -> Self {
        self.push(column, FilterOp::Neq, value.into())
    }

    pub fn gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.push(column, FilterOp::Gte, value.into())
    }

    pub fn lte(self, column: &str, value: impl Into<Value>) -> Self {
        self.push(column, FilterOp::Lte, value.into())
    }

    pub fn gt(self, column: &str, value: impl Into<Value>) -> Self {
        self.push(column, FilterOp::Gt, value.into())
    }

    pub fn lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.push(column, FilterOp::Lt, value.into())
    }

    /// Set membership. Named `in_` because `in` is a keyword.
    pub fn in_<V: Into<Value>>(self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        let values = Value::Array(values.into_iter().map(Into::into).collect());
        self.push(column, FilterOp::In, values)
    }

    /// Register a filter by its encoded key, e.g. `"date_gte"` or `"id_in"`.
    pub fn filter(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.filters.register(FilterKey::parse(key), value.into());
        self
    }

    fn push(mut self, column: &str, op: FilterOp, value: Value) -> Self {
        self.filters.register(FilterKey::new(column, op), value);
        self
    }

    // ── Terminal methods ──────────────────────────────────────────────────────

    /// Run the query and return the matching rows.
    pub fn execute(self) -> Envelope<Vec<Value>> {
        let count = self.count;
        match self.collect_rows(true) {
            Ok((rows, total)) => Envelope::ok(rows).with_count(count.map(|_| total)),
            Err(err) => Envelope::err(&err),
        }
    }

    /// Return the first matching row. `range` is ignored; an empty result is
    /// not an error.
    pub fn single(self) -> Envelope<Value> {
        let count = self.count;
        match self.collect_rows(false) {
            Ok((rows, total)) => {
                let env = match rows.into_iter().next() {
                    Some(row) => Envelope::ok(row),
                    None => Envelope::empty(),
                };
                env.with_count(count.map(|_| total))
            }
            Err(err) => Envelope::err(&err),
        }
    }

    /// Append a new record. Filters on the query are ignored.
    pub fn insert(self, payload: Value) -> Envelope<Record> {
        let table = self.table;
        let result = self.store.authorize(AccessAction::Insert, table).and_then(|()| {
            let mut state = self.store.lock()?;
            state.insert(table, payload)
        });

        match &result {
            Ok(record) => info!(table = %table, id = %record.id(), "record inserted"),
            Err(err) => warn!(table = %table, error = %err, "insert rejected"),
        }
        result.into()
    }

    /// Prepare a merge of `patch` into the first row matched by the
    /// following `.eq(column, value)`.
    pub fn update(self, patch: Value) -> UpdateQuery {
        UpdateQuery { query: self, patch }
    }

    /// Prepare removal of the first row matched by the following
    /// `.eq(column, value)`.
    pub fn delete(self) -> DeleteQuery {
        DeleteQuery { query: self }
    }

    /// Filter, sort, optionally paginate and project. Returns the rows plus
    /// the match count before pagination.
    fn collect_rows(self, paginate: bool) -> ClinicResult<(Vec<Value>, usize)> {
        self.store.authorize(AccessAction::Read, self.table)?;

        let mut matched: Vec<Map<String, Value>> = {
            let state = self.store.lock()?;
            state
                .rows(self.table)
                .iter()
                .map(Record::fields)
                .filter(|row| self.filters.matches(row))
                .collect()
        };

        if !self.sort.is_empty() {
            matched.sort_by(|a, b| compare_rows(&self.sort, a, b));
        }

        let total = matched.len();
        let page = match (paginate, self.range) {
            (true, Some((from, to))) => window(matched, from, to),
            _ => matched,
        };

        debug!(
            table = %self.table,
            filters = self.filters.len(),
            matched = total,
            returned = page.len(),
            "query executed"
        );

        let rows = page
            .into_iter()
            .map(|row| Value::Object(project(row, self.columns.as_deref())))
            .collect();
        Ok((rows, total))
    }
}

/// Inclusive `[from, to]` slice, clamped to the available rows.
fn window(rows: Vec<Map<String, Value>>, from: usize, to: usize) -> Vec<Map<String, Value>> {
    if from > to {
        return Vec::new();
    }
    rows.into_iter()
        .take(to.saturating_add(1))
        .skip(from)
        .collect()
}

fn project(row: Map<String, Value>, columns: Option<&[String]>) -> Map<String, Value> {
    match columns {
        None => row,
        Some(columns) => {
            let mut row = row;
            columns
                .iter()
                .filter_map(|c| row.remove(c).map(|v| (c.clone(), v)))
                .collect()
        }
    }
}

fn compare_rows(keys: &[SortKey], a: &Map<String, Value>, b: &Map<String, Value>) -> Ordering {
    for key in keys {
        let left = a.get(&key.column).filter(|v| !v.is_null());
        let right = b.get(&key.column).filter(|v| !v.is_null());
        let ordering = match (left, right) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(l), Some(r)) => {
                let natural = compare_values(l, r).unwrap_or(Ordering::Equal);
                if key.ascending {
                    natural
                } else {
                    natural.reverse()
                }
            }
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

// ── Mutation continuations ────────────────────────────────────────────────────

/// Second half of `update(patch).eq(column, value)`.
pub struct UpdateQuery {
    query: Query,
    patch: Value,
}

impl UpdateQuery {
    pub fn eq(self, column: &str, value: impl Into<Value>) -> Envelope<Record> {
        let Query { store, table, .. } = self.query;
        let value = value.into();
        let result = store.authorize(AccessAction::Update, table).and_then(|()| {
            let mut state = store.lock()?;
            state.update_first(table, column, &value, self.patch)
        });

        log_mutation("update", table, column, &value, &result);
        result.into()
    }
}

/// Second half of `delete().eq(column, value)`.
pub struct DeleteQuery {
    query: Query,
}

impl DeleteQuery {
    /// On success the envelope carries neither data nor error.
    pub fn eq(self, column: &str, value: impl Into<Value>) -> Envelope<()> {
        let Query { store, table, .. } = self.query;
        let value = value.into();
        let result = store.authorize(AccessAction::Delete, table).and_then(|()| {
            let mut state = store.lock()?;
            state.delete_first(table, column, &value)
        });

        log_mutation("delete", table, column, &value, &result);
        match result {
            Ok(_) => Envelope::empty(),
            Err(err) => Envelope::err(&err),
        }
    }
}

fn log_mutation(op: &str, table: Table, column: &str, value: &Value, result: &ClinicResult<Record>) {
    match result {
        Ok(record) => info!(op, table = %table, id = %record.id(), "record mutated"),
        Err(ClinicError::NotFound) => warn!(
            op,
            table = %table,
            column,
            value = %value,
            "no row matched"
        ),
        Err(err) => warn!(op, table = %table, error = %err, "mutation rejected"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use serde_json::{json, Value};

    use clinic_contracts::{
        error::{ClinicResult, NOT_FOUND_MESSAGE},
        policy::{AccessContext, AccessVerdict},
        record::Record,
        table::Table,
    };

    use super::CountMode;
    use crate::{store::Store, traits::AccessPolicy};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn appointment(id: u32, professional: &str, date: &str, status: &str, amount: f64) -> Record {
        Record::from_json(
            Table::Appointments,
            json!({
                "id": id.to_string(),
                "patient_id": "1",
                "professional_id": professional,
                "service_id": "1",
                "date": date,
                "time": "09:00",
                "status": status,
                "amount": amount,
                "created_at": "2024-12-01T00:00:00Z",
                "updated_at": "2024-12-01T00:00:00Z"
            }),
        )
        .unwrap()
    }

    /// Five appointments: ids 1..=5, professionals 1/2 alternating.
    fn store() -> Store {
        let store = Store::new();
        store
            .seed([
                appointment(1, "1", "2024-12-20", "completed", 200.0),
                appointment(2, "2", "2024-12-20", "completed", 120.0),
                appointment(3, "1", "2024-12-21", "scheduled", 80.0),
                appointment(4, "2", "2024-12-22", "confirmed", 90.0),
                appointment(5, "1", "2024-12-23", "cancelled", 60.0),
            ])
            .unwrap();
        store
    }

    fn ids(rows: &[Value]) -> Vec<&str> {
        rows.iter().map(|r| r["id"].as_str().unwrap()).collect()
    }

    fn rows(env: clinic_contracts::envelope::Envelope<Vec<Value>>) -> Vec<Value> {
        env.into_result().unwrap().unwrap()
    }

    // ── Filtering ─────────────────────────────────────────────────────────────

    #[test]
    fn execute_without_filters_returns_everything() {
        let env = store().from(Table::Appointments).execute();
        assert!(env.is_ok());
        assert_eq!(env.data.unwrap().len(), 5);
        assert!(env.count.is_none());
    }

    #[test]
    fn chained_filters_intersect() {
        let result = rows(
            store()
                .from(Table::Appointments)
                .eq("professional_id", "1")
                .neq("status", "cancelled")
                .gte("date", "2024-12-20")
                .execute(),
        );
        assert_eq!(ids(&result), ["1", "3"]);
    }

    #[test]
    fn numeric_range_filters() {
        let result = rows(
            store()
                .from(Table::Appointments)
                .gt("amount", 60)
                .lt("amount", 200)
                .execute(),
        );
        assert_eq!(ids(&result), ["2", "3", "4"]);

        let result = rows(
            store()
                .from(Table::Appointments)
                .gte("amount", 90)
                .lte("amount", 120)
                .execute(),
        );
        assert_eq!(ids(&result), ["2", "4"]);
    }

    #[test]
    fn in_filter_matches_membership() {
        let result = rows(
            store()
                .from(Table::Appointments)
                .in_("date", ["2024-12-21", "2024-12-23"])
                .execute(),
        );
        assert_eq!(ids(&result), ["3", "5"]);
    }

    #[test]
    fn encoded_filter_keys_are_accepted() {
        let result = rows(
            store()
                .from(Table::Appointments)
                .filter("status_neq", "completed")
                .filter("id_in", json!(["3", "4"]))
                .execute(),
        );
        assert_eq!(ids(&result), ["3", "4"]);
    }

    // ── Pagination ────────────────────────────────────────────────────────────

    #[test]
    fn range_upper_bound_is_inclusive() {
        let result = rows(store().from(Table::Appointments).range(0, 1).execute());
        assert_eq!(result.len(), 2);
        assert_eq!(ids(&result), ["1", "2"]);

        let result = rows(store().from(Table::Appointments).range(1, 3).execute());
        assert_eq!(ids(&result), ["2", "3", "4"]);
    }

    #[test]
    fn range_applies_after_filters() {
        let result = rows(
            store()
                .from(Table::Appointments)
                .range(1, 1)
                .eq("professional_id", "1")
                .execute(),
        );
        assert_eq!(ids(&result), ["3"]);
    }

    #[test]
    fn range_past_the_end_is_clamped() {
        let result = rows(store().from(Table::Appointments).range(3, 10).execute());
        assert_eq!(ids(&result), ["4", "5"]);

        let result = rows(store().from(Table::Appointments).range(7, 9).execute());
        assert!(result.is_empty());

        let result = rows(store().from(Table::Appointments).range(3, 2).execute());
        assert!(result.is_empty());
    }

    #[test]
    fn open_ended_range_returns_the_tail() {
        let result = rows(store().from(Table::Appointments).range(0, usize::MAX).execute());
        assert_eq!(result.len(), 5);

        let result = rows(
            store()
                .from(Table::Appointments)
                .range(2, usize::MAX)
                .execute(),
        );
        assert_eq!(ids(&result), ["3", "4", "5"]);

        let result = rows(
            store()
                .from(Table::Appointments)
                .range(usize::MAX, usize::MAX)
                .execute(),
        );
        assert!(result.is_empty());
    }

    // ── Count ─────────────────────────────────────────────────────────────────

    #[test]
    fn exact_count_is_post_filter_and_pre_pagination() {
        let env = store()
            .from(Table::Appointments)
            .count(CountMode::Exact)
            .eq("professional_id", "1")
            .range(0, 0)
            .execute();
        assert_eq!(env.count, Some(3));
        assert_eq!(env.data.unwrap().len(), 1);
    }

    // ── Ordering and projection ───────────────────────────────────────────────

    #[test]
    fn order_sorts_by_column() {
        let result = rows(store().from(Table::Appointments).order("amount", true).execute());
        assert_eq!(ids(&result), ["5", "3", "4", "2", "1"]);

        let result = rows(store().from(Table::Appointments).order("date", false).execute());
        assert_eq!(ids(&result), ["5", "4", "3", "1", "2"]);
    }

    #[test]
    fn order_uses_secondary_keys_and_is_stable() {
        let result = rows(
            store()
                .from(Table::Appointments)
                .order("professional_id", true)
                .order("amount", false)
                .execute(),
        );
        assert_eq!(ids(&result), ["1", "3", "5", "2", "4"]);
    }

    #[test]
    fn order_then_range_pages_the_sorted_rows() {
        let result = rows(
            store()
                .from(Table::Appointments)
                .order("amount", false)
                .range(0, 1)
                .execute(),
        );
        assert_eq!(ids(&result), ["1", "2"]);
    }

    #[test]
    fn select_projects_requested_columns() {
        let result = rows(
            store()
                .from(Table::Appointments)
                .select("id, status, not_a_column")
                .eq("id", "4")
                .execute(),
        );
        assert_eq!(result, vec![json!({ "id": "4", "status": "confirmed" })]);
    }

    #[test]
    fn select_star_returns_full_rows() {
        let result = rows(store().from(Table::Appointments).select("*").range(0, 0).execute());
        assert!(result[0].get("created_at").is_some());
        assert!(result[0].get("payments").is_some());
    }

    // ── single() ──────────────────────────────────────────────────────────────

    #[test]
    fn single_returns_first_match_or_none() {
        let env = store().from(Table::Appointments).eq("status", "scheduled").single();
        assert_eq!(env.data.unwrap()["id"], json!("3"));

        let env = store().from(Table::Appointments).eq("status", "no_show").single();
        assert!(env.is_ok());
        assert!(env.data.is_none());
    }

    #[test]
    fn single_ignores_range() {
        let env = store().from(Table::Appointments).range(2, 3).single();
        assert_eq!(env.data.unwrap()["id"], json!("1"));
    }

    // ── insert ────────────────────────────────────────────────────────────────

    fn new_appointment() -> Value {
        json!({
            "patient_id": "9",
            "professional_id": "3",
            "service_id": "2",
            "date": "2024-12-30",
            "time": "10:30",
            "status": "scheduled"
        })
    }

    #[test]
    fn insert_appends_one_record_with_fresh_id_and_timestamps() {
        let store = store();
        let env = store.from(Table::Appointments).insert(new_appointment());
        let record = env.into_result().unwrap().unwrap();

        assert_eq!(record.id(), "6");
        assert_eq!(store.len(Table::Appointments).unwrap(), 6);
        let fields = record.fields();
        assert!(fields["created_at"].is_string());
        assert_eq!(fields["created_at"], fields["updated_at"]);
    }

    #[test]
    fn repeated_inserts_never_reuse_an_id() {
        let store = store();
        let mut seen: HashSet<String> = store
            .snapshot(Table::Appointments)
            .unwrap()
            .iter()
            .map(|r| r.id().to_string())
            .collect();

        for _ in 0..200 {
            let record = store
                .from(Table::Appointments)
                .insert(new_appointment())
                .into_result()
                .unwrap()
                .unwrap();
            assert!(seen.insert(record.id().to_string()), "id {} reused", record.id());
        }
        assert_eq!(store.len(Table::Appointments).unwrap(), 205);
    }

    #[test]
    fn inserted_record_reads_back_unchanged() {
        let store = store();
        let record = store
            .from(Table::Appointments)
            .insert(new_appointment())
            .into_result()
            .unwrap()
            .unwrap();

        let env = store.from(Table::Appointments).eq("id", record.id()).execute();
        assert_eq!(env.data.unwrap(), vec![record.to_json()]);
    }

    #[test]
    fn insert_rejects_invalid_payload_and_leaves_table_alone() {
        let store = store();
        let env = store
            .from(Table::Appointments)
            .insert(json!({ "patient_id": "1", "time": "25:99" }));
        assert!(env.data.is_none());
        assert!(env.message().unwrap().contains("invalid appointments record"));
        assert_eq!(store.len(Table::Appointments).unwrap(), 5);
    }

    #[test]
    fn insert_rejects_unknown_columns() {
        let store = store();
        let mut payload = new_appointment();
        payload["category"] = json!("exame");
        let env = store.from(Table::Appointments).insert(payload);
        assert!(env.data.is_none());
        assert!(env.message().unwrap().contains("unknown field `category`"));
        assert_eq!(store.len(Table::Appointments).unwrap(), 5);
    }

    #[test]
    fn update_rejects_unknown_columns() {
        let store = store();
        let env = store
            .from(Table::Appointments)
            .update(json!({ "category": "exame" }))
            .eq("id", "1");
        assert!(env.message().unwrap().contains("unknown field `category`"));
        let row = store.from(Table::Appointments).eq("id", "1").single().data.unwrap();
        assert!(row.get("category").is_none());
    }

    #[test]
    fn legacy_status_value_is_rejected_not_rewritten() {
        let store = store();
        let mut payload = new_appointment();
        payload["status"] = json!("agendado");
        let env = store.from(Table::Appointments).insert(payload);
        assert!(env.message().unwrap().contains("invalid appointments record"));

        let mut payload = new_appointment();
        payload["status"] = json!("scheduled");
        let inserted = store.from(Table::Appointments).insert(payload).data.unwrap();
        assert_eq!(inserted.fields()["status"], json!("scheduled"));

        let hits = rows(store.from(Table::Appointments).eq("status", "scheduled").execute());
        assert!(ids(&hits).contains(&inserted.id()));
    }

    #[test]
    fn insert_rejects_duplicate_caller_id() {
        let store = store();
        let mut payload = new_appointment();
        payload["id"] = json!("2");
        let env = store.from(Table::Appointments).insert(payload);
        assert!(env.message().unwrap().contains("duplicate id '2'"));
        assert_eq!(store.len(Table::Appointments).unwrap(), 5);
    }

    // ── update ────────────────────────────────────────────────────────────────

    #[test]
    fn update_merges_into_first_match() {
        let store = store();
        let env = store
            .from(Table::Appointments)
            .update(json!({ "status": "confirmed", "notes": "called the patient" }))
            .eq("professional_id", "1");
        let record = env.into_result().unwrap().unwrap();
        assert_eq!(record.id(), "1");

        let row = store.from(Table::Appointments).eq("id", "1").single().data.unwrap();
        assert_eq!(row["status"], json!("confirmed"));
        assert_eq!(row["notes"], json!("called the patient"));
        assert_eq!(row["amount"], json!(200.0));
        assert_ne!(row["updated_at"], row["created_at"]);
    }

    #[test]
    fn update_cannot_change_id() {
        let store = store();
        store
            .from(Table::Appointments)
            .update(json!({ "id": "99", "amount": 1.0 }))
            .eq("id", "5");
        let row = store.from(Table::Appointments).eq("id", "5").single().data.unwrap();
        assert_eq!(row["amount"], json!(1.0));
        assert!(store.from(Table::Appointments).eq("id", "99").single().data.is_none());
    }

    #[test]
    fn update_missing_row_reports_not_found_and_changes_nothing() {
        let store = store();
        let before = store.snapshot(Table::Appointments).unwrap();

        let env = store
            .from(Table::Appointments)
            .update(json!({ "status": "cancelled" }))
            .eq("id", "404");

        assert!(env.data.is_none());
        assert_eq!(env.message(), Some(NOT_FOUND_MESSAGE));
        assert_eq!(store.snapshot(Table::Appointments).unwrap(), before);
    }

    #[test]
    fn update_producing_invalid_record_is_rejected() {
        let store = store();
        let before = store.snapshot(Table::Appointments).unwrap();
        let env = store
            .from(Table::Appointments)
            .update(json!({ "date": "not a date" }))
            .eq("id", "1");
        assert!(env.message().unwrap().contains("invalid appointments record"));
        assert_eq!(store.snapshot(Table::Appointments).unwrap(), before);
    }

    // ── delete ────────────────────────────────────────────────────────────────

    #[test]
    fn delete_removes_exactly_first_match() {
        let store = store();
        let env = store.from(Table::Appointments).delete().eq("professional_id", "2");
        assert!(env.is_ok());
        assert!(env.data.is_none());
        assert_eq!(store.len(Table::Appointments).unwrap(), 4);

        let remaining = rows(store.from(Table::Appointments).eq("professional_id", "2").execute());
        assert_eq!(ids(&remaining), ["4"]);
    }

    #[test]
    fn repeated_delete_reports_not_found() {
        let store = store();
        assert!(store.from(Table::Appointments).delete().eq("id", "3").is_ok());
        let second = store.from(Table::Appointments).delete().eq("id", "3");
        assert_eq!(second.message(), Some(NOT_FOUND_MESSAGE));
        assert_eq!(store.len(Table::Appointments).unwrap(), 4);
    }

    #[test]
    fn mutations_are_visible_to_later_queries() {
        let store = store();
        let reader = store.clone();
        store
            .from(Table::Appointments)
            .update(json!({ "status": "no_show" }))
            .eq("id", "4");
        let env = reader.from(Table::Appointments).eq("status", "no_show").execute();
        assert_eq!(ids(&env.data.unwrap()), ["4"]);
    }

    // ── Access policy ─────────────────────────────────────────────────────────

    /// Lets everyone read; only "admin" may write.
    struct AdminWrites;

    impl AccessPolicy for AdminWrites {
        fn evaluate(&self, ctx: &AccessContext) -> ClinicResult<AccessVerdict> {
            if ctx.action == "read" || ctx.role == "admin" {
                Ok(AccessVerdict::Allow)
            } else {
                Ok(AccessVerdict::Deny {
                    reason: format!("{} may not {}", ctx.role, ctx.action),
                })
            }
        }
    }

    #[test]
    fn policy_denial_is_reported_in_envelope() {
        let store = store().with_policy(Arc::new(AdminWrites));
        let reception = store.acting_as("reception");

        assert_eq!(rows(reception.from(Table::Appointments).execute()).len(), 5);

        let env = reception.from(Table::Appointments).delete().eq("id", "1");
        assert_eq!(env.message(), Some("access denied: reception may not delete"));
        assert_eq!(store.len(Table::Appointments).unwrap(), 5);

        let env = store.acting_as("admin").from(Table::Appointments).delete().eq("id", "1");
        assert!(env.is_ok());
        assert_eq!(store.len(Table::Appointments).unwrap(), 4);
    }

    #[test]
    fn handle_without_role_is_anonymous() {
        let store = store().with_policy(Arc::new(AdminWrites));
        let env = store.from(Table::Appointments).insert(json!({}));
        assert_eq!(env.message(), Some("access denied: anonymous may not insert"));

        let env = store.system().from(Table::Appointments).update(json!({ "amount": 5.0 })).eq("id", "2");
        assert!(env.is_ok());
    }
}
