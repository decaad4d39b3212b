//! Typed clinic records.
//!
//! Each table has its own record struct. `Record` is the tagged union the
//! store keeps in its collections. Payloads coming from callers are plain
//! JSON objects; `Record::from_json` is the single place where they are
//! checked against the table's shape before they reach a collection.
//! Unknown fields are rejected rather than dropped.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    error::{ClinicError, ClinicResult},
    table::Table,
};

/// Strip the punctuation people type into CPF numbers (`.`, `-`, spaces).
pub fn normalize_cpf(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '.' | '-') && !c.is_whitespace())
        .collect()
}

// ── Enumerations ──────────────────────────────────────────────────────────────

/// Access level of a staff account. Also the role name used by access rules.
///
/// Enum fields accept only their canonical snake_case names, so a stored
/// value always equals the value that was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Admin,
    Reception,
    Professional,
    Developer,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Admin => "admin",
            AccessLevel::Reception => "reception",
            AccessLevel::Professional => "professional",
            AccessLevel::Developer => "developer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Pending,
}

// ── Per-table records ─────────────────────────────────────────────────────────

/// A staff account that can sign in.
///
/// `password` holds a legacy plaintext password until the first successful
/// sign-in migrates it to `password_hash`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct User {
    pub id: String,
    pub name: String,
    pub cpf: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub access_level: AccessLevel,
    #[serde(default)]
    pub first_access: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub cpf: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Professional {
    pub id: String,
    pub name: String,
    pub specialty: String,
    /// CRM/CRO registration number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
    #[serde(default = "default_active")]
    pub status: ActiveStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Service {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    pub duration_min: u32,
    #[serde(default = "default_true")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Payment {
    pub status: PaymentStatus,
    pub amount: f64,
    pub method: String,
}

/// A booked slot. `patient_id`, `professional_id` and `service_id` are plain
/// references; nothing checks that they resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub professional_id: String,
    pub service_id: String,
    pub date: NaiveDate,
    /// Start time as `HH:MM`.
    pub time: String,
    #[serde(default = "default_scheduled")]
    pub status: AppointmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub payments: Vec<Payment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> ActiveStatus {
    ActiveStatus::Active
}

fn default_true() -> bool {
    true
}

fn default_scheduled() -> AppointmentStatus {
    AppointmentStatus::Scheduled
}

// ── Record union ──────────────────────────────────────────────────────────────

/// One row of any table.
///
/// Serializes as the inner record's JSON object, without a tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    User(User),
    Patient(Patient),
    Professional(Professional),
    Service(Service),
    Appointment(Appointment),
}

impl Record {
    /// Build a record for `table` from a JSON object, rejecting anything that
    /// does not fit the table's shape.
    pub fn from_json(table: Table, payload: Value) -> ClinicResult<Self> {
        if !payload.is_object() {
            return Err(invalid(table, "expected a JSON object"));
        }

        let record = match table {
            Table::Users => Record::User(parse(table, payload)?),
            Table::Patients => Record::Patient(parse(table, payload)?),
            Table::Professionals => Record::Professional(parse(table, payload)?),
            Table::Services => Record::Service(parse(table, payload)?),
            Table::Appointments => Record::Appointment(parse(table, payload)?),
        };

        record.validate()?;
        Ok(record)
    }

    pub fn table(&self) -> Table {
        match self {
            Record::User(_) => Table::Users,
            Record::Patient(_) => Table::Patients,
            Record::Professional(_) => Table::Professionals,
            Record::Service(_) => Table::Services,
            Record::Appointment(_) => Table::Appointments,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Record::User(r) => &r.id,
            Record::Patient(r) => &r.id,
            Record::Professional(r) => &r.id,
            Record::Service(r) => &r.id,
            Record::Appointment(r) => &r.id,
        }
    }

    /// The record as a JSON object.
    ///
    /// # Panics
    ///
    /// Panics if serialization fails, which cannot happen for these types:
    /// every field is a string, number, bool, date or nested struct of those.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).expect("records always serialize to JSON")
    }

    /// Field name → value view used by filters, ordering and projection.
    pub fn fields(&self) -> Map<String, Value> {
        match self.to_json() {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    pub fn as_user(&self) -> Option<&User> {
        match self {
            Record::User(user) => Some(user),
            _ => None,
        }
    }

    pub fn as_appointment(&self) -> Option<&Appointment> {
        match self {
            Record::Appointment(appointment) => Some(appointment),
            _ => None,
        }
    }

    /// Field-level checks serde cannot express.
    fn validate(&self) -> ClinicResult<()> {
        let table = self.table();
        if self.id().trim().is_empty() {
            return Err(invalid(table, "id must not be empty"));
        }

        match self {
            Record::User(u) => {
                require_name(table, &u.name)?;
                require_cpf(table, &u.cpf)
            }
            Record::Patient(p) => {
                require_name(table, &p.name)?;
                require_cpf(table, &p.cpf)
            }
            Record::Professional(p) => require_name(table, &p.name),
            Record::Service(s) => {
                require_name(table, &s.name)?;
                if !s.price.is_finite() || s.price < 0.0 {
                    return Err(invalid(table, "price must be a non-negative number"));
                }
                if s.duration_min == 0 {
                    return Err(invalid(table, "duration_min must be positive"));
                }
                Ok(())
            }
            Record::Appointment(a) => {
                if NaiveTime::parse_from_str(&a.time, "%H:%M").is_err() {
                    return Err(invalid(table, &format!("time '{}' is not HH:MM", a.time)));
                }
                if !a.amount.is_finite() || a.amount < 0.0 {
                    return Err(invalid(table, "amount must be a non-negative number"));
                }
                Ok(())
            }
        }
    }
}

fn parse<T: serde::de::DeserializeOwned>(table: Table, payload: Value) -> ClinicResult<T> {
    serde_json::from_value(payload).map_err(|e| invalid(table, &e.to_string()))
}

fn invalid(table: Table, reason: &str) -> ClinicError {
    ClinicError::InvalidRecord {
        table: table.to_string(),
        reason: reason.to_string(),
    }
}

fn require_name(table: Table, name: &str) -> ClinicResult<()> {
    if name.trim().is_empty() {
        return Err(invalid(table, "name must not be empty"));
    }
    Ok(())
}

fn require_cpf(table: Table, cpf: &str) -> ClinicResult<()> {
    let digits = normalize_cpf(cpf);
    if digits.len() != 11 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid(table, &format!("cpf '{}' must have 11 digits", cpf)));
    }
    Ok(())
}
