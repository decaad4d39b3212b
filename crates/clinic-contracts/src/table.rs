//! Collection names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ClinicError;

/// The five collections the data layer serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Users,
    Patients,
    Professionals,
    Services,
    Appointments,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Users,
        Table::Patients,
        Table::Professionals,
        Table::Services,
        Table::Appointments,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Patients => "patients",
            Table::Professionals => "professionals",
            Table::Services => "services",
            Table::Appointments => "appointments",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Table {
    type Err = ClinicError;

    /// Accepts the English names and the legacy Portuguese collection names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "users" | "usuarios" => Ok(Table::Users),
            "patients" | "pacientes" => Ok(Table::Patients),
            "professionals" | "profissionais" => Ok(Table::Professionals),
            "services" | "servicos" => Ok(Table::Services),
            "appointments" | "agendamentos" => Ok(Table::Appointments),
            other => Err(ClinicError::UnknownTable {
                name: other.to_string(),
            }),
        }
    }
}
