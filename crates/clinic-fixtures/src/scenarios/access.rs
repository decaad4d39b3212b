//! Scenario: role access rules.
//!
//! Runs the same calls as each staff role against a store bound to the
//! configured rules. When the configuration carries no rules the bundled
//! clinic rules are used instead.

use serde_json::json;

use clinic_contracts::{envelope::Envelope, error::ClinicResult, record::AccessLevel, table::Table};
use clinic_policy::ClinicConfig;

use super::seeded;

pub fn run_scenario(config: &ClinicConfig) -> ClinicResult<()> {
    println!("=== Scenario: Role Access Rules ===");
    println!();

    let bundled;
    let config = if config.rules.is_empty() {
        bundled = ClinicConfig::from_toml_str(crate::CLINIC_CONFIG)?;
        &bundled
    } else {
        config
    };
    println!("  Rules loaded: {}", config.rules.len());
    println!();

    let store = seeded(config)?;

    for level in [
        AccessLevel::Admin,
        AccessLevel::Reception,
        AccessLevel::Professional,
    ] {
        let staff = store.acting_as(level.as_str());
        println!("  Role: {}", level.as_str());
        report("read appointments", &staff.from(Table::Appointments).execute());
        report("read users", &staff.from(Table::Users).execute());
        report(
            "update appointment 10",
            &staff
                .from(Table::Appointments)
                .update(json!({ "status": "completed" }))
                .eq("id", "10"),
        );
        report("insert service", &staff.from(Table::Services).insert(new_service(level)));
        println!();
    }

    // Deletes run last so earlier roles see the same rows.
    {
        let reception = store.acting_as(AccessLevel::Reception.as_str());
        report(
            "reception delete patient 8",
            &reception.from(Table::Patients).delete().eq("id", "8"),
        );
        let admin = store.acting_as(AccessLevel::Admin.as_str());
        report(
            "admin delete patient 8",
            &admin.from(Table::Patients).delete().eq("id", "8"),
        );
        report("unbound role read", &store.from(Table::Patients).execute());
        println!();
    }

    println!("  Access scenario complete.");
    println!();
    Ok(())
}

fn new_service(level: AccessLevel) -> serde_json::Value {
    json!({
        "name": format!("Avaliação ({})", level.as_str()),
        "price": 100.0,
        "duration_min": 20,
    })
}

fn report<T>(label: &str, envelope: &Envelope<T>) {
    match envelope.message() {
        None => println!("    {:<28} allowed", label),
        Some(message) => println!("    {:<28} {}", label, message),
    }
}

#[cfg(test)]
mod tests {
    use clinic_contracts::error::ClinicError;
    use clinic_core::Store;

    use super::*;

    fn guarded() -> Store {
        let config = ClinicConfig::from_toml_str(crate::CLINIC_CONFIG).unwrap();
        seeded(&config).unwrap()
    }

    #[test]
    fn bundled_rules_parse() {
        let config = ClinicConfig::from_toml_str(crate::CLINIC_CONFIG).unwrap();
        assert!(config.rules.len() >= 5);
        assert_eq!(config.auth.sign_out_latency_ms, 0);
    }

    #[test]
    fn reception_cannot_delete_or_read_accounts() {
        let reception = guarded().acting_as("reception");
        assert!(reception.from(Table::Patients).execute().is_ok());

        let delete = reception.from(Table::Patients).delete().eq("id", "1");
        assert_eq!(
            delete.message(),
            Some("access denied: reception staff cannot delete records")
        );

        let users = reception.from(Table::Users).execute();
        assert!(users.message().is_some_and(|m| m.starts_with("access denied")));
    }

    #[test]
    fn professional_reads_and_updates_appointments_only() {
        let professional = guarded().acting_as("professional");
        assert!(professional
            .from(Table::Appointments)
            .update(json!({ "status": "completed" }))
            .eq("id", "10")
            .is_ok());
        assert!(!professional
            .from(Table::Patients)
            .insert(json!({ "name": "X", "cpf": "12345678901", "phone": "1" }))
            .is_ok());
    }

    #[test]
    fn unbound_role_is_denied_by_default() {
        let env = guarded().from(Table::Services).execute();
        let expected = ClinicError::AccessDenied {
            reason: "denied by default: no rule lets 'anonymous' read on 'services'".to_string(),
        };
        assert_eq!(env.message(), Some(expected.to_string().as_str()));
    }

    #[test]
    fn runs_with_and_without_configured_rules() {
        run_scenario(&ClinicConfig::default()).unwrap();
        run_scenario(&ClinicConfig::from_toml_str(crate::CLINIC_CONFIG).unwrap()).unwrap();
    }
}
