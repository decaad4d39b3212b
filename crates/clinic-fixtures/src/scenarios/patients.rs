//! Scenario: reception working the patient register.

use serde_json::json;

use clinic_contracts::{error::ClinicResult, record::AccessLevel, table::Table};
use clinic_policy::ClinicConfig;

use super::{failure, seeded, settle};

pub fn run_scenario(config: &ClinicConfig) -> ClinicResult<()> {
    println!("=== Scenario: Patient Register ===");
    println!();

    let store = seeded(config)?.acting_as(AccessLevel::Reception.as_str());

    // ── Listing ──────────────────────────────────────────────────────────────

    {
        let rows = settle(
            store
                .from(Table::Patients)
                .select("id,name,phone")
                .order("name", true)
                .execute(),
        )?
        .unwrap_or_default();
        println!("  Patients by name:");
        for row in &rows {
            println!(
                "    {:>2}  {:<18} {}",
                row["id"].as_str().unwrap_or("?"),
                row["name"].as_str().unwrap_or("?"),
                row["phone"].as_str().unwrap_or("?"),
            );
        }
        println!();
    }

    // ── Lookups ──────────────────────────────────────────────────────────────

    {
        let found = settle(
            store
                .from(Table::Patients)
                .eq("cpf", "123.456.789-00")
                .single(),
        )?;
        let name = found
            .as_ref()
            .and_then(|r| r["name"].as_str())
            .unwrap_or("none");
        println!("  CPF 123.456.789-00:     {}", name);

        let selected = settle(
            store
                .from(Table::Patients)
                .in_("id", ["1", "3", "5"])
                .select("name")
                .execute(),
        )?
        .unwrap_or_default();
        let names: Vec<&str> = selected.iter().filter_map(|r| r["name"].as_str()).collect();
        println!("  Patients 1, 3 and 5:    {}", names.join(", "));

        let born_before = settle(
            store
                .from(Table::Patients)
                .lt("birth_date", "1980-01-01")
                .execute(),
        )?
        .unwrap_or_default();
        println!("  Born before 1980:       {}", born_before.len());
        println!();
    }

    // ── Registration and edits ───────────────────────────────────────────────

    {
        let created = settle(store.from(Table::Patients).insert(json!({
            "name": "Lucas Rocha",
            "cpf": "741.852.963-00",
            "phone": "(11) 90000-1111",
            "birth_date": "2001-06-09",
            "city": "São Paulo",
            "state": "SP",
        })))?;
        let id = created.map(|r| r.id().to_string()).unwrap_or_default();
        println!("  Registered patient:     id {}", id);

        settle(
            store
                .from(Table::Patients)
                .update(json!({ "phone": "(11) 90000-2222" }))
                .eq("id", id.as_str()),
        )?;
        println!("  Phone updated:          id {}", id);

        let missing = store
            .from(Table::Patients)
            .update(json!({ "phone": "(11) 90000-3333" }))
            .eq("id", "99");
        println!("  Update id 99:           {}", failure(&missing)?);

        let invalid = store
            .from(Table::Patients)
            .insert(json!({ "name": "Sem CPF", "phone": "(11) 90000-4444" }));
        println!("  Insert without CPF:     {}", failure(&invalid)?);
        println!();
    }

    println!("  Patient scenario complete.");
    println!();
    Ok(())
}
