//! Scenario: the appointment agenda.
//!
//! A professional's agenda for a date window, the day's revenue, a status
//! change, booking and cancelling a slot, and paging through every
//! appointment.

use serde_json::{json, Value};
use tracing::info;

use clinic_contracts::{error::ClinicResult, record::AccessLevel, table::Table};
use clinic_core::CountMode;
use clinic_policy::ClinicConfig;

use super::{failure, seeded, settle};

const PAGE_SIZE: usize = 5;

pub fn run_scenario(config: &ClinicConfig) -> ClinicResult<()> {
    println!("=== Scenario: Appointment Agenda ===");
    println!();

    let store = seeded(config)?.acting_as(AccessLevel::Admin.as_str());

    // ── Agenda window ────────────────────────────────────────────────────────

    {
        println!("  Dr. Carlos Mendes (professional 1), 2024-12-20 to 2024-12-23");
        let env = store
            .from(Table::Appointments)
            .eq("professional_id", "1")
            .gte("date", "2024-12-20")
            .lte("date", "2024-12-23")
            .order("date", true)
            .order("time", true)
            .count(CountMode::Exact)
            .execute();
        let count = env.count.unwrap_or_default();
        for row in settle(env)?.unwrap_or_default() {
            println!("    {}", agenda_line(&row));
        }
        println!("  Appointments in window: {}", count);
        println!();
    }

    // ── Revenue ──────────────────────────────────────────────────────────────

    {
        let rows = settle(
            store
                .from(Table::Appointments)
                .eq("status", "completed")
                .select("id,amount")
                .execute(),
        )?
        .unwrap_or_default();
        let total: f64 = rows.iter().filter_map(|r| r["amount"].as_f64()).sum();
        println!("  Completed appointments: {}", rows.len());
        println!("  Revenue received:       R$ {:.2}", total);
        println!();
    }

    // ── Status change ────────────────────────────────────────────────────────

    {
        let updated = settle(
            store
                .from(Table::Appointments)
                .update(json!({ "status": "confirmed" }))
                .eq("id", "9"),
        )?;
        if let Some(record) = updated.as_ref().and_then(|r| r.as_appointment()) {
            println!("  Appointment 9 status:   {:?}", record.status);
        }
    }

    // ── Booking and cancelling ───────────────────────────────────────────────

    {
        let booked = settle(store.from(Table::Appointments).insert(json!({
            "patient_id": "8",
            "professional_id": "6",
            "service_id": "7",
            "date": "2024-12-26",
            "time": "10:15",
            "amount": 140.0,
            "notes": "Retorno dermatológico",
        })))?;
        let id = booked.map(|r| r.id().to_string()).unwrap_or_default();
        println!("  Booked appointment:     id {}", id);
        info!(appointment_id = %id, "appointment booked");

        settle(store.from(Table::Appointments).delete().eq("id", id.as_str()))?;
        println!("  Cancelled appointment:  id {}", id);

        let again = store.from(Table::Appointments).delete().eq("id", id.as_str());
        println!("  Cancelling again:       {}", failure(&again)?);
        println!();
    }

    // ── Paging ───────────────────────────────────────────────────────────────

    {
        let mut from = 0;
        loop {
            let env = store
                .from(Table::Appointments)
                .order("date", false)
                .order("time", false)
                .count(CountMode::Exact)
                .range(from, from + PAGE_SIZE - 1)
                .execute();
            let total = env.count.unwrap_or_default();
            let page = settle(env)?.unwrap_or_default();
            if page.is_empty() {
                break;
            }
            let ids: Vec<&str> = page.iter().filter_map(|r| r["id"].as_str()).collect();
            println!(
                "  Page {} of {}: ids {}",
                from / PAGE_SIZE + 1,
                total.div_ceil(PAGE_SIZE),
                ids.join(", ")
            );
            from += PAGE_SIZE;
        }
        println!();
    }

    println!("  Agenda scenario complete.");
    println!();
    Ok(())
}

fn agenda_line(row: &Value) -> String {
    format!(
        "{} {}  patient {:<2} service {:<2} {:<10} {}",
        row["date"].as_str().unwrap_or("?"),
        row["time"].as_str().unwrap_or("?"),
        row["patient_id"].as_str().unwrap_or("?"),
        row["service_id"].as_str().unwrap_or("?"),
        row["status"].as_str().unwrap_or("?"),
        row["notes"].as_str().unwrap_or(""),
    )
}
