//! Fixture data for the clinic.
//!
//! Five staff accounts, eight patients, eight professionals, fifteen
//! services and fifteen appointments. Every name, CPF and phone number is
//! fictional. Staff passwords are stored in plaintext so the first sign-in
//! of each account exercises the hash migration.

use serde_json::{json, Value};

use clinic_contracts::{error::ClinicResult, record::Record, table::Table};
use clinic_core::Store;

// ── Staff accounts ────────────────────────────────────────────────────────────

/// (id, name, cpf, password, email, access level, first access)
const USERS: [(&str, &str, &str, &str, &str, &str, bool); 5] = [
    ("1", "Administrador", "12345678900", "admin123", "admin@clinica.com", "admin", false),
    ("2", "Recepcionista", "98765432100", "recep123", "recepcao@clinica.com", "reception", false),
    ("3", "Profissional", "11122233344", "prof123", "profissional@clinica.com", "professional", false),
    ("4", "Desenvolvedor Principal", "33333333333", "333", "dev@clinica.com", "developer", true),
    ("5", "Desenvolvedor", "55555555555", "555", "dev@clinica.com", "developer", false),
];

pub fn users() -> Vec<Value> {
    USERS
        .iter()
        .map(|(id, name, cpf, password, email, level, first_access)| {
            json!({
                "id": id,
                "name": name,
                "cpf": cpf,
                "password": password,
                "email": email,
                "access_level": level,
                "first_access": first_access,
                "created_at": "2024-01-01T00:00:00Z",
                "updated_at": "2024-01-01T00:00:00Z",
            })
        })
        .collect()
}

// ── Patients ──────────────────────────────────────────────────────────────────

/// (id, name, cpf, phone, birth date, gender, address, zip code, registered at)
const PATIENTS: [(&str, &str, &str, &str, &str, &str, &str, &str, &str); 8] = [
    ("1", "João Silva", "123.456.789-00", "(11) 99999-9999", "1990-01-15", "masculino", "Rua das Flores, 123", "01234-567", "2024-01-15T10:00:00Z"),
    ("2", "Maria Santos", "987.654.321-00", "(11) 88888-8888", "1985-05-20", "feminino", "Av. Paulista, 456", "01310-100", "2024-01-20T14:30:00Z"),
    ("3", "Pedro Oliveira", "111.222.333-44", "(11) 77777-7777", "1978-12-03", "masculino", "Rua Augusta, 789", "01305-000", "2024-02-01T09:15:00Z"),
    ("4", "Ana Costa", "555.666.777-88", "(11) 66666-6666", "1992-08-10", "feminino", "Av. Faria Lima, 1000", "04538-132", "2024-02-05T16:45:00Z"),
    ("5", "Carlos Mendes", "999.888.777-66", "(11) 55555-5555", "1965-03-25", "masculino", "Rua Oscar Freire, 200", "01426-000", "2024-02-10T11:20:00Z"),
    ("6", "Fernanda Lima", "444.333.222-11", "(11) 44444-4444", "1988-11-18", "feminino", "Rua Bela Cintra, 500", "01415-000", "2024-02-15T13:10:00Z"),
    ("7", "Roberto Alves", "777.888.999-00", "(11) 33333-3333", "1975-07-12", "masculino", "Av. Rebouças, 300", "05402-000", "2024-02-20T08:30:00Z"),
    ("8", "Juliana Pereira", "222.111.000-99", "(11) 22222-2222", "1995-04-30", "feminino", "Rua Haddock Lobo, 150", "01414-000", "2024-02-25T15:45:00Z"),
];

pub fn patients() -> Vec<Value> {
    PATIENTS
        .iter()
        .map(|(id, name, cpf, phone, birth, gender, address, zip, registered)| {
            // E-mail is the lowercase first and last name without accents.
            let email = format!("{}@email.com", email_local_part(name));
            json!({
                "id": id,
                "name": name,
                "cpf": cpf,
                "phone": phone,
                "birth_date": birth,
                "gender": gender,
                "email": email,
                "address": address,
                "city": "São Paulo",
                "state": "SP",
                "zip_code": zip,
                "created_at": registered,
                "updated_at": registered,
            })
        })
        .collect()
}

fn email_local_part(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| match c {
            'ã' | 'á' | 'â' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'õ' | 'ô' => 'o',
            'ú' => 'u',
            'ç' => 'c',
            ' ' => '.',
            other => other,
        })
        .collect()
}

// ── Professionals ─────────────────────────────────────────────────────────────

/// (id, name, specialty, CRM/CRO)
const PROFESSIONALS: [(&str, &str, &str, &str); 8] = [
    ("1", "Dr. Carlos Mendes", "Cardiologia", "12345"),
    ("2", "Dra. Ana Silva", "Pediatria", "67890"),
    ("3", "Dr. Pedro Santos", "Neurologia", "54321"),
    ("4", "Dra. Maria Oliveira", "Ginecologia", "98765"),
    ("5", "Dr. Roberto Lima", "Ortopedia", "13579"),
    ("6", "Dra. Fernanda Costa", "Dermatologia", "24680"),
    ("7", "Dr. João Alves", "Oftalmologia", "11223"),
    ("8", "Dra. Juliana Pereira", "Psicologia", "33445"),
];

pub fn professionals() -> Vec<Value> {
    PROFESSIONALS
        .iter()
        .enumerate()
        .map(|(i, (id, name, specialty, license))| {
            let created = format!("2024-01-{:02}T08:00:00Z", i + 1);
            json!({
                "id": id,
                "name": name,
                "specialty": specialty,
                "license_number": license,
                "status": "active",
                "created_at": created,
                "updated_at": created,
            })
        })
        .collect()
}

// ── Services ──────────────────────────────────────────────────────────────────

/// (id, name, price, duration in minutes)
const SERVICES: [(&str, &str, f64, u32); 15] = [
    ("1", "Consulta Médica", 150.0, 30),
    ("2", "Consulta Cardiológica", 200.0, 45),
    ("3", "Consulta Pediátrica", 120.0, 30),
    ("4", "Consulta Neurológica", 250.0, 60),
    ("5", "Consulta Ginecológica", 180.0, 40),
    ("6", "Consulta Ortopédica", 160.0, 30),
    ("7", "Consulta Dermatológica", 140.0, 25),
    ("8", "Consulta Oftalmológica", 130.0, 30),
    ("9", "Sessão de Psicologia", 100.0, 50),
    ("10", "Exame de Sangue", 80.0, 15),
    ("11", "Ultrassom", 120.0, 30),
    ("12", "Raio-X", 90.0, 20),
    ("13", "Eletrocardiograma", 60.0, 15),
    ("14", "Teste Ergométrico", 200.0, 60),
    ("15", "Endoscopia", 300.0, 45),
];

pub fn services() -> Vec<Value> {
    SERVICES
        .iter()
        .map(|(id, name, price, duration)| {
            json!({
                "id": id,
                "name": name,
                "price": price,
                "duration_min": duration,
                "active": true,
                "created_at": "2024-01-01T00:00:00Z",
                "updated_at": "2024-01-01T00:00:00Z",
            })
        })
        .collect()
}

// ── Appointments ──────────────────────────────────────────────────────────────

/// (id, patient, professional, service, date, time, status, amount,
/// payment method, notes). A payment method marks a settled appointment.
#[allow(clippy::type_complexity)]
const APPOINTMENTS: [(&str, &str, &str, &str, &str, &str, &str, f64, Option<&str>, &str); 15] = [
    ("1", "1", "1", "2", "2024-12-20", "09:00", "completed", 200.0, Some("Cartão de Crédito"), "Consulta de rotina - check-up anual"),
    ("2", "2", "2", "3", "2024-12-20", "14:00", "completed", 120.0, Some("PIX"), "Consulta pediátrica - vacinação"),
    ("3", "3", "3", "4", "2024-12-19", "10:30", "completed", 250.0, Some("Dinheiro"), "Avaliação neurológica - dor de cabeça"),
    ("4", "4", "4", "5", "2024-12-19", "15:30", "completed", 180.0, Some("Cartão de Débito"), "Consulta ginecológica - preventivo"),
    ("5", "5", "5", "6", "2024-12-18", "08:00", "completed", 160.0, Some("PIX"), "Consulta ortopédica - dor no joelho"),
    ("6", "6", "6", "7", "2024-12-18", "11:00", "completed", 140.0, Some("Cartão de Crédito"), "Consulta dermatológica - manchas na pele"),
    ("7", "7", "7", "8", "2024-12-17", "16:00", "completed", 130.0, Some("Dinheiro"), "Consulta oftalmológica - exame de vista"),
    ("8", "8", "8", "9", "2024-12-17", "14:30", "completed", 100.0, Some("PIX"), "Sessão de psicologia - ansiedade"),
    ("9", "1", "1", "10", "2024-12-21", "08:30", "scheduled", 80.0, None, "Exame de sangue - check-up"),
    ("10", "2", "2", "11", "2024-12-21", "10:00", "confirmed", 120.0, None, "Ultrassom abdominal"),
    ("11", "3", "3", "12", "2024-12-22", "09:30", "scheduled", 90.0, None, "Raio-X do crânio"),
    ("12", "4", "1", "13", "2024-12-22", "11:30", "confirmed", 60.0, None, "Eletrocardiograma de rotina"),
    ("13", "5", "1", "14", "2024-12-23", "07:00", "scheduled", 200.0, None, "Teste ergométrico - avaliação cardíaca"),
    ("14", "6", "4", "15", "2024-12-23", "14:00", "confirmed", 300.0, None, "Endoscopia digestiva"),
    ("15", "7", "2", "3", "2024-12-24", "08:00", "scheduled", 120.0, None, "Consulta pediátrica - acompanhamento"),
];

pub fn appointments() -> Vec<Value> {
    APPOINTMENTS
        .iter()
        .map(|(id, patient, professional, service, date, time, status, amount, method, notes)| {
            let payments: Vec<Value> = method
                .iter()
                .map(|m| json!({ "status": "paid", "amount": amount, "method": m }))
                .collect();
            let booked = format!("{}T{}:00Z", date, time);
            json!({
                "id": id,
                "patient_id": patient,
                "professional_id": professional,
                "service_id": service,
                "date": date,
                "time": time,
                "status": status,
                "amount": amount,
                "notes": notes,
                "payments": payments,
                "created_at": booked,
                "updated_at": booked,
            })
        })
        .collect()
}

// ── Assembly ──────────────────────────────────────────────────────────────────

/// Every fixture as a validated record, table by table.
pub fn fixture_records() -> ClinicResult<Vec<Record>> {
    let tables = [
        (Table::Users, users()),
        (Table::Patients, patients()),
        (Table::Professionals, professionals()),
        (Table::Services, services()),
        (Table::Appointments, appointments()),
    ];

    let mut records = Vec::new();
    for (table, rows) in tables {
        for row in rows {
            records.push(Record::from_json(table, row)?);
        }
    }
    Ok(records)
}

/// Load every fixture into `store`.
pub fn seed(store: &Store) -> ClinicResult<usize> {
    store.system().seed(fixture_records()?)
}

/// A fresh store holding every fixture and no access policy.
pub fn seeded_store() -> ClinicResult<Store> {
    let store = Store::new();
    seed(&store)?;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use clinic_contracts::record::AppointmentStatus;
    use clinic_core::CountMode;

    use super::*;

    #[test]
    fn every_fixture_is_valid() {
        let records = fixture_records().unwrap();
        assert_eq!(records.len(), 5 + 8 + 8 + 15 + 15);
    }

    #[test]
    fn seeded_store_counts_per_table() {
        let store = seeded_store().unwrap();
        assert_eq!(store.len(Table::Users).unwrap(), 5);
        assert_eq!(store.len(Table::Patients).unwrap(), 8);
        assert_eq!(store.len(Table::Professionals).unwrap(), 8);
        assert_eq!(store.len(Table::Services).unwrap(), 15);
        assert_eq!(store.len(Table::Appointments).unwrap(), 15);
    }

    #[test]
    fn patient_emails_drop_accents() {
        let store = seeded_store().unwrap();
        let joao = store.from(Table::Patients).eq("id", "1").single().data.unwrap();
        assert_eq!(joao["email"], "joao.silva@email.com");
        assert_eq!(joao["city"], "São Paulo");
    }

    #[test]
    fn completed_appointments_carry_one_payment() {
        let store = seeded_store().unwrap();
        let appointments = store.snapshot(Table::Appointments).unwrap();
        for appointment in appointments.iter().filter_map(|r| r.as_appointment()) {
            let expected = usize::from(appointment.status == AppointmentStatus::Completed);
            assert_eq!(appointment.payments.len(), expected, "appointment {}", appointment.id);
        }
    }

    #[test]
    fn professional_one_agenda() {
        let store = seeded_store().unwrap();
        let env = store
            .from(Table::Appointments)
            .eq("professional_id", "1")
            .count(CountMode::Exact)
            .execute();
        assert_eq!(env.count, Some(4));
    }

    #[test]
    fn next_inserted_id_follows_fixtures() {
        let store = seeded_store().unwrap();
        let env = store.from(Table::Services).insert(json!({
            "name": "Holter 24h",
            "price": 250.0,
            "duration_min": 30,
        }));
        assert_eq!(env.data.unwrap().id(), "16");
    }

    #[test]
    fn seeding_twice_is_a_duplicate() {
        let store = seeded_store().unwrap();
        assert!(seed(&store).is_err());
    }
}
