//! Scenario: staff sign-in.
//!
//! Covers punctuated CPFs, the plaintext-to-hash migration, both failure
//! messages, a forced password change on first access and a
//! self-registration going through approval.

use clinic_auth::{AuthService, Credentials, Registration};
use clinic_contracts::{error::ClinicResult, record::AccessLevel, table::Table};
use clinic_policy::ClinicConfig;

use super::{failure, seeded, settle};

pub fn run_scenario(config: &ClinicConfig) -> ClinicResult<()> {
    println!("=== Scenario: Staff Sign-in ===");
    println!();

    let store = seeded(config)?;
    let auth = AuthService::new(&store, config.auth.clone());
    let subscription = auth.on_auth_state_change(|event| println!("    [event] {:?}", event));

    // ── Fixture accounts ─────────────────────────────────────────────────────

    {
        let signed_in = settle(auth.sign_in(&Credentials::new("123.456.789-00", "admin123")))?;
        if let Some(signed_in) = &signed_in {
            println!(
                "  Signed in:              {} ({})",
                signed_in.user.metadata.name,
                signed_in.user.metadata.access_level.as_str()
            );
            println!("  Token expires in:       {}s", signed_in.session.expires_in);
        }

        let migrated = store
            .system()
            .snapshot(Table::Users)?
            .iter()
            .filter_map(|r| r.as_user())
            .any(|u| u.id == "1" && u.password.is_none() && u.password_hash.is_some());
        println!("  Password migrated:      {}", migrated);

        let wrong = auth.sign_in(&Credentials::new("12345678900", "admin"));
        println!("  Wrong password:         {}", failure(&wrong)?);

        let unknown = auth.sign_in(&Credentials::new("000.000.000-00", "admin123"));
        println!("  Unknown CPF:            {}", failure(&unknown)?);
        println!();
    }

    // ── First access ─────────────────────────────────────────────────────────

    {
        let first = settle(auth.sign_in(&Credentials::new("333.333.333-33", "333")))?;
        let must_change = first.as_ref().is_some_and(|s| s.user.must_change_password);
        println!("  Developer must change:  {}", must_change);

        let weak = auth.update_password("4", "abc");
        println!("  Weak password:          {}", failure(&weak)?);

        settle(auth.update_password("4", "Dev2024"))?;
        let again = settle(auth.sign_in(&Credentials::new("33333333333", "Dev2024")))?;
        let must_change = again.as_ref().is_some_and(|s| s.user.must_change_password);
        println!("  After change, must:     {}", must_change);
        println!();
    }

    // ── Self-registration ────────────────────────────────────────────────────

    {
        let pending = auth.register(Registration {
            name: "Beatriz Souza".to_string(),
            email: "beatriz@clinica.com".to_string(),
            cpf: "321.654.987-00".to_string(),
            phone: "(11) 91234-5678".to_string(),
            position: "Recepcionista".to_string(),
            password: "Bia2024".to_string(),
        })?;
        let credentials = Credentials::new("32165498700", "Bia2024");

        let before = auth.sign_in(&credentials);
        println!("  Before approval:        {}", failure(&before)?);

        auth.approve(&pending.id, AccessLevel::Reception)?;
        let after = settle(auth.sign_in(&credentials))?;
        let level = after
            .as_ref()
            .map(|s| s.user.metadata.access_level.as_str())
            .unwrap_or("none");
        println!("  After approval:         signed in as {}", level);
        println!("  Accounts listed:        {}", auth.list_users()?.len());
        println!();
    }

    settle(auth.sign_out())?;
    println!("  Session after sign-out: {:?}", auth.get_session());
    subscription.unsubscribe();

    println!();
    println!("  Sign-in scenario complete.");
    println!();
    Ok(())
}
