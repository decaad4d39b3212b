//! # clinic-fixtures
//!
//! Fixture data and runnable scenarios for the clinic data layer.
//!
//! - `mock_data` holds the clinic's fixture rows and builds seeded stores
//! - `scenarios` walks the agenda, the patient register, staff sign-in and
//!   the role access rules end to end
//!
//! All data is fictional.

pub mod mock_data;
pub mod scenarios;

pub use mock_data::{seed, seeded_store};

/// The bundled clinic configuration: role access rules and zero latency.
pub const CLINIC_CONFIG: &str = include_str!("../policies/clinic.toml");
