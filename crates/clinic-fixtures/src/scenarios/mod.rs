//! End-to-end scenarios over the seeded data layer.
//!
//! Each scenario builds its own store from a `ClinicConfig`, seeds the
//! fixtures and walks through one area of the clinic's daily use, printing
//! what each call returned.

pub mod access;
pub mod agenda;
pub mod login;
pub mod patients;

use clinic_contracts::{
    envelope::Envelope,
    error::{ClinicError, ClinicResult},
};
use clinic_core::Store;
use clinic_policy::ClinicConfig;

use crate::mock_data;

/// A store built from `config` and loaded with every fixture.
pub(crate) fn seeded(config: &ClinicConfig) -> ClinicResult<Store> {
    let store = config.build_store();
    mock_data::seed(&store)?;
    Ok(store)
}

/// Treat an error envelope as a failed scenario step.
pub(crate) fn settle<T>(envelope: Envelope<T>) -> ClinicResult<Option<T>> {
    envelope.into_result().map_err(|e| ClinicError::Internal {
        reason: format!("unexpected failure: {}", e.message),
    })
}

/// The message of an envelope that was expected to fail.
pub(crate) fn failure<T>(envelope: &Envelope<T>) -> ClinicResult<String> {
    envelope
        .message()
        .map(str::to_string)
        .ok_or_else(|| ClinicError::Internal {
            reason: "operation succeeded but was expected to fail".to_string(),
        })
}
