//! Trait seams of the data layer.
//!
//! The store calls an `AccessPolicy` before every terminal operation when one
//! is attached. Implementations are trusted and must be deterministic; they
//! run while no store lock is held.

use clinic_contracts::{
    error::ClinicResult,
    policy::{AccessContext, AccessVerdict},
};

/// Decides whether a role may perform an action on a table.
pub trait AccessPolicy: Send + Sync {
    /// Evaluate one operation. `Deny` blocks the operation and its reason is
    /// surfaced in the error envelope.
    fn evaluate(&self, ctx: &AccessContext) -> ClinicResult<AccessVerdict>;
}
