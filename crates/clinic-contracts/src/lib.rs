//! # clinic-contracts
//!
//! Shared types for the clinic data layer: typed records, table names, the
//! `{ data, error, count }` result envelope, access-policy types and the
//! error enum.
//!
//! All crates in the workspace import from here. No query or storage logic
//! lives in this crate.

pub mod config;
pub mod envelope;
pub mod error;
pub mod policy;
pub mod record;
pub mod table;
