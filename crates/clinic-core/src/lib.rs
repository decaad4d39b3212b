//! # clinic-core
//!
//! The in-memory data layer for the clinic application.
//!
//! This crate provides:
//! - `Store`, an owned, shareable set of collections (one per `Table`)
//! - `Query`, the fluent builder with explicit terminal methods
//! - the filter predicate engine behind `eq`/`neq`/`gte`/`lte`/`gt`/`lt`/`in_`
//! - the `AccessPolicy` trait a store consults before each operation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use clinic_contracts::table::Table;
//! use clinic_core::{CountMode, Store};
//!
//! let store = Store::new();
//! let page = store
//!     .from(Table::Appointments)
//!     .eq("professional_id", "1")
//!     .gte("date", "2024-12-20")
//!     .order("date", true)
//!     .count(CountMode::Exact)
//!     .range(0, 9)
//!     .execute();
//! ```

pub mod filter;
pub mod query;
pub mod store;
pub mod traits;

pub use query::{CountMode, Query};
pub use clinic_contracts::config::IdStrategy;
pub use store::Store;
