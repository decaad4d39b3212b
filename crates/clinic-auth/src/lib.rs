//! # clinic-auth
//!
//! Session simulation for the clinic data layer.
//!
//! - `AuthService` signs users in against the `users` collection and the
//!   approved entries of a pending-user store
//! - `password` holds the salted SHA-256 scheme and the strength rules
//! - `pending` holds the registration records and their durable stores
//!
//! ## Usage
//!
//! ```rust,ignore
//! use clinic_auth::{AuthService, Credentials};
//! use clinic_contracts::config::AuthSettings;
//!
//! let auth = AuthService::new(&store, AuthSettings::default());
//! let response = auth.sign_in(&Credentials::new("123.456.789-00", "admin123"));
//! ```

pub mod password;
pub mod pending;
pub mod service;
pub mod session;

pub use pending::{InMemoryPendingStore, JsonFilePendingStore, PendingStatus, PendingUser, PendingUserStore};
pub use service::{AuthService, Registration};
pub use session::{AuthEvent, AuthState, AuthUser, Credentials, Session, SignIn, Subscription, UserSummary};
