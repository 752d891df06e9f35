//! Session subsystem.
//!
//! # Data Flow
//! ```text
//! login / complete_registration (auth.rs)
//!     → Credentials saved in credentials.rs (memory + optional JSON file)
//!     → current user published to subscribers
//!
//! any API call answered 401 (http::client)
//!     → CredentialStore::clear → subscribers see logout
//! ```

pub mod auth;
pub mod credentials;
pub mod otp;

pub use auth::{AuthError, AuthService, EmailStatus};
pub use credentials::{CredentialStore, Credentials, User};
pub use otp::{OtpCode, PasswordIssue};
