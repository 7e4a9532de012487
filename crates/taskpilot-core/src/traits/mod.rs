//! Core traits defined in `taskpilot-core` and implemented by other crates.

pub mod credential_store;

pub use credential_store::{ACCESS_TOKEN_KEY, CredentialStore, REFRESH_TOKEN_KEY};
