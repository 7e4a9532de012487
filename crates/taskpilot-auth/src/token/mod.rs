//! Access token inspection.

pub mod inspector;

pub use inspector::{DecodedToken, TokenError, TokenInspector};
