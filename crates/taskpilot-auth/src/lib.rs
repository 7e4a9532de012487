//! # taskpilot-auth
//!
//! Client-side session handling for TaskPilot.
//!
//! ## Modules
//!
//! - `credential`: credential store implementations (in-memory, JSON file)
//! - `token`: unverified access-token expiry decoding
//! - `session`: the session authorizer and its refresh exchange seam
//! - `guard`: route guard gating protected views on the authorizer

pub mod credential;
pub mod guard;
pub mod session;
pub mod token;

pub use credential::{Credentials, FileCredentialStore, MemoryCredentialStore};
pub use guard::{GuardState, GuardedRoute, Navigation, RouteGuard};
pub use session::{RefreshError, SessionAuthorizer, SessionState, TokenRefresher};
pub use token::{DecodedToken, TokenError, TokenInspector};
