//! Session authorization: deciding, per protected action, whether the
//! stored credentials are usable, refreshing them when they are not.

pub mod authorizer;
pub mod refresher;

pub use authorizer::{SessionAuthorizer, SessionState};
pub use refresher::{RefreshError, TokenRefresher};
