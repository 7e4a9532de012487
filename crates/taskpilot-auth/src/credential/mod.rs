//! Credential store implementations and the access/refresh pair helper.

pub mod credentials;
pub mod file;
pub mod memory;

pub use credentials::Credentials;
pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;
