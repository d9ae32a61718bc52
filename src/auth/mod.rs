//! Credentials, token storage, refresh coordination, and session lifecycle.

pub mod credentials;
pub mod expiry;
pub mod jwt;
pub mod refresh;
pub mod session;
pub mod store;

pub use credentials::{parse_credentials, Credentials, UserProfile};
pub use refresh::{RefreshCoordinator, RefreshTicket};
pub use store::TokenStore;
