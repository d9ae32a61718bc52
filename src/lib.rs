//! Client SDK for the ModaMint storefront backend.
//!
//! The crate is organized around an authenticated HTTP pipeline:
//! every outgoing call carries a bearer token read from a durable
//! [`auth::TokenStore`], a 401 triggers a single de-duplicated token
//! refresh coordinated by [`auth::RefreshCoordinator`], and requests
//! that stall behind the refresh are released in FIFO order once it
//! completes. See [`api::ApiClient`] for the entry point.

pub mod api;
pub mod auth;
pub mod cli;
pub mod services;

pub use api::{ApiClient, ApiError};
pub use auth::session::{AuthSession, SessionEvent};
pub use auth::store::TokenStore;
