//! Typed wrappers over the storefront's protected endpoints.

pub mod catalog;
pub mod orders;

pub use catalog::{CatalogService, Product};
pub use orders::{Order, OrdersService};
