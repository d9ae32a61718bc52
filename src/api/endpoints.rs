//! Backend endpoint paths and the allow-lists the pipeline consults.

pub const AUTH_LOGIN: &str = "/auth/login";
pub const AUTH_LOGOUT: &str = "/auth/logout";
pub const AUTH_REFRESH: &str = "/auth/refresh";
pub const AUTH_INTROSPECT: &str = "/auth/introspect";
pub const AUTH_ME: &str = "/auth/me";
pub const AUTH_CHANGE_PASSWORD: &str = "/auth/change-password";

pub const PRODUCTS: &str = "/products";
pub const PRODUCTS_SEARCH: &str = "/products/search";
pub const ORDERS: &str = "/orders";
pub const CHECKOUT: &str = "/checkout";

#[must_use]
pub fn product_by_id(id: u64) -> String {
    format!("/products/{id}")
}

#[must_use]
pub fn order_by_id(id: u64) -> String {
    format!("/orders/{id}")
}

#[must_use]
pub fn orders_by_customer(customer_id: &str) -> String {
    format!("/orders/customer/{customer_id}")
}

/// Endpoints that must work pre-authentication. They never carry a bearer
/// token and a 401 from them never starts a refresh, which also keeps the
/// refresh call itself out of the pipeline.
const PUBLIC_ENDPOINTS: &[&str] = &[AUTH_LOGIN, AUTH_LOGOUT, AUTH_REFRESH, AUTH_INTROSPECT];

/// Endpoints whose 401 responses are handed back to the caller untouched,
/// bypassing the refresh pipeline.
const REFRESH_EXEMPT_ENDPOINTS: &[&str] = &[CHECKOUT];

#[must_use]
pub fn is_public_endpoint(path: &str) -> bool {
    PUBLIC_ENDPOINTS.iter().any(|endpoint| path.contains(endpoint))
}

#[must_use]
pub fn is_refresh_exempt(path: &str) -> bool {
    REFRESH_EXEMPT_ENDPOINTS
        .iter()
        .any(|endpoint| path.contains(endpoint))
}
