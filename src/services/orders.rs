//! Order history endpoints.

use crate::api::{endpoints, ApiClient, ApiError};
use serde::{Deserialize, Serialize};
use tracing::instrument;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_name: String,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: u64,
    pub status: String,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub created_date: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

#[derive(Clone)]
pub struct OrdersService {
    client: ApiClient,
}

impl OrdersService {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// # Errors
    /// Returns the classified [`ApiError`] on failure.
    #[instrument(skip(self))]
    pub async fn list_for_customer(&self, customer_id: &str) -> Result<Vec<Order>, ApiError> {
        self.client
            .get_json(&endpoints::orders_by_customer(customer_id))
            .await
    }

    /// # Errors
    /// Returns [`ApiError::NotFound`] for an unknown id.
    #[instrument(skip(self))]
    pub async fn get(&self, id: u64) -> Result<Order, ApiError> {
        self.client.get_json(&endpoints::order_by_id(id)).await
    }
}
