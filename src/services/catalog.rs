//! Product catalog endpoints.

use crate::api::{endpoints, ApiClient, ApiError};
use serde::{Deserialize, Serialize};
use tracing::instrument;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

#[derive(Clone)]
pub struct CatalogService {
    client: ApiClient,
}

impl CatalogService {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// # Errors
    /// Returns the classified [`ApiError`] on failure.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Product>, ApiError> {
        self.client.get_json(endpoints::PRODUCTS).await
    }

    /// # Errors
    /// Returns [`ApiError::NotFound`] for an unknown id.
    #[instrument(skip(self))]
    pub async fn get(&self, id: u64) -> Result<Product, ApiError> {
        self.client.get_json(&endpoints::product_by_id(id)).await
    }

    /// # Errors
    /// Returns the classified [`ApiError`] on failure.
    #[instrument(skip(self))]
    pub async fn search(&self, keyword: &str) -> Result<Vec<Product>, ApiError> {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("keyword", keyword)
            .finish();
        self.client
            .get_json(&format!("{}?{query}", endpoints::PRODUCTS_SEARCH))
            .await
    }
}
