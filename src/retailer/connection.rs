use dotenv::dotenv;
use reqwest::Client;
use std::env;
use thiserror::Error;

use super::converter::RetailerMappingRule;
use super::endpoints::{
    BasketAmountRequest, BasketResponse, Product, ProductFeedRequest, ProductFeedResponse,
};

#[derive(Debug, Error)]
pub enum RetailerApiError {
    #[error("API key not found in environment: {0}")]
    MissingApiKey(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("API error {status}: {error_body}")]
    ApiError {
        status: reqwest::StatusCode,
        error_body: String,
    },
}

/// Client for the retailer's customer API (basket and product catalog).
#[derive(Debug, Clone)]
pub struct RetailerClient {
    base_url: String,
    api_key: String,
    http: Client,
}

impl RetailerClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http: Client::new(),
        }
    }

    /// Reads the API key from `api_key_env_var`, loading `.env` first.
    pub fn from_env(base_url: &str, api_key_env_var: &str) -> Result<Self, RetailerApiError> {
        dotenv().ok();
        let api_key = env::var(api_key_env_var)
            .map_err(|_| RetailerApiError::MissingApiKey(api_key_env_var.to_string()))?;
        Ok(Self::new(base_url, &api_key))
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RetailerApiError> {
        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(RetailerApiError::ApiError { status, error_body });
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Sets the basket amount of one product; returns the whole basket.
    pub async fn set_basket_amount(
        &self,
        product_id: &str,
        amount: f64,
    ) -> Result<BasketResponse, RetailerApiError> {
        let url = format!("{}/basket/{}/amount", self.base_url, product_id);
        let response = self
            .http
            .put(url)
            .header("auth", &self.api_key)
            .json(&BasketAmountRequest { amount })
            .send()
            .await?;
        Self::read_json(response).await
    }

    pub async fn search_products(&self, query: &str) -> Result<Vec<Product>, RetailerApiError> {
        let url = format!("{}/catalog/product/feed", self.base_url);
        let response = self
            .http
            .post(url)
            .header("auth", &self.api_key)
            .json(&ProductFeedRequest::search(query))
            .send()
            .await?;
        let feed: ProductFeedResponse = Self::read_json(response).await?;
        Ok(feed.content.map(|c| c.items).unwrap_or_default())
    }
}

/// Derives a mapping rule for `ingredient_name` from a catalog product.
///
/// Weight only: packaged, size in g. Weight and volume: packaged, size in ml.
/// Otherwise the product is sold loose by its quantum step; a kg unit name
/// is recorded as g.
pub fn rule_from_product(ingredient_name: &str, product: &Product) -> Option<RetailerMappingRule> {
    let md = &product.master_data;
    let (unit, package_size, is_package) = match (md.weight, md.volume) {
        (Some(weight), None) if weight > 0.0 => ("g".to_string(), weight, true),
        (Some(_), Some(volume)) if volume > 0.0 => ("ml".to_string(), volume, true),
        _ => {
            let unit = match md.unit_name.as_deref() {
                Some("kg") | None => "g".to_string(),
                Some(other) => other.to_string(),
            };
            (unit, md.quantum_step?, false)
        }
    };
    if package_size <= 0.0 {
        return None;
    }
    Some(RetailerMappingRule {
        name: ingredient_name.to_string(),
        id: product.id.as_string(),
        package_size,
        unit,
        is_package,
    })
}
