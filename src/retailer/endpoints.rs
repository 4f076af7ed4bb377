use serde::{Deserialize, Serialize};

pub const DEFAULT_RETAILER_BASE_URL: &str = "https://www.perekrestok.ru/api/customer/1.4.1.0";
pub const PRODUCT_FEED_PAGE_SIZE: u32 = 48;

/// Product ids come back as numbers or strings depending on the endpoint.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum ProductId {
    Number(u64),
    Text(String),
}

impl ProductId {
    pub fn as_string(&self) -> String {
        match self {
            ProductId::Number(n) => n.to_string(),
            ProductId::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct BasketAmountRequest {
    pub amount: f64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BasketResponse {
    #[serde(default)]
    pub content: Option<BasketContent>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BasketContent {
    #[serde(default)]
    pub items: Vec<BasketItem>,
    #[serde(default)]
    pub invoice: Option<Invoice>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BasketProduct {
    pub id: ProductId,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BasketItem {
    #[serde(default)]
    pub product: Option<BasketProduct>,
    /// Minor currency units per 1000 amount units.
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub amount: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    #[serde(default)]
    pub summary_cost: Option<f64>,
    #[serde(default)]
    pub item_number: Option<u32>,
    #[serde(default)]
    pub delivery_cost: Option<f64>,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProductFeedFilter {
    pub text_query: String,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProductFeedRequest {
    pub page: u32,
    pub per_page: u32,
    pub filter: ProductFeedFilter,
    pub with_best_product_reviews: bool,
}

impl ProductFeedRequest {
    pub fn search(query: &str) -> Self {
        Self {
            page: 1,
            per_page: PRODUCT_FEED_PAGE_SIZE,
            filter: ProductFeedFilter {
                text_query: query.to_string(),
            },
            with_best_product_reviews: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ProductFeedResponse {
    #[serde(default)]
    pub content: Option<ProductFeedContent>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ProductFeedContent {
    #[serde(default)]
    pub items: Vec<Product>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub title: Option<String>,
    pub master_data: MasterData,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct MasterData {
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub quantum_step: Option<f64>,
    #[serde(default)]
    pub unit_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basket_response_parses() {
        let body = r#"{
            "content": {
                "items": [
                    { "product": { "id": 42 }, "price": 8990, "amount": 2000 },
                    { "product": { "id": "43" }, "price": 100, "amount": 0 }
                ],
                "invoice": { "summaryCost": 17980, "itemNumber": 2, "deliveryCost": 0 }
            }
        }"#;
        let response: BasketResponse = serde_json::from_str(body).unwrap();
        let content = response.content.unwrap();
        assert_eq!(content.items.len(), 2);
        assert_eq!(content.items[0].product.as_ref().unwrap().id.as_string(), "42");
        assert_eq!(content.items[1].product.as_ref().unwrap().id.as_string(), "43");
        assert_eq!(content.invoice.unwrap().item_number, Some(2));
    }

    #[test]
    fn test_product_feed_request_shape() {
        let value = serde_json::to_value(ProductFeedRequest::search("milk")).unwrap();
        assert_eq!(value["perPage"], 48);
        assert_eq!(value["filter"]["textQuery"], "milk");
        assert_eq!(value["withBestProductReviews"], false);
    }

    #[test]
    fn test_product_parses_master_data() {
        let body = r#"{ "id": 7, "title": "Milk 3.2%", "masterData": { "weight": 970, "volume": 930 } }"#;
        let product: Product = serde_json::from_str(body).unwrap();
        assert_eq!(product.master_data.volume, Some(930.0));
        assert_eq!(product.master_data.quantum_step, None);
    }
}
