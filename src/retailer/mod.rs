pub mod cart;
pub mod connection;
pub mod converter;
pub mod endpoints;

pub use cart::{submit_cart, CartBackend, CartItemState, CartSubmission, LineStatus, DEFAULT_SUBMIT_DELAY};
pub use connection::{rule_from_product, RetailerApiError, RetailerClient};
pub use converter::{convert_for_retailer, CartLine, RetailerConversion, RetailerMappingRule, RuleRequest};
pub use endpoints::DEFAULT_RETAILER_BASE_URL;
