use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use super::connection::{RetailerApiError, RetailerClient};
use super::converter::{CartLine, AMOUNT_UNITS_PER_PACKAGE};
use super::endpoints::{BasketResponse, Invoice};

/// Pause between two basket updates.
pub const DEFAULT_SUBMIT_DELAY: Duration = Duration::from_millis(500);

/// Anything that can set a basket amount for a product.
pub trait CartBackend {
    fn set_amount(
        &self,
        product_id: &str,
        amount: f64,
    ) -> impl Future<Output = Result<BasketResponse, RetailerApiError>> + Send;
}

impl CartBackend for RetailerClient {
    async fn set_amount(
        &self,
        product_id: &str,
        amount: f64,
    ) -> Result<BasketResponse, RetailerApiError> {
        self.set_basket_amount(product_id, amount).await
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LineStatus {
    Initial,
    Processing,
    Success,
    Error,
    OutOfStock,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CartItemState {
    pub line: CartLine,
    pub status: LineStatus,
    pub message: Option<String>,
    /// Major currency units per 1000 amount units, from the basket.
    pub price: Option<f64>,
    /// Amount the basket actually holds after submission.
    pub amount: f64,
}

impl CartItemState {
    pub fn new(line: CartLine) -> Self {
        let amount = line.amount;
        Self {
            line,
            status: LineStatus::Initial,
            message: None,
            price: None,
            amount,
        }
    }

    pub fn cost(&self) -> Option<f64> {
        self.price.map(|p| p * self.amount / AMOUNT_UNITS_PER_PACKAGE)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct CartSubmission {
    pub items: Vec<CartItemState>,
    pub invoice: Option<Invoice>,
}

impl CartSubmission {
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.status == LineStatus::Success).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &CartItemState> {
        self.items.iter().filter(|i| i.status != LineStatus::Success)
    }

    /// Basket total in major currency units, if the retailer reported one.
    pub fn summary_cost(&self) -> Option<f64> {
        self.invoice.as_ref()?.summary_cost.map(|c| c / 100.0)
    }

    fn merge_invoice(&mut self, invoice: Option<Invoice>) {
        let Some(mut invoice) = invoice else {
            return;
        };
        // Some responses omit the total; keep the last known one.
        if invoice.summary_cost.is_none() {
            invoice.summary_cost = self.invoice.as_ref().and_then(|i| i.summary_cost);
        }
        self.invoice = Some(invoice);
    }
}

fn apply_response(state: &mut CartItemState, response: &BasketResponse) {
    let basket_item = response
        .content
        .as_ref()
        .into_iter()
        .flat_map(|c| c.items.iter())
        .find(|item| {
            item.product
                .as_ref()
                .is_some_and(|p| p.id.as_string() == state.line.product_id)
        });

    // The basket only lists products it actually holds.
    match basket_item {
        Some(item) if item.amount.unwrap_or(0.0) > 0.0 => {
            state.status = LineStatus::Success;
            state.amount = item.amount.unwrap_or(0.0);
            state.price = item.price.map(|p| p / 100.0);
            state.message = None;
        }
        _ => {
            state.status = LineStatus::OutOfStock;
            state.amount = 0.0;
            state.message = Some("product was not added to the basket".to_string());
        }
    }
}

/// Pushes every line into the basket one at a time, waiting `delay` between
/// requests. A failing line is recorded and the rest still go through.
pub async fn submit_cart<B: CartBackend>(
    backend: &B,
    lines: &[CartLine],
    delay: Duration,
    progress_updater: impl Fn(String),
) -> CartSubmission {
    let mut submission = CartSubmission {
        items: lines.iter().cloned().map(CartItemState::new).collect(),
        invoice: None,
    };
    let total = submission.items.len();

    for idx in 0..total {
        // Throttle: no pause before the first line.
        if idx > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let (product_id, amount) = {
            let state = &mut submission.items[idx];
            state.status = LineStatus::Processing;
            (state.line.product_id.clone(), state.line.amount)
        };
        progress_updater(format!(
            "Submitting {}/{}: {} (amount {})",
            idx + 1,
            total,
            submission.items[idx].line.name,
            amount
        ));

        match backend.set_amount(&product_id, amount).await {
            Ok(response) => {
                apply_response(&mut submission.items[idx], &response);
                submission.merge_invoice(response.content.and_then(|c| c.invoice));
            }
            Err(e) => {
                // One failed line does not stop the rest of the cart.
                log::warn!("Basket update for product {} failed: {}", product_id, e);
                let state = &mut submission.items[idx];
                state.status = LineStatus::Error;
                state.message = Some(e.to_string());
            }
        }

        let state = &submission.items[idx];
        progress_updater(format!("   -> {}: {:?}", state.line.name, state.status));
    }

    log::info!(
        "Cart submission finished: {}/{} lines added",
        submission.succeeded(),
        total
    );
    submission
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retailer::endpoints::{BasketContent, BasketItem, BasketProduct, ProductId};

    fn line(product_id: &str, amount: f64) -> CartLine {
        CartLine {
            product_id: product_id.to_string(),
            name: format!("Item {}", product_id),
            required_quantity: 1.0,
            required_unit: "kg".to_string(),
            required_base: 1000.0,
            base_unit: "g".to_string(),
            package_size: 500.0,
            packages: 2,
            is_package: true,
            amount,
        }
    }

    #[test]
    fn test_apply_response_success_and_out_of_stock() {
        let response = BasketResponse {
            content: Some(BasketContent {
                items: vec![
                    BasketItem {
                        product: Some(BasketProduct { id: ProductId::Number(1) }),
                        price: Some(12000.0),
                        amount: Some(2000.0),
                    },
                    BasketItem {
                        product: Some(BasketProduct { id: ProductId::Number(2) }),
                        price: Some(500.0),
                        amount: Some(0.0),
                    },
                ],
                invoice: None,
            }),
        };

        let mut ok = CartItemState::new(line("1", 2000.0));
        apply_response(&mut ok, &response);
        assert_eq!(ok.status, LineStatus::Success);
        assert_eq!(ok.price, Some(120.0));
        assert_eq!(ok.cost(), Some(240.0));

        let mut empty = CartItemState::new(line("2", 1000.0));
        apply_response(&mut empty, &response);
        assert_eq!(empty.status, LineStatus::OutOfStock);

        let mut missing = CartItemState::new(line("3", 1000.0));
        apply_response(&mut missing, &BasketResponse::default());
        assert_eq!(missing.status, LineStatus::OutOfStock);
    }

    #[test]
    fn test_merge_invoice_keeps_previous_summary() {
        let mut submission = CartSubmission::default();
        submission.merge_invoice(Some(Invoice {
            summary_cost: Some(10000.0),
            item_number: Some(1),
            delivery_cost: Some(0.0),
        }));
        submission.merge_invoice(Some(Invoice {
            summary_cost: None,
            item_number: Some(2),
            delivery_cost: None,
        }));
        assert_eq!(submission.summary_cost(), Some(100.0));
        assert_eq!(submission.invoice.as_ref().unwrap().item_number, Some(2));
    }
}
