use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::shopping::{Dimension, ShoppingListItem};

/// The retailer's amount unit: 1000 per package, per kg or per litre.
pub const AMOUNT_UNITS_PER_PACKAGE: f64 = 1000.0;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RetailerMappingRule {
    /// Ingredient name this rule applies to.
    pub name: String,
    /// External product id.
    pub id: String,
    /// In `unit`.
    pub package_size: f64,
    /// g, ml or piece.
    pub unit: String,
    /// Round up to whole packages instead of sending the exact amount.
    pub is_package: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub required_quantity: f64,
    pub required_unit: String,
    /// Required amount expressed in the rule's unit.
    pub required_base: f64,
    pub base_unit: String,
    pub package_size: f64,
    pub packages: u64,
    pub is_package: bool,
    /// Value sent to the basket API.
    pub amount: f64,
}

/// What the rule-authoring flow needs to know about an unmapped ingredient.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RuleRequest {
    pub ingredient_name: String,
    pub required_quantity: f64,
    pub required_unit: String,
}

impl From<&ShoppingListItem> for RuleRequest {
    fn from(item: &ShoppingListItem) -> Self {
        Self {
            ingredient_name: item.name.clone(),
            required_quantity: item.quantity,
            required_unit: item.unit.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct RetailerConversion {
    pub converted: Vec<CartLine>,
    pub unconverted: Vec<ShoppingListItem>,
}

impl RetailerConversion {
    pub fn rule_requests(&self) -> Vec<RuleRequest> {
        self.unconverted.iter().map(RuleRequest::from).collect()
    }
}

/// Expresses a display quantity in g, ml or piece.
pub fn to_rule_base(quantity: f64, unit: &str) -> f64 {
    match unit {
        "kg" | "l" => quantity * 1000.0,
        _ => quantity,
    }
}

fn rule_dimension(unit: &str) -> Dimension {
    match unit {
        "g" | "kg" => Dimension::Weight,
        "ml" | "l" => Dimension::Volume,
        _ => Dimension::Count,
    }
}

pub fn convert_line(item: &ShoppingListItem, rule: &RetailerMappingRule) -> CartLine {
    // Mismatch is logged only; the rule's unit wins.
    if rule_dimension(&rule.unit) != item.dimension {
        log::warn!(
            "Rule for '{}' is in {} but the list needs {:?}",
            item.name,
            rule.unit,
            item.dimension
        );
    }

    // Works from the displayed (rounded) quantity, not base_total: the cart
    // gets what the list shows, so 2.4 pieces is ordered as 2.
    let required_base = to_rule_base(item.quantity, &item.unit);
    // Always round up; never buy less than needed.
    let packages = (required_base / rule.package_size).ceil().max(0.0) as u64;
    // The basket counts 1000 per package for packaged goods, and g / ml
    // directly for loose ones.
    let amount = if rule.is_package {
        packages as f64 * AMOUNT_UNITS_PER_PACKAGE
    } else {
        required_base
    };

    CartLine {
        product_id: rule.id.clone(),
        name: item.name.clone(),
        required_quantity: item.quantity,
        required_unit: item.unit.clone(),
        required_base,
        base_unit: rule.unit.clone(),
        package_size: rule.package_size,
        packages,
        is_package: rule.is_package,
        amount,
    }
}

/// Splits shopping items into cart lines (items with a rule) and the rest.
pub fn convert_for_retailer(
    items: &[ShoppingListItem],
    rules: &HashMap<String, RetailerMappingRule>,
) -> RetailerConversion {
    let mut conversion = RetailerConversion::default();
    for item in items {
        match rules.get(&item.name) {
            Some(rule) => conversion.converted.push(convert_line(item, rule)),
            None => conversion.unconverted.push(item.clone()),
        }
    }
    log::info!(
        "Converted {} items for the retailer, {} without a rule",
        conversion.converted.len(),
        conversion.unconverted.len()
    );
    conversion
}
