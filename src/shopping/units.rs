use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Weight,
    Volume,
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitConversion {
    pub dimension: Dimension,
    pub base_unit: &'static str,
    pub factor: f64,
}

const COUNT: UnitConversion = UnitConversion {
    dimension: Dimension::Count,
    base_unit: "piece",
    factor: 1.0,
};

/// Unit -> (dimension, base unit, factor to base). Anything unknown is a count.
#[derive(Debug, Clone)]
pub struct UnitTable {
    conversions: HashMap<String, UnitConversion>,
}

impl Default for UnitTable {
    fn default() -> Self {
        let conversions = [
            ("g", Dimension::Weight, "kg", 0.001),
            ("kg", Dimension::Weight, "kg", 1.0),
            ("ml", Dimension::Volume, "l", 0.001),
            ("l", Dimension::Volume, "l", 1.0),
            ("piece", Dimension::Count, "piece", 1.0),
        ]
        .into_iter()
        .map(|(unit, dimension, base_unit, factor)| {
            (
                unit.to_string(),
                UnitConversion {
                    dimension,
                    base_unit,
                    factor,
                },
            )
        })
        .collect();
        Self { conversions }
    }
}

impl UnitTable {
    pub fn lookup(&self, unit: &str) -> UnitConversion {
        self.conversions.get(unit.trim()).copied().unwrap_or(COUNT)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Renders a base-unit total as a human-scale `(quantity, unit)` pair.
/// Exactly 1.0 base unit already shows in the larger unit.
pub fn display_quantity(base_total: f64, dimension: Dimension) -> (f64, &'static str) {
    match dimension {
        Dimension::Weight if base_total >= 1.0 => (round2(base_total), "kg"),
        Dimension::Weight => (round2(base_total * 1000.0), "g"),
        Dimension::Volume if base_total >= 1.0 => (round2(base_total), "l"),
        Dimension::Volume => (round2(base_total * 1000.0), "ml"),
        Dimension::Count => (base_total.round(), "piece"),
    }
}
