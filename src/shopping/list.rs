use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use super::units::{display_quantity, Dimension, UnitTable};
use crate::model::{Day, Menu};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ShoppingListItem {
    pub name: String,
    /// Display-scale quantity in `unit`.
    pub quantity: f64,
    pub unit: String,
    /// Full-precision total in kg, l or piece.
    pub base_total: f64,
    pub dimension: Dimension,
    pub dishes: BTreeSet<String>,
}

impl ShoppingListItem {
    fn from_base(name: String, base_total: f64, dimension: Dimension, dishes: BTreeSet<String>) -> Self {
        let (quantity, unit) = display_quantity(base_total, dimension);
        Self {
            name,
            quantity,
            unit: unit.to_string(),
            base_total,
            dimension,
            dishes,
        }
    }

    pub fn key(&self) -> ItemKey {
        (self.name.clone(), self.dimension)
    }
}

/// Lines are grouped by ingredient name *and* dimension.
pub type ItemKey = (String, Dimension);

/// Sums every selected day's ingredients, scaled by servings, into one line
/// per `(ingredient name, dimension)`.
///
/// The same ingredient listed in grams by one dish and by count in another
/// yields two separate lines. Lines come out in first-seen order, which
/// callers should not rely on. Repeated days are counted once.
pub fn build_shopping_list(
    menu: &Menu,
    selected_days: &[Day],
    unit_table: &UnitTable,
) -> Vec<ShoppingListItem> {
    struct Group {
        total: f64,
        dishes: BTreeSet<String>,
    }

    // Dedup while keeping the caller's order.
    let days: Vec<Day> = selected_days
        .iter()
        .enumerate()
        .filter(|(i, day)| !selected_days[..*i].contains(day))
        .map(|(_, day)| *day)
        .collect();

    let mut order: Vec<ItemKey> = Vec::new();
    let mut groups: HashMap<ItemKey, Group> = HashMap::new();

    for day in days {
        for entry in menu.day(day) {
            for ingredient in &entry.dish.ingredients {
                let conversion = unit_table.lookup(&ingredient.unit);
                let key = (ingredient.name.clone(), conversion.dimension);
                let group = groups.entry(key.clone()).or_insert_with(|| {
                    order.push(key);
                    Group {
                        total: 0.0,
                        dishes: BTreeSet::new(),
                    }
                });
                // Sum in base units (kg, l, piece) at full precision.
                group.total += ingredient.quantity * f64::from(entry.servings) * conversion.factor;
                group.dishes.insert(entry.dish.name.clone());
            }
        }
    }

    order
        .into_iter()
        .filter_map(|key| {
            let group = groups.remove(&key)?;
            Some(ShoppingListItem::from_base(key.0, group.total, key.1, group.dishes))
        })
        .collect()
}

/// Manual +/- step for an item: one piece, or 0.1 kg / l.
pub fn adjustment_step(dimension: Dimension) -> f64 {
    match dimension {
        Dimension::Count => 1.0,
        Dimension::Weight | Dimension::Volume => 0.1,
    }
}

/// Returns the item with `delta` (base units) added, never below zero.
pub fn adjust_shopping_item(item: &ShoppingListItem, delta: f64) -> ShoppingListItem {
    let base_total = (item.base_total + delta).max(0.0);
    ShoppingListItem::from_base(item.name.clone(), base_total, item.dimension, item.dishes.clone())
}

/// A shopping list for a day selection, with manual adjustments and
/// checked-off items layered on top of the computed totals.
#[derive(Debug, Clone)]
pub struct ShoppingList {
    selected_days: Vec<Day>,
    items: Vec<ShoppingListItem>,
    overrides: HashMap<ItemKey, f64>,
    checked: BTreeSet<String>,
    unit_table: UnitTable,
}

impl ShoppingList {
    pub fn new(menu: &Menu, selected_days: &[Day], unit_table: UnitTable) -> Self {
        let mut list = Self {
            selected_days: Vec::new(),
            items: Vec::new(),
            overrides: HashMap::new(),
            checked: BTreeSet::new(),
            unit_table,
        };
        list.select_days(menu, selected_days);
        list
    }

    pub fn selected_days(&self) -> &[Day] {
        &self.selected_days
    }

    /// Recomputes the list; every manual adjustment is dropped.
    pub fn select_days(&mut self, menu: &Menu, selected_days: &[Day]) {
        self.selected_days = selected_days.to_vec();
        self.items = build_shopping_list(menu, &self.selected_days, &self.unit_table);
        self.overrides.clear();
    }

    pub fn toggle_day(&mut self, menu: &Menu, day: Day) {
        let mut days = self.selected_days.clone();
        match days.iter().position(|d| *d == day) {
            Some(pos) => {
                days.remove(pos);
            }
            None => days.push(day),
        }
        self.select_days(menu, &days);
    }

    /// Computed items, without manual adjustments.
    pub fn items(&self) -> &[ShoppingListItem] {
        &self.items
    }

    fn effective(&self, item: &ShoppingListItem) -> ShoppingListItem {
        match self.overrides.get(&item.key()) {
            Some(base_total) => adjust_shopping_item(item, base_total - item.base_total),
            None => item.clone(),
        }
    }

    /// Items with manual adjustments applied.
    pub fn adjusted_items(&self) -> Vec<ShoppingListItem> {
        self.items.iter().map(|item| self.effective(item)).collect()
    }

    fn adjust(&mut self, name: &str, dimension: Dimension, direction: f64) -> Option<ShoppingListItem> {
        let item = self
            .items
            .iter()
            .find(|item| item.name == name && item.dimension == dimension)?;
        let current = self.effective(item);
        let adjusted = adjust_shopping_item(&current, direction * adjustment_step(dimension));
        self.overrides.insert(adjusted.key(), adjusted.base_total);
        Some(adjusted)
    }

    pub fn increase(&mut self, name: &str, dimension: Dimension) -> Option<ShoppingListItem> {
        self.adjust(name, dimension, 1.0)
    }

    pub fn decrease(&mut self, name: &str, dimension: Dimension) -> Option<ShoppingListItem> {
        self.adjust(name, dimension, -1.0)
    }

    pub fn set_checked(&mut self, name: &str, checked: bool) {
        if checked {
            self.checked.insert(name.to_string());
        } else {
            self.checked.remove(name);
        }
    }

    pub fn is_checked(&self, name: &str) -> bool {
        self.checked.contains(name)
    }

    /// Unchecked items with adjustments applied; what still needs buying.
    pub fn cart_items(&self) -> Vec<ShoppingListItem> {
        self.items
            .iter()
            .filter(|item| !self.is_checked(&item.name))
            .map(|item| self.effective(item))
            .collect()
    }

    /// One `"{name} - {quantity} {unit}"` line per item still to buy.
    pub fn to_clipboard_text(&self) -> String {
        self.cart_items()
            .iter()
            .map(|item| format!("{} - {} {}", item.name, item.quantity, item.unit))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
