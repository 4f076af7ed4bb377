use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use super::{cell, is_blank, parse_cell, read_rows, required_cell, Row, RowError};
use crate::model::{Dish, Ingredient};

// Column positions of the recipes table, one row per ingredient.
const NAME_COL: usize = 0;
const COOKING_TIME_COL: usize = 1;
const HANDS_ON_TIME_COL: usize = 2;
const TYPE_COL: usize = 3;
const CATEGORY_COL: usize = 4;
const PREFERENCE_COL: usize = 5;
const CUISINE_COL: usize = 6;
const INGREDIENT_NAME_COL: usize = 7;
const QUANTITY_COL: usize = 8;
const UNIT_COL: usize = 9;

pub const RECIPE_HEADER: [&str; 10] = [
    "name",
    "cookingTime",
    "handsOnTime",
    "type",
    "category",
    "preference",
    "cuisine",
    "ingredientName",
    "quantity",
    "unit",
];

fn split_tags(value: &str) -> BTreeSet<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn join_tags(tags: &BTreeSet<String>) -> String {
    tags.iter().map(String::as_str).collect::<Vec<_>>().join(",")
}

/// Reduces denormalised recipe rows into one `Dish` per name, in first-seen
/// order. Dish metadata is taken from the first row of each dish.
pub fn parse_recipe_rows(rows: &[Row]) -> Result<Vec<Dish>, RowError> {
    let mut dishes: Vec<Dish> = Vec::new();
    let mut index_by_name: HashMap<String, usize> = HashMap::new();

    for (row_index, row) in rows.iter().enumerate() {
        if is_blank(row) {
            continue;
        }
        let name = required_cell(row, NAME_COL, row_index, "name")?;

        let idx = match index_by_name.get(name) {
            Some(idx) => *idx,
            None => {
                let cooking_time: u32 = parse_cell(
                    required_cell(row, COOKING_TIME_COL, row_index, "cookingTime")?,
                    row_index,
                    "cookingTime",
                )?;
                let hands_on_time: u32 = parse_cell(
                    required_cell(row, HANDS_ON_TIME_COL, row_index, "handsOnTime")?,
                    row_index,
                    "handsOnTime",
                )?;
                dishes.push(Dish {
                    name: name.to_string(),
                    // Times are at least one minute.
                    cooking_time: cooking_time.max(1),
                    hands_on_time: hands_on_time.max(1),
                    meal_types: split_tags(cell(row, TYPE_COL)),
                    categories: split_tags(cell(row, CATEGORY_COL)),
                    preferences: split_tags(cell(row, PREFERENCE_COL)),
                    cuisines: split_tags(cell(row, CUISINE_COL)),
                    ingredients: Vec::new(),
                });
                index_by_name.insert(name.to_string(), dishes.len() - 1);
                dishes.len() - 1
            }
        };

        // Metadata-only row.
        let ingredient_name = cell(row, INGREDIENT_NAME_COL);
        if ingredient_name.is_empty() {
            continue;
        }
        let quantity: f64 = parse_cell(
            required_cell(row, QUANTITY_COL, row_index, "quantity")?,
            row_index,
            "quantity",
        )?;
        if !quantity.is_finite() || quantity < 0.0 {
            return Err(RowError::InvalidValue {
                row: row_index,
                column: "quantity",
                value: cell(row, QUANTITY_COL).to_string(),
            });
        }
        dishes[idx].ingredients.push(Ingredient {
            name: ingredient_name.to_string(),
            quantity,
            unit: cell(row, UNIT_COL).to_string(),
        });
    }

    Ok(dishes)
}

/// Flattens dishes back into the one-row-per-ingredient shape.
pub fn dishes_to_rows(dishes: &[Dish]) -> Vec<Row> {
    let mut rows = Vec::new();
    for dish in dishes {
        let meta = vec![
            dish.name.clone(),
            dish.cooking_time.to_string(),
            dish.hands_on_time.to_string(),
            join_tags(&dish.meal_types),
            join_tags(&dish.categories),
            join_tags(&dish.preferences),
            join_tags(&dish.cuisines),
        ];
        if dish.ingredients.is_empty() {
            let mut row = meta.clone();
            row.extend([String::new(), String::new(), String::new()]);
            rows.push(row);
        }
        for ingredient in &dish.ingredients {
            let mut row = meta.clone();
            row.extend([
                ingredient.name.clone(),
                ingredient.quantity.to_string(),
                ingredient.unit.clone(),
            ]);
            rows.push(row);
        }
    }
    rows
}

pub fn load_recipes(csv_path: &Path) -> Result<Vec<Dish>> {
    let rows = read_rows(csv_path)?;
    let dishes = parse_recipe_rows(&rows)
        .with_context(|| format!("Malformed recipe table at {:?}", csv_path))?;
    log::info!("Loaded {} dishes from {:?}", dishes.len(), csv_path);
    Ok(dishes)
}

/// Distinct values seen across the catalog, used to seed filter choices.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct CatalogFacets {
    pub ingredients: BTreeSet<String>,
    pub meal_types: BTreeSet<String>,
    pub categories: BTreeSet<String>,
    pub preferences: BTreeSet<String>,
    pub cuisines: BTreeSet<String>,
}

pub fn catalog_facets(dishes: &[Dish]) -> CatalogFacets {
    let mut facets = CatalogFacets::default();
    for dish in dishes {
        facets
            .ingredients
            .extend(dish.ingredients.iter().map(|i| i.name.clone()));
        facets.meal_types.extend(dish.meal_types.iter().cloned());
        facets.categories.extend(dish.categories.iter().cloned());
        facets.preferences.extend(dish.preferences.iter().cloned());
        facets.cuisines.extend(dish.cuisines.iter().cloned());
    }
    facets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn sample_rows() -> Vec<Row> {
        vec![
            row(&["Omelette", "15", "10", "Breakfast", "Main", "Vegetarian", "French", "Egg", "2", "piece"]),
            row(&["Omelette", "15", "10", "Breakfast", "Main", "Vegetarian", "French", "Milk", "50", "ml"]),
            row(&["Borscht", "90", "30", "Lunch,Dinner", "Soup", "", "Ukrainian", "Beet", "150", "g"]),
            row(&[]),
            row(&["Omelette", "15", "10", "Breakfast", "Main", "Vegetarian", "French", "Salt", "1", "pinch"]),
        ]
    }

    #[test]
    fn test_parse_recipe_rows_groups_by_name() {
        let dishes = parse_recipe_rows(&sample_rows()).unwrap();
        assert_eq!(dishes.len(), 2);

        let omelette = &dishes[0];
        assert_eq!(omelette.name, "Omelette");
        assert_eq!(omelette.ingredients.len(), 3);
        assert_eq!(omelette.ingredients[2].unit, "pinch");

        let borscht = &dishes[1];
        assert!(borscht.meal_types.contains("Lunch"));
        assert!(borscht.meal_types.contains("Dinner"));
        assert!(borscht.preferences.is_empty());
    }

    #[test]
    fn test_parse_recipe_rows_rejects_bad_quantity() {
        let rows = vec![row(&["Tea", "5", "1", "Breakfast", "Drink", "", "", "Tea leaves", "lots", "g"])];
        let err = parse_recipe_rows(&rows).unwrap_err();
        assert!(matches!(err, RowError::InvalidValue { row: 0, column: "quantity", .. }));
    }

    #[test]
    fn test_parse_recipe_rows_requires_cooking_time() {
        let rows = vec![row(&["Tea", "", "1"])];
        let err = parse_recipe_rows(&rows).unwrap_err();
        assert_eq!(err, RowError::MissingColumn { row: 0, column: "cookingTime" });
    }

    #[test]
    fn test_dish_without_ingredients_keeps_metadata() {
        let rows = vec![row(&["Water", "1", "1", "Lunch", "Drink"])];
        let dishes = parse_recipe_rows(&rows).unwrap();
        assert_eq!(dishes.len(), 1);
        assert!(dishes[0].ingredients.is_empty());
    }

    #[test]
    fn test_rows_round_trip() {
        let dishes = parse_recipe_rows(&sample_rows()).unwrap();
        let reparsed = parse_recipe_rows(&dishes_to_rows(&dishes)).unwrap();
        assert_eq!(dishes, reparsed);
    }

    #[test]
    fn test_catalog_facets() {
        let dishes = parse_recipe_rows(&sample_rows()).unwrap();
        let facets = catalog_facets(&dishes);
        assert_eq!(facets.meal_types.len(), 3);
        assert!(facets.ingredients.contains("Beet"));
        assert!(facets.cuisines.contains("French"));
        assert_eq!(facets.preferences.len(), 1);
    }
}
