use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::{cell, is_blank, read_rows, write_rows, Row};
use crate::model::{Day, Dish, Menu};

const MENU_NAME_COL: usize = 0;
const DAY_COL: usize = 1;
const DISH_NAME_COL: usize = 2;
const SERVINGS_COL: usize = 3;

pub const MENU_HEADER: [&str; 4] = ["menuName", "day", "dishName", "servings"];

/// Distinct saved menu names in first-seen order.
pub fn saved_menu_names(rows: &[Row]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for row in rows {
        let name = cell(row, MENU_NAME_COL);
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Rebuilds the named menu from its rows, resolving dish names against the
/// catalog. Rows naming unknown dishes or days are skipped; servings that do
/// not parse fall back to one.
pub fn menu_from_rows(rows: &[Row], catalog: &[Arc<Dish>], menu_name: &str) -> Menu {
    let by_name: HashMap<&str, &Arc<Dish>> = catalog
        .iter()
        .map(|dish| (dish.name.trim(), dish))
        .collect();

    let mut menu = Menu::new();
    for row in rows.iter().filter(|row| cell(row, MENU_NAME_COL) == menu_name) {
        let day = match cell(row, DAY_COL).parse::<Day>() {
            Ok(day) => day,
            Err(e) => {
                log::warn!("Skipping menu row for '{}': {}", menu_name, e);
                continue;
            }
        };
        let dish_name = cell(row, DISH_NAME_COL);
        let Some(dish) = by_name.get(dish_name) else {
            log::warn!("Skipping unknown dish '{}' in menu '{}'", dish_name, menu_name);
            continue;
        };
        let servings = cell(row, SERVINGS_COL)
            .parse::<u32>()
            .ok()
            .filter(|s| *s > 0)
            .unwrap_or(1);
        menu.add_servings(day, Arc::clone(dish), servings);
    }
    menu
}

pub fn menu_to_rows(menu_name: &str, menu: &Menu) -> Vec<Row> {
    menu.iter()
        .flat_map(|(day, entries)| {
            entries.iter().map(move |entry| {
                vec![
                    menu_name.to_string(),
                    day.label().to_string(),
                    entry.dish.name.clone(),
                    entry.servings.to_string(),
                ]
            })
        })
        .collect()
}

/// Drops every existing row of `menu_name` and appends the menu's rows.
pub fn replace_menu_rows(existing: &[Row], menu_name: &str, menu: &Menu) -> Vec<Row> {
    existing
        .iter()
        .filter(|row| !is_blank(row) && cell(row, MENU_NAME_COL) != menu_name)
        .cloned()
        .chain(menu_to_rows(menu_name, menu))
        .collect()
}

pub fn load_menu_rows(csv_path: &Path) -> Result<Vec<Row>> {
    if !csv_path.exists() {
        log::info!("No saved menus at {:?}, starting empty", csv_path);
        return Ok(Vec::new());
    }
    read_rows(csv_path)
}

pub fn save_menu_rows(csv_path: &Path, menu_name: &str, menu: &Menu) -> Result<()> {
    let existing = load_menu_rows(csv_path)?;
    let rows = replace_menu_rows(&existing, menu_name, menu);
    write_rows(csv_path, &MENU_HEADER, &rows)?;
    log::info!("Saved menu '{}' ({} rows total)", menu_name, rows.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::dish;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn catalog() -> Vec<Arc<Dish>> {
        vec![dish("Pilaf", vec![]), dish("Borscht", vec![])]
    }

    #[test]
    fn test_saved_menu_names_first_seen_order() {
        let rows = vec![
            row(&["Week B", "Monday", "Pilaf", "2"]),
            row(&["Week A", "Monday", "Pilaf", "2"]),
            row(&["Week B", "Tuesday", "Pilaf", "2"]),
            row(&["", "Tuesday", "Pilaf", "2"]),
        ];
        assert_eq!(saved_menu_names(&rows), vec!["Week B", "Week A"]);
    }

    #[test]
    fn test_menu_from_rows_resolves_and_merges() {
        let rows = vec![
            row(&["Week", "Monday", "Pilaf", "2"]),
            row(&["Week", "Monday", " Pilaf ", "1"]),
            row(&["Week", "Tuesday", "Borscht", "oops"]),
            row(&["Week", "Tuesday", "Unknown dish", "3"]),
            row(&["Other", "Friday", "Pilaf", "5"]),
        ];
        let menu = menu_from_rows(&rows, &catalog(), "Week");

        assert_eq!(menu.day(Day::Monday).len(), 1);
        assert_eq!(menu.day(Day::Monday)[0].servings, 3);
        assert_eq!(menu.day(Day::Tuesday).len(), 1);
        assert_eq!(menu.day(Day::Tuesday)[0].servings, 1);
        assert!(menu.day(Day::Friday).is_empty());
    }

    #[test]
    fn test_replace_menu_rows_overwrites_only_that_menu() {
        let existing = vec![
            row(&["Keep", "Monday", "Pilaf", "1"]),
            row(&["Week", "Monday", "Pilaf", "9"]),
        ];
        let mut menu = Menu::new();
        menu.add_dish(Day::Sunday, dish("Borscht", vec![]));

        let rows = replace_menu_rows(&existing, "Week", &menu);
        assert_eq!(
            rows,
            vec![
                row(&["Keep", "Monday", "Pilaf", "1"]),
                row(&["Week", "Sunday", "Borscht", "1"]),
            ]
        );
    }

    #[test]
    fn test_menu_rows_round_trip() {
        let mut menu = Menu::new();
        let catalog = catalog();
        menu.add_servings(Day::Wednesday, catalog[0].clone(), 4);
        menu.add_servings(Day::Saturday, catalog[1].clone(), 2);

        let rebuilt = menu_from_rows(&menu_to_rows("W", &menu), &catalog, "W");
        assert_eq!(menu_to_rows("W", &rebuilt), menu_to_rows("W", &menu));
    }
}
