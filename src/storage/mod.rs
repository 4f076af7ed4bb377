pub mod mapping;
pub mod menus;
pub mod recipes;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use std::path::Path;
use thiserror::Error;

pub use mapping::{load_mapping_rules, parse_mapping_rows, save_mapping_rules, upsert_rule};
pub use menus::{load_menu_rows, menu_from_rows, menu_to_rows, replace_menu_rows, save_menu_rows, saved_menu_names};
pub use recipes::{catalog_facets, dishes_to_rows, load_recipes, parse_recipe_rows, CatalogFacets};

/// One spreadsheet row; trailing empty cells may be missing.
pub type Row = Vec<String>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RowError {
    #[error("row {row}: missing required column '{column}'")]
    MissingColumn { row: usize, column: &'static str },
    #[error("row {row}: column '{column}' has invalid value '{value}'")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },
}

pub(crate) fn cell(row: &Row, idx: usize) -> &str {
    row.get(idx).map(|s| s.trim()).unwrap_or("")
}

pub(crate) fn required_cell<'a>(
    row: &'a Row,
    idx: usize,
    row_index: usize,
    column: &'static str,
) -> Result<&'a str, RowError> {
    let value = cell(row, idx);
    if value.is_empty() {
        return Err(RowError::MissingColumn { row: row_index, column });
    }
    Ok(value)
}

pub(crate) fn parse_cell<T: std::str::FromStr>(
    value: &str,
    row_index: usize,
    column: &'static str,
) -> Result<T, RowError> {
    value.parse::<T>().map_err(|_| RowError::InvalidValue {
        row: row_index,
        column,
        value: value.to_string(),
    })
}

pub(crate) fn is_blank(row: &Row) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

/// Reads every data row of a headed CSV table.
pub fn read_rows(csv_path: &Path) -> Result<Vec<Row>> {
    if !csv_path.exists() {
        return Err(anyhow::anyhow!("Table file not found at: {:?}", csv_path));
    }

    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open table file at {:?}", csv_path))?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let mut rows = Vec::new();
    for (row_index, result) in rdr.records().enumerate() {
        let record =
            result.with_context(|| format!("Failed to read record at row index {}", row_index))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Overwrites a table with `header` followed by `rows`.
pub fn write_rows(csv_path: &Path, header: &[&str], rows: &[Row]) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .flexible(true)
        .from_path(csv_path)
        .with_context(|| format!("Failed to create table file at {:?}", csv_path))?;
    wtr.write_record(header)?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()
        .with_context(|| format!("Failed to flush table file at {:?}", csv_path))?;
    Ok(())
}
