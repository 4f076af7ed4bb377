use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

use super::{cell, is_blank, parse_cell, read_rows, required_cell, write_rows, Row, RowError};
use crate::retailer::RetailerMappingRule;

const NAME_COL: usize = 0;
const PRODUCT_ID_COL: usize = 1;
const PACKAGE_SIZE_COL: usize = 2;
const UNIT_COL: usize = 3;
const IS_PACKAGE_COL: usize = 4;

pub const MAPPING_HEADER: [&str; 5] = [
    "ingredientName",
    "externalProductId",
    "packageSize",
    "unit",
    "isPackage",
];

fn parse_is_package(value: &str, row_index: usize) -> Result<bool, RowError> {
    match value.to_ascii_lowercase().as_str() {
        "" | "yes" | "true" | "1" | "package" => Ok(true),
        "no" | "false" | "0" | "exact" => Ok(false),
        _ => Err(RowError::InvalidValue {
            row: row_index,
            column: "isPackage",
            value: value.to_string(),
        }),
    }
}

/// Normalises a declared rule unit to g / ml / piece, scaling the package
/// size when the sheet states kg or l.
fn normalize_rule_unit(unit: &str, package_size: f64) -> (String, f64) {
    match unit {
        "kg" => ("g".to_string(), package_size * 1000.0),
        "l" => ("ml".to_string(), package_size * 1000.0),
        "" => ("piece".to_string(), package_size),
        other => (other.to_string(), package_size),
    }
}

/// One rule per ingredient name; a later row for the same name wins.
pub fn parse_mapping_rows(rows: &[Row]) -> Result<HashMap<String, RetailerMappingRule>, RowError> {
    let mut rules = HashMap::new();
    for (row_index, row) in rows.iter().enumerate() {
        if is_blank(row) {
            continue;
        }
        let name = required_cell(row, NAME_COL, row_index, "ingredientName")?;
        let id = required_cell(row, PRODUCT_ID_COL, row_index, "externalProductId")?;
        let package_size: f64 = parse_cell(
            required_cell(row, PACKAGE_SIZE_COL, row_index, "packageSize")?,
            row_index,
            "packageSize",
        )?;
        if !(package_size > 0.0 && package_size.is_finite()) {
            return Err(RowError::InvalidValue {
                row: row_index,
                column: "packageSize",
                value: cell(row, PACKAGE_SIZE_COL).to_string(),
            });
        }
        let (unit, package_size) = normalize_rule_unit(cell(row, UNIT_COL), package_size);
        let is_package = parse_is_package(cell(row, IS_PACKAGE_COL), row_index)?;

        rules.insert(
            name.to_string(),
            RetailerMappingRule {
                name: name.to_string(),
                id: id.to_string(),
                package_size,
                unit,
                is_package,
            },
        );
    }
    Ok(rules)
}

pub fn rule_to_row(rule: &RetailerMappingRule) -> Row {
    vec![
        rule.name.clone(),
        rule.id.clone(),
        rule.package_size.to_string(),
        rule.unit.clone(),
        if rule.is_package { "yes" } else { "no" }.to_string(),
    ]
}

/// Replaces any existing row for the rule's ingredient and appends the rule.
pub fn upsert_rule(existing: &[Row], rule: &RetailerMappingRule) -> Vec<Row> {
    existing
        .iter()
        .filter(|row| !is_blank(row) && cell(row, NAME_COL) != rule.name)
        .cloned()
        .chain(std::iter::once(rule_to_row(rule)))
        .collect()
}

pub fn load_mapping_rules(csv_path: &Path) -> Result<HashMap<String, RetailerMappingRule>> {
    let rows = read_rows(csv_path)?;
    let rules = parse_mapping_rows(&rows)
        .with_context(|| format!("Malformed retailer mapping table at {:?}", csv_path))?;
    log::info!("Loaded {} retailer mapping rules", rules.len());
    Ok(rules)
}

pub fn save_mapping_rules(csv_path: &Path, rule: &RetailerMappingRule) -> Result<()> {
    let existing = if csv_path.exists() {
        read_rows(csv_path)?
    } else {
        Vec::new()
    };
    write_rows(csv_path, &MAPPING_HEADER, &upsert_rule(&existing, rule))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_parse_mapping_rows() {
        let rows = vec![
            row(&["Milk", "1001", "930", "ml", "yes"]),
            row(&["Potato", "2002", "1", "kg", "no"]),
            row(&["Egg", "3003", "10", "piece", ""]),
        ];
        let rules = parse_mapping_rows(&rows).unwrap();
        assert_eq!(rules.len(), 3);

        let potato = &rules["Potato"];
        assert_eq!(potato.unit, "g");
        assert_eq!(potato.package_size, 1000.0);
        assert!(!potato.is_package);
        assert!(rules["Egg"].is_package);
    }

    #[test]
    fn test_parse_mapping_rows_rejects_zero_package() {
        let rows = vec![row(&["Milk", "1001", "0", "ml", "yes"])];
        assert!(matches!(
            parse_mapping_rows(&rows),
            Err(RowError::InvalidValue { column: "packageSize", .. })
        ));
    }

    #[test]
    fn test_parse_mapping_rows_rejects_unknown_flag() {
        let rows = vec![row(&["Milk", "1001", "930", "ml", "maybe"])];
        assert!(matches!(
            parse_mapping_rows(&rows),
            Err(RowError::InvalidValue { column: "isPackage", .. })
        ));
    }

    #[test]
    fn test_upsert_rule_replaces_by_name() {
        let existing = vec![
            row(&["Milk", "1001", "930", "ml", "yes"]),
            row(&["Egg", "3003", "10", "piece", "yes"]),
        ];
        let rule = RetailerMappingRule {
            name: "Milk".to_string(),
            id: "1002".to_string(),
            package_size: 1000.0,
            unit: "ml".to_string(),
            is_package: true,
        };
        let rows = upsert_rule(&existing, &rule);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], row(&["Milk", "1002", "1000", "ml", "yes"]));

        let rules = parse_mapping_rows(&rows).unwrap();
        assert_eq!(rules["Milk"].id, "1002");
    }
}
