use anyhow::{anyhow, Context, Result};
use menu_planner::cli::{parse_args, Command};
use menu_planner::config::{GenerationConfig, RetailerConfig};
use menu_planner::model::{Day, Menu};
use menu_planner::planner::generate_menu;
use menu_planner::retailer::{convert_for_retailer, submit_cart, LineStatus, RetailerClient};
use menu_planner::shopping::{ShoppingList, UnitTable};
use menu_planner::storage::{
    load_mapping_rules, load_menu_rows, load_recipes, menu_from_rows, save_menu_rows, saved_menu_names,
};
use std::path::Path;
use std::sync::Arc;

fn load_catalog(recipes: &Path) -> Result<Vec<Arc<menu_planner::model::Dish>>> {
    Ok(load_recipes(recipes)?.into_iter().map(Arc::new).collect())
}

fn load_saved_menu(recipes: &Path, menus: &Path, name: Option<String>) -> Result<(String, Menu)> {
    let catalog = load_catalog(recipes)?;
    let rows = load_menu_rows(menus)?;
    let name = match name {
        Some(name) => name,
        None => saved_menu_names(&rows)
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No saved menus in {:?}", menus))?,
    };
    let menu = menu_from_rows(&rows, &catalog, &name);
    if menu.is_empty() {
        log::warn!("Menu '{}' has no dishes", name);
    }
    Ok((name, menu))
}

fn days_or_week(days: Vec<Day>) -> Vec<Day> {
    if days.is_empty() {
        Day::ALL.to_vec()
    } else {
        days
    }
}

fn print_menu(menu: &Menu) {
    for (day, entries) in menu.iter() {
        println!("{}:", day);
        for entry in entries {
            println!("  {} x{}", entry.dish.name, entry.servings);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    pretty_env_logger::init();

    let cli_args = parse_args();

    match cli_args.command {
        Command::Generate { name, settings } => {
            let config = match settings {
                Some(path) => GenerationConfig::load(&path)?,
                None => GenerationConfig::default(),
            };
            let (settings, structure) = config.into_settings().context("Invalid generation settings")?;
            let catalog = load_catalog(&cli_args.recipes)?;

            match generate_menu(&catalog, &settings, &structure, &Day::ALL) {
                Ok(menu) => {
                    print_menu(&menu);
                    save_menu_rows(&cli_args.menus, &name, &menu)?;
                    println!("\nSaved menu '{}'.", name);
                }
                Err(errors) => {
                    eprintln!("Could not generate a menu:");
                    for error in &errors {
                        eprintln!("  {}", error);
                    }
                    return Err(anyhow!("{} meal slots could not be filled", errors.len()));
                }
            }
        }
        Command::Menus => {
            let rows = load_menu_rows(&cli_args.menus)?;
            for name in saved_menu_names(&rows) {
                println!("{}", name);
            }
        }
        Command::ShoppingList { name, days } => {
            let (name, menu) = load_saved_menu(&cli_args.recipes, &cli_args.menus, name)?;
            let list = ShoppingList::new(&menu, &days_or_week(days), UnitTable::default());
            println!("Shopping list for '{}':", name);
            println!("{}", list.to_clipboard_text());
        }
        Command::Cart {
            name,
            days,
            mapping,
            dry_run,
        } => {
            let (_, menu) = load_saved_menu(&cli_args.recipes, &cli_args.menus, name)?;
            let list = ShoppingList::new(&menu, &days_or_week(days), UnitTable::default());
            let rules = load_mapping_rules(&mapping)?;
            let conversion = convert_for_retailer(&list.cart_items(), &rules);

            for line in &conversion.converted {
                println!(
                    "{}: {} {} -> {} x {} {} (amount {})",
                    line.name,
                    line.required_quantity,
                    line.required_unit,
                    line.packages,
                    line.package_size,
                    line.base_unit,
                    line.amount
                );
            }
            if !conversion.unconverted.is_empty() {
                println!("\nNo retailer rule for:");
                for request in conversion.rule_requests() {
                    println!(
                        "  {} ({} {})",
                        request.ingredient_name, request.required_quantity, request.required_unit
                    );
                }
            }
            if dry_run {
                return Ok(());
            }

            let retailer = RetailerConfig::from_env();
            let client = RetailerClient::from_env(&retailer.base_url, &retailer.api_key_env_var)?;
            let progress_callback = |message: String| {
                println!("{}", message);
            };
            let submission =
                submit_cart(&client, &conversion.converted, retailer.submit_delay, progress_callback).await;

            for item in submission.failed() {
                let label = match item.status {
                    LineStatus::OutOfStock => "out of stock",
                    _ => "failed",
                };
                eprintln!(
                    "  {} {}: {}",
                    item.line.name,
                    label,
                    item.message.as_deref().unwrap_or("")
                );
            }
            println!(
                "\n{}/{} lines added to the basket.",
                submission.succeeded(),
                submission.items.len()
            );
            if let Some(total) = submission.summary_cost() {
                println!("Basket total: {:.2}", total);
            }
        }
    }

    Ok(())
}
