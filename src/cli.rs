use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::model::Day;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Recipes table, one row per ingredient
    #[arg(long, env = "MENU_RECIPES_CSV", default_value = "recipes.csv")]
    pub recipes: PathBuf,

    /// Saved menus table
    #[arg(long, env = "MENU_MENUS_CSV", default_value = "menus.csv")]
    pub menus: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a weekly menu and save it under a name
    Generate {
        /// Name to save the generated menu under
        #[arg(short, long)]
        name: String,

        /// JSON generation settings; defaults are used when omitted
        #[arg(short, long, env = "MENU_SETTINGS_JSON")]
        settings: Option<PathBuf>,
    },
    /// List saved menus
    Menus,
    /// Print the shopping list of a saved menu
    ShoppingList {
        /// Saved menu name; the first saved menu when omitted
        #[arg(short, long)]
        name: Option<String>,

        /// Days to shop for (e.g. mon,tue,wed); the whole week when omitted
        #[arg(short, long, value_delimiter = ',')]
        days: Vec<Day>,
    },
    /// Convert the shopping list into retailer cart lines and submit them
    Cart {
        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long, value_delimiter = ',')]
        days: Vec<Day>,

        /// Retailer mapping table (ingredient -> product rule)
        #[arg(long, env = "MENU_MAPPING_CSV", default_value = "retailer_mapping.csv")]
        mapping: PathBuf,

        /// Only print the converted lines, do not call the retailer
        #[arg(long)]
        dry_run: bool,
    },
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
