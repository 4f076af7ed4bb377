pub mod list;
pub mod units;

pub use list::{adjust_shopping_item, adjustment_step, build_shopping_list, ShoppingList, ShoppingListItem};
pub use units::{display_quantity, Dimension, UnitTable};
