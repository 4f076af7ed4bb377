pub mod generator;
pub mod settings;
pub mod usage;

pub use generator::{generate_menu, generate_menu_with_rng, regenerate_into, GenerationError};
pub use settings::{GenerationFilters, GenerationSettings, MealPrep, MealStructure, SettingsError, UserConfig, UserId};
pub use usage::UsageTracker;
