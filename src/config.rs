use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::path::Path;
use std::time::Duration;

use crate::model::Day;
use crate::planner::{GenerationFilters, GenerationSettings, MealPrep, MealStructure, SettingsError, UserConfig};
use crate::retailer::{DEFAULT_RETAILER_BASE_URL, DEFAULT_SUBMIT_DELAY};

pub const RETAILER_API_KEY_ENV_VAR: &str = "RETAILER_API_KEY";
pub const RETAILER_BASE_URL_ENV_VAR: &str = "RETAILER_BASE_URL";
pub const RETAILER_DELAY_MS_ENV_VAR: &str = "RETAILER_SUBMIT_DELAY_MS";

/// On-disk generation settings. Every field is optional; missing ones take
/// the same defaults a fresh planning session starts with.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct GenerationConfig {
    pub meal_structure: MealStructure,
    pub people: Option<u32>,
    pub default_meal_types: Option<BTreeSet<String>>,
    pub filters: GenerationFilters,
    pub meal_prep: MealPrep,
    /// Explicit users for some days; replaces that day's default users.
    pub days: BTreeMap<Day, Vec<UserConfig>>,
}

impl GenerationConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file '{}'", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings file '{}'", path.display()))
    }

    /// Builds settings through the same setters an interactive session uses,
    /// so duplicate user ids and bad counts are rejected here.
    pub fn into_settings(self) -> Result<(GenerationSettings, MealStructure), SettingsError> {
        let structure = self.meal_structure;
        let mut settings = GenerationSettings::new(&structure);
        if let Some(meal_types) = self.default_meal_types {
            settings.set_default_meal_types(meal_types, &structure)?;
        }
        if let Some(people) = self.people {
            settings.set_default_people_count(people)?;
        }
        settings.filters = self.filters;
        settings.set_meal_prep(self.meal_prep)?;

        for (day, users) in self.days {
            settings.clear_day(day);
            for user in users {
                settings.insert_user(day, user)?;
            }
        }
        Ok((settings, structure))
    }
}

#[derive(Debug, Clone)]
pub struct RetailerConfig {
    pub base_url: String,
    pub api_key_env_var: String,
    pub submit_delay: Duration,
}

impl RetailerConfig {
    /// Reads overrides from the environment (after `.env`), falling back to
    /// the public API and a 500 ms pause.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        let base_url =
            env::var(RETAILER_BASE_URL_ENV_VAR).unwrap_or_else(|_| DEFAULT_RETAILER_BASE_URL.to_string());
        let submit_delay = env::var(RETAILER_DELAY_MS_ENV_VAR)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_SUBMIT_DELAY);
        Self {
            base_url,
            api_key_env_var: RETAILER_API_KEY_ENV_VAR.to_string(),
            submit_delay,
        }
    }
}
