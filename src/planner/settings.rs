use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::model::Day;

pub type UserId = u32;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SettingsError {
    #[error("people count must be at least 1")]
    ZeroPeople,
    #[error("meal prep needs max_reuse >= 1 and storage_days >= 1")]
    InvalidMealPrep,
    #[error("user {id} already exists on {day}")]
    DuplicateUser { day: Day, id: UserId },
    #[error("user {id} not found on {day}")]
    UnknownUser { day: Day, id: UserId },
    #[error("cannot remove the last user on {day}")]
    LastUser { day: Day },
    #[error("unknown meal type '{0}'")]
    UnknownMealType(String),
}

/// Meal type -> ordered list of components that must each be filled by one dish.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(transparent)]
pub struct MealStructure(pub BTreeMap<String, Vec<String>>);

impl Default for MealStructure {
    fn default() -> Self {
        let mut structure = BTreeMap::new();
        structure.insert("Breakfast".to_string(), vec!["Main".to_string()]);
        structure.insert(
            "Lunch".to_string(),
            vec!["Soup".to_string(), "Main".to_string(), "Salad".to_string()],
        );
        structure.insert("Dinner".to_string(), vec!["Main".to_string()]);
        MealStructure(structure)
    }
}

impl MealStructure {
    pub fn meal_types(&self) -> BTreeSet<String> {
        self.0.keys().cloned().collect()
    }

    pub fn components(&self, meal_type: &str) -> &[String] {
        self.0.get(meal_type).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UserConfig {
    pub id: UserId,
    pub name: String,
    pub selected_meals: BTreeSet<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GenerationFilters {
    pub preferences: BTreeSet<String>,
    pub cuisines: BTreeSet<String>,
    /// Kept alongside the other filters; slot components already decide category.
    pub categories: BTreeSet<String>,
    pub max_cooking_time: u32,
}

impl Default for GenerationFilters {
    fn default() -> Self {
        Self {
            preferences: BTreeSet::new(),
            cuisines: BTreeSet::new(),
            categories: BTreeSet::new(),
            max_cooking_time: 120,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MealPrep {
    pub enabled: bool,
    pub max_reuse: u32,
    pub storage_days: u32,
}

impl Default for MealPrep {
    fn default() -> Self {
        Self {
            enabled: false,
            max_reuse: 2,
            storage_days: 2,
        }
    }
}

/// Who eats which meals on which day, plus the global dish filters.
///
/// Users are indexed per day by id so uniqueness is checked where users are
/// inserted; every update goes through one of the narrow setters below.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GenerationSettings {
    default_people_count: u32,
    default_meal_types: BTreeSet<String>,
    // Meal types of the structure the settings were built for.
    known_meal_types: BTreeSet<String>,
    days: BTreeMap<Day, BTreeMap<UserId, UserConfig>>,
    pub filters: GenerationFilters,
    meal_prep: MealPrep,
}

fn default_user_name(id: UserId) -> String {
    format!("User {}", id)
}

fn check_meal_types(known: &BTreeSet<String>, meals: &BTreeSet<String>) -> Result<(), SettingsError> {
    match meals.iter().find(|m| !known.contains(*m)) {
        Some(unknown) => Err(SettingsError::UnknownMealType(unknown.clone())),
        None => Ok(()),
    }
}

impl GenerationSettings {
    /// One user per day, opted into every meal type of the structure.
    pub fn new(meal_structure: &MealStructure) -> Self {
        let default_meal_types = meal_structure.meal_types();
        let days = Day::ALL
            .iter()
            .map(|day| {
                let user = UserConfig {
                    id: 1,
                    name: default_user_name(1),
                    selected_meals: default_meal_types.clone(),
                };
                (*day, BTreeMap::from([(1, user)]))
            })
            .collect();
        Self {
            default_people_count: 1,
            known_meal_types: default_meal_types.clone(),
            default_meal_types,
            days,
            filters: GenerationFilters::default(),
            meal_prep: MealPrep::default(),
        }
    }

    pub fn default_people_count(&self) -> u32 {
        self.default_people_count
    }

    pub fn meal_prep(&self) -> &MealPrep {
        &self.meal_prep
    }

    pub fn set_meal_prep(&mut self, meal_prep: MealPrep) -> Result<(), SettingsError> {
        if meal_prep.max_reuse == 0 || meal_prep.storage_days == 0 {
            return Err(SettingsError::InvalidMealPrep);
        }
        self.meal_prep = meal_prep;
        Ok(())
    }

    pub fn users(&self, day: Day) -> impl Iterator<Item = &UserConfig> {
        self.days.get(&day).into_iter().flat_map(|users| users.values())
    }

    fn day_users_mut(&mut self, day: Day) -> &mut BTreeMap<UserId, UserConfig> {
        self.days.entry(day).or_default()
    }

    /// Truncates or extends every day's users to `count`. New users get the
    /// default meal types.
    pub fn set_default_people_count(&mut self, count: u32) -> Result<(), SettingsError> {
        if count == 0 {
            return Err(SettingsError::ZeroPeople);
        }
        let meals = self.default_meal_types.clone();
        for day in Day::ALL {
            let users = self.day_users_mut(day);
            while users.len() > count as usize {
                users.pop_last();
            }
            while users.len() < count as usize {
                let id = users.keys().next_back().map_or(1, |max| max + 1);
                users.insert(
                    id,
                    UserConfig {
                        id,
                        name: default_user_name(id),
                        selected_meals: meals.clone(),
                    },
                );
            }
        }
        self.default_people_count = count;
        Ok(())
    }

    /// Resets every user's meal selection to `meal_types`.
    pub fn set_default_meal_types(
        &mut self,
        meal_types: BTreeSet<String>,
        meal_structure: &MealStructure,
    ) -> Result<(), SettingsError> {
        if let Some(unknown) = meal_types.iter().find(|m| !meal_structure.0.contains_key(*m)) {
            return Err(SettingsError::UnknownMealType(unknown.clone()));
        }
        for users in self.days.values_mut() {
            for user in users.values_mut() {
                user.selected_meals = meal_types.clone();
            }
        }
        self.default_meal_types = meal_types;
        Ok(())
    }

    /// Adds an explicit user. The id must be free on `day` and every selected
    /// meal must exist in the meal structure.
    pub fn insert_user(&mut self, day: Day, user: UserConfig) -> Result<(), SettingsError> {
        check_meal_types(&self.known_meal_types, &user.selected_meals)?;
        let users = self.day_users_mut(day);
        if users.contains_key(&user.id) {
            return Err(SettingsError::DuplicateUser { day, id: user.id });
        }
        users.insert(user.id, user);
        Ok(())
    }

    /// Adds a user with the next free id and the default meal types.
    pub fn add_user(&mut self, day: Day) -> UserId {
        let meals = self.default_meal_types.clone();
        let users = self.day_users_mut(day);
        let id = users.keys().next_back().map_or(1, |max| max + 1);
        users.insert(
            id,
            UserConfig {
                id,
                name: default_user_name(id),
                selected_meals: meals,
            },
        );
        id
    }

    pub fn remove_user(&mut self, day: Day, id: UserId) -> Result<UserConfig, SettingsError> {
        let users = self.day_users_mut(day);
        if !users.contains_key(&id) {
            return Err(SettingsError::UnknownUser { day, id });
        }
        if users.len() == 1 {
            return Err(SettingsError::LastUser { day });
        }
        users.remove(&id).ok_or(SettingsError::UnknownUser { day, id })
    }

    fn user_mut(&mut self, day: Day, id: UserId) -> Result<&mut UserConfig, SettingsError> {
        self.days
            .get_mut(&day)
            .and_then(|users| users.get_mut(&id))
            .ok_or(SettingsError::UnknownUser { day, id })
    }

    pub fn rename_user(&mut self, day: Day, id: UserId, name: &str) -> Result<(), SettingsError> {
        self.user_mut(day, id)?.name = name.to_string();
        Ok(())
    }

    pub fn set_user_meals(
        &mut self,
        day: Day,
        id: UserId,
        meals: BTreeSet<String>,
    ) -> Result<(), SettingsError> {
        check_meal_types(&self.known_meal_types, &meals)?;
        self.user_mut(day, id)?.selected_meals = meals;
        Ok(())
    }

    /// Removes every user of `day`; used before loading explicit per-day users.
    pub fn clear_day(&mut self, day: Day) {
        self.days.insert(day, BTreeMap::new());
    }
}
