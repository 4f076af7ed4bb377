use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    /// Fixed week order; the meal-prep window indexes into this.
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
            Day::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDay(pub String);

impl fmt::Display for UnknownDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown day label '{}'", self.0)
    }
}

impl std::error::Error for UnknownDay {}

impl FromStr for Day {
    type Err = UnknownDay;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Day::ALL
            .iter()
            .copied()
            .find(|day| {
                day.label().eq_ignore_ascii_case(wanted)
                    || day.label()[..3].eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| UnknownDay(s.to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Ingredient {
    pub name: String,
    /// Per single serving.
    pub quantity: f64,
    pub unit: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Dish {
    pub name: String,
    pub cooking_time: u32,
    pub hands_on_time: u32,
    pub meal_types: BTreeSet<String>,
    pub categories: BTreeSet<String>,
    pub preferences: BTreeSet<String>,
    pub cuisines: BTreeSet<String>,
    pub ingredients: Vec<Ingredient>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MenuEntry {
    pub dish: Arc<Dish>,
    pub servings: u32,
}

/// Day-indexed weekly menu. Every day key is always present.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Menu {
    days: BTreeMap<Day, Vec<MenuEntry>>,
}

impl Default for Menu {
    fn default() -> Self {
        Self::new()
    }
}

impl Menu {
    pub fn new() -> Self {
        Self {
            days: Day::ALL.iter().map(|day| (*day, Vec::new())).collect(),
        }
    }

    pub fn day(&self, day: Day) -> &[MenuEntry] {
        self.days.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Day, &[MenuEntry])> {
        self.days.iter().map(|(day, entries)| (*day, entries.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.days.values().all(Vec::is_empty)
    }

    /// Swaps in a whole day's list at once.
    pub fn replace_day(&mut self, day: Day, entries: Vec<MenuEntry>) {
        self.days.insert(day, entries);
    }

    /// Adds `servings` portions of `dish` to `day`, merging into an existing
    /// entry with the same dish name.
    pub fn add_servings(&mut self, day: Day, dish: Arc<Dish>, servings: u32) {
        let mut entries = self.day(day).to_vec();
        match entries.iter_mut().find(|entry| entry.dish.name == dish.name) {
            Some(existing) => existing.servings += servings,
            None => entries.push(MenuEntry { dish, servings }),
        }
        self.replace_day(day, entries);
    }

    /// Manual add path: one serving, or one more on an existing entry.
    pub fn add_dish(&mut self, day: Day, dish: Arc<Dish>) {
        self.add_servings(day, dish, 1);
    }

    pub fn update_servings(&mut self, day: Day, dish_name: &str, servings: u32) {
        let entries = self
            .day(day)
            .iter()
            .cloned()
            .map(|mut entry| {
                if entry.dish.name == dish_name {
                    entry.servings = servings.max(1);
                }
                entry
            })
            .collect();
        self.replace_day(day, entries);
    }

    pub fn remove_dish(&mut self, day: Day, dish_name: &str) {
        let entries = self
            .day(day)
            .iter()
            .filter(|entry| entry.dish.name != dish_name)
            .cloned()
            .collect();
        self.replace_day(day, entries);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn tags(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    pub(crate) fn dish(name: &str, ingredients: Vec<Ingredient>) -> Arc<Dish> {
        Arc::new(Dish {
            name: name.to_string(),
            cooking_time: 30,
            hands_on_time: 10,
            meal_types: tags(&["Lunch"]),
            categories: tags(&["Main"]),
            preferences: BTreeSet::new(),
            cuisines: BTreeSet::new(),
            ingredients,
        })
    }

    pub(crate) fn ingredient(name: &str, quantity: f64, unit: &str) -> Ingredient {
        Ingredient {
            name: name.to_string(),
            quantity,
            unit: unit.to_string(),
        }
    }

    #[test]
    fn new_menu_has_every_day() {
        let menu = Menu::new();
        assert_eq!(menu.iter().count(), 7);
        assert!(menu.is_empty());
    }

    #[test]
    fn adding_same_dish_twice_increments_servings() {
        let mut menu = Menu::new();
        let soup = dish("Borscht", vec![]);
        menu.add_dish(Day::Monday, soup.clone());
        menu.add_dish(Day::Monday, soup);

        let monday = menu.day(Day::Monday);
        assert_eq!(monday.len(), 1);
        assert_eq!(monday[0].servings, 2);
    }

    #[test]
    fn update_servings_clamps_to_one() {
        let mut menu = Menu::new();
        menu.add_dish(Day::Friday, dish("Pilaf", vec![]));
        menu.update_servings(Day::Friday, "Pilaf", 0);
        assert_eq!(menu.day(Day::Friday)[0].servings, 1);

        menu.update_servings(Day::Friday, "Pilaf", 4);
        assert_eq!(menu.day(Day::Friday)[0].servings, 4);
    }

    #[test]
    fn remove_dish_only_touches_that_day() {
        let mut menu = Menu::new();
        let pilaf = dish("Pilaf", vec![]);
        menu.add_dish(Day::Monday, pilaf.clone());
        menu.add_dish(Day::Tuesday, pilaf);

        menu.remove_dish(Day::Monday, "Pilaf");
        assert!(menu.day(Day::Monday).is_empty());
        assert_eq!(menu.day(Day::Tuesday).len(), 1);
    }

    #[test]
    fn day_parses_full_and_short_labels() {
        assert_eq!("monday".parse::<Day>(), Ok(Day::Monday));
        assert_eq!(" Sun ".parse::<Day>(), Ok(Day::Sunday));
        assert!("Someday".parse::<Day>().is_err());
        assert_eq!(Day::Wednesday.index(), 2);
    }
}
