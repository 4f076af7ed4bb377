use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use super::settings::{GenerationFilters, GenerationSettings, MealPrep, MealStructure};
use super::usage::UsageTracker;
use crate::model::{Day, Dish, Menu};

/// Least-used candidates the random pick is drawn from.
pub const CANDIDATE_POOL_SIZE: usize = 3;

/// A (day, meal type, component) slot no dish could fill.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GenerationError {
    pub day: Day,
    pub meal_type: String,
    pub component: String,
    pub users: Vec<String>,
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {}: no dish found for component {} needed by users [{}]",
            self.day,
            self.meal_type,
            self.component,
            self.users.join(", ")
        )
    }
}

fn intersects_or_empty(dish_tags: &BTreeSet<String>, wanted: &BTreeSet<String>) -> bool {
    wanted.is_empty() || dish_tags.iter().any(|tag| wanted.contains(tag))
}

fn matches_slot(dish: &Dish, meal_type: &str, component: &str, filters: &GenerationFilters) -> bool {
    dish.categories.contains(component)
        && dish.meal_types.contains(meal_type)
        && intersects_or_empty(&dish.preferences, &filters.preferences)
        && intersects_or_empty(&dish.cuisines, &filters.cuisines)
        && dish.cooking_time <= filters.max_cooking_time
}

fn within_reuse_limit(dish: &Dish, day: Day, meal_prep: &MealPrep, usage: &UsageTracker) -> bool {
    !meal_prep.enabled
        || usage.in_window(&dish.name, day, meal_prep.storage_days) < meal_prep.max_reuse as usize
}

/// Sorts candidates by how often they were used so far and draws uniformly
/// from the least used few. Ties keep catalog order.
fn pick_candidate<'a, R: Rng + ?Sized>(
    mut candidates: Vec<&'a Arc<Dish>>,
    usage: &UsageTracker,
    rng: &mut R,
) -> Option<&'a Arc<Dish>> {
    // sort_by_key is stable
    candidates.sort_by_key(|dish| usage.total(&dish.name));
    candidates.truncate(CANDIDATE_POOL_SIZE);
    candidates.choose(rng).copied()
}

/// Builds a full weekly menu, or every slot that could not be filled.
///
/// Days are walked in `day_order`; the meal-prep window always indexes the
/// fixed Monday..Sunday order. A meal type is committed for a day only when
/// all of its components found a dish, and any error rejects the whole week.
///
/// # Arguments
/// * `dishes`: The dish catalog.
/// * `settings`: Per-day participation, filters and meal-prep limits.
/// * `meal_structure`: Components required by each meal type.
/// * `day_order`: Days to plan, normally `Day::ALL`.
/// * `rng`: Source for the pick among the least used candidates.
pub fn generate_menu_with_rng<R: Rng + ?Sized>(
    dishes: &[Arc<Dish>],
    settings: &GenerationSettings,
    meal_structure: &MealStructure,
    day_order: &[Day],
    rng: &mut R,
) -> Result<Menu, Vec<GenerationError>> {
    let mut menu = Menu::new();
    let mut usage = UsageTracker::new();
    let mut errors = Vec::new();
    let meal_prep = settings.meal_prep();

    for &day in day_order {
        // Only meal types somebody opted into for this day.
        let meal_types: BTreeSet<&String> = settings
            .users(day)
            .flat_map(|user| user.selected_meals.iter())
            .collect();

        for meal_type in meal_types {
            let participating: Vec<String> = settings
                .users(day)
                .filter(|user| user.selected_meals.contains(meal_type))
                .map(|user| user.name.clone())
                .collect();
            if participating.is_empty() {
                continue;
            }
            // One serving per participating user, for every component.
            let total_servings = participating.len() as u32;

            let components = meal_structure.components(meal_type);
            let mut selected: Vec<Arc<Dish>> = Vec::with_capacity(components.len());
            for component in components {
                let candidates: Vec<&Arc<Dish>> = dishes
                    .iter()
                    .filter(|dish| matches_slot(dish, meal_type, component, &settings.filters))
                    // usage only holds committed meals, so picks earlier in this
                    // meal type do not count against the window yet
                    .filter(|dish| within_reuse_limit(dish, day, meal_prep, &usage))
                    .collect();

                match pick_candidate(candidates, &usage, rng) {
                    Some(dish) => {
                        log::debug!("{} / {} / {}: picked '{}'", day, meal_type, component, dish.name);
                        selected.push(Arc::clone(dish));
                    }
                    None => {
                        // Keep going: the other components may fail too and
                        // every unfilled slot is reported.
                        let error = GenerationError {
                            day,
                            meal_type: meal_type.clone(),
                            component: component.clone(),
                            users: participating.clone(),
                        };
                        log::warn!("{}", error);
                        errors.push(error);
                    }
                }
            }

            // Commit gate: a meal type with any unfilled component adds
            // nothing to the menu or the usage counts.
            if selected.len() != components.len() {
                continue;
            }
            for dish in selected {
                usage.record(&dish.name, day);
                menu.add_servings(day, dish, total_servings);
            }
        }
    }

    if !errors.is_empty() {
        log::warn!("Menu generation failed with {} unfilled slots", errors.len());
        return Err(errors);
    }
    log::info!("Generated weekly menu for {} days", day_order.len());
    Ok(menu)
}

pub fn generate_menu(
    dishes: &[Arc<Dish>],
    settings: &GenerationSettings,
    meal_structure: &MealStructure,
    day_order: &[Day],
) -> Result<Menu, Vec<GenerationError>> {
    generate_menu_with_rng(dishes, settings, meal_structure, day_order, &mut rand::thread_rng())
}

/// Replaces `menu` with a freshly generated one. On failure `menu` is left
/// exactly as it was and the unfilled slots are returned.
pub fn regenerate_into<R: Rng + ?Sized>(
    menu: &mut Menu,
    dishes: &[Arc<Dish>],
    settings: &GenerationSettings,
    meal_structure: &MealStructure,
    rng: &mut R,
) -> Result<(), Vec<GenerationError>> {
    *menu = generate_menu_with_rng(dishes, settings, meal_structure, &Day::ALL, rng)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::tags;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn dish(name: &str, meal_types: &[&str], categories: &[&str]) -> Arc<Dish> {
        Arc::new(Dish {
            name: name.to_string(),
            cooking_time: 30,
            hands_on_time: 15,
            meal_types: tags(meal_types),
            categories: tags(categories),
            preferences: BTreeSet::new(),
            cuisines: BTreeSet::new(),
            ingredients: Vec::new(),
        })
    }

    fn dinner_only() -> MealStructure {
        MealStructure([("Dinner".to_string(), vec!["Main".to_string()])].into())
    }

    #[test]
    fn test_pick_candidate_prefers_least_used() {
        let catalog: Vec<_> = ["A", "B", "C", "D", "E"]
            .iter()
            .map(|n| dish(n, &["Dinner"], &["Main"]))
            .collect();
        let mut usage = UsageTracker::new();
        usage.record("A", Day::Monday);
        usage.record("B", Day::Monday);

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let picked = pick_candidate(catalog.iter().collect(), &usage, &mut rng).unwrap();
            assert!(["C", "D", "E"].contains(&picked.name.as_str()));
        }
    }

    #[test]
    fn test_pick_candidate_draws_from_whole_pool() {
        let catalog: Vec<_> = ["A", "B", "C", "D"]
            .iter()
            .map(|n| dish(n, &["Dinner"], &["Main"]))
            .collect();
        let usage = UsageTracker::new();
        let mut rng = StdRng::seed_from_u64(11);
        let seen: BTreeSet<String> = (0..200)
            .filter_map(|_| pick_candidate(catalog.iter().collect(), &usage, &mut rng))
            .map(|d| d.name.clone())
            .collect();
        assert_eq!(seen, tags(&["A", "B", "C"]));
    }

    #[test]
    fn test_each_day_gets_one_dinner_with_servings_per_user() {
        let structure = dinner_only();
        let catalog = vec![dish("Stew", &["Dinner"], &["Main"])];
        let mut settings = GenerationSettings::new(&structure);
        settings.set_default_people_count(2).unwrap();

        let mut rng = StdRng::seed_from_u64(1);
        let menu =
            generate_menu_with_rng(&catalog, &settings, &structure, &Day::ALL, &mut rng).unwrap();
        for day in Day::ALL {
            let entries = menu.day(day);
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].servings, 2);
        }
    }

    #[test]
    fn test_same_dish_for_two_components_merges() {
        let structure = MealStructure(
            [("Lunch".to_string(), vec!["Main".to_string(), "Salad".to_string()])].into(),
        );
        let catalog = vec![dish("Bowl", &["Lunch"], &["Main", "Salad"])];
        let settings = GenerationSettings::new(&structure);

        let mut rng = StdRng::seed_from_u64(3);
        let menu =
            generate_menu_with_rng(&catalog, &settings, &structure, &[Day::Monday], &mut rng)
                .unwrap();
        let monday = menu.day(Day::Monday);
        assert_eq!(monday.len(), 1);
        assert_eq!(monday[0].servings, 2);
    }

    #[test]
    fn test_filters_apply() {
        let structure = dinner_only();
        let mut slow = dish("Slow roast", &["Dinner"], &["Main"]).as_ref().clone();
        slow.cooking_time = 240;
        let mut vegan = dish("Vegan curry", &["Dinner"], &["Main"]).as_ref().clone();
        vegan.preferences = tags(&["Vegan"]);
        vegan.cuisines = tags(&["Indian"]);
        let catalog = vec![
            Arc::new(slow),
            Arc::new(vegan),
            dish("Steak", &["Dinner"], &["Main"]),
        ];

        let mut settings = GenerationSettings::new(&structure);
        settings.filters.preferences = tags(&["Vegan"]);
        settings.filters.cuisines = tags(&["Indian", "Thai"]);

        let mut rng = StdRng::seed_from_u64(5);
        let menu =
            generate_menu_with_rng(&catalog, &settings, &structure, &Day::ALL, &mut rng).unwrap();
        assert!(menu
            .iter()
            .all(|(_, entries)| entries.iter().all(|e| e.dish.name == "Vegan curry")));
    }

    #[test]
    fn test_user_without_meals_produces_nothing() {
        let structure = dinner_only();
        let mut settings = GenerationSettings::new(&structure);
        settings.set_user_meals(Day::Monday, 1, BTreeSet::new()).unwrap();
        let catalog = vec![dish("Stew", &["Dinner"], &["Main"])];

        let mut rng = StdRng::seed_from_u64(9);
        let menu =
            generate_menu_with_rng(&catalog, &settings, &structure, &Day::ALL, &mut rng).unwrap();
        assert!(menu.day(Day::Monday).is_empty());
        assert_eq!(menu.day(Day::Tuesday).len(), 1);
    }

    #[test]
    fn test_error_display() {
        let error = GenerationError {
            day: Day::Tuesday,
            meal_type: "Lunch".to_string(),
            component: "Soup".to_string(),
            users: vec!["Anna".to_string(), "Boris".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "Tuesday / Lunch: no dish found for component Soup needed by users [Anna, Boris]"
        );
    }
}
