use std::collections::HashMap;

use crate::model::Day;

/// Per-run record of which days each dish was committed on.
#[derive(Debug, Clone, Default)]
pub struct UsageTracker {
    usages: HashMap<String, Vec<Day>>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, dish_name: &str, day: Day) {
        self.usages.entry(dish_name.to_string()).or_default().push(day);
    }

    pub fn total(&self, dish_name: &str) -> usize {
        self.usages.get(dish_name).map_or(0, Vec::len)
    }

    /// Uses of `dish_name` within the last `storage_days` days, `day` included.
    pub fn in_window(&self, dish_name: &str, day: Day, storage_days: u32) -> usize {
        let current = day.index();
        // Clamped at Monday; no wrap into the previous week.
        let start = current.saturating_sub(storage_days.saturating_sub(1) as usize);
        self.usages.get(dish_name).map_or(0, |days| {
            days.iter()
                .filter(|d| (start..=current).contains(&d.index()))
                .count()
        })
    }

    pub fn reset(&mut self) {
        self.usages.clear();
    }
}
