//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;

use ramp_sim::appliances::{
    ApplianceProfile, ApplianceSettings, CycleStep, FunctioningCycle, UsageKey, UsageParams,
    Window,
};
use ramp_sim::archetype::UserArchetype;
use ramp_sim::calendar::{Calendar, SeasonBoundary, WeekClassRule, Weekday};

/// Evening lamp window.
pub const LAMP_WINDOW: (usize, usize) = (1080, 1380);

/// Calendar with a "dry" first half and a "rainy" second half.
pub fn seasonal_calendar(days: usize) -> Calendar {
    Calendar::resolve(
        days,
        &[SeasonBoundary::new(0, "dry"), SeasonBoundary::new(days / 2, "rainy")],
        &WeekClassRule::WeekdayWeekend,
        Weekday::Monday,
    )
    .expect("valid calendar")
}

fn usage(windows: &[(usize, usize)], minutes: usize) -> UsageParams {
    UsageParams::new(
        windows.iter().map(|&(s, e)| Window::new(s, e)).collect(),
        minutes,
        None,
    )
    .expect("valid usage")
}

/// 10 W lamp, two units, 180 ± 20% minutes in the evening.
pub fn lamp() -> ApplianceProfile {
    ApplianceProfile::uniform(
        ApplianceSettings {
            rated_power_w: 10.0,
            num_units_per_user: 2,
            random_variation_day_pct: 20.0,
            min_cycle_minutes: 10,
            ..ApplianceSettings::named("lamp")
        },
        usage(&[LAMP_WINDOW], 180),
    )
    .expect("valid lamp")
}

/// Fridge with a compressor cycle running most of the day.
pub fn fridge() -> ApplianceProfile {
    let cycle = FunctioningCycle::new(vec![
        CycleStep {
            power_w: 150.0,
            duration_minutes: 20,
        },
        CycleStep {
            power_w: 5.0,
            duration_minutes: 10,
        },
    ])
    .expect("valid cycle");
    ApplianceProfile::uniform(
        ApplianceSettings {
            rated_power_w: 150.0,
            duty_cycle_variability_pct: 10.0,
            random_variation_day_pct: 10.0,
            min_cycle_minutes: 30,
            ..ApplianceSettings::named("fridge")
        },
        UsageParams::new(vec![Window::new(0, 1440)], 900, Some(cycle)).expect("valid usage"),
    )
    .expect("valid fridge")
}

/// Fan used only in the dry season (zero minutes when rainy).
pub fn dry_season_fan() -> ApplianceProfile {
    let mut keyed = BTreeMap::new();
    keyed.insert(UsageKey::season("dry"), usage(&[(660, 1020)], 120));
    keyed.insert(UsageKey::season("rainy"), usage(&[(660, 1020)], 0));
    ApplianceProfile::new(
        ApplianceSettings {
            rated_power_w: 40.0,
            random_variation_day_pct: 10.0,
            ..ApplianceSettings::named("fan")
        },
        None,
        keyed,
    )
    .expect("valid fan")
}

/// Household archetype with lamp, fridge and seasonal fan.
pub fn household(users: u32) -> UserArchetype {
    UserArchetype::new("household", users, vec![lamp(), fridge(), dry_season_fan()])
        .expect("valid household")
}

/// School archetype whose computers only run on weekdays.
pub fn school(users: u32) -> UserArchetype {
    let mut keyed = BTreeMap::new();
    keyed.insert(UsageKey::week_class("weekend"), usage(&[(480, 960)], 0));
    let computer = ApplianceProfile::new(
        ApplianceSettings {
            rated_power_w: 50.0,
            num_units_per_user: 4,
            random_variation_day_pct: 20.0,
            min_cycle_minutes: 30,
            ..ApplianceSettings::named("computer")
        },
        Some(usage(&[(480, 720), (780, 960)], 180)),
        keyed,
    )
    .expect("valid computer");
    UserArchetype::new("school", users, vec![computer]).expect("valid school")
}

/// One 100 W appliance: single window [480, 540), exactly 30 minutes a day.
pub fn fixed_lamp_archetype() -> UserArchetype {
    let appliance = ApplianceProfile::uniform(
        ApplianceSettings {
            rated_power_w: 100.0,
            ..ApplianceSettings::named("lamp")
        },
        usage(&[(480, 540)], 30),
    )
    .expect("valid appliance");
    UserArchetype::new("single", 1, vec![appliance]).expect("valid archetype")
}
