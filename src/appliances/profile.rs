use std::collections::BTreeMap;

use crate::calendar::{Calendar, Day};
use crate::error::ConfigError;

use super::types::{FunctioningCycle, UsageKey, UsageParams, Window};

/// Scalar appliance parameters shared by all of its usage entries.
///
/// # Examples
///
/// ```
/// use ramp_sim::appliances::ApplianceSettings;
///
/// let tv = ApplianceSettings {
///     rated_power_w: 60.0,
///     random_variation_day_pct: 20.0,
///     ..ApplianceSettings::named("tv")
/// };
/// assert_eq!(tv.num_units_per_user, 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ApplianceSettings {
    pub name: String,
    /// Nominal draw when switched on without a functioning cycle (W).
    pub rated_power_w: f64,
    pub num_units_per_user: u32,
    /// ± jitter on each cycle step's power, in percent.
    pub duty_cycle_variability_pct: f64,
    /// ± variation of the daily functioning time, in percent.
    pub random_variation_day_pct: f64,
    /// Shortest allowed switch-on event.
    pub min_cycle_minutes: usize,
    /// Probability the appliance is used at all on a given day.
    pub occasional_use: f64,
    /// All units switch on together instead of independently.
    pub fixed_units: bool,
}

impl ApplianceSettings {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Default for ApplianceSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            rated_power_w: 1.0,
            num_units_per_user: 1,
            duty_cycle_variability_pct: 0.0,
            random_variation_day_pct: 0.0,
            min_cycle_minutes: 1,
            occasional_use: 1.0,
            fixed_units: false,
        }
    }
}

/// Static description of one appliance's usage pattern.
///
/// Usage parameters can vary by season and week-class; lookups fall back
/// from the exact `(season, week_class)` key to season-only, then
/// week-class-only, then the profile-wide default.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplianceProfile {
    settings: ApplianceSettings,
    default: Option<UsageParams>,
    keyed: BTreeMap<UsageKey, UsageParams>,
}

/// Usage parameters resolved for one day.
#[derive(Debug, Clone, Copy)]
pub struct EffectiveApplianceParams<'a> {
    pub profile: &'a ApplianceProfile,
    pub usage: &'a UsageParams,
}

impl EffectiveApplianceParams<'_> {
    pub fn windows(&self) -> &[Window] {
        self.usage.windows()
    }

    pub fn cycle(&self) -> Option<&FunctioningCycle> {
        self.usage.cycle()
    }

    pub fn avg_functioning_minutes_per_day(&self) -> usize {
        self.usage.avg_functioning_minutes_per_day()
    }

    pub fn window_minutes(&self) -> usize {
        self.usage.window_minutes()
    }
}

impl ApplianceProfile {
    /// Creates a validated appliance profile.
    ///
    /// # Arguments
    ///
    /// * `settings` - Scalar parameters
    /// * `default` - Usage applied when no keyed entry matches a day
    /// * `keyed` - Season/week-class specific usage
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the name is empty, the power is not
    /// positive, a percentage or probability is out of range, there is no
    /// usage entry at all, or a keyed entry uses the all-wildcard key.
    pub fn new(
        settings: ApplianceSettings,
        default: Option<UsageParams>,
        keyed: BTreeMap<UsageKey, UsageParams>,
    ) -> Result<Self, ConfigError> {
        if settings.name.trim().is_empty() {
            return Err(ConfigError::new("name", "must not be empty"));
        }
        if !settings.rated_power_w.is_finite() || settings.rated_power_w <= 0.0 {
            return Err(ConfigError::new("power_w", "must be a finite number > 0"));
        }
        for (field, pct) in [
            ("duty_cycle_variability_pct", settings.duty_cycle_variability_pct),
            ("random_variation_day_pct", settings.random_variation_day_pct),
        ] {
            if !(0.0..100.0).contains(&pct) {
                return Err(ConfigError::new(field, format!("must be in [0, 100), got {pct}")));
            }
        }
        if settings.min_cycle_minutes == 0 {
            return Err(ConfigError::new("min_cycle_minutes", "must be > 0"));
        }
        if !(0.0..=1.0).contains(&settings.occasional_use) {
            return Err(ConfigError::new("occasional_use", "must be in [0.0, 1.0]"));
        }
        if default.is_none() && keyed.is_empty() {
            return Err(ConfigError::new("usage", "at least one usage entry is required"));
        }
        if keyed.keys().any(UsageKey::is_wildcard) {
            return Err(ConfigError::new(
                "usage",
                "an entry without season and week_class must be the default",
            ));
        }
        Ok(Self {
            settings,
            default,
            keyed,
        })
    }

    /// Shorthand for a profile with one usage pattern for every day.
    pub fn uniform(settings: ApplianceSettings, usage: UsageParams) -> Result<Self, ConfigError> {
        Self::new(settings, Some(usage), BTreeMap::new())
    }

    pub fn settings(&self) -> &ApplianceSettings {
        &self.settings
    }

    pub fn name(&self) -> &str {
        &self.settings.name
    }

    /// Picks the usage parameters applying to `day`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if neither a keyed entry nor a default
    /// matches the day's season and week-class.
    pub fn resolve_for(&self, day: &Day) -> Result<EffectiveApplianceParams<'_>, ConfigError> {
        let candidates = [
            UsageKey {
                season: Some(day.season.clone()),
                week_class: Some(day.week_class.clone()),
            },
            UsageKey {
                season: Some(day.season.clone()),
                week_class: None,
            },
            UsageKey {
                season: None,
                week_class: Some(day.week_class.clone()),
            },
        ];
        candidates
            .iter()
            .find_map(|key| self.keyed.get(key))
            .or(self.default.as_ref())
            .map(|usage| EffectiveApplianceParams {
                profile: self,
                usage,
            })
            .ok_or_else(|| {
                ConfigError::new(
                    "usage",
                    format!(
                        "appliance \"{}\" has no parameters for season \"{}\" / week-class \"{}\"",
                        self.settings.name, day.season, day.week_class
                    ),
                )
            })
    }

    /// Checks that every day of `calendar` resolves to usage parameters.
    ///
    /// # Errors
    ///
    /// Returns the first missing (season, week-class) combination.
    pub fn validate_against(&self, calendar: &Calendar) -> Result<(), ConfigError> {
        let mut checked: Vec<(&str, &str)> = Vec::new();
        for day in calendar.days() {
            let key = (day.season.as_str(), day.week_class.as_str());
            if checked.contains(&key) {
                continue;
            }
            self.resolve_for(day)?;
            checked.push(key);
        }
        Ok(())
    }
}
