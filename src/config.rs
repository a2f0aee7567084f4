//! TOML-based scenario configuration, presets and definition building.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::appliances::{
    ApplianceProfile, ApplianceSettings, CycleStep, FunctioningCycle, UsageKey, UsageParams, Window,
};
use crate::archetype::UserArchetype;
use crate::calendar::{
    Calendar, DAYS_PER_YEAR, SeasonBoundary, SeasonId, WeekClassId, WeekClassRule, Weekday,
    month_season_boundaries,
};
use crate::error::{ConfigError, SimulationError};
use crate::sim::engine::validate_run;
use crate::sim::{SimulationResult, simulate};

/// Top-level scenario configuration parsed from TOML.
///
/// Parse with [`ScenarioConfig::from_toml_str`] or load a built-in preset
/// with [`ScenarioConfig::from_preset`], then turn it into validated
/// definitions with [`build_definitions`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Run-wide parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Year structure.
    #[serde(default)]
    pub calendar: CalendarConfig,
    /// User categories.
    #[serde(default)]
    pub archetypes: Vec<ArchetypeConfig>,
}

/// Run-wide parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Master random seed.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

/// Year structure: length, first weekday, seasons and week-classes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalendarConfig {
    pub year_length_days: usize,
    /// Weekday of day 0.
    pub start_weekday: Weekday,
    /// Explicit season starts. Mutually exclusive with `months`.
    pub seasons: Option<Vec<SeasonBoundary>>,
    /// Season per calendar month (12 entries). Mutually exclusive with `seasons`.
    pub months: Option<Vec<String>>,
    /// Week-class labels: absent for weekday/weekend, one label for a
    /// single class, or seven labels (Monday first).
    pub week_classes: Option<Vec<String>>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            year_length_days: DAYS_PER_YEAR,
            start_weekday: Weekday::Monday,
            seasons: None,
            months: None,
            week_classes: None,
        }
    }
}

/// One user category.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchetypeConfig {
    pub name: String,
    pub user_count: u32,
    #[serde(default)]
    pub appliances: Vec<ApplianceConfig>,
}

/// One step of a functioning cycle.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CycleStepConfig {
    pub power_w: f64,
    pub minutes: usize,
}

/// Season/week-class specific usage of an appliance.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UsageConfig {
    pub season: Option<String>,
    pub week_class: Option<String>,
    /// `[start, end)` minute pairs.
    pub windows: Vec<[usize; 2]>,
    /// Average functioning minutes per day.
    pub func_time: usize,
    pub cycle: Option<Vec<CycleStepConfig>>,
}

/// One appliance. The top-level `windows`/`func_time`/`cycle` form the
/// default usage; `usage` entries override it for specific days.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplianceConfig {
    pub name: String,
    pub power_w: f64,
    #[serde(default = "default_units")]
    pub units: u32,
    #[serde(default)]
    pub duty_cycle_variability_pct: f64,
    #[serde(default)]
    pub random_variation_day_pct: f64,
    #[serde(default = "default_min_cycle")]
    pub min_cycle_minutes: usize,
    #[serde(default = "default_occasional_use")]
    pub occasional_use: f64,
    #[serde(default)]
    pub fixed_units: bool,
    pub windows: Option<Vec<[usize; 2]>>,
    pub func_time: Option<usize>,
    pub cycle: Option<Vec<CycleStepConfig>>,
    #[serde(default)]
    pub usage: Vec<UsageConfig>,
}

fn default_units() -> u32 {
    1
}

fn default_min_cycle() -> usize {
    1
}

fn default_occasional_use() -> f64 {
    1.0
}

const SINGLE_HOUSEHOLD_TOML: &str = include_str!("../scenarios/single_household.toml");
const VILLAGE_TOML: &str = include_str!("../scenarios/village.toml");

impl ScenarioConfig {
    /// Available preset names.
    pub const PRESETS: &[&str] = &["single_household", "village"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "single_household" => Self::from_toml_str(SINGLE_HOUSEHOLD_TOML),
            "village" => Self::from_toml_str(VILLAGE_TOML),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Loads a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or parsed.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.message()))
    }
}

/// Validated inputs of a simulation run.
#[derive(Debug, Clone)]
pub struct Definitions {
    pub calendar: Calendar,
    pub archetypes: Vec<UserArchetype>,
    pub seed: u64,
}

impl Definitions {
    /// Runs [`simulate`] on these definitions.
    ///
    /// # Errors
    ///
    /// Propagates any `SimulationError` from the run.
    pub fn simulate(&self) -> Result<SimulationResult, SimulationError> {
        simulate(&self.calendar, &self.archetypes, self.seed)
    }
}

/// Builds validated calendar and archetypes from a scenario.
///
/// Every check a run needs happens here, so a successful build never fails
/// later with a configuration problem.
///
/// # Errors
///
/// Returns the first `ConfigError`, with the dotted path of the offending
/// field (e.g. `archetypes[1].appliances[0].usage[2].windows[0]`).
pub fn build_definitions(config: &ScenarioConfig) -> Result<Definitions, ConfigError> {
    let calendar = build_calendar(&config.calendar).map_err(|e| e.within("calendar"))?;

    let archetypes = config
        .archetypes
        .iter()
        .enumerate()
        .map(|(i, a)| build_archetype(a).map_err(|e| e.within(&format!("archetypes[{i}]"))))
        .collect::<Result<Vec<_>, _>>()?;

    validate_run(&calendar, &archetypes)?;

    Ok(Definitions {
        calendar,
        archetypes,
        seed: config.simulation.seed,
    })
}

fn build_calendar(cfg: &CalendarConfig) -> Result<Calendar, ConfigError> {
    let boundaries = match (&cfg.seasons, &cfg.months) {
        (Some(_), Some(_)) => {
            return Err(ConfigError::new(
                "months",
                "`seasons` and `months` are mutually exclusive; choose one",
            ));
        }
        (Some(seasons), None) => seasons.clone(),
        (None, Some(months)) => {
            let months: [SeasonId; 12] = months
                .iter()
                .map(|m| SeasonId::new(m.as_str()))
                .collect::<Vec<_>>()
                .try_into()
                .map_err(|v: Vec<SeasonId>| {
                    ConfigError::new("months", format!("expected 12 entries, got {}", v.len()))
                })?;
            month_season_boundaries(cfg.year_length_days, &months)?
        }
        (None, None) => vec![SeasonBoundary::new(0, "year")],
    };

    let rule = match cfg.week_classes.as_deref() {
        None => WeekClassRule::WeekdayWeekend,
        Some([single]) => WeekClassRule::Uniform(WeekClassId::new(single.as_str())),
        Some(labels) if labels.len() == 7 => WeekClassRule::PerWeekday(std::array::from_fn(|i| {
            WeekClassId::new(labels[i].as_str())
        })),
        Some(labels) => {
            return Err(ConfigError::new(
                "week_classes",
                format!("expected 1 or 7 labels, got {}", labels.len()),
            ));
        }
    };

    Calendar::resolve(cfg.year_length_days, &boundaries, &rule, cfg.start_weekday)
}

fn build_archetype(cfg: &ArchetypeConfig) -> Result<UserArchetype, ConfigError> {
    let appliances = cfg
        .appliances
        .iter()
        .enumerate()
        .map(|(i, a)| build_appliance(a).map_err(|e| e.within(&format!("appliances[{i}]"))))
        .collect::<Result<Vec<_>, _>>()?;
    UserArchetype::new(cfg.name.as_str(), cfg.user_count, appliances)
}

fn build_cycle(steps: Option<&[CycleStepConfig]>) -> Result<Option<FunctioningCycle>, ConfigError> {
    steps
        .map(|steps| {
            FunctioningCycle::new(
                steps
                    .iter()
                    .map(|s| CycleStep {
                        power_w: s.power_w,
                        duration_minutes: s.minutes,
                    })
                    .collect(),
            )
        })
        .transpose()
}

fn build_usage(
    windows: &[[usize; 2]],
    func_time: usize,
    cycle: Option<&[CycleStepConfig]>,
) -> Result<UsageParams, ConfigError> {
    let windows = windows.iter().map(|[s, e]| Window::new(*s, *e)).collect();
    UsageParams::new(windows, func_time, build_cycle(cycle)?)
}

fn build_appliance(cfg: &ApplianceConfig) -> Result<ApplianceProfile, ConfigError> {
    let settings = ApplianceSettings {
        name: cfg.name.clone(),
        rated_power_w: cfg.power_w,
        num_units_per_user: cfg.units,
        duty_cycle_variability_pct: cfg.duty_cycle_variability_pct,
        random_variation_day_pct: cfg.random_variation_day_pct,
        min_cycle_minutes: cfg.min_cycle_minutes,
        occasional_use: cfg.occasional_use,
        fixed_units: cfg.fixed_units,
    };

    let default = match (&cfg.windows, cfg.func_time) {
        (Some(windows), Some(func_time)) => {
            Some(build_usage(windows, func_time, cfg.cycle.as_deref())?)
        }
        (None, None) if cfg.cycle.is_none() => None,
        (None, _) => {
            return Err(ConfigError::new(
                "windows",
                "required when func_time or cycle is given",
            ));
        }
        (Some(_), None) => return Err(ConfigError::new("func_time", "required with windows")),
    };

    let mut keyed = BTreeMap::new();
    for (i, usage) in cfg.usage.iter().enumerate() {
        let path = format!("usage[{i}]");
        let key = UsageKey {
            season: usage.season.as_deref().map(SeasonId::from),
            week_class: usage.week_class.as_deref().map(WeekClassId::from),
        };
        if key.is_wildcard() {
            return Err(ConfigError::new(
                path,
                "needs a season and/or week_class (use top-level windows for the default)",
            ));
        }
        let params = build_usage(&usage.windows, usage.func_time, usage.cycle.as_deref())
            .map_err(|e| e.within(&path))?;
        if keyed.insert(key, params).is_some() {
            return Err(ConfigError::new(path, "duplicate season/week_class entry"));
        }
    }

    ApplianceProfile::new(settings, default, keyed)
}
