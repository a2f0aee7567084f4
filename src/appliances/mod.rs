//! Appliance usage descriptions.

/// Appliance profile with season/week-class keyed usage.
pub mod profile;
pub mod types;

pub use profile::{ApplianceProfile, ApplianceSettings, EffectiveApplianceParams};
pub use types::{CycleStep, FunctioningCycle, UsageKey, UsageParams, Window};
