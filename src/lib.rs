//! Bottom-up stochastic demand-profile simulator.
//!
//! Users are grouped into archetypes that own a set of appliances. Each
//! appliance switches on at random minutes inside its functioning windows
//! until its daily functioning time is reached; summing all users gives
//! minute-resolution yearly load profiles per archetype and in total.

/// Appliance definitions and per-day parameter resolution.
pub mod appliances;
pub mod archetype;
/// Year structure: days, seasons, week-classes.
pub mod calendar;
pub mod config;
pub mod error;
pub mod io;
pub mod logging;
/// Simulation engine, event placement, results and statistics.
pub mod sim;

pub use config::{Definitions, ScenarioConfig, build_definitions};
pub use error::{ConfigError, SimulationError};
pub use sim::{CancelToken, LoadProfile, SimulationResult, simulate, simulate_with_cancel};
