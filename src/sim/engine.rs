//! Simulation engine: runs every user instance over the calendar and
//! aggregates the results.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::archetype::{UserArchetype, UserInstance};
use crate::calendar::Calendar;
use crate::error::{ConfigError, SimulationError};

use super::types::{LoadProfile, SimulationResult};

/// Cooperative cancellation flag, checked at every day boundary.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Checks everything a run needs before any random draw.
///
/// # Errors
///
/// Returns a `ConfigError` for an empty calendar, duplicate archetype names,
/// or an appliance lacking parameters for some calendar day.
pub fn validate_run(calendar: &Calendar, archetypes: &[UserArchetype]) -> Result<(), ConfigError> {
    if calendar.is_empty() {
        return Err(ConfigError::new("calendar", "must contain at least one day"));
    }
    for (i, archetype) in archetypes.iter().enumerate() {
        if archetypes[..i].iter().any(|a| a.name() == archetype.name()) {
            return Err(ConfigError::new(
                format!("archetypes[{i}].name"),
                format!("duplicate archetype name \"{}\"", archetype.name()),
            ));
        }
        archetype
            .validate_against(calendar)
            .map_err(|e| e.within(&format!("archetypes[{i}]")))?;
    }
    Ok(())
}

/// Runs the stochastic simulation for a whole calendar.
///
/// Same `(calendar, archetypes, seed)` always yields a bit-identical result,
/// independent of the number of worker threads.
///
/// # Errors
///
/// Returns `SimulationError::Config` if validation fails (nothing is
/// simulated in that case).
pub fn simulate(
    calendar: &Calendar,
    archetypes: &[UserArchetype],
    seed: u64,
) -> Result<SimulationResult, SimulationError> {
    simulate_with_cancel(calendar, archetypes, seed, &CancelToken::new())
}

/// Like [`simulate`], aborting with `SimulationError::Cancelled` once
/// `cancel` is set.
#[instrument(skip_all, fields(days = calendar.len(), archetypes = archetypes.len(), seed = seed))]
pub fn simulate_with_cancel(
    calendar: &Calendar,
    archetypes: &[UserArchetype],
    seed: u64,
    cancel: &CancelToken,
) -> Result<SimulationResult, SimulationError> {
    validate_run(calendar, archetypes)?;

    let users: u64 = archetypes.iter().map(|a| u64::from(a.user_count())).sum();
    info!(users, "starting simulation");

    let mut ordered: Vec<&UserArchetype> = archetypes.iter().collect();
    ordered.sort_by(|a, b| a.name().cmp(b.name()));

    let mut per_user_category = BTreeMap::new();
    for archetype in ordered {
        if cancel.is_cancelled() {
            return Err(SimulationError::Cancelled);
        }
        let profile = simulate_archetype(calendar, archetype, seed, cancel)?;
        debug!(
            archetype = archetype.name(),
            users = archetype.user_count(),
            energy_kwh = profile.energy_kwh(),
            "archetype simulated"
        );
        per_user_category.insert(archetype.name().to_string(), profile);
    }

    let mut total = LoadProfile::zeros(calendar.len());
    for profile in per_user_category.values() {
        total.accumulate(profile);
    }

    let (_, peak_w) = total.peak();
    info!(energy_kwh = total.energy_kwh(), peak_w, "simulation finished");

    Ok(SimulationResult {
        per_user_category,
        total,
    })
}

/// Simulates all instances of one archetype and sums them in index order.
///
/// Instances run in parallel one batch at a time so that only a batch of
/// yearly arrays is alive at once.
fn simulate_archetype(
    calendar: &Calendar,
    archetype: &UserArchetype,
    seed: u64,
    cancel: &CancelToken,
) -> Result<LoadProfile, SimulationError> {
    let mut profile = LoadProfile::zeros(calendar.len());
    let indices: Vec<u32> = (0..archetype.user_count()).collect();
    let batch = rayon::current_num_threads().max(1) * 2;

    for chunk in indices.chunks(batch) {
        let partials = chunk
            .par_iter()
            .map(|&i| simulate_instance(calendar, archetype.instance(seed, i), cancel))
            .collect::<Result<Vec<_>, _>>()?;
        for partial in &partials {
            profile.accumulate(partial);
        }
    }

    Ok(profile)
}

/// Runs one user instance over every calendar day.
fn simulate_instance(
    calendar: &Calendar,
    mut instance: UserInstance,
    cancel: &CancelToken,
) -> Result<LoadProfile, SimulationError> {
    let mut profile = LoadProfile::zeros(calendar.len());
    for day in calendar.days() {
        if cancel.is_cancelled() {
            return Err(SimulationError::Cancelled);
        }
        let trace = instance.simulate_day(day)?;
        profile.day_mut(day.index).copy_from_slice(&trace.power_w);
    }
    Ok(profile)
}
