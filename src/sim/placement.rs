//! Randomized placement of switch-on events inside functioning windows.

use rand::{Rng, rngs::StdRng};
use tracing::trace;

use crate::appliances::types::uniform_variation;
use crate::appliances::{EffectiveApplianceParams, Window};
use crate::archetype::UserInstance;
use crate::calendar::{Day, MINUTES_PER_DAY};
use crate::error::SimulationError;

use super::types::{DayTrace, SwitchOnEvent};

/// Consecutive rejected placement attempts after which a unit accepts a
/// shorter realized duration than its target.
pub const MAX_PLACEMENT_ATTEMPTS: usize = 1000;

/// Draws the daily functioning time for one unit.
///
/// `floor(avg × (1 ± r))`, clipped to the available window minutes.
pub fn draw_daily_minutes(rng: &mut StdRng, params: &EffectiveApplianceParams<'_>) -> usize {
    let avg = params.avg_functioning_minutes_per_day();
    let factor = uniform_variation(rng, params.profile.settings().random_variation_day_pct);
    let drawn = (avg as f64 * factor).floor().max(0.0) as usize;
    drawn.min(params.window_minutes())
}

/// Maps the `k`-th available minute (counting through the windows in order)
/// to its minute of day and containing window.
fn nth_window_minute(windows: &[Window], mut k: usize) -> Option<(usize, Window)> {
    for w in windows {
        if k < w.width() {
            return Some((w.start + k, *w));
        }
        k -= w.width();
    }
    None
}

/// Places non-overlapping events for one unit until `target` minutes are
/// covered or [`MAX_PLACEMENT_ATTEMPTS`] consecutive attempts are rejected.
///
/// Returns `(start, end)` intervals; every interval lies inside one window.
pub fn place_unit(
    rng: &mut StdRng,
    windows: &[Window],
    target: usize,
    min_cycle_minutes: usize,
) -> Vec<(usize, usize)> {
    let available: usize = windows.iter().map(Window::width).sum();
    let mut occupied = [false; MINUTES_PER_DAY];
    let mut events = Vec::new();
    let mut placed = 0;
    let mut rejected = 0;

    while placed < target && available > 0 {
        if rejected >= MAX_PLACEMENT_ATTEMPTS {
            break;
        }
        let remaining = target - placed;
        let min_len = min_cycle_minutes.min(remaining).max(1);
        let desired = rng.random_range(min_len..=remaining);

        let Some((start, window)) = nth_window_minute(windows, rng.random_range(0..available))
        else {
            break;
        };
        if occupied[start] {
            rejected += 1;
            continue;
        }

        let free_run = (start..window.end)
            .take_while(|&m| !occupied[m])
            .count();
        let len = desired.min(free_run);
        if len < min_len {
            rejected += 1;
            continue;
        }

        occupied[start..start + len].fill(true);
        events.push((start, start + len));
        placed += len;
        rejected = 0;
    }

    events
}

/// Writes one event's power into `power_w`.
///
/// With a functioning cycle the steps repeat across the event, each step's
/// power jittered once per event; otherwise the rated power is used.
fn expand_event(
    rng: &mut StdRng,
    params: &EffectiveApplianceParams<'_>,
    start: usize,
    end: usize,
    units: u32,
    power_w: &mut [f64],
) {
    let settings = params.profile.settings();
    let multiplier = f64::from(units);
    match params.cycle() {
        Some(cycle) => {
            let step_power: Vec<f64> = cycle
                .steps()
                .iter()
                .map(|s| s.power_w * uniform_variation(rng, settings.duty_cycle_variability_pct))
                .collect();
            for (offset, minute) in (start..end).enumerate() {
                power_w[minute] += step_power[cycle.step_index_at(offset)] * multiplier;
            }
        }
        None => {
            for w in &mut power_w[start..end] {
                *w += settings.rated_power_w * multiplier;
            }
        }
    }
}

/// Simulates every unit of one appliance for one day into `trace`.
fn simulate_appliance(
    rng: &mut StdRng,
    appliance: usize,
    params: &EffectiveApplianceParams<'_>,
    trace: &mut DayTrace,
) {
    let settings = params.profile.settings();
    if settings.num_units_per_user == 0 {
        return;
    }
    if settings.occasional_use < 1.0 && !rng.random_bool(settings.occasional_use) {
        return;
    }

    let (placements, units_per_event) = if settings.fixed_units {
        (1, settings.num_units_per_user)
    } else {
        (settings.num_units_per_user, 1)
    };

    for unit in 0..placements {
        let target = draw_daily_minutes(rng, params);
        let intervals = place_unit(rng, params.windows(), target, settings.min_cycle_minutes);
        let realized: usize = intervals.iter().map(|(s, e)| e - s).sum();
        if realized < target {
            trace!(
                appliance = settings.name.as_str(),
                unit,
                day = trace.day,
                target,
                realized,
                "placement gave up before reaching target"
            );
        }
        for (start, end) in intervals {
            expand_event(rng, params, start, end, units_per_event, &mut trace.power_w);
            trace.events.push(SwitchOnEvent {
                appliance,
                unit,
                units: units_per_event,
                start,
                end,
            });
        }
    }
}

impl UserInstance {
    /// Draws this user's appliance usage for one day.
    ///
    /// Advances the instance's private generator; calling it for the same
    /// days in the same order always yields the same traces.
    ///
    /// # Errors
    ///
    /// Returns `SimulationError::Invariant` if an appliance has no parameters
    /// for the day, which validation before a run rules out.
    pub fn simulate_day(&mut self, day: &Day) -> Result<DayTrace, SimulationError> {
        let appliances = self.shared_appliances();
        let mut trace = DayTrace::new(day.index);
        for (i, appliance) in appliances.iter().enumerate() {
            let params = appliance.resolve_for(day).map_err(|e| {
                SimulationError::Invariant(format!("day {} unresolved: {e}", day.index))
            })?;
            simulate_appliance(&mut self.rng, i, &params, &mut trace);
        }
        Ok(trace)
    }
}
