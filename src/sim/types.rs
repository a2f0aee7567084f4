//! Core simulation types: load profiles, run results and day traces.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;

use crate::calendar::{MINUTES_PER_DAY, MINUTES_PER_HOUR};

/// Minute-resolution power series covering whole days, in watts.
///
/// # Examples
///
/// ```
/// use ramp_sim::sim::types::LoadProfile;
///
/// let profile = LoadProfile::zeros(2);
/// assert_eq!(profile.len(), 2 * 1440);
/// assert_eq!(profile.to_hourly().len(), 48);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LoadProfile {
    days: usize,
    watts: Vec<f64>,
}

impl LoadProfile {
    /// An all-zero profile spanning `days` days.
    pub fn zeros(days: usize) -> Self {
        Self {
            days,
            watts: vec![0.0; days * MINUTES_PER_DAY],
        }
    }

    pub fn days(&self) -> usize {
        self.days
    }

    /// Number of minutes (`days × 1440`).
    pub fn len(&self) -> usize {
        self.watts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watts.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.watts
    }

    /// The 1440 minutes of day `day`.
    ///
    /// # Panics
    ///
    /// Panics if `day >= self.days()`.
    pub fn day(&self, day: usize) -> &[f64] {
        &self.watts[day * MINUTES_PER_DAY..(day + 1) * MINUTES_PER_DAY]
    }

    pub(crate) fn day_mut(&mut self, day: usize) -> &mut [f64] {
        &mut self.watts[day * MINUTES_PER_DAY..(day + 1) * MINUTES_PER_DAY]
    }

    /// Adds `other` minute by minute.
    ///
    /// # Panics
    ///
    /// Panics if the profiles cover a different number of days.
    pub fn accumulate(&mut self, other: &LoadProfile) {
        assert_eq!(self.days, other.days, "profiles must span the same days");
        for (acc, w) in self.watts.iter_mut().zip(&other.watts) {
            *acc += w;
        }
    }

    /// Sums each consecutive 60-minute block (watt-minutes per hour).
    ///
    /// A 365-day profile yields 8760 values. Divide by 60 for mean watts
    /// (equivalently watt-hours) per hour.
    pub fn to_hourly(&self) -> Vec<f64> {
        self.watts
            .chunks(MINUTES_PER_HOUR)
            .map(|block| block.iter().sum())
            .collect()
    }

    /// Sum of all minute values (watt-minutes).
    pub fn total_watt_minutes(&self) -> f64 {
        self.watts.iter().sum()
    }

    /// Energy over the whole profile in kWh.
    pub fn energy_kwh(&self) -> f64 {
        self.total_watt_minutes() / MINUTES_PER_HOUR as f64 / 1000.0
    }

    /// Highest minute value and its minute index.
    pub fn peak(&self) -> (usize, f64) {
        self.watts
            .iter()
            .copied()
            .enumerate()
            .fold((0, 0.0), |best, (t, w)| if w > best.1 { (t, w) } else { best })
    }

    pub fn is_all_zero(&self) -> bool {
        self.watts.iter().all(|w| *w == 0.0)
    }
}

impl Index<usize> for LoadProfile {
    type Output = f64;

    fn index(&self, minute: usize) -> &f64 {
        &self.watts[minute]
    }
}

/// Output of one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    /// Aggregated profile per archetype, keyed (and summed) by name order.
    pub per_user_category: BTreeMap<String, LoadProfile>,
    /// Sum of all archetype profiles.
    pub total: LoadProfile,
}

impl SimulationResult {
    pub fn days(&self) -> usize {
        self.total.days()
    }

    pub fn category(&self, name: &str) -> Option<&LoadProfile> {
        self.per_user_category.get(name)
    }
}

/// One placed switch-on event of an appliance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchOnEvent {
    /// Index of the appliance in the archetype's appliance list.
    pub appliance: usize,
    /// Unit index within the user (0 for fixed-unit appliances).
    pub unit: u32,
    /// Number of units drawing power during this event.
    pub units: u32,
    /// First minute of the event (inclusive).
    pub start: usize,
    /// Minute after the last one (exclusive).
    pub end: usize,
}

impl SwitchOnEvent {
    pub fn duration(&self) -> usize {
        self.end - self.start
    }
}

/// Power and placed events of one user instance over one day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayTrace {
    pub day: usize,
    pub power_w: Vec<f64>,
    pub events: Vec<SwitchOnEvent>,
}

impl DayTrace {
    pub fn new(day: usize) -> Self {
        Self {
            day,
            power_w: vec![0.0; MINUTES_PER_DAY],
            events: Vec::new(),
        }
    }

    /// Minutes of switch-on for one appliance unit.
    pub fn unit_minutes(&self, appliance: usize, unit: u32) -> usize {
        self.events
            .iter()
            .filter(|e| e.appliance == appliance && e.unit == unit)
            .map(SwitchOnEvent::duration)
            .sum()
    }
}

impl fmt::Display for SwitchOnEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "appliance {} unit {} (x{}) {:02}:{:02}-{:02}:{:02}",
            self.appliance,
            self.unit,
            self.units,
            self.start / 60,
            self.start % 60,
            self.end / 60,
            self.end % 60,
        )
    }
}
