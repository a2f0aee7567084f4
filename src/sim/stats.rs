//! Post-hoc statistics computed from load profiles.

use std::fmt;

use crate::calendar::MINUTES_PER_DAY;

use super::types::LoadProfile;

/// Per minute-of-day variability across all days of a profile.
///
/// Each vector has 1440 entries.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyBands {
    pub mean_w: Vec<f64>,
    pub min_w: Vec<f64>,
    pub max_w: Vec<f64>,
    /// 5th percentile (linear interpolation between closest ranks).
    pub p05_w: Vec<f64>,
    /// 95th percentile.
    pub p95_w: Vec<f64>,
}

impl DailyBands {
    /// Computes the bands over every day of `profile`.
    ///
    /// An empty profile yields all-zero bands.
    pub fn from_profile(profile: &LoadProfile) -> Self {
        let mut bands = Self {
            mean_w: vec![0.0; MINUTES_PER_DAY],
            min_w: vec![0.0; MINUTES_PER_DAY],
            max_w: vec![0.0; MINUTES_PER_DAY],
            p05_w: vec![0.0; MINUTES_PER_DAY],
            p95_w: vec![0.0; MINUTES_PER_DAY],
        };
        let days = profile.days();
        if days == 0 {
            return bands;
        }

        let mut column = Vec::with_capacity(days);
        for minute in 0..MINUTES_PER_DAY {
            column.clear();
            column.extend((0..days).map(|d| profile.day(d)[minute]));
            column.sort_by(f64::total_cmp);

            bands.mean_w[minute] = column.iter().sum::<f64>() / days as f64;
            bands.min_w[minute] = column[0];
            bands.max_w[minute] = column[days - 1];
            bands.p05_w[minute] = percentile(&column, 0.05);
            bands.p95_w[minute] = percentile(&column, 0.95);
        }
        bands
    }
}

/// Percentile of an ascending, non-empty slice.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Headline figures of one load profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSummary {
    /// Highest minute value (W).
    pub peak_w: f64,
    /// Day and minute-of-day of the peak.
    pub peak_day: usize,
    pub peak_minute_of_day: usize,
    pub mean_w: f64,
    pub energy_kwh: f64,
    /// Mean over peak; 0 for an all-zero profile.
    pub load_factor: f64,
}

impl ProfileSummary {
    pub fn from_profile(profile: &LoadProfile) -> Self {
        let (peak_at, peak_w) = profile.peak();
        let mean_w = if profile.is_empty() {
            0.0
        } else {
            profile.total_watt_minutes() / profile.len() as f64
        };
        Self {
            peak_w,
            peak_day: peak_at / MINUTES_PER_DAY,
            peak_minute_of_day: peak_at % MINUTES_PER_DAY,
            mean_w,
            energy_kwh: profile.energy_kwh(),
            load_factor: if peak_w > 0.0 { mean_w / peak_w } else { 0.0 },
        }
    }
}

impl fmt::Display for ProfileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Energy:       {:>12.2} kWh", self.energy_kwh)?;
        writeln!(f, "Mean load:    {:>12.2} W", self.mean_w)?;
        writeln!(
            f,
            "Peak load:    {:>12.2} W (day {}, {:02}:{:02})",
            self.peak_w,
            self.peak_day,
            self.peak_minute_of_day / 60,
            self.peak_minute_of_day % 60
        )?;
        write!(f, "Load factor:  {:>12.3}", self.load_factor)
    }
}
