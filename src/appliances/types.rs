//! Building blocks of an appliance's usage pattern.

use rand::{Rng, rngs::StdRng};

use crate::calendar::{MINUTES_PER_DAY, SeasonId, WeekClassId};
use crate::error::ConfigError;

/// Half-open time-of-day interval `[start, end)` in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Window {
    pub start: usize,
    pub end: usize,
}

impl Window {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn width(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn contains(&self, minute: usize) -> bool {
        minute >= self.start && minute < self.end
    }
}

/// One step of a functioning cycle: constant power for a number of minutes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleStep {
    pub power_w: f64,
    pub duration_minutes: usize,
}

/// Multi-step power pattern of one switch-on (e.g. compressor on/off).
///
/// When an event is longer than the cycle, the steps repeat.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctioningCycle {
    steps: Vec<CycleStep>,
    total_minutes: usize,
}

impl FunctioningCycle {
    /// # Errors
    ///
    /// Returns a `ConfigError` if there are no steps, a step lasts zero
    /// minutes, or a step power is negative or not finite.
    pub fn new(steps: Vec<CycleStep>) -> Result<Self, ConfigError> {
        if steps.is_empty() {
            return Err(ConfigError::new("cycle", "must have at least one step"));
        }
        for (i, step) in steps.iter().enumerate() {
            if step.duration_minutes == 0 {
                return Err(ConfigError::new(
                    format!("cycle[{i}].minutes"),
                    "must be > 0",
                ));
            }
            if !step.power_w.is_finite() || step.power_w < 0.0 {
                return Err(ConfigError::new(
                    format!("cycle[{i}].power_w"),
                    "must be a finite number >= 0",
                ));
            }
        }
        let total_minutes = steps.iter().map(|s| s.duration_minutes).sum();
        Ok(Self {
            steps,
            total_minutes,
        })
    }

    pub fn steps(&self) -> &[CycleStep] {
        &self.steps
    }

    /// Length of one full pass through the steps.
    pub fn total_minutes(&self) -> usize {
        self.total_minutes
    }

    /// Index of the step active `offset` minutes after switch-on.
    pub fn step_index_at(&self, offset: usize) -> usize {
        let mut t = offset % self.total_minutes;
        for (i, step) in self.steps.iter().enumerate() {
            if t < step.duration_minutes {
                return i;
            }
            t -= step.duration_minutes;
        }
        self.steps.len() - 1
    }
}

/// Windows, daily functioning time and optional cycle for one
/// (season, week-class) combination.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageParams {
    windows: Vec<Window>,
    avg_functioning_minutes_per_day: usize,
    cycle: Option<FunctioningCycle>,
}

impl UsageParams {
    /// Creates validated usage parameters.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if windows are empty, empty-width, outside
    /// `[0, 1440)`, unsorted or overlapping, or if the daily functioning time
    /// exceeds the total window width.
    pub fn new(
        windows: Vec<Window>,
        avg_functioning_minutes_per_day: usize,
        cycle: Option<FunctioningCycle>,
    ) -> Result<Self, ConfigError> {
        if windows.is_empty() {
            return Err(ConfigError::new("windows", "at least one window is required"));
        }
        for (i, w) in windows.iter().enumerate() {
            if w.start >= w.end {
                return Err(ConfigError::new(
                    format!("windows[{i}]"),
                    format!("start {} must be < end {}", w.start, w.end),
                ));
            }
            if w.end > MINUTES_PER_DAY {
                return Err(ConfigError::new(
                    format!("windows[{i}]"),
                    format!("end {} is past the end of the day ({MINUTES_PER_DAY})", w.end),
                ));
            }
            if i > 0 && w.start < windows[i - 1].end {
                return Err(ConfigError::new(
                    format!("windows[{i}]"),
                    "windows must be sorted and non-overlapping",
                ));
            }
        }
        let available: usize = windows.iter().map(Window::width).sum();
        if avg_functioning_minutes_per_day > available {
            return Err(ConfigError::new(
                "func_time",
                format!(
                    "{avg_functioning_minutes_per_day} min exceeds the {available} min of available windows"
                ),
            ));
        }
        Ok(Self {
            windows,
            avg_functioning_minutes_per_day,
            cycle,
        })
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn avg_functioning_minutes_per_day(&self) -> usize {
        self.avg_functioning_minutes_per_day
    }

    pub fn cycle(&self) -> Option<&FunctioningCycle> {
        self.cycle.as_ref()
    }

    /// Sum of window widths.
    pub fn window_minutes(&self) -> usize {
        self.windows.iter().map(Window::width).sum()
    }
}

/// Selects which days a keyed [`UsageParams`] entry applies to.
///
/// `None` matches any season / week-class.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UsageKey {
    pub season: Option<SeasonId>,
    pub week_class: Option<WeekClassId>,
}

impl UsageKey {
    pub fn exact(season: impl Into<String>, week_class: impl Into<String>) -> Self {
        Self {
            season: Some(SeasonId::new(season)),
            week_class: Some(WeekClassId::new(week_class)),
        }
    }

    pub fn season(season: impl Into<String>) -> Self {
        Self {
            season: Some(SeasonId::new(season)),
            week_class: None,
        }
    }

    pub fn week_class(week_class: impl Into<String>) -> Self {
        Self {
            season: None,
            week_class: Some(WeekClassId::new(week_class)),
        }
    }

    /// True when neither season nor week-class is set.
    pub fn is_wildcard(&self) -> bool {
        self.season.is_none() && self.week_class.is_none()
    }
}

/// Draws a multiplicative factor uniformly from `[1 - pct/100, 1 + pct/100]`.
///
/// Returns exactly `1.0` without touching the generator when `pct <= 0`.
pub fn uniform_variation(rng: &mut StdRng, pct: f64) -> f64 {
    if pct <= 0.0 {
        return 1.0;
    }
    let spread = pct / 100.0;
    1.0 + rng.random_range(-spread..=spread)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn windows_must_be_sorted_and_disjoint() {
        let overlapping = vec![Window::new(60, 120), Window::new(100, 200)];
        let err = UsageParams::new(overlapping, 10, None).expect_err("must fail");
        assert_eq!(err.field, "windows[1]");

        let unsorted = vec![Window::new(600, 700), Window::new(60, 120)];
        assert!(UsageParams::new(unsorted, 10, None).is_err());

        let adjacent = vec![Window::new(60, 120), Window::new(120, 180)];
        assert!(UsageParams::new(adjacent, 120, None).is_ok());
    }

    #[test]
    fn windows_must_fit_inside_the_day() {
        assert!(UsageParams::new(vec![Window::new(1400, 1441)], 10, None).is_err());
        assert!(UsageParams::new(vec![Window::new(50, 50)], 0, None).is_err());
        assert!(UsageParams::new(vec![], 0, None).is_err());
    }

    #[test]
    fn functioning_time_bounded_by_windows() {
        let err = UsageParams::new(vec![Window::new(480, 540)], 61, None).expect_err("must fail");
        assert_eq!(err.field, "func_time");
        assert!(UsageParams::new(vec![Window::new(480, 540)], 60, None).is_ok());
    }

    #[test]
    fn cycle_steps_repeat() {
        let cycle = FunctioningCycle::new(vec![
            CycleStep {
                power_w: 150.0,
                duration_minutes: 5,
            },
            CycleStep {
                power_w: 5.0,
                duration_minutes: 10,
            },
        ])
        .expect("valid cycle");
        assert_eq!(cycle.total_minutes(), 15);
        assert_eq!(cycle.step_index_at(0), 0);
        assert_eq!(cycle.step_index_at(4), 0);
        assert_eq!(cycle.step_index_at(5), 1);
        assert_eq!(cycle.step_index_at(14), 1);
        assert_eq!(cycle.step_index_at(15), 0);
    }

    #[test]
    fn cycle_rejects_bad_steps() {
        assert!(FunctioningCycle::new(vec![]).is_err());
        let zero = CycleStep {
            power_w: 10.0,
            duration_minutes: 0,
        };
        assert!(FunctioningCycle::new(vec![zero]).is_err());
        let negative = CycleStep {
            power_w: -1.0,
            duration_minutes: 3,
        };
        assert!(FunctioningCycle::new(vec![negative]).is_err());
    }

    #[test]
    fn uniform_variation_stays_in_band() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(uniform_variation(&mut rng, 0.0), 1.0);
        for _ in 0..1000 {
            let f = uniform_variation(&mut rng, 20.0);
            assert!((0.8..=1.2).contains(&f), "factor {f} out of band");
        }
    }
}
