//! Year structure: days, seasons and week-classes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Minutes in one simulated day.
pub const MINUTES_PER_DAY: usize = 1440;
/// Minutes in one hour of the hourly aggregation.
pub const MINUTES_PER_HOUR: usize = 60;
/// Days in a standard (non-leap) year.
pub const DAYS_PER_YEAR: usize = 365;

const MONTH_DAYS: [usize; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

macro_rules! label_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(label: impl Into<String>) -> Self {
                Self(label.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(label: &str) -> Self {
                Self(label.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

label_id!(
    /// Season label (e.g. `"dry"`, `"rainy"`).
    SeasonId
);
label_id!(
    /// Week-class label (e.g. `"weekday"`, `"weekend"`).
    WeekClassId
);

/// Day of the week, Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Zero-based position in the week (Monday = 0).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the weekday `days` days after `self`.
    pub fn advance(self, days: usize) -> Weekday {
        Self::ALL[(self.index() + days % 7) % 7]
    }

    pub fn is_weekend(self) -> bool {
        matches!(self, Weekday::Saturday | Weekday::Sunday)
    }
}

/// Maps a day to its week-class.
///
/// Implemented by [`WeekClassRule`] and by any
/// `Fn(usize, Weekday) -> WeekClassId` closure.
pub trait WeekClassify {
    /// Returns the week-class for the day at `day_index` falling on `weekday`.
    fn classify(&self, day_index: usize, weekday: Weekday) -> WeekClassId;
}

impl<F> WeekClassify for F
where
    F: Fn(usize, Weekday) -> WeekClassId,
{
    fn classify(&self, day_index: usize, weekday: Weekday) -> WeekClassId {
        self(day_index, weekday)
    }
}

/// Table-driven week-class rules.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WeekClassRule {
    /// Monday–Friday map to `"weekday"`, Saturday–Sunday to `"weekend"`.
    #[default]
    WeekdayWeekend,
    /// Every day gets the same class.
    Uniform(WeekClassId),
    /// One class per weekday, Monday first.
    PerWeekday([WeekClassId; 7]),
}

impl WeekClassify for WeekClassRule {
    fn classify(&self, _day_index: usize, weekday: Weekday) -> WeekClassId {
        match self {
            WeekClassRule::WeekdayWeekend if weekday.is_weekend() => WeekClassId::from("weekend"),
            WeekClassRule::WeekdayWeekend => WeekClassId::from("weekday"),
            WeekClassRule::Uniform(class) => class.clone(),
            WeekClassRule::PerWeekday(table) => table[weekday.index()].clone(),
        }
    }
}

/// Start of a season, as a zero-based day index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonBoundary {
    pub start_day: usize,
    pub season: SeasonId,
}

impl SeasonBoundary {
    pub fn new(start_day: usize, season: impl Into<String>) -> Self {
        Self {
            start_day,
            season: SeasonId::new(season),
        }
    }
}

/// Converts a month → season table into season boundaries.
///
/// Consecutive months with the same season are merged into one boundary.
/// Supports 365- and 366-day years.
///
/// # Errors
///
/// Returns a `ConfigError` for any other year length.
pub fn month_season_boundaries(
    year_length_days: usize,
    months: &[SeasonId; 12],
) -> Result<Vec<SeasonBoundary>, ConfigError> {
    let leap = match year_length_days {
        365 => false,
        366 => true,
        n => {
            return Err(ConfigError::new(
                "year_length_days",
                format!("month-based seasons need a 365 or 366 day year, got {n}"),
            ));
        }
    };

    let mut boundaries: Vec<SeasonBoundary> = Vec::new();
    let mut start_day = 0;
    for (month, season) in months.iter().enumerate() {
        if boundaries.last().map(|b| &b.season) != Some(season) {
            boundaries.push(SeasonBoundary {
                start_day,
                season: season.clone(),
            });
        }
        start_day += MONTH_DAYS[month] + usize::from(leap && month == 1);
    }
    Ok(boundaries)
}

/// One resolved calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Day {
    pub index: usize,
    pub weekday: Weekday,
    pub season: SeasonId,
    pub week_class: WeekClassId,
}

/// Ordered sequence of days, each with exactly one season and week-class.
///
/// # Examples
///
/// ```
/// use ramp_sim::calendar::{Calendar, SeasonBoundary, WeekClassRule, Weekday};
///
/// let seasons = [SeasonBoundary::new(0, "dry"), SeasonBoundary::new(120, "rainy")];
/// let cal = Calendar::resolve(365, &seasons, &WeekClassRule::default(), Weekday::Monday)
///     .expect("valid calendar");
/// assert_eq!(cal.len(), 365);
/// assert_eq!(cal.day(120).map(|d| d.season.as_str()), Some("rainy"));
/// assert_eq!(cal.day(5).map(|d| d.week_class.as_str()), Some("weekend"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calendar {
    days: Vec<Day>,
}

impl Calendar {
    /// Resolves a year into days.
    ///
    /// # Arguments
    ///
    /// * `year_length_days` - Number of days in the year (must be > 0)
    /// * `season_boundaries` - Season starts; must begin at day 0 and be strictly increasing
    /// * `week_class_rule` - Day → week-class mapping
    /// * `start_weekday` - Weekday of day 0
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the year is empty or the boundaries are
    /// empty, unsorted, overlapping, out of range, or do not start at day 0.
    pub fn resolve(
        year_length_days: usize,
        season_boundaries: &[SeasonBoundary],
        week_class_rule: &impl WeekClassify,
        start_weekday: Weekday,
    ) -> Result<Self, ConfigError> {
        if year_length_days == 0 {
            return Err(ConfigError::new("year_length_days", "must be > 0"));
        }
        let Some(first) = season_boundaries.first() else {
            return Err(ConfigError::new("seasons", "at least one season is required"));
        };
        if first.start_day != 0 {
            return Err(ConfigError::new(
                "seasons[0].start_day",
                format!("first season must start at day 0, got {}", first.start_day),
            ));
        }
        for (i, pair) in season_boundaries.windows(2).enumerate() {
            if pair[1].start_day <= pair[0].start_day {
                return Err(ConfigError::new(
                    format!("seasons[{}].start_day", i + 1),
                    format!(
                        "season starts must be strictly increasing ({} after {})",
                        pair[1].start_day, pair[0].start_day
                    ),
                ));
            }
        }
        if let Some((i, b)) = season_boundaries
            .iter()
            .enumerate()
            .find(|(_, b)| b.start_day >= year_length_days)
        {
            return Err(ConfigError::new(
                format!("seasons[{i}].start_day"),
                format!(
                    "day {} is outside a {year_length_days}-day year",
                    b.start_day
                ),
            ));
        }

        let mut days = Vec::with_capacity(year_length_days);
        let mut boundary = 0;
        for index in 0..year_length_days {
            while boundary + 1 < season_boundaries.len()
                && season_boundaries[boundary + 1].start_day <= index
            {
                boundary += 1;
            }
            let weekday = start_weekday.advance(index);
            days.push(Day {
                index,
                weekday,
                season: season_boundaries[boundary].season.clone(),
                week_class: week_class_rule.classify(index, weekday),
            });
        }

        Ok(Self { days })
    }

    /// A single-season year with weekday/weekend classes.
    pub fn standard_year(
        year_length_days: usize,
        start_weekday: Weekday,
    ) -> Result<Self, ConfigError> {
        Self::resolve(
            year_length_days,
            &[SeasonBoundary::new(0, "year")],
            &WeekClassRule::WeekdayWeekend,
            start_weekday,
        )
    }

    pub fn days(&self) -> &[Day] {
        &self.days
    }

    pub fn day(&self, index: usize) -> Option<&Day> {
        self.days.get(index)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Total minutes covered by the calendar.
    pub fn total_minutes(&self) -> usize {
        self.days.len() * MINUTES_PER_DAY
    }

    /// Distinct seasons in order of first appearance.
    pub fn seasons(&self) -> Vec<&SeasonId> {
        let mut seen: Vec<&SeasonId> = Vec::new();
        for day in &self.days {
            if !seen.contains(&&day.season) {
                seen.push(&day.season);
            }
        }
        seen
    }

    /// Distinct week-classes in order of first appearance.
    pub fn week_classes(&self) -> Vec<&WeekClassId> {
        let mut seen: Vec<&WeekClassId> = Vec::new();
        for day in &self.days {
            if !seen.contains(&&day.week_class) {
                seen.push(&day.week_class);
            }
        }
        seen
    }
}
