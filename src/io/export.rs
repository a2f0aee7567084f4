//! CSV export for simulation results.
//!
//! Both layouts have one column per user category (in name order) followed
//! by a `total` column.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::calendar::{MINUTES_PER_DAY, MINUTES_PER_HOUR};
use crate::sim::types::{LoadProfile, SimulationResult};

const TOTAL_COLUMN: &str = "total";

fn header<'a>(leading: &[&'a str], result: &'a SimulationResult) -> Vec<&'a str> {
    leading
        .iter()
        .copied()
        .chain(result.per_user_category.keys().map(String::as_str))
        .chain(std::iter::once(TOTAL_COLUMN))
        .collect()
}

fn columns(result: &SimulationResult) -> Vec<&LoadProfile> {
    result
        .per_user_category
        .values()
        .chain(std::iter::once(&result.total))
        .collect()
}

/// Writes the minute-resolution profiles as CSV.
///
/// Columns: `day`, `minute` (of day), one power column (W) per category,
/// `total`. One row per simulated minute.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_minute_csv(result: &SimulationResult, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(header(&["day", "minute"], result))?;

    let cols = columns(result);
    let mut row = Vec::with_capacity(cols.len() + 2);
    for day in 0..result.days() {
        for minute in 0..MINUTES_PER_DAY {
            row.clear();
            row.push(day.to_string());
            row.push(minute.to_string());
            let i = day * MINUTES_PER_DAY + minute;
            row.extend(cols.iter().map(|p| format!("{:.3}", p[i])));
            wtr.write_record(&row)?;
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Writes hourly aggregates as CSV.
///
/// Columns: `hour` (of the year), `day`, `hour_of_day`, one column per
/// category, `total`. Each value is the sum of the hour's 60 minute values
/// (W·min); divide by 60 for Wh.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_hourly_csv(result: &SimulationResult, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(header(&["hour", "day", "hour_of_day"], result))?;

    let hourly: Vec<Vec<f64>> = columns(result).iter().map(|p| p.to_hourly()).collect();
    let hours_per_day = MINUTES_PER_DAY / MINUTES_PER_HOUR;
    let hours = result.days() * hours_per_day;

    let mut row = Vec::with_capacity(hourly.len() + 3);
    for hour in 0..hours {
        row.clear();
        row.push(hour.to_string());
        row.push((hour / hours_per_day).to_string());
        row.push((hour % hours_per_day).to_string());
        row.extend(hourly.iter().map(|series| format!("{:.3}", series[hour])));
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes the hourly CSV to a file at `path`.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_hourly_csv(result: &SimulationResult, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_hourly_csv(result, io::BufWriter::new(file))
}
