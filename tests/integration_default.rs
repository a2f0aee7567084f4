//! Integration tests for whole simulation runs.

mod common;

use approx::assert_relative_eq;
use ramp_sim::archetype::UserArchetype;
use ramp_sim::calendar::{Calendar, MINUTES_PER_DAY, Weekday};
use ramp_sim::error::SimulationError;
use ramp_sim::logging;
use ramp_sim::sim::{CancelToken, SimulationResult, simulate, simulate_with_cancel};

const SEED: u64 = 42;

fn run_mixed(days: usize, seed: u64) -> SimulationResult {
    logging::init_test();
    let calendar = common::seasonal_calendar(days);
    simulate(
        &calendar,
        &[common::household(4), common::school(1)],
        seed,
    )
    .expect("simulation runs")
}

#[test]
fn determinism_same_seed_identical_results() {
    let first = run_mixed(14, SEED);
    let second = run_mixed(14, SEED);
    assert_eq!(first, second);
}

#[test]
fn different_seeds_give_different_profiles() {
    let first = run_mixed(14, SEED);
    let second = run_mixed(14, SEED + 1);
    assert_ne!(first.total, second.total);
}

#[test]
fn total_is_exact_sum_of_categories() {
    let result = run_mixed(10, SEED);
    assert_eq!(result.per_user_category.len(), 2);
    for minute in 0..result.total.len() {
        let mut expected = 0.0;
        for profile in result.per_user_category.values() {
            expected += profile[minute];
        }
        assert_eq!(result.total[minute], expected, "minute {minute}");
    }
}

#[test]
fn every_calendar_day_is_covered() {
    let result = run_mixed(21, SEED);
    assert_eq!(result.days(), 21);
    assert_eq!(result.total.len(), 21 * MINUTES_PER_DAY);
    for profile in result.per_user_category.values() {
        assert_eq!(profile.days(), 21);
    }
}

#[test]
fn lamp_power_stays_inside_its_window() {
    let calendar = common::seasonal_calendar(30);
    let archetype =
        UserArchetype::new("lamps", 5, vec![common::lamp()]).expect("valid archetype");
    let result = simulate(&calendar, &[archetype], SEED).expect("simulation runs");
    let (start, end) = common::LAMP_WINDOW;
    for day in 0..result.days() {
        for (minute, w) in result.total.day(day).iter().enumerate() {
            if *w != 0.0 {
                assert!(
                    (start..end).contains(&minute),
                    "day {day} minute {minute} has {w} W outside the window"
                );
            }
        }
    }
    assert!(!result.total.is_all_zero());
}

#[test]
fn unit_durations_respect_bounds_and_windows() {
    let calendar = common::seasonal_calendar(60);
    let archetype = common::household(3);
    for mut instance in archetype.instantiate(SEED) {
        for day in calendar.days() {
            let trace = instance.simulate_day(day).expect("day simulates");
            for event in &trace.events {
                let params = archetype.appliances()[event.appliance]
                    .resolve_for(day)
                    .expect("resolves");
                assert!(
                    params
                        .windows()
                        .iter()
                        .any(|w| event.start >= w.start && event.end <= w.end),
                    "{event} is not inside one window"
                );
            }
            for (i, appliance) in archetype.appliances().iter().enumerate() {
                let settings = appliance.settings();
                let params = appliance.resolve_for(day).expect("resolves");
                let bound = (params.avg_functioning_minutes_per_day() as f64
                    * (1.0 + settings.random_variation_day_pct / 100.0))
                    .floor() as usize;
                for unit in 0..settings.num_units_per_user {
                    assert!(trace.unit_minutes(i, unit) <= bound);
                }
            }
        }
    }
}

#[test]
fn seasonal_appliance_is_off_in_other_season() {
    let calendar = common::seasonal_calendar(20);
    let archetype = common::household(2);
    let fan = 2;
    let mut dry_minutes = 0;
    for mut instance in archetype.instantiate(SEED) {
        for day in calendar.days() {
            let trace = instance.simulate_day(day).expect("day simulates");
            let minutes = trace.unit_minutes(fan, 0);
            if day.season.as_str() == "rainy" {
                assert_eq!(minutes, 0, "fan ran on rainy day {}", day.index);
            } else {
                dry_minutes += minutes;
            }
        }
    }
    assert!(dry_minutes > 0);
}

#[test]
fn fixed_window_target_is_met_every_day() {
    let calendar = Calendar::standard_year(365, Weekday::Monday).expect("valid calendar");
    let result = simulate(&calendar, &[common::fixed_lamp_archetype()], SEED)
        .expect("simulation runs");
    for day in 0..result.days() {
        let minutes = result.total.day(day);
        let on: Vec<usize> = (0..MINUTES_PER_DAY).filter(|&m| minutes[m] != 0.0).collect();
        assert_eq!(on.len(), 30, "day {day}");
        assert!(on.iter().all(|m| (480..540).contains(m)));
        assert!(on.iter().all(|&m| minutes[m] == 100.0));
    }
}

#[test]
fn zero_user_archetype_contributes_nothing() {
    let calendar = common::seasonal_calendar(7);
    let with_empty = simulate(
        &calendar,
        &[common::household(2), common::school(0)],
        SEED,
    )
    .expect("simulation runs");
    let without = simulate(&calendar, &[common::household(2)], SEED).expect("simulation runs");

    let school = with_empty.category("school").expect("school present");
    assert!(school.is_all_zero());
    assert_eq!(with_empty.total, without.total);
}

#[test]
fn hourly_series_preserves_energy() {
    let calendar = Calendar::standard_year(365, Weekday::Monday).expect("valid calendar");
    let result = simulate(&calendar, &[common::household(1)], SEED).expect("simulation runs");
    let hourly = result.total.to_hourly();
    assert_eq!(hourly.len(), 8760);
    let hourly_kwh = hourly.iter().sum::<f64>() / 60.0 / 1000.0;
    assert_relative_eq!(hourly_kwh, result.total.energy_kwh(), max_relative = 1e-9);
}

#[test]
fn cancelled_run_returns_no_result() {
    let calendar = common::seasonal_calendar(30);
    let token = CancelToken::new();
    let worker = token.clone();
    worker.cancel();
    let result = simulate_with_cancel(&calendar, &[common::household(3)], SEED, &token);
    assert!(matches!(result, Err(SimulationError::Cancelled)));

    let fresh = simulate_with_cancel(&calendar, &[common::household(3)], SEED, &CancelToken::new());
    assert!(fresh.is_ok());
}

#[test]
fn result_does_not_depend_on_thread_count() {
    let calendar = common::seasonal_calendar(10);
    let archetypes = [common::household(9), common::school(2)];
    let run = |threads: usize| {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .expect("thread pool")
            .install(|| simulate(&calendar, &archetypes, SEED))
            .expect("simulation runs")
    };
    assert_eq!(run(1), run(4));
}

#[test]
fn instance_streams_do_not_depend_on_user_count() {
    let calendar = common::seasonal_calendar(5);
    let small = common::household(2);
    let large = common::household(7);
    let mut a = small.instance(SEED, 1);
    let mut b = large.instance(SEED, 1);
    for day in calendar.days() {
        assert_eq!(
            a.simulate_day(day).expect("day simulates"),
            b.simulate_day(day).expect("day simulates")
        );
    }
}
