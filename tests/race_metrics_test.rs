// ABOUTME: Tests for derived race metrics: event size class, race zone and event TSS
// ABOUTME: Pins the sport-specific distance thresholds and the objective/size zone table
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use chrono::NaiveDate;
use pierre_periodization::config::PlanningTables;
use pierre_periodization::models::{EventSize, Objective, RaceSpec, Sport, Zone};

fn race(sport: Sport, objective: Objective, distance_km: f64, minutes: u32) -> RaceSpec {
    RaceSpec {
        date: NaiveDate::from_ymd_opt(2025, 4, 6).unwrap(),
        sport,
        objective,
        distance_km,
        target_hours: minutes / 60,
        target_minutes: minutes % 60,
        weekly_start_hours: 3.0,
        weekly_end_hours: 9.0,
        secondary_share: None,
    }
}

#[test]
fn test_half_marathon_is_medium() {
    assert_eq!(
        race(Sport::Run, Objective::Perf, 21.1, 100).event_size(),
        EventSize::M
    );
}

#[test]
fn test_medium_perf_races_at_threshold() {
    assert_eq!(race(Sport::Run, Objective::Perf, 21.1, 100).race_zone(), Zone::Z4);
}

#[test]
fn test_finish_objective_always_races_endurance() {
    for distance in [10.0, 21.1, 42.2, 80.0] {
        assert_eq!(
            race(Sport::Run, Objective::Finish, distance, 300).race_zone(),
            Zone::Z2
        );
    }
}

#[test]
fn test_event_tss_is_zone_rate_over_target_duration() {
    let tables = PlanningTables::default();
    // Z4 at 100 TSS/h over 100 minutes
    let event = race(Sport::Run, Objective::Perf, 21.1, 100);
    let tss = event.event_tss(&tables).unwrap();
    assert!((tss - 100.0 * 100.0 / 60.0).abs() < 1e-9);
}

#[test]
fn test_bike_event_sizes_use_bike_thresholds() {
    assert_eq!(race(Sport::Bike, Objective::Perf, 70.0, 150).event_size(), EventSize::M);
    assert_eq!(race(Sport::Bike, Objective::Perf, 120.0, 240).event_size(), EventSize::L);
}

#[test]
fn test_secondary_share_validation() {
    let mut event = race(Sport::Run, Objective::Perf, 21.1, 100);
    event.secondary_share = Some(0.3);
    assert!(event.validate().is_ok());
    assert!((event.main_sport_share() - 0.7).abs() < 1e-9);
    event.secondary_share = Some(0.6);
    assert!(event.validate().is_err());
}

#[test]
fn test_zero_target_time_is_rejected() {
    let event = race(Sport::Run, Objective::Perf, 21.1, 0);
    assert!(event.validate().is_err());
}
