// ABOUTME: Tests for the weekly load progression: fondamental ramp and specific pattern
// ABOUTME: Pins monotonicity, the rest-cycle invariant and the 95% ramp termination rule
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use pierre_periodization::models::KeyWorkout;
use pierre_periodization::planning::progression::{
    fondamental_weeks_required, specific_weeks, SkeletonWeek,
};

fn max_working_streak(weeks: &[SkeletonWeek]) -> usize {
    let mut streak = 0;
    let mut longest = 0;
    for week in weeks {
        if week.theoretical_resting {
            streak = 0;
        } else {
            streak += 1;
            longest = longest.max(streak);
        }
    }
    longest
}

#[test]
fn test_ramp_from_100_to_120_takes_two_weeks() {
    let ramp = fondamental_weeks_required(100.0, 1, 0, 120.0, 0.1, 4, 4).unwrap();
    let loads: Vec<f64> = ramp
        .weeks
        .iter()
        .map(|week| week.theoretical_weekly_tss)
        .collect();
    assert_eq!(loads.len(), 2);
    assert!((loads[0] - 110.0).abs() < 1e-9);
    // second week is capped at the end load
    assert!((loads[1] - 120.0).abs() < 1e-9);
}

#[test]
fn test_ramp_is_monotonic_across_working_weeks() {
    let ramp = fondamental_weeks_required(150.0, 1, 0, 600.0, 0.07, 4, 3).unwrap();
    let mut previous = 0.0;
    for week in ramp.weeks.iter().filter(|week| !week.theoretical_resting) {
        assert!(
            week.theoretical_weekly_tss >= previous,
            "working-week load regressed: {} after {previous}",
            week.theoretical_weekly_tss
        );
        assert!(week.theoretical_weekly_tss <= 600.0);
        previous = week.theoretical_weekly_tss;
    }
}

#[test]
fn test_ramp_respects_rest_cycle() {
    let ramp = fondamental_weeks_required(100.0, 1, 0, 800.0, 0.1, 4, 3).unwrap();
    assert!(max_working_streak(&ramp.weeks) <= 3);
}

#[test]
fn test_ramp_already_at_target_emits_nothing() {
    let ramp = fondamental_weeks_required(580.0, 3, 2, 600.0, 0.1, 4, 1).unwrap();
    assert!(ramp.weeks.is_empty());
}

#[test]
fn test_fondamental_weeks_carry_long_intensity() {
    let ramp = fondamental_weeks_required(200.0, 1, 0, 400.0, 0.1, 4, 3).unwrap();
    for week in ramp.weeks.iter().filter(|week| !week.theoretical_resting) {
        assert_eq!(week.key_workouts, vec![KeyWorkout::LongIntensity]);
    }
}

#[test]
fn test_specific_weeks_carry_all_three_key_workouts() {
    let weeks = specific_weeks(6, 400.0, 4, 2, 1, 1);
    for week in weeks.iter().filter(|week| !week.theoretical_resting) {
        assert!(week.key_workouts.contains(&KeyWorkout::RaceIntensity));
        assert!(week.key_workouts.contains(&KeyWorkout::Long));
        assert!(week.key_workouts.contains(&KeyWorkout::ShortIntensity));
    }
}

#[test]
fn test_specific_partial_cycle_prefers_working_suffix() {
    // two available weeks of a W R W W pattern: the prefix ends on rest, so
    // the working suffix is taken instead
    let weeks = specific_weeks(2, 300.0, 4, 1, 1, 1);
    assert_eq!(weeks.len(), 2);
    assert!(weeks.iter().all(|week| !week.theoretical_resting));
}

#[test]
fn test_specific_full_cycle_plus_partial_ends_working() {
    let weeks = specific_weeks(6, 300.0, 4, 2, 1, 1);
    assert_eq!(weeks.len(), 6);
    assert!(!weeks.last().unwrap().theoretical_resting);
}

#[test]
fn test_specific_weeks_rest_cycle_invariant() {
    for available in 1..=14u32 {
        let weeks = specific_weeks(available, 300.0, 4, 3, 1, 1);
        assert!(
            max_working_streak(&weeks) <= 4,
            "streak too long for {available} available weeks"
        );
    }
}

#[test]
fn test_resting_weeks_run_at_sixty_percent() {
    let weeks = specific_weeks(8, 500.0, 4, 1, 1, 1);
    for week in weeks.iter().filter(|week| week.theoretical_resting) {
        assert!((week.theoretical_weekly_tss - 300.0).abs() < 1e-9);
    }
}
