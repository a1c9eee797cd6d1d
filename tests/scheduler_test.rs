// ABOUTME: End-to-end scheduler tests: calendar contiguity, phase anchoring and idempotence
// ABOUTME: Also pins the multi-race validation policy and the rest-cycle invariant
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use chrono::{Duration, NaiveDate, Weekday};
use pierre_periodization::config::PlanningTables;
use pierre_periodization::errors::ErrorCode;
use pierre_periodization::models::{
    AthleteLevel, AthleteProfile, CycleType, DayDurations, LoadRampPreference, Objective,
    RaceSpec, RecuperationNeed, Sport, WeekOrganization,
};
use pierre_periodization::planning::{compute_training_plan, PlanRequest, StoredCycles};

fn athlete() -> AthleteProfile {
    AthleteProfile {
        level: AthleteLevel::Confirmed,
        recuperation: RecuperationNeed::Low,
        weekly_hours: 5.0,
        intensity_sessions: 1,
        longest_workout_hours: 1.5,
        next_resting_week: Some(3),
        ramp: LoadRampPreference::High,
    }
}

fn half_marathon(date: NaiveDate) -> RaceSpec {
    RaceSpec {
        date,
        sport: Sport::Run,
        objective: Objective::Perf,
        distance_km: 21.1,
        target_hours: 1,
        target_minutes: 40,
        weekly_start_hours: 3.0,
        weekly_end_hours: 9.0,
        secondary_share: None,
    }
}

fn week_org() -> WeekOrganization {
    WeekOrganization {
        long_workout_day: Weekday::Sun,
        available_days: vec![Weekday::Tue, Weekday::Thu, Weekday::Sat, Weekday::Sun],
        day_durations: DayDurations::from_hours([0.0, 2.0, 0.0, 2.0, 0.0, 2.0, 5.0]),
    }
}

fn request(races: Vec<RaceSpec>) -> PlanRequest {
    PlanRequest {
        athlete: athlete(),
        races,
        week_organization: week_org(),
        completed_workouts: Vec::new(),
        stored: StoredCycles::default(),
    }
}

#[test]
fn test_single_race_calendar_is_contiguous_through_race_day() {
    let today = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(); // a Monday
    let race_day = NaiveDate::from_ymd_opt(2025, 4, 6).unwrap(); // a Sunday
    let tables = PlanningTables::default();
    let plan = compute_training_plan(&request(vec![half_marathon(race_day)]), today, &tables)
        .unwrap();

    assert!(!plan.microcycles.is_empty());
    assert_eq!(plan.microcycles[0].start_date, today);
    let last = plan.microcycles.last().unwrap();
    assert_eq!(last.cycle_type, CycleType::Compet);
    assert_eq!(last.end_date, race_day);

    for pair in plan.microcycles.windows(2) {
        assert_eq!(
            pair[1].start_date,
            pair[0].end_date + Duration::days(1),
            "gap between {} and {}",
            pair[0].end_date,
            pair[1].start_date
        );
    }
}

#[test]
fn test_single_race_phase_windows_are_anchored_backwards() {
    let today = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
    let race_day = NaiveDate::from_ymd_opt(2025, 4, 6).unwrap();
    let tables = PlanningTables::default();
    let plan = compute_training_plan(&request(vec![half_marathon(race_day)]), today, &tables)
        .unwrap();

    let compet = plan
        .microcycles
        .iter()
        .find(|micro| micro.cycle_type == CycleType::Compet)
        .unwrap();
    assert_eq!(compet.start_date, NaiveDate::from_ymd_opt(2025, 3, 31).unwrap());
    assert_eq!(compet.end_date, race_day);

    let taper = plan
        .microcycles
        .iter()
        .find(|micro| micro.cycle_type == CycleType::PreCompet)
        .unwrap();
    assert_eq!(taper.start_date, NaiveDate::from_ymd_opt(2025, 3, 24).unwrap());
    assert_eq!(taper.end_date, NaiveDate::from_ymd_opt(2025, 3, 30).unwrap());
    assert!(taper.theoretical_resting);
    // half the peak load, prorated over the taper days
    assert!((taper.theoretical_weekly_tss - 630.0 / 2.0).abs() < 1e-6);
}

#[test]
fn test_first_build_week_ramps_from_the_start_load() {
    let today = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
    let race_day = NaiveDate::from_ymd_opt(2025, 4, 6).unwrap();
    let tables = PlanningTables::default();
    let plan = compute_training_plan(&request(vec![half_marathon(race_day)]), today, &tables)
        .unwrap();

    // the first full week starts the following Monday, one ramp step above
    // the bootstrap load of 210
    let first_full = plan
        .microcycles
        .iter()
        .find(|micro| micro.start_date == NaiveDate::from_ymd_opt(2025, 1, 13).unwrap())
        .unwrap();
    assert!((first_full.theoretical_weekly_tss - 210.0 * 1.1 * 1.1).abs() < 0.5);
}

#[test]
fn test_rest_cycle_invariant_across_the_stitched_schedule() {
    let today = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
    let race_day = NaiveDate::from_ymd_opt(2025, 4, 6).unwrap();
    let tables = PlanningTables::default();
    let plan = compute_training_plan(&request(vec![half_marathon(race_day)]), today, &tables)
        .unwrap();

    let mut streak = 0;
    for micro in plan
        .microcycles
        .iter()
        .filter(|micro| micro.cycle_type != CycleType::Compet)
    {
        if micro.theoretical_resting {
            streak = 0;
        } else {
            streak += 1;
            assert!(
                streak <= 3,
                "{} consecutive working weeks at {}",
                streak,
                micro.start_date
            );
        }
    }
}

#[test]
fn test_future_weeks_carry_day_by_day_plans() {
    let today = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
    let race_day = NaiveDate::from_ymd_opt(2025, 4, 6).unwrap();
    let tables = PlanningTables::default();
    let plan = compute_training_plan(&request(vec![half_marathon(race_day)]), today, &tables)
        .unwrap();

    for micro in &plan.microcycles {
        assert!(
            !micro.day_by_day.is_empty(),
            "week starting {} has no day-by-day plan",
            micro.start_date
        );
        // every planned workout's stress matches its zone times
        for (_, workouts) in micro.day_by_day.iter() {
            for workout in workouts {
                let from_times = tables
                    .tss_for_times(Sport::Run, &workout.seconds_in_zone)
                    .unwrap();
                assert!((from_times - workout.tss).abs() < 1.5);
            }
        }
    }
}

#[test]
fn test_planning_is_deterministic_for_identical_inputs() {
    let today = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
    let race_day = NaiveDate::from_ymd_opt(2025, 4, 6).unwrap();
    let tables = PlanningTables::default();
    let input = request(vec![half_marathon(race_day)]);

    let first = compute_training_plan(&input, today, &tables).unwrap();
    let second = compute_training_plan(&input, today, &tables).unwrap();

    let shape = |plan: &pierre_periodization::planning::TrainingPlan| -> Vec<_> {
        plan.microcycles
            .iter()
            .map(|micro| {
                (
                    micro.start_date,
                    micro.end_date,
                    micro.cycle_type,
                    micro.theoretical_resting,
                    (micro.theoretical_weekly_tss * 100.0).round() as i64,
                )
            })
            .collect()
    };
    assert_eq!(shape(&first), shape(&second));
}

#[test]
fn test_replanning_preserves_week_identity() {
    let today = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
    let race_day = NaiveDate::from_ymd_opt(2025, 4, 6).unwrap();
    let tables = PlanningTables::default();
    let mut input = request(vec![half_marathon(race_day)]);

    let first = compute_training_plan(&input, today, &tables).unwrap();
    input.stored = StoredCycles {
        macrocycles: first.macrocycles.clone(),
        microcycles: first.microcycles.clone(),
    };
    let second = compute_training_plan(&input, today, &tables).unwrap();

    // stored future weeks are merged, not recreated: identities survive
    let first_ids: Vec<_> = first.microcycles.iter().map(|micro| micro.id).collect();
    let mut preserved = 0;
    for micro in &second.microcycles {
        if first_ids.contains(&micro.id) {
            preserved += 1;
        }
    }
    assert!(
        preserved >= first.microcycles.len() - 1,
        "only {preserved} of {} week identities survived replanning",
        first.microcycles.len()
    );
}

#[test]
fn test_races_out_of_order_are_rejected() {
    let today = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
    let tables = PlanningTables::default();
    let races = vec![
        half_marathon(NaiveDate::from_ymd_opt(2025, 4, 6).unwrap()),
        half_marathon(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()),
    ];
    let error = compute_training_plan(&request(races), today, &tables).unwrap_err();
    assert_eq!(error.code, ErrorCode::Consistency);
}

#[test]
fn test_negative_distance_race_is_skipped_not_fatal() {
    let today = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
    let tables = PlanningTables::default();
    let mut bogus = half_marathon(NaiveDate::from_ymd_opt(2025, 2, 2).unwrap());
    bogus.distance_km = -5.0;
    let races = vec![bogus, half_marathon(NaiveDate::from_ymd_opt(2025, 4, 6).unwrap())];
    let plan = compute_training_plan(&request(races), today, &tables).unwrap();

    // only the valid race produced cycles
    let compet_count = plan
        .microcycles
        .iter()
        .filter(|micro| micro.cycle_type == CycleType::Compet)
        .count();
    assert_eq!(compet_count, 1);
    assert_eq!(
        plan.microcycles.last().unwrap().end_date,
        NaiveDate::from_ymd_opt(2025, 4, 6).unwrap()
    );
}

#[test]
fn test_planning_inside_the_competition_window_stops_there() {
    let today = NaiveDate::from_ymd_opt(2025, 4, 2).unwrap();
    let race_day = NaiveDate::from_ymd_opt(2025, 4, 6).unwrap();
    let tables = PlanningTables::default();
    let plan = compute_training_plan(&request(vec![half_marathon(race_day)]), today, &tables)
        .unwrap();

    assert_eq!(plan.microcycles.len(), 1);
    assert_eq!(plan.microcycles[0].cycle_type, CycleType::Compet);
    assert_eq!(plan.microcycles[0].end_date, race_day);
}

#[test]
fn test_macrocycles_cover_the_horizon_without_overlap() {
    let today = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
    let race_day = NaiveDate::from_ymd_opt(2025, 4, 6).unwrap();
    let tables = PlanningTables::default();
    let plan = compute_training_plan(&request(vec![half_marathon(race_day)]), today, &tables)
        .unwrap();

    assert!(!plan.macrocycles.is_empty());
    for pair in plan.macrocycles.windows(2) {
        assert!(
            pair[1].start_date > pair[0].end_date,
            "overlapping phases {} and {}",
            pair[0].start_date,
            pair[1].start_date
        );
    }
    let compet_phases = plan
        .macrocycles
        .iter()
        .filter(|phase| phase.cycle_type == CycleType::Compet)
        .count();
    assert_eq!(compet_phases, 1);
    assert_eq!(plan.macrocycles.last().unwrap().end_date, race_day);
}
