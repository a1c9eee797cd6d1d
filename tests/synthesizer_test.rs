// ABOUTME: Tests for day-by-day workout synthesis: key sessions, placement and conservation
// ABOUTME: Covers the competition week structure and the best-fit day selection rules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use chrono::{NaiveDate, Weekday};
use pierre_periodization::config::PlanningTables;
use pierre_periodization::models::{
    AthleteLevel, AthleteProfile, CycleType, DayDurations, KeyWorkout, LoadRampPreference,
    Microcycle, Objective, RaceSpec, RecuperationNeed, Sport, WeekOrganization, WorkoutType,
};
use pierre_periodization::planning::synthesizer::{find_best_fit_day, plan_week_day_by_day};
use pierre_periodization::planning::{LoadPlan, RaceContext};

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

fn race() -> RaceSpec {
    RaceSpec {
        date: NaiveDate::from_ymd_opt(2025, 4, 6).unwrap(),
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

fn setup() -> (PlanningTables, RaceContext, LoadPlan) {
    let tables = PlanningTables::default();
    let ctx = RaceContext::for_race(&race(), AthleteLevel::Confirmed, &tables).unwrap();
    let plan = LoadPlan::for_race(&athlete(), &race(), &tables).unwrap();
    (tables, ctx, plan)
}

fn specific_week() -> Microcycle {
    let mut micro = Microcycle::new(
        CycleType::Specific,
        NaiveDate::from_ymd_opt(2025, 2, 10).unwrap(),
        NaiveDate::from_ymd_opt(2025, 2, 16).unwrap(),
        400.0,
        false,
    );
    micro.key_workouts = vec![
        KeyWorkout::RaceIntensity,
        KeyWorkout::Long,
        KeyWorkout::ShortIntensity,
    ];
    micro.targets.long = Some(150.0);
    micro.targets.short_intensity = Some(40.0);
    micro.targets.race_intensity = Some(50.0);
    micro
}

#[test]
fn test_long_workout_lands_on_the_designated_day() {
    let (tables, ctx, plan) = setup();
    let planned = plan_week_day_by_day(&specific_week(), &week_org(), &ctx, &plan, &tables).unwrap();
    let sunday = planned.day_by_day.workouts_on(Weekday::Sun);
    assert!(sunday
        .iter()
        .any(|workout| workout.workout_type == WorkoutType::Long));
    let long = sunday
        .iter()
        .find(|workout| workout.workout_type == WorkoutType::Long)
        .unwrap();
    assert!((long.tss - 150.0).abs() < 1.0);
    assert!(!long.intervals.is_empty());
}

#[test]
fn test_key_workouts_are_all_planned() {
    let (tables, ctx, plan) = setup();
    let planned = plan_week_day_by_day(&specific_week(), &week_org(), &ctx, &plan, &tables).unwrap();
    let mut kinds: Vec<WorkoutType> = Vec::new();
    for (_, workouts) in planned.day_by_day.iter() {
        for workout in workouts {
            kinds.push(workout.workout_type);
        }
    }
    assert!(kinds.contains(&WorkoutType::Long));
    assert!(kinds.contains(&WorkoutType::ShortIntensity));
    assert!(kinds.contains(&WorkoutType::RaceIntensity));
}

#[test]
fn test_weekly_stress_is_conserved_within_one_session() {
    let (tables, ctx, plan) = setup();
    let micro = specific_week();
    let planned = plan_week_day_by_day(&micro, &week_org(), &ctx, &plan, &tables).unwrap();

    // every workout's stress matches its own zone times
    for (_, workouts) in planned.day_by_day.iter() {
        for workout in workouts {
            let from_times = tables
                .tss_for_times(ctx.sport, &workout.seconds_in_zone)
                .unwrap();
            assert!(
                (from_times - workout.tss).abs() < 1.5,
                "workout {} stress {} != zone-time stress {from_times}",
                workout.workout_type,
                workout.tss
            );
        }
    }

    // and the week's total lands within one typical session of the target
    let total = planned.day_by_day.total_tss();
    assert!(
        (total - micro.theoretical_weekly_tss).abs() < 100.0,
        "planned {total}, target {}",
        micro.theoretical_weekly_tss
    );
}

#[test]
fn test_competition_week_structure() {
    let (tables, ctx, plan) = setup();
    let compet = Microcycle::new(
        CycleType::Compet,
        NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
        NaiveDate::from_ymd_opt(2025, 4, 6).unwrap(),
        250.0,
        false,
    );
    let planned = plan_week_day_by_day(&compet, &week_org(), &ctx, &plan, &tables).unwrap();

    // the race itself lands on race day
    let sunday = planned.day_by_day.workouts_on(Weekday::Sun);
    assert_eq!(sunday.len(), 1);
    assert_eq!(sunday[0].workout_type, WorkoutType::Competition);
    assert!((sunday[0].tss - ctx.event_tss).abs() < 1e-6);

    // a shakeout the day before
    let saturday = planned.day_by_day.workouts_on(Weekday::Sat);
    assert_eq!(saturday.len(), 1);
    assert_eq!(saturday[0].workout_type, WorkoutType::Activation);
    assert!(saturday[0].tss < 50.0);

    // a last long session five days out, at 60% of the final long-run target
    let tuesday = planned.day_by_day.workouts_on(Weekday::Tue);
    assert_eq!(tuesday.len(), 1);
    assert_eq!(tuesday[0].workout_type, WorkoutType::Long);
    assert!((tuesday[0].tss - plan.final_long_workout_tss * 0.6).abs() < 1e-6);

    // D-2 to D-4 stay free
    for day in [Weekday::Wed, Weekday::Thu, Weekday::Fri] {
        assert!(planned.day_by_day.workouts_on(day).is_empty());
    }
}

#[test]
fn test_short_competition_week_skips_the_opener() {
    let (tables, ctx, plan) = setup();
    let compet = Microcycle::new(
        CycleType::Compet,
        NaiveDate::from_ymd_opt(2025, 4, 3).unwrap(),
        NaiveDate::from_ymd_opt(2025, 4, 6).unwrap(),
        250.0,
        false,
    );
    let planned = plan_week_day_by_day(&compet, &week_org(), &ctx, &plan, &tables).unwrap();
    let mut kinds: Vec<WorkoutType> = Vec::new();
    for (_, workouts) in planned.day_by_day.iter() {
        for workout in workouts {
            kinds.push(workout.workout_type);
        }
    }
    assert!(kinds.contains(&WorkoutType::Competition));
    assert!(kinds.contains(&WorkoutType::Activation));
    assert!(!kinds.contains(&WorkoutType::Long));
}

#[test]
fn test_best_fit_day_worked_example() {
    // no day in the available set: fall back to the most spacious day
    let mut durations = DayDurations::zero();
    durations.set(Weekday::Mon, 1800.0);
    durations.set(Weekday::Tue, 5400.0);
    let (day, duration) = find_best_fit_day(3600.0, &[], &durations);
    assert_eq!(day, Weekday::Tue);
    assert!((duration - 5400.0).abs() < f64::EPSILON);
}

#[test]
fn test_resting_week_gets_only_easy_volume() {
    let (tables, ctx, plan) = setup();
    let mut resting = Microcycle::new(
        CycleType::Specific,
        NaiveDate::from_ymd_opt(2025, 2, 17).unwrap(),
        NaiveDate::from_ymd_opt(2025, 2, 23).unwrap(),
        240.0,
        true,
    );
    resting.key_workouts = Vec::new();
    let planned = plan_week_day_by_day(&resting, &week_org(), &ctx, &plan, &tables).unwrap();
    for (_, workouts) in planned.day_by_day.iter() {
        for workout in workouts {
            assert_eq!(workout.workout_type, WorkoutType::Remaining);
        }
    }
    assert!(planned.day_by_day.total_tss() > 0.0);
}
