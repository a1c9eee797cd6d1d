// ABOUTME: Load status analysis: digests elapsed microcycles into takeaways for the planner
// ABOUTME: Also classifies completed workouts against planned sessions (validity check)
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Load Status Analyzer
//!
//! Past weeks are analyzed exactly once (guarded by `analyzed`) and then
//! treated as immutable history. A rolling window of the analyzed weeks is
//! summarized into [`Takeaways`] that seed the next planning pass.

use crate::config::PlanningTables;
use crate::errors::AppResult;
use crate::models::cycle::{
    KeyWorkoutActuals, Macrocycle, Microcycle, MicrocycleOutcome, NextWeekGuideline,
};
use crate::models::race::Sport;
use crate::models::workout::{
    CompletedWorkout, KeyWorkout, Workout, WorkoutType, Zone, ZoneRepartition, ZoneTimes,
};
use tracing::debug;

/// A completed workout counts toward a planned one above this share of it
const VALIDITY_THRESHOLD: f64 = 0.8;

/// Weekly analysis marks a key workout done above this share of its target
const ANALYSIS_THRESHOLD: f64 = 0.85;

/// A resting week absorbed more than this share of its target is not resting
const RESTING_OVERSHOOT: f64 = 1.2;

/// A working week under this share of its target counts as rest
const WORKING_UNDERSHOOT: f64 = 0.6;

/// Rolling summary of recently completed microcycles
#[derive(Debug, Clone, PartialEq)]
pub struct Takeaways {
    /// Highest weekly stress absorbed over the last four weeks
    pub current_handable_load: f64,
    /// Weeks until the next resting week is due
    pub next_resting_week: u32,
    /// Key workouts missed over the last two weeks
    pub missing_key_workouts: Vec<KeyWorkout>,
    /// Cumulative actual-minus-planned stress over the last five weeks
    pub tss_balance: f64,
    /// Guidance carried over from the most recent week
    pub next_week_guidelines: NextWeekGuideline,
    /// Cumulative actual-minus-planned seconds per zone over the last four weeks
    pub zone_time_balance: ZoneTimes,
    /// Biggest single workout handled over the last three weeks
    pub biggest_workout: f64,
    /// Biggest race-intensity dose handled over the last three weeks
    pub biggest_race_intensity: f64,
    /// Biggest long-intensity dose handled over the last three weeks
    pub biggest_long_intensity: f64,
    /// Biggest short-intensity dose handled over the last three weeks
    pub biggest_short_intensity: f64,
}

impl Default for Takeaways {
    fn default() -> Self {
        Self {
            current_handable_load: 0.0,
            next_resting_week: 0,
            missing_key_workouts: Vec::new(),
            tss_balance: 0.0,
            next_week_guidelines: NextWeekGuideline::Normal,
            zone_time_balance: ZoneTimes::zero(),
            biggest_workout: 0.0,
            biggest_race_intensity: 0.0,
            biggest_long_intensity: 0.0,
            biggest_short_intensity: 0.0,
        }
    }
}

/// TSS represented by the actual seconds spent in a set of zones
fn zones_tss(
    tables: &PlanningTables,
    sport: Sport,
    times: &ZoneTimes,
    zones: &[Zone],
) -> AppResult<f64> {
    let mut total = 0.0;
    for zone in zones {
        total += tables.tss_for_seconds(sport, *zone, times.get(*zone))?;
    }
    Ok(total)
}

/// Decide whether a completed activity satisfies a planned workout.
///
/// The comparison is type-specific: the long workout compares total stress,
/// the intensity workouts compare the stress represented by their signature
/// zones, anything else compares total stress. On a match the completed
/// workout is annotated with the inferred workout type.
///
/// # Errors
/// Returns a configuration error when a TSS rate lookup fails.
pub fn check_workout_validity(
    actual: &mut CompletedWorkout,
    planned: &Workout,
    tables: &PlanningTables,
) -> AppResult<bool> {
    if actual.sport != planned.sport {
        return Ok(false);
    }
    let threshold = planned.tss * VALIDITY_THRESHOLD;
    let done = match planned.workout_type {
        WorkoutType::Long => actual.tss > threshold,
        WorkoutType::LongIntensity => {
            zones_tss(
                tables,
                actual.sport,
                &actual.seconds_in_zone,
                &[Zone::Z3, Zone::Z4],
            )? > threshold
        }
        WorkoutType::ShortIntensity => {
            zones_tss(
                tables,
                actual.sport,
                &actual.seconds_in_zone,
                &[Zone::Z5, Zone::Z6, Zone::Z7],
            )? > threshold
        }
        _ => actual.tss > threshold,
    };
    if done {
        match planned.workout_type {
            WorkoutType::Long
            | WorkoutType::LongIntensity
            | WorkoutType::ShortIntensity
            | WorkoutType::RaceIntensity => actual.inferred_type = Some(planned.workout_type),
            _ => {}
        }
    }
    Ok(done)
}

fn best_zone_dose(
    tables: &PlanningTables,
    sport: Sport,
    workouts: &[CompletedWorkout],
    zones: &[Zone],
    target: Option<f64>,
) -> AppResult<KeyWorkoutActuals> {
    let mut best = 0.0_f64;
    for workout in workouts {
        let dose = zones_tss(tables, sport, &workout.seconds_in_zone, zones)?;
        best = best.max(dose);
    }
    let target = target.unwrap_or(0.0);
    Ok(KeyWorkoutActuals {
        done: target > 0.0 && best > target * ANALYSIS_THRESHOLD,
        actual_tss: best,
    })
}

/// Analyze one elapsed microcycle against the completed-workout feed.
///
/// Returns the analyzed copy; the caller replaces its stored record. The
/// operation is idempotent and guarded by `analyzed` at the call site.
///
/// # Errors
/// Returns a configuration error when a table lookup fails.
pub fn analyze_microcycle(
    microcycle: &Microcycle,
    completed: &[CompletedWorkout],
    race_zone: Zone,
    sport: Sport,
    repartition: &ZoneRepartition,
    tables: &PlanningTables,
) -> AppResult<Microcycle> {
    let week_workouts: Vec<&CompletedWorkout> = completed
        .iter()
        .filter(|workout| microcycle.contains(workout.date))
        .collect();

    let actual_tss: f64 = week_workouts.iter().map(|workout| workout.tss).sum();
    let mut actual_seconds_in_zone = ZoneTimes::zero();
    for workout in &week_workouts {
        actual_seconds_in_zone.accumulate(&workout.seconds_in_zone);
    }

    let theoretical_time_in_zone =
        tables.weekly_time_in_zone(sport, repartition, microcycle.theoretical_weekly_tss)?;
    let delta_time_in_zone: ZoneTimes = Zone::ALL
        .iter()
        .map(|zone| {
            (
                *zone,
                actual_seconds_in_zone.get(*zone) - theoretical_time_in_zone.get(*zone),
            )
        })
        .collect();

    // Long workout: compare whole-session stress, not zone doses
    let mut biggest = 0.0_f64;
    for workout in &week_workouts {
        biggest = biggest.max(workout.tss);
    }
    let long_target = microcycle.targets.long.unwrap_or(0.0);
    let long_workout = KeyWorkoutActuals {
        done: long_target > 0.0 && biggest > long_target * ANALYSIS_THRESHOLD,
        actual_tss: biggest,
    };

    let owned_week: Vec<CompletedWorkout> =
        week_workouts.iter().map(|workout| (**workout).clone()).collect();
    let race_intensity = best_zone_dose(
        tables,
        sport,
        &owned_week,
        &[race_zone],
        microcycle.targets.race_intensity,
    )?;
    let long_intensity = best_zone_dose(
        tables,
        sport,
        &owned_week,
        &[Zone::Z3, Zone::Z4],
        microcycle.targets.long_intensity,
    )?;
    let short_intensity = best_zone_dose(
        tables,
        sport,
        &owned_week,
        &[Zone::Z5, Zone::Z6, Zone::Z7],
        microcycle.targets.short_intensity,
    )?;

    let mut analyzed = microcycle.clone();
    let mut next_week_guidelines = analyzed.next_week_guidelines;
    let actual_resting = if microcycle.theoretical_resting {
        let rested = actual_tss <= microcycle.theoretical_weekly_tss * RESTING_OVERSHOOT;
        if !rested {
            next_week_guidelines = Some(NextWeekGuideline::Rest);
        }
        rested
    } else {
        let rested = actual_tss <= microcycle.theoretical_weekly_tss * WORKING_UNDERSHOOT;
        if rested {
            next_week_guidelines = Some(NextWeekGuideline::Normal);
        }
        rested
    };

    // A key workout is missing when it was never planned or when no completed
    // activity passes the validity check against its planned session
    let mut missing_key_workouts = Vec::new();
    for key in &microcycle.key_workouts {
        let planned = microcycle
            .day_by_day
            .iter()
            .flat_map(|(_, workouts)| workouts.iter())
            .find(|workout| workout.workout_type == WorkoutType::from(*key));
        let mut done = false;
        if let Some(planned) = planned {
            for workout in &week_workouts {
                let mut candidate = (*workout).clone();
                if check_workout_validity(&mut candidate, planned, tables)? {
                    done = true;
                    break;
                }
            }
        }
        if !done {
            missing_key_workouts.push(*key);
        }
    }

    debug!(
        start = %microcycle.start_date,
        actual_tss,
        missing = missing_key_workouts.len(),
        "microcycle analyzed"
    );

    analyzed.outcome = Some(MicrocycleOutcome {
        actual_tss,
        actual_seconds_in_zone,
        theoretical_time_in_zone,
        delta_time_in_zone,
        actual_resting,
        long_workout,
        race_intensity,
        long_intensity,
        short_intensity,
    });
    analyzed.missing_key_workouts = missing_key_workouts;
    analyzed.next_week_guidelines = next_week_guidelines;
    analyzed.analyzed = true;
    Ok(analyzed)
}

/// Analyze one elapsed macrocycle: aggregate the realized stress of its
/// member weeks. Idempotent, guarded by `analyzed` at the call site.
#[must_use]
pub fn analyze_macrocycle(macrocycle: &Macrocycle, microcycles: &[Microcycle]) -> Macrocycle {
    let actual_total: f64 = microcycles
        .iter()
        .filter(|micro| macrocycle.contains(micro.start_date))
        .filter_map(|micro| micro.outcome.as_ref())
        .map(|outcome| outcome.actual_tss)
        .sum();
    let mut analyzed = macrocycle.clone();
    analyzed.actual_total_tss = Some(actual_total);
    analyzed.analyzed = true;
    analyzed
}

/// Summarize the trailing window of analyzed weeks into planner seeds.
#[must_use]
pub fn load_status(past_microcycles: &[Microcycle], cycle_length: u32) -> Takeaways {
    let mut takeaways = Takeaways::default();
    if past_microcycles.is_empty() {
        return takeaways;
    }

    let last = |n: usize| &past_microcycles[past_microcycles.len().saturating_sub(n)..];

    for week in last(4) {
        if let Some(outcome) = &week.outcome {
            takeaways.current_handable_load = takeaways.current_handable_load.max(outcome.actual_tss);
        }
    }

    // Most recent realized resting week decides where we are in the cycle
    let last_resting_index = past_microcycles
        .iter()
        .rposition(|week| {
            week.outcome
                .as_ref()
                .is_some_and(|outcome| outcome.actual_resting)
        })
        .unwrap_or(0);
    let weeks_since_rest = (past_microcycles.len() - last_resting_index) as u32;
    takeaways.next_resting_week = cycle_length
        .saturating_sub(weeks_since_rest)
        .min(cycle_length);

    for week in last(2) {
        takeaways
            .missing_key_workouts
            .extend(week.missing_key_workouts.iter().copied());
    }

    for week in last(5) {
        if let Some(outcome) = &week.outcome {
            takeaways.tss_balance += outcome.actual_tss - week.theoretical_weekly_tss;
        }
    }

    if let Some(guideline) = past_microcycles
        .last()
        .and_then(|week| week.next_week_guidelines)
    {
        takeaways.next_week_guidelines = guideline;
    }

    for week in last(4) {
        if let Some(outcome) = &week.outcome {
            takeaways
                .zone_time_balance
                .accumulate(&outcome.delta_time_in_zone);
        }
    }

    for week in last(3) {
        let Some(outcome) = &week.outcome else {
            continue;
        };
        let credited = |actuals: &KeyWorkoutActuals, target: Option<f64>| {
            if actuals.done {
                target.unwrap_or(actuals.actual_tss)
            } else {
                actuals.actual_tss
            }
        };
        takeaways.biggest_workout = takeaways
            .biggest_workout
            .max(credited(&outcome.long_workout, week.targets.long));
        takeaways.biggest_race_intensity = takeaways
            .biggest_race_intensity
            .max(credited(&outcome.race_intensity, week.targets.race_intensity));
        takeaways.biggest_long_intensity = takeaways
            .biggest_long_intensity
            .max(credited(&outcome.long_intensity, week.targets.long_intensity));
        takeaways.biggest_short_intensity = takeaways
            .biggest_short_intensity
            .max(credited(&outcome.short_intensity, week.targets.short_intensity));
    }

    takeaways
}
