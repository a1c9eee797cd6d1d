// ABOUTME: Adaptive replanning of the in-progress week from the completed-workout feed
// ABOUTME: Rescues missed key sessions, rebalances zone time and enforces the daily cap
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Adaptive Replanner
//!
//! Compares the current, partially elapsed microcycle against what was
//! actually completed and rewrites the remaining days: missed key sessions
//! are rescheduled first (bumping whatever occupies the best-fitting day),
//! then other missed sessions; displaced work is greedily re-inserted only
//! where the daily cap allows, and persistent zone-time imbalances are
//! spread across the remaining sessions.

use crate::config::PlanningTables;
use crate::errors::AppResult;
use crate::models::cycle::{Microcycle, NextWeekGuideline};
use crate::models::workout::{
    CompletedWorkout, KeyWorkout, Workout, WorkoutType, Zone, ZoneTimes, WEEKDAYS,
};
use crate::planning::load_plan::LoadPlan;
use crate::planning::status::{check_workout_validity, Takeaways};
use crate::planning::RaceContext;
use chrono::{Datelike, NaiveDate, Weekday};
use tracing::{debug, info, warn};

/// Zone-time drift below this share of the weekly target is left alone
const ZONE_DRIFT_TOLERANCE: f64 = 0.1;

/// A resting week that absorbed more than this share of its target derails
const RESTING_OVERSHOOT: f64 = 1.3;

/// Pick the day that should host a rescued workout: an empty remaining day,
/// else a day holding only a lone easy session, else (for key workouts) the
/// remaining day whose content scores lowest by key-workout priority order.
/// Non-key workouts that fit nowhere return `None` and are dropped.
#[must_use]
pub fn find_best_day_to_replace(
    microcycle: &Microcycle,
    workout_type: WorkoutType,
    remaining_days: &[Weekday],
) -> Option<Weekday> {
    for day in remaining_days {
        if microcycle.day_by_day.workouts_on(*day).is_empty() {
            return Some(*day);
        }
    }
    for day in remaining_days {
        let workouts = microcycle.day_by_day.workouts_on(*day);
        if workouts.len() == 1 && workouts[0].workout_type == WorkoutType::Easy {
            return Some(*day);
        }
    }
    if workout_type
        .as_key_workout()
        .is_some_and(|key| microcycle.key_workouts.contains(&key))
    {
        let mut best: Option<(Weekday, i64)> = None;
        for day in remaining_days {
            let types: Vec<WorkoutType> = microcycle
                .day_by_day
                .workouts_on(*day)
                .iter()
                .map(|workout| workout.workout_type)
                .collect();
            let mut score = 0_i64;
            for (priority, key) in microcycle.key_workouts.iter().enumerate() {
                if let Some(position) = types
                    .iter()
                    .position(|candidate| *candidate == WorkoutType::from(*key))
                {
                    score += priority as i64 - position as i64;
                }
            }
            match best {
                Some((_, best_score)) if score >= best_score => {}
                _ => best = Some((*day, score)),
            }
        }
        return best.map(|(day, _)| day);
    }
    None
}

fn weekdays_from(today_index: u32) -> Vec<Weekday> {
    WEEKDAYS
        .iter()
        .copied()
        .filter(|day| day.num_days_from_monday() >= today_index)
        .collect()
}

fn planned_workouts_before(
    microcycle: &Microcycle,
    today_index: u32,
) -> Vec<(Weekday, Workout)> {
    let mut planned = Vec::new();
    for (day, workouts) in microcycle.day_by_day.iter() {
        if day.num_days_from_monday() < today_index {
            for workout in workouts {
                planned.push((day, workout.clone()));
            }
        }
    }
    planned
}

/// Compare the in-progress week against the completed feed and rewrite the
/// remaining days where needed. Returns the replanned microcycle.
///
/// # Errors
/// Returns a configuration error when a table lookup fails.
pub fn replan_current_week(
    microcycle: &Microcycle,
    completed: &[CompletedWorkout],
    today: NaiveDate,
    takeaways: &Takeaways,
    plan: &LoadPlan,
    ctx: &RaceContext,
    tables: &PlanningTables,
) -> AppResult<Microcycle> {
    let mut micro = microcycle.clone();
    let today_index = today.weekday().num_days_from_monday();
    let remaining_days = weekdays_from(today_index);

    let repartition = match micro.zone_repartition {
        Some(repartition) => repartition,
        None => tables.zone_repartition(ctx.level, micro.cycle_type, ctx.size)?,
    };
    let theoretical_time_in_zone =
        tables.weekly_time_in_zone(ctx.sport, &repartition, micro.theoretical_weekly_tss)?;

    let week_completed: Vec<CompletedWorkout> = completed
        .iter()
        .filter(|workout| micro.contains(workout.date))
        .cloned()
        .collect();
    let completed_tss: f64 = week_completed.iter().map(|workout| workout.tss).sum();
    let mut done_time_in_zone = ZoneTimes::zero();
    for workout in &week_completed {
        done_time_in_zone.accumulate(&workout.seconds_in_zone);
    }

    // Which already-elapsed planned sessions were actually done? Each
    // completed activity can satisfy at most one planned session.
    let past_planned = planned_workouts_before(&micro, today_index);
    let mut unclaimed = week_completed.clone();
    let mut missing_key: Vec<Workout> = Vec::new();
    let mut missing_other: Vec<Workout> = Vec::new();
    for (_, planned) in &past_planned {
        let mut matched = None;
        for (index, actual) in unclaimed.iter().enumerate() {
            let mut candidate = actual.clone();
            if check_workout_validity(&mut candidate, planned, tables)? {
                matched = Some(index);
                break;
            }
        }
        match matched {
            Some(index) => {
                unclaimed.remove(index);
            }
            None => {
                if planned
                    .workout_type
                    .as_key_workout()
                    .is_some_and(|key| micro.key_workouts.contains(&key))
                {
                    missing_key.push(planned.clone());
                } else {
                    missing_other.push(planned.clone());
                }
            }
        }
    }

    // Rescue missed key sessions first, bumping whatever held the best day
    let mut displaced: Vec<Workout> = Vec::new();
    let mut missing_key_kinds: Vec<KeyWorkout> = Vec::new();
    for workout in missing_key {
        if let Some(key) = workout.workout_type.as_key_workout() {
            missing_key_kinds.push(key);
        }
        match find_best_day_to_replace(&micro, workout.workout_type, &remaining_days) {
            Some(day) => {
                let bumped = micro.day_by_day.workouts_on(day).to_vec();
                displaced.extend(bumped);
                info!(day = ?day, kind = %workout.workout_type, "rescheduling missed key workout");
                micro.day_by_day.set_day(day, vec![workout]);
            }
            None => {
                warn!(kind = %workout.workout_type, "no day available for missed key workout, dropping");
            }
        }
    }
    let mut dropped_other: Vec<Workout> = Vec::new();
    for workout in missing_other {
        match find_best_day_to_replace(&micro, workout.workout_type, &remaining_days) {
            Some(day) => {
                let bumped = micro.day_by_day.workouts_on(day).to_vec();
                displaced.extend(bumped);
                micro.day_by_day.set_day(day, vec![workout]);
            }
            None => {
                debug!(kind = %workout.workout_type, "missed workout dropped, no day to host it");
                dropped_other.push(workout);
            }
        }
    }

    // The bumping above sheds load; give displaced sessions back to days that
    // stay under the daily cap while the week misses more than a day's share
    let theoretical = micro.theoretical_weekly_tss;
    let mut planned_plus_done = micro.day_by_day.total_tss() + completed_tss;
    let mut give_back = displaced;
    give_back.extend(dropped_other);
    while theoretical - planned_plus_done > theoretical / 7.0 && !give_back.is_empty() {
        let workout = give_back.remove(0);
        let mut hosted = false;
        for day in &remaining_days {
            if day.num_days_from_monday() <= today_index {
                continue;
            }
            let day_tss = micro.day_by_day.day_tss(*day);
            if day_tss + workout.tss < plan.max_tss_per_day {
                planned_plus_done += workout.tss;
                micro.day_by_day.add(*day, workout.clone());
                hosted = true;
                break;
            }
        }
        if !hosted {
            debug!(kind = %workout.workout_type, tss = workout.tss, "displaced workout discarded");
        }
    }

    // Persistent per-zone drift the last weeks' balance does not absorb is
    // spread across the remaining sessions that train the zone
    let mut future_time_in_zone = ZoneTimes::zero();
    for (day, workouts) in micro.day_by_day.iter() {
        if day.num_days_from_monday() > today_index {
            for workout in workouts {
                future_time_in_zone.accumulate(&workout.seconds_in_zone);
            }
        }
    }
    future_time_in_zone.accumulate(&done_time_in_zone);

    for zone in Zone::ALL {
        let theoretical_zone = theoretical_time_in_zone.get(zone);
        if theoretical_zone <= 0.0 {
            continue;
        }
        let drift = future_time_in_zone.get(zone) - theoretical_zone;
        let carried = takeaways.zone_time_balance.get(zone);
        let tolerance = ZONE_DRIFT_TOLERANCE * theoretical_zone;
        if drift.abs() <= tolerance || (carried + drift).abs() <= tolerance {
            continue;
        }
        let correction = -drift;
        let rate = tables.tss_rate(ctx.sport, zone)?;

        let mut host_days: Vec<Weekday> = Vec::new();
        for (day, workouts) in micro.day_by_day.iter() {
            if day.num_days_from_monday() > today_index
                && workouts.iter().any(|workout| workout.seconds_in_zone.get(zone) > 0.0)
            {
                host_days.push(day);
            }
        }

        if host_days.is_empty() {
            if correction > 0.0 {
                // no session trains this zone: widen an easy one instead,
                // staying under the daily cap
                'inject: for day in &remaining_days {
                    if day.num_days_from_monday() <= today_index {
                        continue;
                    }
                    let headroom_tss =
                        (plan.max_tss_per_day - micro.day_by_day.day_tss(*day)).max(0.0);
                    for workout in micro.day_by_day.workouts_on_mut(*day) {
                        if workout.workout_type == WorkoutType::Easy {
                            let applied = correction.min(headroom_tss * 3600.0 / rate);
                            if applied > 0.0 {
                                workout.seconds_in_zone.add(zone, applied);
                                workout.tss += applied * rate / 3600.0;
                            }
                            break 'inject;
                        }
                    }
                }
            }
            continue;
        }

        let mut hosts = 0_usize;
        for day in &host_days {
            for workout in micro.day_by_day.workouts_on(*day) {
                if workout.seconds_in_zone.get(zone) > 0.0 {
                    hosts += 1;
                }
            }
        }
        let share = correction / hosts as f64;
        for day in host_days {
            let mut headroom_tss =
                (plan.max_tss_per_day - micro.day_by_day.day_tss(day)).max(0.0);
            for workout in micro.day_by_day.workouts_on_mut(day) {
                let current = workout.seconds_in_zone.get(zone);
                if current <= 0.0 {
                    continue;
                }
                let mut applied = share.max(-current);
                if applied > 0.0 {
                    applied = applied.min(headroom_tss * 3600.0 / rate);
                    headroom_tss -= applied * rate / 3600.0;
                }
                workout.seconds_in_zone.add(zone, applied);
                workout.tss += applied * rate / 3600.0;
            }
        }
        debug!(%zone, drift, correction, "zone time rebalanced");
    }

    micro.missing_key_workouts = missing_key_kinds;
    if micro.theoretical_resting && completed_tss > RESTING_OVERSHOOT * theoretical {
        micro.on_track = false;
        if micro.next_week_guidelines.is_none() {
            micro.next_week_guidelines = Some(NextWeekGuideline::Rest);
        }
    }
    Ok(micro)
}
