// ABOUTME: Workout synthesis: turns a week's load target into a concrete day-by-day plan
// ABOUTME: Allocates zone time under caps, slices intervals and picks best-fitting days
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Workout Synthesizer
//!
//! One microcycle in, the same microcycle with a day-by-day plan out. The
//! weekly TSS target is converted to per-zone time budgets through the
//! phase's zone repartition, then consumed by the week's key workouts and a
//! tail of generic filler sessions, each placed on the best-fitting day.

use crate::config::PlanningTables;
use crate::errors::AppResult;
use crate::models::athlete::{DayDurations, WeekOrganization};
use crate::models::cycle::{CycleType, Microcycle};
use crate::models::race::Sport;
use crate::models::workout::{
    DayPlan, IntervalKind, IntervalStep, KeyWorkout, Workout, WorkoutType, Zone, ZoneTimes,
};
use crate::planning::load_plan::LoadPlan;
use crate::planning::RaceContext;
use chrono::{Datelike, Duration, Weekday};
use tracing::{debug, info};

/// Default warm-up and cool-down length for interval sessions, seconds
const WARMUP_SECS: f64 = 600.0;
/// Default cool-down length, seconds
const COOLDOWN_SECS: f64 = 600.0;

/// Generic filler sessions are capped at this much combined Z3+ stress
const REMAINING_INTENSITY_CAP_TSS: f64 = 40.0;
/// Generic filler sessions are capped at this total stress
const REMAINING_WORKOUT_CAP_TSS: f64 = 100.0;

/// Long workout time split across Z1/Z2/Z3
const LONG_SPLIT: [(Zone, f64); 3] = [(Zone::Z1, 0.3), (Zone::Z2, 0.5), (Zone::Z3, 0.2)];

/// A cumulative TSS cap shared by a set of zones inside one workout
#[derive(Debug, Clone)]
pub struct CumulativeCap {
    /// Zones sharing the cap
    pub zones: Vec<Zone>,
    /// Combined TSS allowed across those zones
    pub max_tss: f64,
}

/// Zone-time allocation request for one workout
#[derive(Debug, Clone)]
pub struct WorkoutRequest<'a> {
    /// Stress the workout should reach
    pub target_tss: f64,
    /// Zones to fill, in priority order
    pub zones: &'a [Zone],
    /// Per-zone caps on time in one session, seconds
    pub max_time_in_zone: &'a [(Zone, f64)],
    /// Cumulative TSS caps across zone groups
    pub cumulative_caps: &'a [CumulativeCap],
    /// Warm-up length, seconds
    pub warmup_secs: f64,
    /// Cool-down length, seconds
    pub cooldown_secs: f64,
}

/// Zone-time allocation result
#[derive(Debug, Clone)]
pub struct AllocatedWorkout {
    /// Stress actually allocated
    pub total_tss: f64,
    /// Seconds allocated per zone
    pub seconds_in_zone: ZoneTimes,
    /// Suggested interval structure
    pub intervals: Vec<IntervalStep>,
}

/// Find the day a workout of `total_seconds` fits best: the tightest
/// available day that can still hold it, else (no available day fits, or
/// none is available at all) the day with the most remaining duration.
#[must_use]
pub fn find_best_fit_day(
    total_seconds: f64,
    available_days: &[Weekday],
    durations: &DayDurations,
) -> (Weekday, f64) {
    let mut best: Option<(Weekday, f64)> = None;
    for day in available_days {
        let duration = durations.get(*day);
        if duration >= total_seconds {
            match best {
                Some((_, current)) if duration >= current => {}
                _ => best = Some((*day, duration)),
            }
        }
    }
    best.unwrap_or_else(|| durations.longest_day())
}

fn slice_intervals(
    zone: Zone,
    work_seconds: f64,
    recovery_factor: f64,
    typical_secs: f64,
    work_rate: f64,
    z1_rate: f64,
) -> Vec<IntervalStep> {
    if work_seconds <= 0.0 {
        return Vec::new();
    }
    let reps = if typical_secs > 0.0 {
        (work_seconds / typical_secs).floor() as usize + 1
    } else {
        1
    };
    let rep_secs = work_seconds / reps as f64;
    let recovery_secs = rep_secs * recovery_factor;
    let mut steps = Vec::with_capacity(reps * 2);
    for _ in 0..reps {
        steps.push(IntervalStep {
            kind: IntervalKind::Work,
            zone,
            duration_secs: rep_secs,
            tss: work_rate * rep_secs / 3600.0,
        });
        // every repetition owes its recovery: the Z1 tail was sized as
        // factor * total work time
        if recovery_secs > 0.0 {
            steps.push(IntervalStep {
                kind: IntervalKind::Recovery,
                zone: Zone::Z1,
                duration_secs: recovery_secs,
                tss: z1_rate * recovery_secs / 3600.0,
            });
        }
    }
    steps
}

/// Allocate zone time for one workout under the request's constraints.
///
/// Warm-up and cool-down always land in Z1. Each requested zone then gets
/// `min(cumulative-cap seconds, remaining weekly time in the zone, seconds
/// affordable under the remaining target, per-session zone cap)`, plus a
/// proportional Z1 recovery tail. Whatever target stress is still missing
/// afterwards is filled half into Z1 and half into Z2.
///
/// # Errors
/// Returns a configuration error when a table lookup fails.
pub fn create_workout(
    request: &WorkoutRequest<'_>,
    remaining_time_in_zone: &ZoneTimes,
    sport: Sport,
    tables: &PlanningTables,
) -> AppResult<AllocatedWorkout> {
    let z1_rate = tables.tss_rate(sport, Zone::Z1)?;
    let mut seconds_in_zone = ZoneTimes::zero();
    let mut intervals = Vec::new();
    let mut total_tss = 0.0;
    let mut remaining_tss = request.target_tss;

    seconds_in_zone.add(Zone::Z1, request.warmup_secs);
    let warmup_tss = z1_rate * request.warmup_secs / 3600.0;
    total_tss += warmup_tss;
    remaining_tss -= warmup_tss;
    intervals.push(IntervalStep {
        kind: IntervalKind::WarmUp,
        zone: Zone::Z1,
        duration_secs: request.warmup_secs,
        tss: warmup_tss,
    });

    seconds_in_zone.add(Zone::Z1, request.cooldown_secs);
    let cooldown_tss = z1_rate * request.cooldown_secs / 3600.0;
    total_tss += cooldown_tss;
    remaining_tss -= cooldown_tss;

    for zone in request.zones {
        let zone = *zone;
        if remaining_time_in_zone.get(zone) <= 0.0 {
            continue;
        }
        let rate = tables.tss_rate(sport, zone)?;
        let recovery_factor = tables.recovery_factor(sport, zone)?;
        let affordable_secs =
            (3600.0 * remaining_tss / (rate + recovery_factor * z1_rate)).max(0.0);

        let mut cap_secs = f64::INFINITY;
        for cap in request.cumulative_caps {
            if !cap.zones.contains(&zone) {
                continue;
            }
            let mut other_zones_tss = 0.0;
            for other in cap.zones.iter().filter(|other| **other != zone) {
                other_zones_tss +=
                    tables.tss_for_seconds(sport, *other, seconds_in_zone.get(*other))?;
            }
            let allowed = (cap.max_tss - other_zones_tss) * 3600.0 / rate;
            cap_secs = cap_secs.min(allowed);
        }

        let session_cap = request
            .max_time_in_zone
            .iter()
            .find(|(capped, _)| *capped == zone)
            .map_or(f64::INFINITY, |(_, secs)| *secs);

        let work_seconds = cap_secs
            .min(remaining_time_in_zone.get(zone))
            .min(affordable_secs)
            .min(session_cap)
            .max(0.0);
        if work_seconds <= 0.0 {
            continue;
        }

        let work_tss = rate * work_seconds / 3600.0;
        total_tss += work_tss;
        remaining_tss -= work_tss;
        seconds_in_zone.add(zone, work_seconds);

        let recovery_secs = work_seconds * recovery_factor;
        seconds_in_zone.add(Zone::Z1, recovery_secs);
        let recovery_tss = z1_rate * recovery_secs / 3600.0;
        total_tss += recovery_tss;
        remaining_tss -= recovery_tss;

        let typical = tables.typical_interval(sport, zone)?;
        intervals.extend(slice_intervals(
            zone,
            work_seconds,
            recovery_factor,
            typical,
            rate,
            z1_rate,
        ));
        debug!(%zone, work_seconds, work_tss, recovery_tss, "zone allocated");
    }

    intervals.push(IntervalStep {
        kind: IntervalKind::CoolDown,
        zone: Zone::Z1,
        duration_secs: request.cooldown_secs,
        tss: cooldown_tss,
    });

    if remaining_tss > 0.0 {
        let z2_rate = tables.tss_rate(sport, Zone::Z2)?;
        seconds_in_zone.add(Zone::Z1, remaining_tss / 2.0 * 3600.0 / z1_rate);
        seconds_in_zone.add(Zone::Z2, remaining_tss / 2.0 * 3600.0 / z2_rate);
        total_tss += remaining_tss;
    }

    Ok(AllocatedWorkout {
        total_tss,
        seconds_in_zone,
        intervals,
    })
}

fn build_workout(
    workout_type: WorkoutType,
    allocated: AllocatedWorkout,
    ctx: &RaceContext,
    tables: &PlanningTables,
) -> AppResult<Workout> {
    let distance =
        tables.distance_for_times(ctx.sport, ctx.level, &allocated.seconds_in_zone)?;
    Ok(Workout {
        workout_type,
        sport: ctx.sport,
        tss: allocated.total_tss,
        theoretical_distance_km: distance,
        theoretical_time_secs: allocated.seconds_in_zone.total_seconds(),
        seconds_in_zone: allocated.seconds_in_zone,
        intervals: allocated.intervals,
    })
}

/// Place an allocated workout on its best-fitting day, consuming that day's
/// availability and the weekly zone budgets.
fn place_workout(
    micro: &mut Microcycle,
    workout: Workout,
    available_days: &mut Vec<Weekday>,
    durations: &mut DayDurations,
    weekly_time_in_zone: &mut ZoneTimes,
) {
    let total_seconds = workout.total_seconds();
    let (day, _) = find_best_fit_day(total_seconds, available_days, durations);
    for (zone, seconds) in workout.seconds_in_zone.iter() {
        weekly_time_in_zone.add(zone, -seconds);
    }
    durations.consume(day, total_seconds);
    if let Some(position) = available_days.iter().position(|candidate| *candidate == day) {
        available_days.remove(position);
    }
    debug!(day = ?day, tss = workout.tss, kind = %workout.workout_type, "workout placed");
    micro.day_by_day.add(day, workout);
}

/// The long workout's fixed interval skeleton:
/// warmup, Z2, Z3, Z2, Z3, Z2, cooldown with fractional splits.
fn long_workout_skeleton(
    tz1: f64,
    tz2: f64,
    tz3: f64,
    z1_rate: f64,
    z2_rate: f64,
    z3_rate: f64,
) -> Vec<IntervalStep> {
    let step = |kind, zone, secs: f64, rate: f64| IntervalStep {
        kind,
        zone,
        duration_secs: secs,
        tss: rate * secs / 3600.0,
    };
    vec![
        step(IntervalKind::WarmUp, Zone::Z1, tz1 * 0.5, z1_rate),
        step(IntervalKind::Work, Zone::Z2, tz2 * 0.4, z2_rate),
        step(IntervalKind::Work, Zone::Z3, tz3 * 0.5, z3_rate),
        step(IntervalKind::Work, Zone::Z2, tz2 * 0.3, z2_rate),
        step(IntervalKind::Work, Zone::Z3, tz3 * 0.5, z3_rate),
        step(IntervalKind::Work, Zone::Z2, tz2 * 0.3, z2_rate),
        step(IntervalKind::CoolDown, Zone::Z1, tz1 * 0.5, z1_rate),
    ]
}

fn plan_competition_week(
    micro: &mut Microcycle,
    ctx: &RaceContext,
    plan: &LoadPlan,
    tables: &PlanningTables,
) -> AppResult<()> {
    info!(race_day = %micro.end_date, "planning competition week");
    let race_day = micro.end_date.weekday();
    let target_secs = ctx.target_time_minutes * 60.0;
    let mut race_times = ZoneTimes::zero();
    race_times.set(ctx.race_zone, target_secs);
    micro.day_by_day.set_day(
        race_day,
        vec![Workout {
            workout_type: WorkoutType::Competition,
            sport: ctx.sport,
            tss: ctx.event_tss,
            seconds_in_zone: race_times,
            theoretical_distance_km: ctx.race_distance_km,
            theoretical_time_secs: target_secs,
            intervals: Vec::new(),
        }],
    );

    if micro.end_weekday_index() >= 1 {
        let mut shakeout_times = ZoneTimes::zero();
        shakeout_times.set(Zone::Z1, 1800.0);
        shakeout_times.set(Zone::Z6, 120.0);
        let shakeout_tss = tables.tss_for_times(ctx.sport, &shakeout_times)?;
        let shakeout_distance =
            tables.distance_for_times(ctx.sport, ctx.level, &shakeout_times)?;
        micro.day_by_day.set_day(
            (micro.end_date - Duration::days(1)).weekday(),
            vec![Workout {
                workout_type: WorkoutType::Activation,
                sport: ctx.sport,
                tss: shakeout_tss,
                seconds_in_zone: shakeout_times,
                theoretical_distance_km: shakeout_distance,
                theoretical_time_secs: 1920.0,
                intervals: Vec::new(),
            }],
        );
    }

    // D-5 opener: a last long session at 60% of the final long-run target,
    // 30% of its stress in Z1 and 70% in Z2; D-2 to D-4 stay free
    if micro.end_date - micro.start_date > Duration::days(5) {
        let opener_tss = plan.final_long_workout_tss * 0.6;
        let tz1 = tables.seconds_for_tss(ctx.sport, Zone::Z1, opener_tss * 0.3)?;
        let tz2 = tables.seconds_for_tss(ctx.sport, Zone::Z2, opener_tss * 0.7)?;
        let mut opener_times = ZoneTimes::zero();
        opener_times.set(Zone::Z1, tz1);
        opener_times.set(Zone::Z2, tz2);
        let distance = tables.distance_for_times(ctx.sport, ctx.level, &opener_times)?;
        micro.day_by_day.set_day(
            (micro.end_date - Duration::days(5)).weekday(),
            vec![Workout {
                workout_type: WorkoutType::Long,
                sport: ctx.sport,
                tss: opener_tss,
                seconds_in_zone: opener_times,
                theoretical_distance_km: distance,
                theoretical_time_secs: tz1 + tz2,
                intervals: Vec::new(),
            }],
        );
    }
    Ok(())
}

fn plan_long_workout(
    micro: &mut Microcycle,
    week_org: &WeekOrganization,
    ctx: &RaceContext,
    weekly_time_in_zone: &mut ZoneTimes,
    available_days: &mut Vec<Weekday>,
    durations: &mut DayDurations,
    tables: &PlanningTables,
) -> AppResult<f64> {
    let target = micro.targets.long.unwrap_or(0.0);
    if target <= 0.0 {
        return Ok(0.0);
    }
    let z1_rate = tables.tss_rate(ctx.sport, Zone::Z1)?;
    let z2_rate = tables.tss_rate(ctx.sport, Zone::Z2)?;
    let z3_rate = tables.tss_rate(ctx.sport, Zone::Z3)?;

    // time split 30/50/20 across Z1/Z2/Z3 under the stress target
    let weighted: f64 = LONG_SPLIT
        .iter()
        .map(|(zone, pct)| match zone {
            Zone::Z1 => z1_rate * pct,
            Zone::Z2 => z2_rate * pct,
            _ => z3_rate * pct,
        })
        .sum();
    let total_secs = target * 3600.0 / weighted;
    let tz1 = total_secs * LONG_SPLIT[0].1;
    let mut tz2 = total_secs * LONG_SPLIT[1].1;
    let mut tz3 = total_secs * LONG_SPLIT[2].1;

    // the week's Z3 budget bounds the session; overflow moves to Z2
    let z3_budget = weekly_time_in_zone.get(Zone::Z3);
    if z3_budget < tz3 {
        let overflow = tz3 - z3_budget.max(0.0);
        tz3 -= overflow;
        tz2 += overflow * z3_rate / z2_rate;
    }

    let mut times = ZoneTimes::zero();
    times.set(Zone::Z1, tz1);
    times.set(Zone::Z2, tz2);
    times.set(Zone::Z3, tz3);
    let session_tss = tables.tss_for_times(ctx.sport, &times)?;
    let distance = tables.distance_for_times(ctx.sport, ctx.level, &times)?;
    let session_secs = times.total_seconds();

    let workout = Workout {
        workout_type: WorkoutType::Long,
        sport: ctx.sport,
        tss: session_tss,
        seconds_in_zone: times,
        theoretical_distance_km: distance,
        theoretical_time_secs: session_secs,
        intervals: long_workout_skeleton(tz1, tz2, tz3, z1_rate, z2_rate, z3_rate),
    };

    for (zone, seconds) in workout.seconds_in_zone.iter() {
        weekly_time_in_zone.add(zone, -seconds);
    }
    let day = week_org.long_workout_day;
    micro.day_by_day.add(day, workout);
    if let Some(position) = available_days.iter().position(|candidate| *candidate == day) {
        available_days.remove(position);
        durations.consume(day, session_secs);
    }
    info!(day = ?day, tss = session_tss, "long workout planned");
    Ok(session_tss)
}

/// Fill one future microcycle's day-by-day plan.
///
/// The competition week gets its fixed structure; every other week gets its
/// long workout (when prescribed), then the remaining key workouts, then
/// generic sessions until the weekly target is consumed.
///
/// # Errors
/// Returns a configuration error when a table lookup fails.
pub fn plan_week_day_by_day(
    microcycle: &Microcycle,
    week_org: &WeekOrganization,
    ctx: &RaceContext,
    plan: &LoadPlan,
    tables: &PlanningTables,
) -> AppResult<Microcycle> {
    let mut micro = microcycle.clone();
    micro.day_by_day = DayPlan::new();
    let repartition =
        tables.zone_repartition(ctx.level, micro.cycle_type, ctx.size)?;
    micro.zone_repartition = Some(repartition);

    if micro.cycle_type == CycleType::Compet {
        plan_competition_week(&mut micro, ctx, plan, tables)?;
        return Ok(micro);
    }

    let mut weekly_time_in_zone =
        tables.weekly_time_in_zone(ctx.sport, &repartition, micro.theoretical_weekly_tss)?;
    let mut available_days = week_org.available_days.clone();
    let mut durations = week_org.day_durations;
    let mut remaining_tss = micro.theoretical_weekly_tss;

    if micro.key_workouts.contains(&KeyWorkout::Long) {
        remaining_tss -= plan_long_workout(
            &mut micro,
            week_org,
            ctx,
            &mut weekly_time_in_zone,
            &mut available_days,
            &mut durations,
            tables,
        )?;
    }

    let typical_tss = tables.typical_workout_tss(ctx.cap_key())?;
    let workout_count = (remaining_tss / typical_tss).round();
    if workout_count <= 0.0 {
        return Ok(micro);
    }
    let tss_per_activity = (remaining_tss / workout_count).round();

    if micro.key_workouts.contains(&KeyWorkout::ShortIntensity) {
        let cap = micro
            .targets
            .short_intensity
            .unwrap_or(plan.max_tss_per_workout);
        let allocated = create_workout(
            &WorkoutRequest {
                target_tss: tss_per_activity,
                zones: &[Zone::Z7, Zone::Z6, Zone::Z5],
                max_time_in_zone: &[(Zone::Z5, 1200.0), (Zone::Z6, 600.0), (Zone::Z7, 300.0)],
                cumulative_caps: &[CumulativeCap {
                    zones: vec![Zone::Z5, Zone::Z6, Zone::Z7],
                    max_tss: cap,
                }],
                warmup_secs: WARMUP_SECS,
                cooldown_secs: COOLDOWN_SECS,
            },
            &weekly_time_in_zone,
            ctx.sport,
            tables,
        )?;
        let workout = build_workout(WorkoutType::ShortIntensity, allocated, ctx, tables)?;
        place_workout(
            &mut micro,
            workout,
            &mut available_days,
            &mut durations,
            &mut weekly_time_in_zone,
        );
    }

    if micro.key_workouts.contains(&KeyWorkout::LongIntensity) {
        let cap = micro
            .targets
            .long_intensity
            .unwrap_or(plan.max_tss_per_workout);
        let allocated = create_workout(
            &WorkoutRequest {
                target_tss: tss_per_activity,
                zones: &[Zone::Z4, Zone::Z3],
                max_time_in_zone: &[(Zone::Z4, 1800.0), (Zone::Z3, 7200.0)],
                cumulative_caps: &[CumulativeCap {
                    zones: vec![Zone::Z4, Zone::Z3],
                    max_tss: cap,
                }],
                warmup_secs: WARMUP_SECS,
                cooldown_secs: COOLDOWN_SECS,
            },
            &weekly_time_in_zone,
            ctx.sport,
            tables,
        )?;
        let workout = build_workout(WorkoutType::LongIntensity, allocated, ctx, tables)?;
        place_workout(
            &mut micro,
            workout,
            &mut available_days,
            &mut durations,
            &mut weekly_time_in_zone,
        );
    }

    if micro.key_workouts.contains(&KeyWorkout::RaceIntensity) {
        let allocated = create_workout(
            &WorkoutRequest {
                target_tss: tss_per_activity,
                zones: &[ctx.race_zone],
                max_time_in_zone: &[(ctx.race_zone, 1800.0)],
                cumulative_caps: &[],
                warmup_secs: WARMUP_SECS,
                cooldown_secs: COOLDOWN_SECS,
            },
            &weekly_time_in_zone,
            ctx.sport,
            tables,
        )?;
        let workout = build_workout(WorkoutType::RaceIntensity, allocated, ctx, tables)?;
        place_workout(
            &mut micro,
            workout,
            &mut available_days,
            &mut durations,
            &mut weekly_time_in_zone,
        );
    }

    let mut remaining = micro.theoretical_weekly_tss - micro.day_by_day.total_tss();
    while remaining > plan.min_tss_per_workout {
        let mut zones: Vec<Zone> = Zone::ALL
            .iter()
            .copied()
            .filter(|zone| weekly_time_in_zone.get(*zone) > 0.0)
            .collect();
        zones.sort_by(|a, b| b.cmp(a));

        let allocated = create_workout(
            &WorkoutRequest {
                target_tss: tss_per_activity,
                zones: &zones,
                max_time_in_zone: &[],
                cumulative_caps: &[CumulativeCap {
                    zones: vec![Zone::Z3, Zone::Z4, Zone::Z5, Zone::Z6, Zone::Z7],
                    max_tss: REMAINING_INTENSITY_CAP_TSS,
                }],
                warmup_secs: WARMUP_SECS,
                cooldown_secs: COOLDOWN_SECS,
            },
            &weekly_time_in_zone,
            ctx.sport,
            tables,
        )?
        .capped(REMAINING_WORKOUT_CAP_TSS);
        if allocated.total_tss <= 0.0 {
            break;
        }
        remaining -= allocated.total_tss;
        let workout = build_workout(WorkoutType::Remaining, allocated, ctx, tables)?;
        place_workout(
            &mut micro,
            workout,
            &mut available_days,
            &mut durations,
            &mut weekly_time_in_zone,
        );
    }

    Ok(micro)
}

impl AllocatedWorkout {
    /// Clamp the filler contribution so a generic session cannot exceed
    /// `cap_tss`: any Z1/Z2 filler beyond the cap is shed proportionally.
    #[must_use]
    fn capped(mut self, cap_tss: f64) -> Self {
        if self.total_tss <= cap_tss || self.total_tss <= 0.0 {
            return self;
        }
        let scale = cap_tss / self.total_tss;
        let scaled: ZoneTimes = self
            .seconds_in_zone
            .iter()
            .map(|(zone, seconds)| (zone, seconds * scale))
            .collect();
        self.seconds_in_zone = scaled;
        for step in &mut self.intervals {
            step.duration_secs *= scale;
            step.tss *= scale;
        }
        self.total_tss = cap_tss;
        self
    }
}
