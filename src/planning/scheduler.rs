// ABOUTME: The cycle scheduler: splits history from future, anchors phases to the race date
// ABOUTME: and stitches ramp, specific pattern, taper and competition into one cycle list
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Cycle Scheduler
//!
//! The orchestrator of one planning pass. Calendar position is walked by an
//! explicit state machine: the competition window is fixed first (from the
//! race date backwards), then the taper window, then the remaining time is
//! filled with the fondamental ramp and the specific-phase pattern, dated
//! from the next Monday forwards and merged week-for-week with previously
//! stored cycles.

use crate::config::PlanningTables;
use crate::errors::{AppError, AppResult};
use crate::models::athlete::{AthleteProfile, WeekOrganization};
use crate::models::cycle::{
    CycleType, Macrocycle, MacrocycleUpdate, Microcycle, MicrocycleUpdate,
};
use crate::models::race::RaceSpec;
use crate::models::workout::{CompletedWorkout, KeyWorkout};
use crate::planning::load_plan::LoadPlan;
use crate::planning::progression::{
    cap_trailing_working_weeks, fondamental_weeks_required, key_workouts_for, specific_weeks,
    SkeletonWeek, RESTING_LOAD_FACTOR,
};
use crate::planning::replanner::replan_current_week;
use crate::planning::status::{analyze_macrocycle, analyze_microcycle, load_status, Takeaways};
use crate::planning::synthesizer::plan_week_day_by_day;
use crate::planning::RaceContext;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Resting weeks discount their key-workout targets by this factor
const RESTING_TARGET_DISCOUNT: f64 = 0.7;

/// Fallback current short-intensity dose when nothing was observed, TSS
const DEFAULT_CURRENT_SHORT_INTENSITY: f64 = 10.0;
/// Fallback current long-intensity dose, TSS
const DEFAULT_CURRENT_LONG_INTENSITY: f64 = 15.0;
/// Fallback current race-intensity dose, TSS
const DEFAULT_CURRENT_RACE_INTENSITY: f64 = 15.0;
/// Floor for the current long-workout seed, TSS
const MIN_CURRENT_LONG_WORKOUT: f64 = 30.0;

/// Previously persisted cycles handed back by the persistence layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredCycles {
    /// Previously planned macrocycles
    pub macrocycles: Vec<Macrocycle>,
    /// Previously planned microcycles
    pub microcycles: Vec<Microcycle>,
}

/// Everything one planning call needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    /// The athlete's declared state and preferences
    pub athlete: AthleteProfile,
    /// Races to prepare, in date order
    pub races: Vec<RaceSpec>,
    /// Weekly availability
    pub week_organization: WeekOrganization,
    /// Completed-workout feed from the activity provider
    pub completed_workouts: Vec<CompletedWorkout>,
    /// Previously persisted cycles
    pub stored: StoredCycles,
}

/// The engine's output: the full ordered cycle list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingPlan {
    /// All macrocycles, ordered by start date
    pub macrocycles: Vec<Macrocycle>,
    /// All microcycles, ordered by start date
    pub microcycles: Vec<Microcycle>,
}

/// Coarse calendar position of the planning pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlanningPhase {
    /// Fixing the competition window
    Compet,
    /// Fixing the taper window
    PreCompet,
    /// Filling the remaining weeks up to the taper
    BeforePreCompet,
}

#[derive(Debug, Default)]
struct ScheduleState {
    compet_macro: Option<Macrocycle>,
    compet_micro: Option<Microcycle>,
    precompet_macro: Option<Macrocycle>,
    precompet_micro: Option<Microcycle>,
    new_weeks: Vec<Microcycle>,
    new_phases: Vec<Macrocycle>,
}

/// One race's planning pass
pub struct CycleScheduler<'a> {
    tables: &'a PlanningTables,
    ctx: RaceContext,
    plan: LoadPlan,
    week_org: &'a WeekOrganization,
    today: NaiveDate,
    race_number: usize,
    now: DateTime<Utc>,
}

impl<'a> CycleScheduler<'a> {
    /// Build the scheduler for one race
    #[must_use]
    pub fn new(
        tables: &'a PlanningTables,
        ctx: RaceContext,
        plan: LoadPlan,
        week_org: &'a WeekOrganization,
        today: NaiveDate,
        race_number: usize,
    ) -> Self {
        Self {
            tables,
            ctx,
            plan,
            week_org,
            today,
            race_number,
            now: Utc::now(),
        }
    }

    fn next_monday(&self) -> NaiveDate {
        let weekday = i64::from(self.today.weekday().num_days_from_monday());
        self.today + Duration::days(7 - weekday)
    }

    /// Run the full pass: analyze the past, replan the current week, fix the
    /// race-anchored windows and fill the remaining weeks.
    ///
    /// # Errors
    /// Returns configuration errors from table lookups and input errors from
    /// the load ramp.
    pub fn schedule(
        &self,
        stored: &StoredCycles,
        completed: &[CompletedWorkout],
    ) -> AppResult<TrainingPlan> {
        let mut past: Vec<Microcycle> = stored
            .microcycles
            .iter()
            .filter(|micro| micro.end_date < self.today)
            .cloned()
            .collect();
        past.sort_by_key(|micro| micro.start_date);
        let mut current: Option<Microcycle> = stored
            .microcycles
            .iter()
            .find(|micro| micro.contains(self.today))
            .cloned();
        let future: Vec<Microcycle> = stored
            .microcycles
            .iter()
            .filter(|micro| micro.start_date > self.today)
            .cloned()
            .collect();

        let mut past_macro: Vec<Macrocycle> = stored
            .macrocycles
            .iter()
            .filter(|phase| phase.end_date < self.today)
            .cloned()
            .collect();
        past_macro.sort_by_key(|phase| phase.start_date);
        let current_macro: Option<Macrocycle> = stored
            .macrocycles
            .iter()
            .find(|phase| phase.contains(self.today))
            .cloned();
        let future_macro: Vec<Macrocycle> = stored
            .macrocycles
            .iter()
            .filter(|phase| phase.start_date > self.today)
            .cloned()
            .collect();

        // Elapsed weeks are analyzed exactly once
        for micro in &mut past {
            if micro.analyzed {
                continue;
            }
            let repartition = match micro.zone_repartition {
                Some(repartition) => repartition,
                None => self.tables.zone_repartition(
                    self.ctx.level,
                    micro.cycle_type,
                    self.ctx.size,
                )?,
            };
            *micro = analyze_microcycle(
                micro,
                completed,
                self.ctx.race_zone,
                self.ctx.sport,
                &repartition,
                self.tables,
            )?;
        }
        for phase in &mut past_macro {
            if !phase.analyzed {
                *phase = analyze_macrocycle(phase, &past);
            }
        }

        let takeaways = load_status(&past, self.plan.cycle_length);
        let start_load = if self.plan.start_load > 0.0 {
            self.plan.start_load
        } else {
            takeaways.current_handable_load
        };
        let mut next_resting = self
            .plan
            .next_resting_week
            .unwrap_or_else(|| takeaways.next_resting_week.saturating_sub(1));

        if let Some(micro) = &current {
            current = Some(replan_current_week(
                micro,
                completed,
                self.today,
                &takeaways,
                &self.plan,
                &self.ctx,
                self.tables,
            )?);
        }

        next_resting = next_resting.saturating_sub(1);
        let current_resting = current.as_ref().is_some_and(|micro| {
            micro.theoretical_resting
                || micro
                    .outcome
                    .as_ref()
                    .is_some_and(|outcome| outcome.actual_resting)
        });
        if current_resting {
            next_resting = self.plan.cycle_length;
        }

        let ramp = fondamental_weeks_required(
            start_load * (1.0 + self.plan.weekly_increase_rate),
            current.as_ref().map_or(1, |micro| micro.cycle_number),
            current.as_ref().map_or(0, |micro| micro.index_in_cycle),
            self.plan.end_load,
            self.plan.weekly_increase_rate,
            self.plan.cycle_length,
            next_resting,
        )?;

        let mut skeleton = self.assemble_skeleton(ramp.weeks, ramp.cycle_number, current.as_ref())?;
        self.assign_key_workout_targets(&mut skeleton, &takeaways);

        let mut state = ScheduleState::default();
        let mut phase = PlanningPhase::Compet;
        loop {
            let next = match phase {
                PlanningPhase::Compet => self.fix_compet_window(&mut state, stored)?,
                PlanningPhase::PreCompet => self.fix_precompet_window(&mut state, stored)?,
                PlanningPhase::BeforePreCompet => {
                    let macro_pool: Vec<Macrocycle> = current_macro
                        .iter()
                        .chain(future_macro.iter())
                        .cloned()
                        .collect();
                    self.fill_remaining_weeks(
                        &mut state,
                        &skeleton,
                        current.as_ref(),
                        &future,
                        &macro_pool,
                        next_resting,
                    );
                    None
                }
            };
            match next {
                Some(next_phase) => phase = next_phase,
                None => break,
            }
        }

        // Day-by-day synthesis for every newly planned future week
        for micro in &mut state.new_weeks {
            *micro = plan_week_day_by_day(micro, self.week_org, &self.ctx, &self.plan, self.tables)?;
        }
        if let Some(micro) = state.precompet_micro.take() {
            state.precompet_micro = Some(if micro.start_date > self.today {
                plan_week_day_by_day(&micro, self.week_org, &self.ctx, &self.plan, self.tables)?
            } else {
                micro
            });
        }
        if let Some(micro) = state.compet_micro.take() {
            state.compet_micro = Some(if micro.start_date > self.today {
                plan_week_day_by_day(&micro, self.week_org, &self.ctx, &self.plan, self.tables)?
            } else {
                micro
            });
        }

        let mut microcycles: Vec<Microcycle> = Vec::new();
        microcycles.extend(past);
        microcycles.extend(current);
        microcycles.append(&mut state.new_weeks);
        microcycles.extend(state.precompet_micro);
        microcycles.extend(state.compet_micro);
        let mut microcycles = dedupe_by_id(microcycles, |micro| micro.id);
        microcycles.sort_by_key(|micro| micro.start_date);

        let mut macrocycles: Vec<Macrocycle> = Vec::new();
        macrocycles.extend(past_macro);
        macrocycles.extend(current_macro);
        macrocycles.append(&mut state.new_phases);
        macrocycles.extend(state.precompet_macro);
        macrocycles.extend(state.compet_macro);
        let mut macrocycles = dedupe_by_id(macrocycles, |phase| phase.id);
        macrocycles.sort_by_key(|phase| phase.start_date);

        Ok(TrainingPlan {
            macrocycles,
            microcycles,
        })
    }

    fn precompet_start(&self) -> AppResult<NaiveDate> {
        let precompet_days = self.tables.phase_window_days(
            self.ctx.objective,
            self.ctx.size,
            CycleType::PreCompet,
        )?;
        let compet_days =
            self.tables
                .phase_window_days(self.ctx.objective, self.ctx.size, CycleType::Compet)?;
        Ok(self.ctx.race_date - Duration::days(precompet_days + compet_days) + Duration::days(1))
    }

    /// Whole weeks available for fondamental + specific work, counted from
    /// the Monday after the current week up to the taper boundary. The first
    /// race gets one extra week when there is no current week yet and the
    /// taper starts off-Monday.
    fn available_weeks(&self, has_current: bool) -> AppResult<u32> {
        let boundary = self.precompet_start()?;
        let mut available = ((boundary - self.today).num_days() - 7).div_euclid(7);
        if !has_current && self.race_number == 0 && boundary.weekday() != Weekday::Mon {
            available += 1;
        }
        Ok(available.max(0) as u32)
    }

    fn assemble_skeleton(
        &self,
        mut fondamental: Vec<SkeletonWeek>,
        ramp_cycle_number: u32,
        current: Option<&Microcycle>,
    ) -> AppResult<Vec<SkeletonWeek>> {
        let available = self.available_weeks(current.is_some())? as usize;
        info!(
            fondamental = fondamental.len(),
            available, "assembling phase skeleton"
        );

        if fondamental.len() > available {
            fondamental.truncate(available);
            // a truncated build must not end on rest
            if let Some(last) = fondamental.last_mut() {
                if last.theoretical_resting {
                    last.theoretical_resting = false;
                    last.theoretical_weekly_tss /= RESTING_LOAD_FACTOR;
                    last.key_workouts = key_workouts_for(CycleType::Fondamental);
                }
            }
            cap_trailing_working_weeks(&mut fondamental, self.plan.cycle_length);
            return Ok(fondamental);
        }

        let specific_count = (available - fondamental.len()) as u32;
        let cycle_length = self.plan.cycle_length;
        let (next_cycle_number, next_index, next_resting) = match fondamental.last() {
            Some(last) => {
                let cycle_number = if last.index_in_cycle == cycle_length - 1 {
                    last.cycle_number + 1
                } else {
                    last.cycle_number
                };
                let index = if last.index_in_cycle < cycle_length - 1 {
                    last.index_in_cycle + 1
                } else {
                    1
                };
                let last_resting_index = fondamental
                    .iter()
                    .rposition(|week| week.theoretical_resting)
                    .unwrap_or(0);
                let next_resting = (fondamental.len() as i64 - last_resting_index as i64 - 2)
                    .max(0) as u32;
                (cycle_number, index, next_resting)
            }
            None => (
                ramp_cycle_number,
                current.map_or(1, |micro| micro.index_in_cycle + 1),
                cycle_length.saturating_sub(1),
            ),
        };

        fondamental.extend(specific_weeks(
            specific_count,
            self.plan.end_load,
            cycle_length,
            next_resting,
            next_cycle_number + 1,
            next_index,
        ));
        Ok(fondamental)
    }

    /// Week-by-week linear interpolation of the key-workout targets from the
    /// currently handable dose toward the phase-final target: each time a
    /// target is assigned, the remaining gap is re-divided by the number of
    /// later weeks sharing that key workout.
    fn assign_key_workout_targets(&self, skeleton: &mut [SkeletonWeek], takeaways: &Takeaways) {
        let ramp = 1.0 + self.plan.weekly_increase_rate;
        let seed = |explicit: Option<f64>, observed: f64, fallback: f64| {
            explicit.unwrap_or_else(|| {
                if observed > 0.0 {
                    observed * ramp
                } else {
                    fallback * ramp
                }
            })
        };
        let mut handable_long = seed(
            self.plan.current_long_workout_tss,
            takeaways.biggest_workout,
            MIN_CURRENT_LONG_WORKOUT,
        );
        let mut handable_short = seed(
            self.plan.current_short_intensity_tss,
            takeaways.biggest_short_intensity,
            DEFAULT_CURRENT_SHORT_INTENSITY,
        );
        let mut handable_long_intensity = seed(
            self.plan.current_long_intensity_tss,
            takeaways.biggest_long_intensity,
            DEFAULT_CURRENT_LONG_INTENSITY,
        );
        let mut handable_race = seed(
            self.plan.current_race_intensity_tss,
            takeaways.biggest_race_intensity,
            DEFAULT_CURRENT_RACE_INTENSITY,
        );

        for index in 0..skeleton.len() {
            let keys = skeleton[index].key_workouts.clone();
            if skeleton[index].theoretical_resting {
                for key in keys {
                    let current = match key {
                        KeyWorkout::Long => handable_long,
                        KeyWorkout::ShortIntensity => handable_short,
                        KeyWorkout::LongIntensity => handable_long_intensity,
                        KeyWorkout::RaceIntensity => handable_race,
                    };
                    skeleton[index]
                        .targets
                        .set(key, current * RESTING_TARGET_DISCOUNT);
                }
                continue;
            }
            for key in keys {
                let later_weeks = skeleton[index + 1..]
                    .iter()
                    .filter(|week| week.key_workouts.contains(&key))
                    .count() as f64;
                let (current, final_target) = match key {
                    KeyWorkout::Long => (&mut handable_long, self.plan.final_long_workout_tss),
                    KeyWorkout::ShortIntensity => {
                        (&mut handable_short, self.plan.final_short_intensity_tss)
                    }
                    KeyWorkout::LongIntensity => (
                        &mut handable_long_intensity,
                        self.plan.final_long_intensity_tss,
                    ),
                    KeyWorkout::RaceIntensity => {
                        (&mut handable_race, self.plan.final_race_intensity_tss)
                    }
                };
                skeleton[index].targets.set(key, *current);
                *current += (final_target - *current) / (later_weeks + 1.0);
            }
        }
    }

    /// Fix the competition window: one macro/microcycle ending on race day,
    /// its load the event stress scaled by the competition multiplier.
    fn fix_compet_window(
        &self,
        state: &mut ScheduleState,
        stored: &StoredCycles,
    ) -> AppResult<Option<PlanningPhase>> {
        let compet_days = self
            .tables
            .phase_window_days(self.ctx.objective, self.ctx.size, CycleType::Compet)?;
        let multiplier = self
            .tables
            .compet_tss_multiplier(self.ctx.sport, self.ctx.objective, self.ctx.size)?;
        let total_tss = self.ctx.event_tss * multiplier;
        let start =
            (self.ctx.race_date - Duration::days(compet_days) + Duration::days(1)).max(self.today);
        let end = self.ctx.race_date;

        state.compet_macro = Some(
            match stored
                .macrocycles
                .iter()
                .find(|phase| phase.cycle_type == CycleType::Compet)
            {
                Some(existing) => {
                    let (updated, _) = existing.with_updates(
                        &MacrocycleUpdate {
                            start_date: Some(start),
                            end_date: Some(end),
                            total_tss: Some(total_tss),
                            ..MacrocycleUpdate::default()
                        },
                        self.now,
                    );
                    updated
                }
                None => Macrocycle::new(CycleType::Compet, start, end, total_tss),
            },
        );

        state.compet_micro = Some(
            match stored
                .microcycles
                .iter()
                .find(|micro| micro.cycle_type == CycleType::Compet)
            {
                Some(existing) => {
                    let (updated, _) = existing.with_updates(
                        &MicrocycleUpdate {
                            start_date: Some(start),
                            end_date: Some(end),
                            theoretical_weekly_tss: Some(total_tss),
                            ..MicrocycleUpdate::default()
                        },
                        self.now,
                    );
                    updated
                }
                None => Microcycle::new(CycleType::Compet, start, end, total_tss, false),
            },
        );

        if self.today >= start {
            debug!("inside the competition window, planning stops here");
            Ok(None)
        } else {
            Ok(Some(PlanningPhase::PreCompet))
        }
    }

    /// Fix the taper window just before the competition window. A zero-length
    /// taper (short performance races) is degenerate and skipped.
    fn fix_precompet_window(
        &self,
        state: &mut ScheduleState,
        stored: &StoredCycles,
    ) -> AppResult<Option<PlanningPhase>> {
        let precompet_days = self.tables.phase_window_days(
            self.ctx.objective,
            self.ctx.size,
            CycleType::PreCompet,
        )?;
        if precompet_days == 0 {
            debug!("degenerate taper window, skipping straight to week filling");
            return Ok(Some(PlanningPhase::BeforePreCompet));
        }
        let compet_start = state
            .compet_micro
            .as_ref()
            .map_or(self.ctx.race_date, |micro| micro.start_date);
        let start = (compet_start - Duration::days(precompet_days)).max(self.today);
        let end = compet_start - Duration::days(1);
        let total_tss = self.plan.end_load / 2.0 * precompet_days as f64 / 7.0;

        state.precompet_macro = Some(
            match stored
                .macrocycles
                .iter()
                .find(|phase| phase.cycle_type == CycleType::PreCompet)
            {
                Some(existing) => {
                    let (updated, _) = existing.with_updates(
                        &MacrocycleUpdate {
                            start_date: Some(start),
                            end_date: Some(end),
                            total_tss: Some(total_tss),
                            theoretical_resting: Some(true),
                            ..MacrocycleUpdate::default()
                        },
                        self.now,
                    );
                    updated
                }
                None => {
                    let mut phase = Macrocycle::new(CycleType::PreCompet, start, end, total_tss);
                    phase.theoretical_resting = true;
                    phase
                }
            },
        );

        state.precompet_micro = Some(
            match stored
                .microcycles
                .iter()
                .find(|micro| micro.cycle_type == CycleType::PreCompet)
            {
                Some(existing) => {
                    let (updated, _) = existing.with_updates(
                        &MicrocycleUpdate {
                            start_date: Some(start),
                            end_date: Some(end),
                            theoretical_weekly_tss: Some(total_tss),
                            theoretical_resting: Some(true),
                            ..MicrocycleUpdate::default()
                        },
                        self.now,
                    );
                    updated
                }
                None => Microcycle::new(CycleType::PreCompet, start, end, total_tss, true),
            },
        );

        if self.today >= start {
            debug!("inside the taper window, planning stops here");
            Ok(None)
        } else {
            Ok(Some(PlanningPhase::BeforePreCompet))
        }
    }

    /// Date the skeleton from the Monday after the current week, merge it
    /// week-for-week with previously stored future weeks and derive the
    /// fondamental/specific macrocycles from the result.
    fn fill_remaining_weeks(
        &self,
        state: &mut ScheduleState,
        skeleton: &[SkeletonWeek],
        current: Option<&Microcycle>,
        stored_future: &[Microcycle],
        stored_phases: &[Macrocycle],
        next_resting: u32,
    ) {
        let boundary = state
            .precompet_micro
            .as_ref()
            .or(state.compet_micro.as_ref())
            .map_or(self.ctx.race_date, |micro| micro.start_date);

        // Bootstrap a partial current week for a first race with no history
        if current.is_none() && self.race_number == 0 {
            let weekday = self.today.weekday().num_days_from_monday();
            let end = (self.today + Duration::days(i64::from(6 - weekday))).min(boundary - Duration::days(1));
            if end >= self.today {
                let resting = next_resting == 0;
                let fraction = f64::from(6 - weekday) / 7.0;
                let tss = if resting {
                    self.plan.start_load * fraction / 2.0
                } else {
                    self.plan.start_load * fraction
                };
                let micro =
                    Microcycle::new(CycleType::Fondamental, self.today, end, tss, resting);
                info!(start = %self.today, end = %end, tss, "bootstrapping current week");
                state.new_weeks.push(micro);
            }
        }

        let mut merge_pool: Vec<Microcycle> = stored_future
            .iter()
            .filter(|micro| {
                micro.cycle_type != CycleType::PreCompet && micro.cycle_type != CycleType::Compet
            })
            .cloned()
            .collect();
        merge_pool.sort_by_key(|micro| micro.start_date);

        let first_monday = self.next_monday();
        for (index, week) in skeleton.iter().enumerate() {
            let start = first_monday + Duration::days(7 * index as i64);
            let mut end = start + Duration::days(6);
            let mut tss = week.theoretical_weekly_tss;
            let mut key_workouts = week.key_workouts.clone();
            let mut targets = week.targets;
            if index == skeleton.len() - 1 {
                end = boundary - Duration::days(1);
                if end < start {
                    warn!(start = %start, boundary = %boundary, "final skeleton week has no room, dropping");
                    continue;
                }
                let days = end.weekday().num_days_from_monday() + 1;
                tss = tss * f64::from(days) / 7.0;
                if end.weekday().num_days_from_monday() <= 3 {
                    key_workouts.retain(|key| *key != KeyWorkout::Long);
                    targets.long = None;
                }
            }

            let micro = if let Some(existing) = merge_pool.get(index) {
                let (updated, changed) = existing.with_updates(
                    &MicrocycleUpdate {
                        start_date: Some(start),
                        end_date: Some(end),
                        cycle_type: Some(week.cycle_type),
                        cycle_number: Some(week.cycle_number),
                        index_in_cycle: Some(week.index_in_cycle),
                        theoretical_weekly_tss: Some(tss),
                        theoretical_resting: Some(week.theoretical_resting),
                        key_workouts: Some(key_workouts),
                        targets: Some(targets),
                    },
                    self.now,
                );
                debug!(start = %start, changed, "merged skeleton week with stored week");
                updated
            } else {
                let mut created =
                    Microcycle::new(week.cycle_type, start, end, tss, week.theoretical_resting);
                created.cycle_number = week.cycle_number;
                created.index_in_cycle = week.index_in_cycle;
                created.key_workouts = key_workouts;
                created.targets = targets;
                created
            };
            state.new_weeks.push(micro);
        }

        state.new_phases = self.derive_phase_macrocycles(&state.new_weeks, stored_phases);
    }

    /// Contiguous same-type runs of the newly planned weeks become the
    /// fondamental/specific macrocycles, merged with stored future phases of
    /// the same type in order.
    fn derive_phase_macrocycles(
        &self,
        weeks: &[Microcycle],
        stored_phases: &[Macrocycle],
    ) -> Vec<Macrocycle> {
        let mut runs: Vec<(CycleType, NaiveDate, NaiveDate, f64)> = Vec::new();
        for week in weeks {
            match runs.last_mut() {
                Some((cycle_type, _, end, total))
                    if *cycle_type == week.cycle_type
                        && week.start_date <= *end + Duration::days(1) =>
                {
                    *end = week.end_date.max(*end);
                    *total += week.theoretical_weekly_tss;
                }
                _ => runs.push((
                    week.cycle_type,
                    week.start_date,
                    week.end_date,
                    week.theoretical_weekly_tss,
                )),
            }
        }

        let mut reusable: Vec<&Macrocycle> = stored_phases
            .iter()
            .filter(|phase| {
                phase.cycle_type != CycleType::PreCompet && phase.cycle_type != CycleType::Compet
            })
            .collect();

        let mut phases = Vec::new();
        for (cycle_type, start, end, total) in runs {
            let existing = reusable
                .iter()
                .position(|phase| phase.cycle_type == cycle_type);
            let phase = match existing {
                Some(position) => {
                    let stored_phase = reusable.remove(position);
                    let (updated, _) = stored_phase.with_updates(
                        &MacrocycleUpdate {
                            start_date: Some(start),
                            end_date: Some(end),
                            total_tss: Some(total),
                            ..MacrocycleUpdate::default()
                        },
                        self.now,
                    );
                    updated
                }
                None => Macrocycle::new(cycle_type, start, end, total),
            };
            phases.push(phase);
        }
        phases
    }
}

fn dedupe_by_id<T, F: Fn(&T) -> uuid::Uuid>(items: Vec<T>, id: F) -> Vec<T> {
    let mut seen = HashSet::new();
    let mut kept: Vec<T> = Vec::with_capacity(items.len());
    // keep the last occurrence: later entries carry the updated state
    for item in items.into_iter().rev() {
        if seen.insert(id(&item)) {
            kept.push(item);
        }
    }
    kept.reverse();
    kept
}

/// Plan the full race sequence: validate the races, run one scheduler pass
/// per race and concatenate the outputs.
///
/// Races out of date order are rejected; a race with a negative distance is
/// skipped with a warning rather than failing the whole plan.
///
/// # Errors
/// Returns consistency errors for invalid race sequences and configuration
/// errors from table lookups.
pub fn compute_training_plan(
    request: &PlanRequest,
    today: NaiveDate,
    tables: &PlanningTables,
) -> AppResult<TrainingPlan> {
    for pair in request.races.windows(2) {
        if pair[1].date <= pair[0].date {
            return Err(AppError::consistency(format!(
                "races out of date order: {} does not follow {}",
                pair[1].date, pair[0].date
            )));
        }
    }

    let mut output = TrainingPlan::default();
    let mut previous_race_date: Option<NaiveDate> = None;
    for (race_number, race) in request.races.iter().enumerate() {
        if race.distance_km < 0.0 {
            warn!(date = %race.date, distance = race.distance_km, "skipping race with negative distance");
            continue;
        }
        race.validate()?;

        // Later races start planning the Monday after the previous race when
        // it fell on the weekend, else on the race date itself
        let pass_today = match previous_race_date {
            None => today,
            Some(previous) => {
                let weekday = i64::from(previous.weekday().num_days_from_monday());
                if weekday >= 4 {
                    previous + Duration::days(7 - weekday)
                } else {
                    previous
                }
            }
        };

        let ctx = RaceContext::for_race(race, request.athlete.level, tables)?;
        let plan = LoadPlan::for_race(&request.athlete, race, tables)?;
        let scheduler = CycleScheduler::new(
            tables,
            ctx,
            plan,
            &request.week_organization,
            pass_today,
            race_number,
        );

        let window_start = previous_race_date;
        let stored = StoredCycles {
            macrocycles: request
                .stored
                .macrocycles
                .iter()
                .filter(|phase| {
                    phase.end_date <= race.date
                        && window_start.map_or(true, |bound| phase.start_date > bound)
                })
                .cloned()
                .collect(),
            microcycles: request
                .stored
                .microcycles
                .iter()
                .filter(|micro| {
                    micro.end_date <= race.date
                        && window_start.map_or(true, |bound| micro.start_date > bound)
                })
                .cloned()
                .collect(),
        };

        let pass = scheduler.schedule(&stored, &request.completed_workouts)?;
        output.macrocycles.extend(pass.macrocycles);
        output.microcycles.extend(pass.microcycles);
        previous_race_date = Some(race.date);
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::workout::WEEKDAYS as ALL_DAYS;

    #[test]
    fn test_dedupe_keeps_last_occurrence() {
        let id = uuid::Uuid::new_v4();
        let a = Macrocycle::new(
            CycleType::Compet,
            NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            NaiveDate::from_ymd_opt(2025, 4, 6).unwrap(),
            100.0,
        );
        let mut b = a.clone();
        b.id = id;
        let mut c = b.clone();
        c.total_tss = 250.0;
        let kept = dedupe_by_id(vec![a, b, c], |phase| phase.id);
        assert_eq!(kept.len(), 2);
        let survivor = kept.iter().find(|phase| phase.id == id).unwrap();
        assert!((survivor.total_tss - 250.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_weekdays_constant_is_monday_first() {
        assert_eq!(ALL_DAYS[0], Weekday::Mon);
        assert_eq!(ALL_DAYS[6], Weekday::Sun);
    }
}
