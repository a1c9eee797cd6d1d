// ABOUTME: Immutable per-race planning configuration derived from athlete and race inputs
// ABOUTME: Fixes loads, ramp rate, cycle length, caps and key-workout targets for one pass
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::config::{CapKey, PlanningTables};
use crate::errors::AppResult;
use crate::models::athlete::AthleteProfile;
use crate::models::race::RaceSpec;
use serde::{Deserialize, Serialize};

/// TSS one weekly training hour is worth when sizing the load ramp
const TSS_PER_WEEKLY_HOUR: f64 = 70.0;

/// Smallest workout worth scheduling
const MIN_TSS_PER_WORKOUT: f64 = 30.0;

/// Peak short-intensity session target at the end of the build
const FINAL_SHORT_INTENSITY_TSS: f64 = 50.0;

/// Peak long-intensity session target at the end of the build
const FINAL_LONG_INTENSITY_TSS: f64 = 70.0;

/// Everything one race's planning pass needs to know about loads and caps.
/// Built once per race and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadPlan {
    /// Weekly load at the start of the build
    pub start_load: f64,
    /// Race-ready weekly load
    pub end_load: f64,
    /// Week-over-week load increase rate
    pub weekly_increase_rate: f64,
    /// Rest-cycle length in weeks (working weeks + one rest)
    pub cycle_length: u32,
    /// Declared weeks until the next resting week, when provided
    pub next_resting_week: Option<u32>,
    /// Weekly load the athlete declared they can absorb today
    pub declared_handable_load: f64,
    /// Smallest workout worth scheduling
    pub min_tss_per_workout: f64,
    /// Cap on a single workout
    pub max_tss_per_workout: f64,
    /// Cap on one day's total load
    pub max_tss_per_day: f64,
    /// Stress of the longest workout the athlete can currently handle
    pub current_long_workout_tss: Option<f64>,
    /// Race-intensity stress the athlete can currently handle
    pub current_race_intensity_tss: Option<f64>,
    /// Short-intensity stress the athlete can currently handle
    pub current_short_intensity_tss: Option<f64>,
    /// Long-intensity stress the athlete can currently handle
    pub current_long_intensity_tss: Option<f64>,
    /// Long-workout target at the end of the build
    pub final_long_workout_tss: f64,
    /// Race-intensity target at the end of the build
    pub final_race_intensity_tss: f64,
    /// Short-intensity target at the end of the build
    pub final_short_intensity_tss: f64,
    /// Long-intensity target at the end of the build
    pub final_long_intensity_tss: f64,
}

impl LoadPlan {
    /// Derive the load plan for one race from the athlete's declarations and
    /// the capacity tables.
    ///
    /// # Errors
    /// Returns a configuration error when a capacity table has no entry for
    /// the race's sport/objective/size/level combination.
    pub fn for_race(
        profile: &AthleteProfile,
        race: &RaceSpec,
        tables: &PlanningTables,
    ) -> AppResult<Self> {
        let key = CapKey {
            sport: race.sport,
            objective: race.objective,
            size: race.event_size(),
            level: profile.level,
        };
        let event_tss = race.event_tss(tables)?;

        Ok(Self {
            start_load: race.weekly_start_hours * TSS_PER_WEEKLY_HOUR,
            end_load: race.weekly_end_hours * TSS_PER_WEEKLY_HOUR,
            weekly_increase_rate: profile.ramp.weekly_rate(),
            cycle_length: profile.recuperation.cycle_length(),
            next_resting_week: profile.next_resting_week,
            declared_handable_load: profile.declared_handable_load(),
            min_tss_per_workout: MIN_TSS_PER_WORKOUT,
            max_tss_per_workout: tables.max_workout_tss(key)?,
            max_tss_per_day: tables.max_daily_tss(key)?,
            current_long_workout_tss: Some(profile.longest_workout_tss()),
            current_race_intensity_tss: Some(0.2 * event_tss),
            current_short_intensity_tss: None,
            current_long_intensity_tss: None,
            final_long_workout_tss: tables.long_workout_pct(key)? * event_tss,
            final_race_intensity_tss: tables.race_intensity_pct(key)? * event_tss,
            final_short_intensity_tss: FINAL_SHORT_INTENSITY_TSS,
            final_long_intensity_tss: FINAL_LONG_INTENSITY_TSS,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::athlete::{AthleteLevel, LoadRampPreference, RecuperationNeed};
    use crate::models::race::{Objective, Sport};
    use chrono::NaiveDate;

    #[test]
    fn test_load_plan_for_half_marathon() {
        let profile = AthleteProfile {
            level: AthleteLevel::Confirmed,
            recuperation: RecuperationNeed::Low,
            weekly_hours: 5.0,
            intensity_sessions: 1,
            longest_workout_hours: 1.5,
            next_resting_week: Some(3),
            ramp: LoadRampPreference::High,
        };
        let race = RaceSpec {
            date: NaiveDate::from_ymd_opt(2025, 4, 6).unwrap(),
            sport: Sport::Run,
            objective: Objective::Perf,
            distance_km: 21.1,
            target_hours: 1,
            target_minutes: 40,
            weekly_start_hours: 3.0,
            weekly_end_hours: 9.0,
            secondary_share: None,
        };
        let tables = PlanningTables::default();
        let plan = LoadPlan::for_race(&profile, &race, &tables).unwrap();

        assert!((plan.start_load - 210.0).abs() < f64::EPSILON);
        assert!((plan.end_load - 630.0).abs() < f64::EPSILON);
        assert!((plan.weekly_increase_rate - 0.10).abs() < f64::EPSILON);
        assert_eq!(plan.cycle_length, 4);
        // half marathon at Perf pace races in Z4: 100 TSS/h over 100 minutes
        let event_tss = race.event_tss(&tables).unwrap();
        assert!((event_tss - 166.666_666_666_666_66).abs() < 1e-9);
        assert!((plan.final_long_workout_tss - 1.5 * event_tss).abs() < 1e-9);
        assert!((plan.current_race_intensity_tss.unwrap() - 0.2 * event_tss).abs() < 1e-9);
        assert!((plan.max_tss_per_workout - 200.0).abs() < f64::EPSILON);
    }
}
