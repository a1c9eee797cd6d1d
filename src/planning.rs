// ABOUTME: Planning engine module root: progression, status, scheduling, synthesis, replanning
// ABOUTME: Defines the per-race planning context shared by all engine stages
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Periodization Engine
//!
//! The engine is a pure, synchronous computation: one call transforms the
//! current date, the athlete/race configuration, previously stored cycles
//! and the completed-workout history into an updated cycle list. It performs
//! no I/O; concurrency belongs to the caller.

/// Per-race immutable planning configuration
pub mod load_plan;
/// Load progression and rest-cycle patterns
pub mod progression;
/// Adaptive replanning of the in-progress week
pub mod replanner;
/// The orchestrating cycle scheduler
pub mod scheduler;
/// Past-cycle analysis and takeaways
pub mod status;
/// Day-by-day workout synthesis
pub mod synthesizer;

use crate::config::{CapKey, PlanningTables};
use crate::errors::AppResult;
use crate::models::athlete::AthleteLevel;
use crate::models::race::{EventSize, Objective, RaceSpec, Sport};
use crate::models::workout::Zone;
use chrono::NaiveDate;

pub use load_plan::LoadPlan;
pub use scheduler::{
    compute_training_plan, CycleScheduler, PlanRequest, StoredCycles, TrainingPlan,
};
pub use status::Takeaways;

/// Derived race facts every engine stage needs
#[derive(Debug, Clone, PartialEq)]
pub struct RaceContext {
    /// Race day
    pub race_date: NaiveDate,
    /// Main sport
    pub sport: Sport,
    /// Race objective
    pub objective: Objective,
    /// Event size class
    pub size: EventSize,
    /// Athlete level
    pub level: AthleteLevel,
    /// Zone the race will be run at
    pub race_zone: Zone,
    /// Expected stress of the race itself
    pub event_tss: f64,
    /// Race distance in kilometers
    pub race_distance_km: f64,
    /// Target finish time in minutes
    pub target_time_minutes: f64,
    /// Share of weekly load on the main sport
    pub main_sport_share: f64,
}

impl RaceContext {
    /// Derive the planning context for one race.
    ///
    /// # Errors
    /// Returns a configuration error when the event TSS lookup fails.
    pub fn for_race(
        race: &RaceSpec,
        level: AthleteLevel,
        tables: &PlanningTables,
    ) -> AppResult<Self> {
        Ok(Self {
            race_date: race.date,
            sport: race.sport,
            objective: race.objective,
            size: race.event_size(),
            level,
            race_zone: race.race_zone(),
            event_tss: race.event_tss(tables)?,
            race_distance_km: race.distance_km,
            target_time_minutes: race.target_time_minutes(),
            main_sport_share: race.main_sport_share(),
        })
    }

    /// Capacity-table key for this race and athlete
    #[must_use]
    pub const fn cap_key(&self) -> CapKey {
        CapKey {
            sport: self.sport,
            objective: self.objective,
            size: self.size,
            level: self.level,
        }
    }
}
