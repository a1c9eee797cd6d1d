// ABOUTME: Domain model module root: athlete, race, workout and cycle types
// ABOUTME: Re-exports the types shared across the planning engine and its callers
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Core domain models for the periodization engine

/// Athlete profile and weekly availability
pub mod athlete;
/// Macro/microcycle records and audit updates
pub mod cycle;
/// Race description and derived event metrics
pub mod race;
/// Workouts, zones and day plans
pub mod workout;

pub use athlete::{
    AthleteLevel, AthleteProfile, DayDurations, LoadRampPreference, RecuperationNeed,
    WeekOrganization,
};
pub use cycle::{
    CycleType, KeyWorkoutActuals, KeyWorkoutTargets, Macrocycle, MacrocycleSnapshot,
    MacrocycleUpdate, Microcycle, MicrocycleOutcome, MicrocycleSnapshot, MicrocycleUpdate,
    NextWeekGuideline,
};
pub use race::{EventSize, Objective, RaceSpec, Sport};
pub use workout::{
    CompletedWorkout, DayPlan, IntervalKind, IntervalStep, KeyWorkout, Workout, WorkoutType, Zone,
    ZoneRepartition, ZoneTimes, WEEKDAYS,
};
