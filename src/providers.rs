// ABOUTME: Collaborator traits for the activity-history feed and the cycle store
// ABOUTME: The engine is pure; implementations live with the caller, not in this crate
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # External Collaborators
//!
//! The engine consumes a completed-workout feed and previously persisted
//! cycles, and hands back the updated cycle list. Both sides are expressed
//! as traits so the surrounding application chooses the transport and the
//! storage; the engine itself performs no I/O.

use crate::errors::AppResult;
use crate::models::workout::CompletedWorkout;
use crate::planning::scheduler::{StoredCycles, TrainingPlan};
use chrono::NaiveDate;

/// Source of the athlete's completed workouts (e.g. a Strava-backed
/// provider in the surrounding application).
pub trait ActivityHistory {
    /// Completed workouts within `[from, to]`, oldest first.
    ///
    /// # Errors
    /// Implementations report their own retrieval failures.
    fn completed_workouts(&self, from: NaiveDate, to: NaiveDate)
        -> AppResult<Vec<CompletedWorkout>>;
}

/// Persistence boundary for planned cycles across invocations.
pub trait PlanStore {
    /// Cycles persisted by an earlier planning pass.
    ///
    /// # Errors
    /// Implementations report their own retrieval failures.
    fn load_cycles(&self) -> AppResult<StoredCycles>;

    /// Persist the outcome of a planning pass.
    ///
    /// # Errors
    /// Implementations report their own storage failures.
    fn store_plan(&mut self, plan: &TrainingPlan) -> AppResult<()>;
}
