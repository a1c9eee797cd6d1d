// ABOUTME: Crate root for the Pierre periodization engine
// ABOUTME: Pure multi-horizon training schedule generation and adaptive repair
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Pierre Periodization Engine
//!
//! Generates and continuously repairs a multi-horizon endurance-training
//! schedule: weekly microcycles nested inside multi-week macrocycles,
//! terminating in a fixed competition date, for one or several races in
//! sequence.
//!
//! The engine:
//! - projects a load-progression curve from the athlete's current training
//!   load to a race-ready load,
//! - partitions the remaining time into phase segments anchored to the race
//!   date (competition and taper windows counted backwards, build weeks
//!   counted forwards),
//! - synthesizes concrete day-by-day workouts (zone-time allocation and
//!   interval suggestions) satisfying the weekly targets,
//! - adaptively re-plans the remainder of the current week when completed
//!   training diverges from the plan.
//!
//! It is a pure, single-threaded, synchronous computation with no I/O: the
//! interactive surface, the activity-history provider and the persistence
//! layer are external collaborators behind the traits in [`providers`].
//!
//! ```no_run
//! use pierre_periodization::config::PlanningTables;
//! use pierre_periodization::planning::{compute_training_plan, PlanRequest};
//!
//! # fn run(request: PlanRequest, today: chrono::NaiveDate) -> pierre_periodization::errors::AppResult<()> {
//! let tables = PlanningTables::default();
//! tables.validate()?;
//! let plan = compute_training_plan(&request, today, &tables)?;
//! for micro in &plan.microcycles {
//!     println!("{} -> {}: {:.0} TSS", micro.start_date, micro.end_date, micro.theoretical_weekly_tss);
//! }
//! # Ok(())
//! # }
//! ```

/// Injected physiological lookup tables
pub mod config;
/// Typed error handling
pub mod errors;
/// Logging bootstrap
pub mod logging;
/// Domain models
pub mod models;
/// The planning engine
pub mod planning;
/// External collaborator traits
pub mod providers;

pub use config::PlanningTables;
pub use errors::{AppError, AppResult, ErrorCode};
pub use planning::{compute_training_plan, PlanRequest, StoredCycles, TrainingPlan};
