// ABOUTME: Macrocycle and microcycle records with immutable update semantics
// ABOUTME: Every mutating update goes through with_updates and records an audit snapshot
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Training Cycles
//!
//! A macrocycle is a multi-week phase; a microcycle is one training week.
//! Both are value types: the engine never mutates a stored record in place.
//! `with_updates` applies a change set and, when anything actually changed,
//! pushes the prior state onto the record's audit trail.

use crate::models::workout::{DayPlan, KeyWorkout, ZoneRepartition, ZoneTimes};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Training phase kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleType {
    /// Off-season / between-race transition
    Transition,
    /// Aerobic base building
    Fondamental,
    /// Race-specific preparation
    Specific,
    /// Pre-competition taper
    PreCompet,
    /// Competition week
    Compet,
}

impl fmt::Display for CycleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transition => f.write_str("Transition"),
            Self::Fondamental => f.write_str("Fondamental"),
            Self::Specific => f.write_str("Specific"),
            Self::PreCompet => f.write_str("Pre-Compet"),
            Self::Compet => f.write_str("Compet"),
        }
    }
}

/// Per-key-workout theoretical TSS targets for one week.
///
/// A target is only present when the corresponding key workout belongs to
/// the week's plan, which keeps "maybe present" statically visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyWorkoutTargets {
    /// Target stress of the long workout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<f64>,
    /// Target stress of the long-intensity workout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_intensity: Option<f64>,
    /// Target stress of the short-intensity workout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_intensity: Option<f64>,
    /// Target stress of the race-intensity workout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub race_intensity: Option<f64>,
}

impl KeyWorkoutTargets {
    /// Target for one key-workout kind
    #[must_use]
    pub const fn get(&self, key: KeyWorkout) -> Option<f64> {
        match key {
            KeyWorkout::Long => self.long,
            KeyWorkout::LongIntensity => self.long_intensity,
            KeyWorkout::ShortIntensity => self.short_intensity,
            KeyWorkout::RaceIntensity => self.race_intensity,
        }
    }

    /// Set the target for one key-workout kind
    pub fn set(&mut self, key: KeyWorkout, target: f64) {
        match key {
            KeyWorkout::Long => self.long = Some(target),
            KeyWorkout::LongIntensity => self.long_intensity = Some(target),
            KeyWorkout::ShortIntensity => self.short_intensity = Some(target),
            KeyWorkout::RaceIntensity => self.race_intensity = Some(target),
        }
    }
}

/// Guidance the analyzer/replanner leaves for the following week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextWeekGuideline {
    /// Proceed as planned
    Normal,
    /// Back off: the athlete overshot a resting week
    Rest,
}

/// Done flag and best observed stress for one key-workout kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyWorkoutActuals {
    /// Whether the key workout was satisfied this week
    pub done: bool,
    /// Best observed stress toward the target
    pub actual_tss: f64,
}

/// Realized metrics of an elapsed microcycle, produced once by the analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicrocycleOutcome {
    /// Total stress actually accumulated
    pub actual_tss: f64,
    /// Seconds actually spent per zone
    pub actual_seconds_in_zone: ZoneTimes,
    /// Seconds the plan called for per zone
    pub theoretical_time_in_zone: ZoneTimes,
    /// Actual minus theoretical seconds per zone
    pub delta_time_in_zone: ZoneTimes,
    /// Whether the week turned out to be a resting week
    pub actual_resting: bool,
    /// Long workout outcome
    pub long_workout: KeyWorkoutActuals,
    /// Race-intensity outcome
    pub race_intensity: KeyWorkoutActuals,
    /// Long-intensity outcome
    pub long_intensity: KeyWorkoutActuals,
    /// Short-intensity outcome
    pub short_intensity: KeyWorkoutActuals,
}

/// Audit snapshot of a microcycle's mutable planning fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicrocycleSnapshot {
    /// Prior start date
    pub start_date: NaiveDate,
    /// Prior end date
    pub end_date: NaiveDate,
    /// Prior phase kind
    pub cycle_type: CycleType,
    /// Prior cycle number
    pub cycle_number: u32,
    /// Prior index within the rest cycle
    pub index_in_cycle: u32,
    /// Prior weekly target
    pub theoretical_weekly_tss: f64,
    /// Prior resting flag
    pub theoretical_resting: bool,
    /// Prior key workout list
    pub key_workouts: Vec<KeyWorkout>,
    /// Prior key workout targets
    pub targets: KeyWorkoutTargets,
    /// Prior analyzed flag
    pub analyzed: bool,
    /// When the superseding update happened
    pub update_date: DateTime<Utc>,
}

/// Change set applied to a microcycle through [`Microcycle::with_updates`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MicrocycleUpdate {
    /// New start date
    pub start_date: Option<NaiveDate>,
    /// New end date
    pub end_date: Option<NaiveDate>,
    /// New phase kind
    pub cycle_type: Option<CycleType>,
    /// New cycle number
    pub cycle_number: Option<u32>,
    /// New index within the rest cycle
    pub index_in_cycle: Option<u32>,
    /// New weekly target
    pub theoretical_weekly_tss: Option<f64>,
    /// New resting flag
    pub theoretical_resting: Option<bool>,
    /// New key workout list
    pub key_workouts: Option<Vec<KeyWorkout>>,
    /// New key workout targets
    pub targets: Option<KeyWorkoutTargets>,
}

/// One training week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Microcycle {
    /// Stable identity, preserved across replanning merges
    pub id: Uuid,
    /// Phase this week belongs to
    pub cycle_type: CycleType,
    /// First day of the week (may be mid-week at boundaries)
    pub start_date: NaiveDate,
    /// Last day of the week
    pub end_date: NaiveDate,
    /// Which rest cycle the week belongs to
    pub cycle_number: u32,
    /// Position of the week inside its rest cycle
    pub index_in_cycle: u32,
    /// Planned weekly training stress
    pub theoretical_weekly_tss: f64,
    /// Whether the week is planned as a resting week
    pub theoretical_resting: bool,
    /// Key workouts the week must include
    pub key_workouts: Vec<KeyWorkout>,
    /// Per-key-workout stress targets
    pub targets: KeyWorkoutTargets,
    /// Zone time repartition used when the week was synthesized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_repartition: Option<ZoneRepartition>,
    /// Concrete day-by-day plan
    pub day_by_day: DayPlan,
    /// Whether the elapsed week has been analyzed (analysis runs once)
    pub analyzed: bool,
    /// Realized metrics once the week is in the past
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<MicrocycleOutcome>,
    /// Key workouts found missing by analysis or replanning
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_key_workouts: Vec<KeyWorkout>,
    /// Whether the in-progress week still tracks its plan
    pub on_track: bool,
    /// Guidance for the following week
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_week_guidelines: Option<NextWeekGuideline>,
    /// Audit trail of superseded states
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub previous_versions: Vec<MicrocycleSnapshot>,
}

impl Microcycle {
    /// Create a fresh microcycle with a new identity
    #[must_use]
    pub fn new(
        cycle_type: CycleType,
        start_date: NaiveDate,
        end_date: NaiveDate,
        theoretical_weekly_tss: f64,
        theoretical_resting: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            cycle_type,
            start_date,
            end_date,
            cycle_number: 1,
            index_in_cycle: 0,
            theoretical_weekly_tss,
            theoretical_resting,
            key_workouts: Vec::new(),
            targets: KeyWorkoutTargets::default(),
            zone_repartition: None,
            day_by_day: DayPlan::new(),
            analyzed: false,
            outcome: None,
            missing_key_workouts: Vec::new(),
            on_track: true,
            next_week_guidelines: None,
            previous_versions: Vec::new(),
        }
    }

    /// Number of calendar days the week covers
    #[must_use]
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Whether `date` falls inside the week
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Weekday position of the week's last day, Monday = 0
    #[must_use]
    pub fn end_weekday_index(&self) -> u32 {
        self.end_date.weekday().num_days_from_monday()
    }

    fn snapshot(&self, now: DateTime<Utc>) -> MicrocycleSnapshot {
        MicrocycleSnapshot {
            start_date: self.start_date,
            end_date: self.end_date,
            cycle_type: self.cycle_type,
            cycle_number: self.cycle_number,
            index_in_cycle: self.index_in_cycle,
            theoretical_weekly_tss: self.theoretical_weekly_tss,
            theoretical_resting: self.theoretical_resting,
            key_workouts: self.key_workouts.clone(),
            targets: self.targets,
            analyzed: self.analyzed,
            update_date: now,
        }
    }

    /// Apply a change set, returning the updated record and whether anything
    /// changed. When it did, the prior state is appended to the audit trail.
    /// Identity, day-by-day plan, outcome and existing history carry over.
    #[must_use]
    pub fn with_updates(&self, changes: &MicrocycleUpdate, now: DateTime<Utc>) -> (Self, bool) {
        let mut updated = self.clone();
        if let Some(value) = changes.start_date {
            updated.start_date = value;
        }
        if let Some(value) = changes.end_date {
            updated.end_date = value;
        }
        if let Some(value) = changes.cycle_type {
            updated.cycle_type = value;
        }
        if let Some(value) = changes.cycle_number {
            updated.cycle_number = value;
        }
        if let Some(value) = changes.index_in_cycle {
            updated.index_in_cycle = value;
        }
        if let Some(value) = changes.theoretical_weekly_tss {
            updated.theoretical_weekly_tss = value;
        }
        if let Some(value) = changes.theoretical_resting {
            updated.theoretical_resting = value;
        }
        if let Some(value) = &changes.key_workouts {
            updated.key_workouts.clone_from(value);
        }
        if let Some(value) = changes.targets {
            updated.targets = value;
        }

        let changed = updated.start_date != self.start_date
            || updated.end_date != self.end_date
            || updated.cycle_type != self.cycle_type
            || updated.cycle_number != self.cycle_number
            || updated.index_in_cycle != self.index_in_cycle
            || (updated.theoretical_weekly_tss - self.theoretical_weekly_tss).abs() > f64::EPSILON
            || updated.theoretical_resting != self.theoretical_resting
            || updated.key_workouts != self.key_workouts
            || updated.targets != self.targets;

        if changed {
            updated.previous_versions.push(self.snapshot(now));
        }
        (updated, changed)
    }
}

/// Audit snapshot of a macrocycle's mutable planning fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacrocycleSnapshot {
    /// Prior start date
    pub start_date: NaiveDate,
    /// Prior end date
    pub end_date: NaiveDate,
    /// Prior phase kind
    pub cycle_type: CycleType,
    /// Prior phase total stress
    pub total_tss: f64,
    /// Prior resting flag
    pub theoretical_resting: bool,
    /// Prior analyzed flag
    pub analyzed: bool,
    /// When the superseding update happened
    pub update_date: DateTime<Utc>,
}

/// Change set applied to a macrocycle through [`Macrocycle::with_updates`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MacrocycleUpdate {
    /// New start date
    pub start_date: Option<NaiveDate>,
    /// New end date
    pub end_date: Option<NaiveDate>,
    /// New phase kind
    pub cycle_type: Option<CycleType>,
    /// New phase total stress
    pub total_tss: Option<f64>,
    /// New resting flag
    pub theoretical_resting: Option<bool>,
}

/// One multi-week training phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Macrocycle {
    /// Stable identity, preserved across replanning merges
    pub id: Uuid,
    /// Phase kind
    pub cycle_type: CycleType,
    /// First day of the phase
    pub start_date: NaiveDate,
    /// Last day of the phase
    pub end_date: NaiveDate,
    /// Planned total stress across the phase
    pub total_tss: f64,
    /// Whether the whole phase is a recovery block (taper)
    pub theoretical_resting: bool,
    /// Whether the elapsed phase has been analyzed
    pub analyzed: bool,
    /// Realized total stress once the phase is in the past
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_total_tss: Option<f64>,
    /// Audit trail of superseded states
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub previous_versions: Vec<MacrocycleSnapshot>,
}

impl Macrocycle {
    /// Create a fresh macrocycle with a new identity
    #[must_use]
    pub fn new(
        cycle_type: CycleType,
        start_date: NaiveDate,
        end_date: NaiveDate,
        total_tss: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            cycle_type,
            start_date,
            end_date,
            total_tss,
            theoretical_resting: false,
            analyzed: false,
            actual_total_tss: None,
            previous_versions: Vec::new(),
        }
    }

    /// Whether `date` falls inside the phase
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    fn snapshot(&self, now: DateTime<Utc>) -> MacrocycleSnapshot {
        MacrocycleSnapshot {
            start_date: self.start_date,
            end_date: self.end_date,
            cycle_type: self.cycle_type,
            total_tss: self.total_tss,
            theoretical_resting: self.theoretical_resting,
            analyzed: self.analyzed,
            update_date: now,
        }
    }

    /// Apply a change set, returning the updated record and whether anything
    /// changed. See [`Microcycle::with_updates`].
    #[must_use]
    pub fn with_updates(&self, changes: &MacrocycleUpdate, now: DateTime<Utc>) -> (Self, bool) {
        let mut updated = self.clone();
        if let Some(value) = changes.start_date {
            updated.start_date = value;
        }
        if let Some(value) = changes.end_date {
            updated.end_date = value;
        }
        if let Some(value) = changes.cycle_type {
            updated.cycle_type = value;
        }
        if let Some(value) = changes.total_tss {
            updated.total_tss = value;
        }
        if let Some(value) = changes.theoretical_resting {
            updated.theoretical_resting = value;
        }

        let changed = updated.start_date != self.start_date
            || updated.end_date != self.end_date
            || updated.cycle_type != self.cycle_type
            || (updated.total_tss - self.total_tss).abs() > f64::EPSILON
            || updated.theoretical_resting != self.theoretical_resting;

        if changed {
            updated.previous_versions.push(self.snapshot(now));
        }
        (updated, changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn week() -> Microcycle {
        Microcycle::new(
            CycleType::Fondamental,
            NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 12).unwrap(),
            300.0,
            false,
        )
    }

    #[test]
    fn test_with_updates_records_snapshot_on_change() {
        let original = week();
        let changes = MicrocycleUpdate {
            theoretical_weekly_tss: Some(320.0),
            ..MicrocycleUpdate::default()
        };
        let (updated, changed) = original.with_updates(&changes, Utc::now());
        assert!(changed);
        assert_eq!(updated.previous_versions.len(), 1);
        assert!((updated.previous_versions[0].theoretical_weekly_tss - 300.0).abs() < f64::EPSILON);
        assert_eq!(updated.id, original.id);
    }

    #[test]
    fn test_with_updates_no_snapshot_when_identical() {
        let original = week();
        let changes = MicrocycleUpdate {
            theoretical_weekly_tss: Some(300.0),
            theoretical_resting: Some(false),
            ..MicrocycleUpdate::default()
        };
        let (updated, changed) = original.with_updates(&changes, Utc::now());
        assert!(!changed);
        assert!(updated.previous_versions.is_empty());
    }

    #[test]
    fn test_macrocycle_contains() {
        let phase = Macrocycle::new(
            CycleType::Compet,
            NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            NaiveDate::from_ymd_opt(2025, 4, 6).unwrap(),
            250.0,
        );
        assert!(phase.contains(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()));
        assert!(!phase.contains(NaiveDate::from_ymd_opt(2025, 4, 7).unwrap()));
    }
}
