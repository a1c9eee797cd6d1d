// ABOUTME: Workout-level domain types: intensity zones, zone-time maps, day plans and intervals
// ABOUTME: Shared by the synthesizer, the replanner and the status analyzer
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::errors::AppError;
use crate::models::race::Sport;
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The seven weekdays in plan order (Monday first)
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Training intensity zone (1 = active recovery .. 7 = neuromuscular power)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    /// Zone 1 - Active Recovery
    Z1,
    /// Zone 2 - Endurance
    Z2,
    /// Zone 3 - Tempo
    Z3,
    /// Zone 4 - Lactate Threshold
    Z4,
    /// Zone 5 - `VO2` Max
    Z5,
    /// Zone 6 - Anaerobic Capacity
    Z6,
    /// Zone 7 - Neuromuscular Power
    Z7,
}

impl Zone {
    /// All zones, lowest intensity first
    pub const ALL: [Self; 7] = [
        Self::Z1,
        Self::Z2,
        Self::Z3,
        Self::Z4,
        Self::Z5,
        Self::Z6,
        Self::Z7,
    ];

    /// Zero-based index into per-zone arrays
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Conventional one-based zone number
    #[must_use]
    pub const fn number(self) -> u8 {
        self as u8 + 1
    }

    /// Build a zone from its conventional one-based number
    #[must_use]
    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::Z1),
            2 => Some(Self::Z2),
            3 => Some(Self::Z3),
            4 => Some(Self::Z4),
            5 => Some(Self::Z5),
            6 => Some(Self::Z6),
            7 => Some(Self::Z7),
            _ => None,
        }
    }

    /// Human-readable zone name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Z1 => "Active Recovery",
            Self::Z2 => "Endurance",
            Self::Z3 => "Tempo",
            Self::Z4 => "Lactate Threshold",
            Self::Z5 => "VO2 Max",
            Self::Z6 => "Anaerobic Capacity",
            Self::Z7 => "Neuromuscular Power",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Z{}", self.number())
    }
}

/// Seconds spent (or planned) per intensity zone
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneTimes {
    seconds: [f64; 7],
}

impl ZoneTimes {
    /// Empty zone-time map
    #[must_use]
    pub const fn zero() -> Self {
        Self { seconds: [0.0; 7] }
    }

    /// Seconds in one zone
    #[must_use]
    pub const fn get(&self, zone: Zone) -> f64 {
        self.seconds[zone.index()]
    }

    /// Overwrite the seconds in one zone
    pub fn set(&mut self, zone: Zone, seconds: f64) {
        self.seconds[zone.index()] = seconds;
    }

    /// Add (or, when negative, remove) seconds in one zone
    pub fn add(&mut self, zone: Zone, seconds: f64) {
        self.seconds[zone.index()] += seconds;
    }

    /// Total seconds across all zones
    #[must_use]
    pub fn total_seconds(&self) -> f64 {
        self.seconds.iter().sum()
    }

    /// Iterate over `(zone, seconds)` pairs, lowest zone first
    pub fn iter(&self) -> impl Iterator<Item = (Zone, f64)> + '_ {
        Zone::ALL.iter().map(|zone| (*zone, self.get(*zone)))
    }

    /// Accumulate another zone-time map into this one
    pub fn accumulate(&mut self, other: &Self) {
        for (zone, seconds) in other.iter() {
            self.add(zone, seconds);
        }
    }
}

impl FromIterator<(Zone, f64)> for ZoneTimes {
    fn from_iter<I: IntoIterator<Item = (Zone, f64)>>(iter: I) -> Self {
        let mut times = Self::zero();
        for (zone, seconds) in iter {
            times.add(zone, seconds);
        }
        times
    }
}

/// Fraction of weekly training time allotted to each zone (sums to ~1)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneRepartition {
    fractions: [f64; 7],
}

impl ZoneRepartition {
    /// Build a repartition from per-zone fractions, lowest zone first
    #[must_use]
    pub const fn new(fractions: [f64; 7]) -> Self {
        Self { fractions }
    }

    /// Fraction of weekly time in one zone
    #[must_use]
    pub const fn fraction(&self, zone: Zone) -> f64 {
        self.fractions[zone.index()]
    }

    /// Sum of all fractions
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.fractions.iter().sum()
    }
}

/// Mandatory session kinds a phase/week must include
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyWorkout {
    /// The week's long endurance session
    Long,
    /// Sustained Z3/Z4 interval session
    LongIntensity,
    /// Short Z5-Z7 interval session
    ShortIntensity,
    /// Session at the projected race intensity zone
    RaceIntensity,
}

impl From<KeyWorkout> for WorkoutType {
    fn from(key: KeyWorkout) -> Self {
        match key {
            KeyWorkout::Long => Self::Long,
            KeyWorkout::LongIntensity => Self::LongIntensity,
            KeyWorkout::ShortIntensity => Self::ShortIntensity,
            KeyWorkout::RaceIntensity => Self::RaceIntensity,
        }
    }
}

/// Kind of a planned (or inferred) workout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutType {
    /// Long endurance session
    Long,
    /// Sustained Z3/Z4 intervals
    LongIntensity,
    /// Short Z5-Z7 intervals
    ShortIntensity,
    /// Race-zone intervals
    RaceIntensity,
    /// The race itself
    Competition,
    /// Pre-race shakeout
    Activation,
    /// Filler session absorbing leftover weekly load
    Remaining,
    /// Unstructured easy session
    Easy,
    /// Steady tempo session
    Tempo,
}

impl WorkoutType {
    /// The key-workout kind this type satisfies, if any
    #[must_use]
    pub const fn as_key_workout(self) -> Option<KeyWorkout> {
        match self {
            Self::Long => Some(KeyWorkout::Long),
            Self::LongIntensity => Some(KeyWorkout::LongIntensity),
            Self::ShortIntensity => Some(KeyWorkout::ShortIntensity),
            Self::RaceIntensity => Some(KeyWorkout::RaceIntensity),
            _ => None,
        }
    }

    /// Stable lowercase name for logging and serialization
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Long => "long",
            Self::LongIntensity => "long_intensity",
            Self::ShortIntensity => "short_intensity",
            Self::RaceIntensity => "race_intensity",
            Self::Competition => "competition",
            Self::Activation => "activation",
            Self::Remaining => "remaining",
            Self::Easy => "easy",
            Self::Tempo => "tempo",
        }
    }
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WorkoutType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "long" => Ok(Self::Long),
            "long_intensity" => Ok(Self::LongIntensity),
            "short_intensity" => Ok(Self::ShortIntensity),
            "race_intensity" => Ok(Self::RaceIntensity),
            "competition" => Ok(Self::Competition),
            "activation" => Ok(Self::Activation),
            "remaining" => Ok(Self::Remaining),
            "easy" => Ok(Self::Easy),
            "tempo" => Ok(Self::Tempo),
            other => Err(AppError::invalid_input(format!(
                "Unknown workout type: '{other}'"
            ))),
        }
    }
}

/// Role of a single interval step inside a workout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalKind {
    /// Opening easy segment
    WarmUp,
    /// Work segment at the prescribed zone
    Work,
    /// Z1 recovery between work segments
    Recovery,
    /// Closing easy segment
    CoolDown,
}

/// One step of a workout's suggested interval structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalStep {
    /// Step role
    pub kind: IntervalKind,
    /// Zone the step is performed in
    pub zone: Zone,
    /// Step duration in seconds
    pub duration_secs: f64,
    /// Training stress contributed by the step
    pub tss: f64,
}

/// A single planned workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    /// Workout kind
    pub workout_type: WorkoutType,
    /// Sport the workout is performed in
    pub sport: Sport,
    /// Planned training stress
    pub tss: f64,
    /// Planned seconds per zone
    pub seconds_in_zone: ZoneTimes,
    /// Estimated distance covered, in kilometers
    pub theoretical_distance_km: f64,
    /// Estimated total duration in seconds
    pub theoretical_time_secs: f64,
    /// Suggested interval structure, empty for unstructured sessions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub intervals: Vec<IntervalStep>,
}

impl Workout {
    /// Total planned duration derived from the zone-time map
    #[must_use]
    pub fn total_seconds(&self) -> f64 {
        self.seconds_in_zone.total_seconds()
    }
}

/// Ordered workouts for each day of one week, Monday first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    days: [Vec<Workout>; 7],
}

impl DayPlan {
    /// Empty week
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn idx(day: Weekday) -> usize {
        day.num_days_from_monday() as usize
    }

    /// Workouts planned on one day
    #[must_use]
    pub fn workouts_on(&self, day: Weekday) -> &[Workout] {
        &self.days[Self::idx(day)]
    }

    /// Mutable access to one day's workouts
    pub fn workouts_on_mut(&mut self, day: Weekday) -> &mut Vec<Workout> {
        &mut self.days[Self::idx(day)]
    }

    /// Append a workout to one day
    pub fn add(&mut self, day: Weekday, workout: Workout) {
        self.days[Self::idx(day)].push(workout);
    }

    /// Replace one day's workouts wholesale
    pub fn set_day(&mut self, day: Weekday, workouts: Vec<Workout>) {
        self.days[Self::idx(day)] = workouts;
    }

    /// Iterate `(weekday, workouts)` in Monday-first order
    pub fn iter(&self) -> impl Iterator<Item = (Weekday, &[Workout])> + '_ {
        WEEKDAYS
            .iter()
            .map(|day| (*day, self.workouts_on(*day)))
    }

    /// Total planned stress on one day
    #[must_use]
    pub fn day_tss(&self, day: Weekday) -> f64 {
        self.workouts_on(day).iter().map(|w| w.tss).sum()
    }

    /// Total planned stress across the week
    #[must_use]
    pub fn total_tss(&self) -> f64 {
        WEEKDAYS.iter().map(|day| self.day_tss(*day)).sum()
    }

    /// Sum of planned seconds per zone across the week
    #[must_use]
    pub fn total_seconds_in_zone(&self) -> ZoneTimes {
        let mut totals = ZoneTimes::zero();
        for (_, workouts) in self.iter() {
            for workout in workouts {
                totals.accumulate(&workout.seconds_in_zone);
            }
        }
        totals
    }

    /// True when no day holds any workout
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.iter().all(Vec::is_empty)
    }
}

/// A workout actually completed by the athlete, as reported by the
/// external activity-history provider. Read-only for the engine except for
/// the `inferred_type` annotation produced by the validity check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedWorkout {
    /// Day the workout was performed
    pub date: NaiveDate,
    /// Sport of the activity
    pub sport: Sport,
    /// Measured training stress
    pub tss: f64,
    /// Measured seconds per zone
    pub seconds_in_zone: ZoneTimes,
    /// Workout kind inferred when the activity matched a planned session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inferred_type: Option<WorkoutType>,
}
