// ABOUTME: Athlete profile and weekly availability inputs consumed by the planner
// ABOUTME: Maps declared preferences onto load-ramp rates, cycle lengths and handable load
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::models::workout::WEEKDAYS;
use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Athlete experience level, the key into most capacity tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AthleteLevel {
    /// First seasons of structured training
    Beginner,
    /// Several seasons of consistent training
    Intermediate,
    /// Long training history, high tolerance to load
    Confirmed,
}

/// How much recovery the athlete needs between loading blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecuperationNeed {
    /// Recovers fast: four-week cycles (three working weeks + one rest)
    Low,
    /// Needs more recovery: three-week cycles
    High,
}

impl RecuperationNeed {
    /// Length of one rest cycle in weeks, including the resting week
    #[must_use]
    pub const fn cycle_length(self) -> u32 {
        match self {
            Self::Low => 4,
            Self::High => 3,
        }
    }
}

/// Declared appetite for week-over-week load increases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadRampPreference {
    /// 5% weekly increase
    Low,
    /// 7% weekly increase
    Medium,
    /// 10% weekly increase
    High,
}

impl LoadRampPreference {
    /// Weekly TSS increase rate
    #[must_use]
    pub const fn weekly_rate(self) -> f64 {
        match self {
            Self::Low => 0.05,
            Self::Medium => 0.07,
            Self::High => 0.10,
        }
    }
}

/// The athlete's declared state and preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteProfile {
    /// Experience level
    pub level: AthleteLevel,
    /// Recovery need, drives the rest-cycle length
    pub recuperation: RecuperationNeed,
    /// Current weekly training volume in hours
    pub weekly_hours: f64,
    /// Intensity sessions currently performed per week
    pub intensity_sessions: u32,
    /// Duration of the longest recent workout, in hours
    pub longest_workout_hours: f64,
    /// Weeks until the athlete wants the next resting week, when declared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_resting_week: Option<u32>,
    /// Appetite for weekly load increases
    pub ramp: LoadRampPreference,
}

impl AthleteProfile {
    /// Weekly TSS the athlete can currently absorb, from declared hours and
    /// the share of intensity work: one intensity session raises the hourly
    /// stress rate by 5 TSS/h, from a 60 TSS/h easy baseline up to 90.
    #[must_use]
    pub fn declared_handable_load(&self) -> f64 {
        let rate = 60.0 + 5.0 * f64::from(self.intensity_sessions.min(6));
        self.weekly_hours * rate
    }

    /// Estimated TSS of the longest recent workout (65 TSS/h mixed pace)
    #[must_use]
    pub fn longest_workout_tss(&self) -> f64 {
        self.longest_workout_hours * 65.0
    }
}

/// Available training duration per weekday, in seconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DayDurations {
    seconds: [f64; 7],
}

impl DayDurations {
    /// No availability at all
    #[must_use]
    pub const fn zero() -> Self {
        Self { seconds: [0.0; 7] }
    }

    /// Build from per-day available hours, Monday first
    #[must_use]
    pub fn from_hours(hours: [f64; 7]) -> Self {
        let mut seconds = [0.0; 7];
        for (slot, value) in seconds.iter_mut().zip(hours) {
            *slot = value * 3600.0;
        }
        Self { seconds }
    }

    /// Remaining seconds available on one day
    #[must_use]
    pub fn get(&self, day: Weekday) -> f64 {
        self.seconds[day.num_days_from_monday() as usize]
    }

    /// Overwrite one day's availability
    pub fn set(&mut self, day: Weekday, seconds: f64) {
        self.seconds[day.num_days_from_monday() as usize] = seconds;
    }

    /// Consume seconds from one day (may go negative on overflow days)
    pub fn consume(&mut self, day: Weekday, seconds: f64) {
        self.seconds[day.num_days_from_monday() as usize] -= seconds;
    }

    /// The day with the most remaining availability
    #[must_use]
    pub fn longest_day(&self) -> (Weekday, f64) {
        let mut best = (Weekday::Mon, self.get(Weekday::Mon));
        for day in WEEKDAYS {
            let available = self.get(day);
            if available > best.1 {
                best = (day, available);
            }
        }
        best
    }
}

/// How the athlete organizes a training week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekOrganization {
    /// Day reserved for the long workout
    pub long_workout_day: Weekday,
    /// Days the athlete can train on
    pub available_days: Vec<Weekday>,
    /// Available duration per day
    pub day_durations: DayDurations,
}
