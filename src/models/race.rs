// ABOUTME: Race description and derived event metrics (size class, race zone, event TSS)
// ABOUTME: One RaceSpec per competition drives one full planning pass of the engine
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::config::PlanningTables;
use crate::errors::{AppError, AppResult};
use crate::models::workout::Zone;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported training sports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sport {
    /// Running
    Run,
    /// Cycling
    Bike,
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Run => f.write_str("Run"),
            Self::Bike => f.write_str("Bike"),
        }
    }
}

impl FromStr for Sport {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "run" => Ok(Self::Run),
            "bike" => Ok(Self::Bike),
            other => Err(AppError::invalid_input(format!("Unknown sport: '{other}'"))),
        }
    }
}

/// What the athlete wants out of the race
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// Complete the distance comfortably
    Finish,
    /// Race it for a time
    Perf,
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finish => f.write_str("Finish"),
            Self::Perf => f.write_str("Perf"),
        }
    }
}

/// Event size class, sport- and distance-dependent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSize {
    /// Short event (e.g. 10k run, short bike race)
    S,
    /// Medium event (e.g. half marathon)
    M,
    /// Long event (e.g. marathon)
    L,
    /// Ultra-distance event
    XL,
}

impl fmt::Display for EventSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::S => f.write_str("S"),
            Self::M => f.write_str("M"),
            Self::L => f.write_str("L"),
            Self::XL => f.write_str("XL"),
        }
    }
}

/// One competition the athlete is preparing for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceSpec {
    /// Race day
    pub date: NaiveDate,
    /// Race sport
    pub sport: Sport,
    /// Finish or performance objective
    pub objective: Objective,
    /// Race distance in kilometers
    pub distance_km: f64,
    /// Target finish time, hours component
    pub target_hours: u32,
    /// Target finish time, minutes component
    pub target_minutes: u32,
    /// Weekly training budget at the start of the build, in hours
    pub weekly_start_hours: f64,
    /// Weekly training budget at peak, in hours
    pub weekly_end_hours: f64,
    /// Share of weekly load delegated to a secondary sport (0.0-0.5)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_share: Option<f64>,
}

impl RaceSpec {
    /// Target finish time in minutes
    #[must_use]
    pub fn target_time_minutes(&self) -> f64 {
        f64::from(self.target_hours) * 60.0 + f64::from(self.target_minutes)
    }

    /// Size class of the event, from sport-specific distance thresholds
    #[must_use]
    pub fn event_size(&self) -> EventSize {
        match self.sport {
            Sport::Run => {
                if self.distance_km <= 12.0 {
                    EventSize::S
                } else if self.distance_km <= 23.0 {
                    EventSize::M
                } else if self.distance_km <= 45.0 {
                    EventSize::L
                } else {
                    EventSize::XL
                }
            }
            Sport::Bike => {
                if self.distance_km <= 40.0 {
                    EventSize::S
                } else if self.distance_km <= 80.0 {
                    EventSize::M
                } else if self.distance_km <= 130.0 {
                    EventSize::L
                } else {
                    EventSize::XL
                }
            }
        }
    }

    /// Intensity zone the race will be run at, from objective and size
    #[must_use]
    pub fn race_zone(&self) -> Zone {
        match self.objective {
            Objective::Finish => Zone::Z2,
            Objective::Perf => match self.event_size() {
                EventSize::S => Zone::Z5,
                EventSize::M => Zone::Z4,
                EventSize::L => Zone::Z3,
                EventSize::XL => Zone::Z2,
            },
        }
    }

    /// Expected training stress of the race itself: the race-zone TSS rate
    /// applied over the target duration.
    ///
    /// # Errors
    /// Returns a configuration error when the sport has no TSS-rate table.
    pub fn event_tss(&self, tables: &PlanningTables) -> AppResult<f64> {
        let rate = tables.tss_rate(self.sport, self.race_zone())?;
        Ok(rate * self.target_time_minutes() / 60.0)
    }

    /// Fraction of the weekly load assigned to the race's main sport
    #[must_use]
    pub fn main_sport_share(&self) -> f64 {
        1.0 - self.secondary_share.unwrap_or(0.0)
    }

    /// Reject structurally invalid race parameters.
    ///
    /// A negative distance is not reported here: the caller skips such races
    /// with a warning instead (explicit skip-and-log policy).
    ///
    /// # Errors
    /// Returns a consistency error for a non-positive target time or a
    /// secondary-sport share above one half.
    pub fn validate(&self) -> AppResult<()> {
        if self.target_time_minutes() <= 0.0 {
            return Err(AppError::consistency(format!(
                "race on {} has a non-positive target time",
                self.date
            )));
        }
        if let Some(share) = self.secondary_share {
            if !(0.0..=0.5).contains(&share) {
                return Err(AppError::consistency(format!(
                    "secondary sport share {share} must be within 0.0-0.5"
                )));
            }
        }
        Ok(())
    }
}
