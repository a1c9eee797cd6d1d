// ABOUTME: Typed planning lookup tables with fail-fast keyed access and validation
// ABOUTME: Covers TSS rates, recovery factors, interval durations, speeds, caps and repartitions
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::errors::{AppError, AppResult};
use crate::models::athlete::AthleteLevel;
use crate::models::cycle::CycleType;
use crate::models::race::{EventSize, Objective, Sport};
use crate::models::workout::{Zone, ZoneRepartition, ZoneTimes};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Key for per-level capacity tables (caps, typical sizes, percentages)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapKey {
    /// Main sport of the race
    pub sport: Sport,
    /// Race objective
    pub objective: Objective,
    /// Event size class
    pub size: EventSize,
    /// Athlete level
    pub level: AthleteLevel,
}

impl fmt::Display for CapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{:?}",
            self.sport, self.objective, self.size, self.level
        )
    }
}

/// Key for phase-window tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhaseKey {
    /// Race objective
    pub objective: Objective,
    /// Event size class
    pub size: EventSize,
    /// Phase kind
    pub cycle: CycleType,
}

/// Key for zone time-repartition tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepartitionKey {
    /// Athlete level
    pub level: AthleteLevel,
    /// Phase kind
    pub cycle: CycleType,
    /// Event size class
    pub size: EventSize,
}

/// All physiological lookup tables the engine plans against.
///
/// Built with sensible defaults via [`Default`]; callers may replace any
/// table before planning. [`PlanningTables::validate`] should run once on
/// any externally supplied table set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningTables {
    /// TSS accumulated per hour in each zone, per sport
    pub tss_rate_per_hour: HashMap<Sport, [f64; 7]>,
    /// Z1 recovery seconds owed per second of work in each zone
    pub recovery_factor: HashMap<Sport, [f64; 7]>,
    /// Typical duration of one interval repetition in each zone, seconds
    pub typical_interval_secs: HashMap<Sport, [f64; 7]>,
    /// Sustainable speed per zone, km/h, per sport and level
    pub zone_speed_kmh: HashMap<(Sport, AthleteLevel), [f64; 7]>,
    /// Final long-workout TSS as a fraction of event TSS
    pub long_workout_pct: HashMap<CapKey, f64>,
    /// Final race-intensity TSS as a fraction of event TSS
    pub race_intensity_pct: HashMap<CapKey, f64>,
    /// Hard cap on a single workout's TSS
    pub max_workout_tss: HashMap<CapKey, f64>,
    /// Typical size of a regular workout, TSS
    pub typical_workout_tss: HashMap<CapKey, f64>,
    /// Hard cap on one day's total TSS
    pub max_daily_tss: HashMap<CapKey, f64>,
    /// Maximum length of each phase in days before the race
    pub phase_window_days: HashMap<PhaseKey, i64>,
    /// Multiplier applied to event TSS for the competition week's load
    pub compet_tss_multiplier: HashMap<(Sport, Objective, EventSize), f64>,
    /// Weekly zone time repartition per level, phase and event size
    pub zone_repartition: HashMap<RepartitionKey, ZoneRepartition>,
}

impl PlanningTables {
    fn zone_entry(
        map: &HashMap<Sport, [f64; 7]>,
        table: &str,
        sport: Sport,
        zone: Zone,
    ) -> AppResult<f64> {
        map.get(&sport)
            .map(|row| row[zone.index()])
            .ok_or_else(|| AppError::config_missing(format!("no {table} entry for sport {sport}")))
    }

    /// TSS accumulated per hour at `zone` for `sport`
    pub fn tss_rate(&self, sport: Sport, zone: Zone) -> AppResult<f64> {
        Self::zone_entry(&self.tss_rate_per_hour, "TSS rate", sport, zone)
    }

    /// TSS earned by spending `seconds` at `zone`
    pub fn tss_for_seconds(&self, sport: Sport, zone: Zone, seconds: f64) -> AppResult<f64> {
        Ok(self.tss_rate(sport, zone)? * seconds / 3600.0)
    }

    /// Seconds at `zone` needed to accumulate `tss`
    pub fn seconds_for_tss(&self, sport: Sport, zone: Zone, tss: f64) -> AppResult<f64> {
        let rate = self.tss_rate(sport, zone)?;
        if rate <= 0.0 {
            return Err(AppError::config_invalid(format!(
                "TSS rate for {sport} {zone} must be positive"
            )));
        }
        Ok(tss * 3600.0 / rate)
    }

    /// Total TSS represented by a zone-time map
    pub fn tss_for_times(&self, sport: Sport, times: &ZoneTimes) -> AppResult<f64> {
        let mut total = 0.0;
        for (zone, seconds) in times.iter() {
            total += self.tss_for_seconds(sport, zone, seconds)?;
        }
        Ok(total)
    }

    /// Z1 recovery seconds owed per second of work at `zone`
    pub fn recovery_factor(&self, sport: Sport, zone: Zone) -> AppResult<f64> {
        Self::zone_entry(&self.recovery_factor, "recovery factor", sport, zone)
    }

    /// Typical duration of one interval repetition at `zone`
    pub fn typical_interval(&self, sport: Sport, zone: Zone) -> AppResult<f64> {
        Self::zone_entry(
            &self.typical_interval_secs,
            "typical interval duration",
            sport,
            zone,
        )
    }

    /// Sustainable speed at `zone` for `sport` and `level`, km/h
    pub fn zone_speed_kmh(
        &self,
        sport: Sport,
        level: AthleteLevel,
        zone: Zone,
    ) -> AppResult<f64> {
        self.zone_speed_kmh
            .get(&(sport, level))
            .map(|row| row[zone.index()])
            .ok_or_else(|| {
                AppError::config_missing(format!(
                    "no zone speed entry for sport {sport} level {level:?}"
                ))
            })
    }

    /// Estimated distance covered by a zone-time map, km
    pub fn distance_for_times(
        &self,
        sport: Sport,
        level: AthleteLevel,
        times: &ZoneTimes,
    ) -> AppResult<f64> {
        let mut distance = 0.0;
        for (zone, seconds) in times.iter() {
            distance += seconds / 3600.0 * self.zone_speed_kmh(sport, level, zone)?;
        }
        Ok(distance)
    }

    fn cap_entry(map: &HashMap<CapKey, f64>, table: &str, key: CapKey) -> AppResult<f64> {
        map.get(&key)
            .copied()
            .ok_or_else(|| AppError::config_missing(format!("no {table} entry for {key}")))
    }

    /// Final long-workout TSS as a fraction of event TSS
    pub fn long_workout_pct(&self, key: CapKey) -> AppResult<f64> {
        Self::cap_entry(&self.long_workout_pct, "long workout percentage", key)
    }

    /// Final race-intensity TSS as a fraction of event TSS
    pub fn race_intensity_pct(&self, key: CapKey) -> AppResult<f64> {
        Self::cap_entry(
            &self.race_intensity_pct,
            "race intensity percentage",
            key,
        )
    }

    /// Hard cap on a single workout's TSS
    pub fn max_workout_tss(&self, key: CapKey) -> AppResult<f64> {
        Self::cap_entry(&self.max_workout_tss, "max workout TSS", key)
    }

    /// Typical size of a regular workout, TSS
    pub fn typical_workout_tss(&self, key: CapKey) -> AppResult<f64> {
        Self::cap_entry(&self.typical_workout_tss, "typical workout TSS", key)
    }

    /// Hard cap on one day's total TSS
    pub fn max_daily_tss(&self, key: CapKey) -> AppResult<f64> {
        Self::cap_entry(&self.max_daily_tss, "max daily TSS", key)
    }

    /// Maximum length of `cycle` in days before the race
    pub fn phase_window_days(
        &self,
        objective: Objective,
        size: EventSize,
        cycle: CycleType,
    ) -> AppResult<i64> {
        let key = PhaseKey {
            objective,
            size,
            cycle,
        };
        self.phase_window_days.get(&key).copied().ok_or_else(|| {
            AppError::config_missing(format!(
                "no phase window entry for {objective}/{size}/{cycle}"
            ))
        })
    }

    /// Multiplier applied to event TSS for the competition week's load
    pub fn compet_tss_multiplier(
        &self,
        sport: Sport,
        objective: Objective,
        size: EventSize,
    ) -> AppResult<f64> {
        self.compet_tss_multiplier
            .get(&(sport, objective, size))
            .copied()
            .ok_or_else(|| {
                AppError::config_missing(format!(
                    "no competition multiplier entry for {sport}/{objective}/{size}"
                ))
            })
    }

    /// Weekly zone time repartition for `level`, `cycle` and `size`
    pub fn zone_repartition(
        &self,
        level: AthleteLevel,
        cycle: CycleType,
        size: EventSize,
    ) -> AppResult<ZoneRepartition> {
        let key = RepartitionKey { level, cycle, size };
        self.zone_repartition.get(&key).copied().ok_or_else(|| {
            AppError::config_missing(format!(
                "no zone repartition entry for {level:?}/{cycle}/{size}"
            ))
        })
    }

    /// Total planned seconds for a week of `weekly_tss` under `repartition`:
    /// `tss * 3600 / sum(rate_z * fraction_z)`.
    ///
    /// # Errors
    /// Returns a configuration error when the TSS-weighted repartition sum is
    /// zero, which would otherwise divide by zero.
    pub fn weekly_seconds(
        &self,
        sport: Sport,
        repartition: &ZoneRepartition,
        weekly_tss: f64,
    ) -> AppResult<f64> {
        let mut weighted = 0.0;
        for zone in Zone::ALL {
            weighted += self.tss_rate(sport, zone)? * repartition.fraction(zone);
        }
        if weighted <= 0.0 {
            return Err(AppError::config_invalid(
                "zone repartition has a zero TSS-weighted sum",
            ));
        }
        Ok(weekly_tss * 3600.0 / weighted)
    }

    /// Planned seconds per zone for a week of `weekly_tss` under `repartition`
    pub fn weekly_time_in_zone(
        &self,
        sport: Sport,
        repartition: &ZoneRepartition,
        weekly_tss: f64,
    ) -> AppResult<ZoneTimes> {
        let total = self.weekly_seconds(sport, repartition, weekly_tss)?;
        Ok(Zone::ALL
            .iter()
            .map(|zone| (*zone, repartition.fraction(*zone) * total))
            .collect())
    }

    /// Validate an externally supplied table set: positive TSS rates and
    /// well-formed zone repartitions (fractions summing to ~1 with a
    /// non-zero TSS-weighted sum).
    ///
    /// # Errors
    /// Returns a configuration error naming the first offending entry.
    pub fn validate(&self) -> AppResult<()> {
        for (sport, rates) in &self.tss_rate_per_hour {
            if rates.iter().any(|rate| *rate <= 0.0) {
                return Err(AppError::config_invalid(format!(
                    "TSS rates for {sport} must all be positive"
                )));
            }
        }
        for (key, repartition) in &self.zone_repartition {
            let sum = repartition.sum();
            if (sum - 1.0).abs() > 0.01 {
                return Err(AppError::config_invalid(format!(
                    "zone repartition for {:?}/{}/{} sums to {sum:.3}, expected 1.0",
                    key.level, key.cycle, key.size
                )));
            }
            let mut weighted = 0.0;
            for zone in Zone::ALL {
                let rates = self.tss_rate_per_hour.get(&Sport::Run);
                if let Some(rates) = rates {
                    weighted += rates[zone.index()] * repartition.fraction(zone);
                }
            }
            if weighted <= 0.0 {
                return Err(AppError::config_invalid(format!(
                    "zone repartition for {:?}/{}/{} has a zero TSS-weighted sum",
                    key.level, key.cycle, key.size
                )));
            }
        }
        Ok(())
    }
}
