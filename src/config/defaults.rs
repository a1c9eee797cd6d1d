// ABOUTME: Built-in default data for every planning lookup table
// ABOUTME: Values follow established TSS-per-zone heuristics and per-level capacity ladders
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use super::tables::{CapKey, PhaseKey, PlanningTables, RepartitionKey};
use crate::models::athlete::AthleteLevel;
use crate::models::cycle::CycleType;
use crate::models::race::{EventSize, Objective, Sport};
use crate::models::workout::ZoneRepartition;
use std::collections::HashMap;

const SPORTS: [Sport; 2] = [Sport::Run, Sport::Bike];
const LEVELS: [AthleteLevel; 3] = [
    AthleteLevel::Beginner,
    AthleteLevel::Intermediate,
    AthleteLevel::Confirmed,
];
const SIZES: [EventSize; 4] = [EventSize::S, EventSize::M, EventSize::L, EventSize::XL];
const OBJECTIVES: [Objective; 2] = [Objective::Finish, Objective::Perf];

/// TSS accumulated per hour, zones 1-7
const TSS_RATE: [f64; 7] = [50.0, 60.0, 80.0, 100.0, 150.0, 250.0, 500.0];

/// Z1 recovery seconds owed per second of work, zones 1-7
const RECOVERY_FACTOR: [f64; 7] = [0.0, 0.2, 0.5, 0.75, 1.0, 2.0, 20.0];

/// Typical duration of one interval repetition, zones 1-7, seconds
const TYPICAL_INTERVAL: [f64; 7] = [600.0, 1200.0, 900.0, 600.0, 180.0, 60.0, 20.0];

/// Per-level sustainable speed ladders, km/h
const RUN_SPEEDS: [(AthleteLevel, [f64; 7]); 3] = [
    (AthleteLevel::Beginner, [8.0, 9.0, 11.0, 12.0, 13.0, 14.0, 20.0]),
    (AthleteLevel::Intermediate, [9.0, 10.0, 12.0, 14.0, 16.0, 18.0, 24.0]),
    (AthleteLevel::Confirmed, [10.0, 11.0, 13.0, 15.0, 17.0, 19.0, 26.0]),
];
const BIKE_SPEEDS: [(AthleteLevel, [f64; 7]); 3] = [
    (AthleteLevel::Beginner, [18.0, 22.0, 26.0, 29.0, 33.0, 38.0, 45.0]),
    (AthleteLevel::Intermediate, [22.0, 26.0, 30.0, 34.0, 38.0, 42.0, 50.0]),
    (AthleteLevel::Confirmed, [26.0, 30.0, 34.0, 38.0, 42.0, 46.0, 55.0]),
];

/// Expand one `[beginner, intermediate, confirmed]` row across both sports
fn insert_caps(
    table: &mut HashMap<CapKey, f64>,
    objective: Objective,
    size: EventSize,
    by_level: [f64; 3],
) {
    for sport in SPORTS {
        for (level, value) in LEVELS.iter().zip(by_level) {
            table.insert(
                CapKey {
                    sport,
                    objective,
                    size,
                    level: *level,
                },
                value,
            );
        }
    }
}

fn cap_table(rows: &[(Objective, EventSize, [f64; 3])]) -> HashMap<CapKey, f64> {
    let mut table = HashMap::new();
    for (objective, size, by_level) in rows {
        insert_caps(&mut table, *objective, *size, *by_level);
    }
    table
}

fn long_workout_pct() -> HashMap<CapKey, f64> {
    use EventSize::{L, M, S, XL};
    use Objective::{Finish, Perf};
    cap_table(&[
        (Finish, S, [0.75, 0.75, 0.75]),
        (Finish, M, [0.75, 0.75, 0.75]),
        (Finish, L, [0.75, 0.75, 0.75]),
        (Finish, XL, [0.65, 0.65, 0.65]),
        (Perf, S, [1.3, 1.7, 2.0]),
        (Perf, M, [0.9, 1.1, 1.5]),
        (Perf, L, [0.65, 0.75, 0.85]),
        (Perf, XL, [0.65, 0.70, 0.75]),
    ])
}

fn race_intensity_pct() -> HashMap<CapKey, f64> {
    use EventSize::{L, M, S, XL};
    use Objective::{Finish, Perf};
    cap_table(&[
        (Finish, S, [0.75, 0.75, 0.75]),
        (Finish, M, [0.75, 0.75, 0.75]),
        (Finish, L, [0.75, 0.75, 0.75]),
        (Finish, XL, [0.65, 0.65, 0.65]),
        (Perf, S, [0.8, 0.8, 0.8]),
        (Perf, M, [0.75, 0.75, 0.75]),
        (Perf, L, [0.55, 0.55, 0.55]),
        (Perf, XL, [0.40, 0.40, 0.40]),
    ])
}

/// Shared by the single-workout cap and the daily cap: one very big day is
/// the most these athletes should absorb either way.
fn max_tss_caps() -> HashMap<CapKey, f64> {
    use EventSize::{L, M, S, XL};
    use Objective::{Finish, Perf};
    cap_table(&[
        (Finish, S, [70.0, 80.0, 90.0]),
        (Finish, M, [120.0, 140.0, 160.0]),
        (Finish, L, [170.0, 200.0, 230.0]),
        (Finish, XL, [230.0, 270.0, 320.0]),
        (Perf, S, [100.0, 120.0, 150.0]),
        (Perf, M, [150.0, 180.0, 200.0]),
        (Perf, L, [250.0, 250.0, 280.0]),
        (Perf, XL, [350.0, 320.0, 350.0]),
    ])
}

fn typical_workout_tss() -> HashMap<CapKey, f64> {
    use EventSize::{L, M, S, XL};
    use Objective::{Finish, Perf};
    cap_table(&[
        (Finish, S, [45.0, 60.0, 75.0]),
        (Finish, M, [55.0, 70.0, 85.0]),
        (Finish, L, [65.0, 80.0, 95.0]),
        (Finish, XL, [75.0, 82.0, 90.0]),
        (Perf, S, [60.0, 70.0, 80.0]),
        (Perf, M, [70.0, 80.0, 90.0]),
        (Perf, L, [80.0, 90.0, 100.0]),
        (Perf, XL, [90.0, 100.0, 110.0]),
    ])
}

fn phase_window_days() -> HashMap<PhaseKey, i64> {
    let mut table = HashMap::new();
    for objective in OBJECTIVES {
        for size in SIZES {
            let fondamental = if size == EventSize::XL { 720 } else { 365 };
            // A short performance race needs no dedicated taper week
            let pre_compet = if objective == Objective::Perf && size == EventSize::S {
                0
            } else {
                7
            };
            let windows = [
                (CycleType::Fondamental, fondamental),
                (CycleType::Specific, 90),
                (CycleType::PreCompet, pre_compet),
                (CycleType::Compet, 7),
                (CycleType::Transition, 0),
            ];
            for (cycle, days) in windows {
                table.insert(
                    PhaseKey {
                        objective,
                        size,
                        cycle,
                    },
                    days,
                );
            }
        }
    }
    table
}

fn compet_tss_multiplier() -> HashMap<(Sport, Objective, EventSize), f64> {
    let mut table = HashMap::new();
    for sport in SPORTS {
        for objective in OBJECTIVES {
            for size in SIZES {
                table.insert((sport, objective, size), 1.5);
            }
        }
    }
    table
}

/// Base endurance mix used everywhere intensity has no race-specific role
const BASE_MIX: [f64; 7] = [0.4, 0.4, 0.1, 0.05, 0.03, 0.02, 0.0];

fn specific_mix(level: AthleteLevel, size: EventSize) -> [f64; 7] {
    match (level, size) {
        (AthleteLevel::Confirmed, EventSize::S) => [0.4, 0.2, 0.2, 0.12, 0.06, 0.02, 0.0],
        (AthleteLevel::Confirmed, EventSize::M) | (AthleteLevel::Intermediate, EventSize::S) => {
            [0.4, 0.25, 0.2, 0.1, 0.03, 0.02, 0.0]
        }
        (AthleteLevel::Confirmed, EventSize::L) | (AthleteLevel::Intermediate, EventSize::M) => {
            [0.4, 0.30, 0.15, 0.1, 0.03, 0.02, 0.0]
        }
        (AthleteLevel::Intermediate, EventSize::L) => [0.4, 0.35, 0.13, 0.07, 0.03, 0.02, 0.0],
        _ => BASE_MIX,
    }
}

fn zone_repartition() -> HashMap<RepartitionKey, ZoneRepartition> {
    let mut table = HashMap::new();
    let cycles = [
        CycleType::Transition,
        CycleType::Fondamental,
        CycleType::Specific,
        CycleType::PreCompet,
        CycleType::Compet,
    ];
    for level in LEVELS {
        for cycle in cycles {
            for size in SIZES {
                let mix = match cycle {
                    CycleType::Specific | CycleType::PreCompet | CycleType::Compet => {
                        specific_mix(level, size)
                    }
                    CycleType::Fondamental | CycleType::Transition => BASE_MIX,
                };
                table.insert(
                    RepartitionKey { level, cycle, size },
                    ZoneRepartition::new(mix),
                );
            }
        }
    }
    table
}

impl Default for PlanningTables {
    fn default() -> Self {
        let mut zone_speed_kmh = HashMap::new();
        for (level, speeds) in RUN_SPEEDS {
            zone_speed_kmh.insert((Sport::Run, level), speeds);
        }
        for (level, speeds) in BIKE_SPEEDS {
            zone_speed_kmh.insert((Sport::Bike, level), speeds);
        }

        let per_sport = |row: [f64; 7]| {
            let mut map = HashMap::new();
            for sport in SPORTS {
                map.insert(sport, row);
            }
            map
        };

        Self {
            tss_rate_per_hour: per_sport(TSS_RATE),
            recovery_factor: per_sport(RECOVERY_FACTOR),
            typical_interval_secs: per_sport(TYPICAL_INTERVAL),
            zone_speed_kmh,
            long_workout_pct: long_workout_pct(),
            race_intensity_pct: race_intensity_pct(),
            max_workout_tss: max_tss_caps(),
            typical_workout_tss: typical_workout_tss(),
            max_daily_tss: max_tss_caps(),
            phase_window_days: phase_window_days(),
            compet_tss_multiplier: compet_tss_multiplier(),
            zone_repartition: zone_repartition(),
        }
    }
}
