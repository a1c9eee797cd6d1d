// ABOUTME: Tests for the planning lookup tables: keyed access, failure modes, validation
// ABOUTME: Unknown table keys must fail fast and malformed repartitions must be rejected
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use pierre_periodization::config::{CapKey, PlanningTables};
use pierre_periodization::errors::ErrorCode;
use pierre_periodization::models::{
    AthleteLevel, CycleType, EventSize, Objective, Sport, Zone, ZoneRepartition,
};

#[test]
fn test_default_tables_are_complete_and_valid() {
    let tables = PlanningTables::default();
    tables.validate().unwrap();
    assert!((tables.tss_rate(Sport::Run, Zone::Z4).unwrap() - 100.0).abs() < 1e-9);
    assert!((tables.tss_rate(Sport::Bike, Zone::Z7).unwrap() - 500.0).abs() < 1e-9);
}

#[test]
fn test_unknown_cap_key_is_a_configuration_error() {
    let mut tables = PlanningTables::default();
    let key = CapKey {
        sport: Sport::Bike,
        objective: Objective::Finish,
        size: EventSize::XL,
        level: AthleteLevel::Beginner,
    };
    tables.max_daily_tss.remove(&key);
    let error = tables.max_daily_tss(key).unwrap_err();
    assert_eq!(error.code, ErrorCode::ConfigMissing);
    assert!(error.message.contains("Bike"));
}

#[test]
fn test_zero_weight_repartition_is_rejected_not_nan() {
    let tables = PlanningTables::default();
    let zeroed = ZoneRepartition::new([0.0; 7]);
    let error = tables
        .weekly_seconds(Sport::Run, &zeroed, 250.0)
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::ConfigInvalid);
}

#[test]
fn test_validate_rejects_fraction_sum_away_from_one() {
    let mut tables = PlanningTables::default();
    for repartition in tables.zone_repartition.values_mut() {
        *repartition = ZoneRepartition::new([0.2, 0.2, 0.1, 0.0, 0.0, 0.0, 0.0]);
    }
    assert!(tables.validate().is_err());
}

#[test]
fn test_weekly_time_in_zone_matches_repartition() {
    let tables = PlanningTables::default();
    let repartition = tables
        .zone_repartition(AthleteLevel::Confirmed, CycleType::Fondamental, EventSize::M)
        .unwrap();
    let times = tables
        .weekly_time_in_zone(Sport::Run, &repartition, 300.0)
        .unwrap();
    let total = times.total_seconds();
    for zone in Zone::ALL {
        let expected = repartition.fraction(zone) * total;
        assert!((times.get(zone) - expected).abs() < 1e-6);
    }
    // and the time budget converts back to the weekly stress
    let round_trip = tables.tss_for_times(Sport::Run, &times).unwrap();
    assert!((round_trip - 300.0).abs() < 1e-6);
}

#[test]
fn test_recovery_factor_grows_with_intensity() {
    let tables = PlanningTables::default();
    let mut previous = -1.0;
    for zone in Zone::ALL {
        let factor = tables.recovery_factor(Sport::Run, zone).unwrap();
        assert!(factor >= previous);
        previous = factor;
    }
}
