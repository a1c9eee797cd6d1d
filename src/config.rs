// ABOUTME: Configuration module root for the injected planning lookup tables
// ABOUTME: Exposes PlanningTables plus the typed key records used to index them
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Planning Configuration
//!
//! The engine treats every physiological table as injected configuration:
//! TSS rates per zone, recovery factors, zone speeds, per-level caps, phase
//! windows and zone time repartitions. Lookups are keyed by typed records and
//! fail fast with a configuration error instead of silently defaulting.

mod defaults;
/// Typed lookup tables and validation
pub mod tables;

pub use tables::{CapKey, PhaseKey, PlanningTables, RepartitionKey};
