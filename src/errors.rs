// ABOUTME: Unified error handling for the periodization engine with typed error codes
// ABOUTME: Defines ErrorCode, AppError and the AppResult alias used across all modules
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Unified Error Handling
//!
//! Centralized error types for the periodization engine. The engine is a pure
//! computation; every failure is reported to the caller as a typed error and
//! nothing is retried or recovered internally.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Configuration (1000-1999)
    #[serde(rename = "CONFIG_MISSING")]
    ConfigMissing = 1000,
    #[serde(rename = "CONFIG_INVALID")]
    ConfigInvalid = 1001,

    // Validation (2000-2999)
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 2000,
    #[serde(rename = "VALUE_OUT_OF_RANGE")]
    ValueOutOfRange = 2001,

    // Consistency (3000-3999)
    #[serde(rename = "CONSISTENCY_ERROR")]
    Consistency = 3000,

    // Internal (9000-9999)
    #[serde(rename = "INTERNAL_ERROR")]
    Internal = 9000,
}

impl ErrorCode {
    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::ConfigMissing => "A required configuration table entry is missing",
            Self::ConfigInvalid => "The provided configuration is invalid",
            Self::InvalidInput => "The provided input is invalid",
            Self::ValueOutOfRange => "The provided value is outside the acceptable range",
            Self::Consistency => "The planning inputs are mutually inconsistent",
            Self::Internal => "An internal engine error occurred",
        }
    }
}

/// Unified error type for the engine
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Missing configuration table entry
    pub fn config_missing(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigMissing, message)
    }

    /// Invalid configuration value
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalid, message)
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Value out of range
    pub fn out_of_range(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValueOutOfRange, message)
    }

    /// Inconsistent planning inputs
    pub fn consistency(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Consistency, message)
    }

    /// Internal engine error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
