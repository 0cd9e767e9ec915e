//! Error types shared by the model, the harness and the binary.

use std::fmt;
use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::sim::clock::Timeslot;
use crate::tariff::TariffId;

/// Configuration error with field path and constraint description.
///
/// Produced both for fatal scenario errors and for rejected warehouse
/// settings; the latter are logged and the previous value is kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"warehouse.stock_capacity"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    /// Creates a new error for `field`.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {} — {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Errors surfaced by a simulation step or a scenario run.
#[derive(Debug, Error)]
pub enum SimError {
    /// No weather report exists for the timeslot being simulated.
    #[error("no weather report for timeslot {timeslot}")]
    WeatherUnavailable { timeslot: Timeslot },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("unknown tariff {0}")]
    UnknownTariff(TariffId),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
