//! Flexible-load model of a refrigerated warehouse for retail electricity
//! market simulation.
//!
//! The warehouse keeps frozen stock inside a temperature band while stock
//! turnover, building heat loss and internal loads push it around. It
//! reports hourly consumption, offers regulation from its thermal slack and
//! forecasts its own usage under candidate tariffs.

#[cfg(feature = "api")]
pub mod api;
pub mod config;
pub mod error;
pub mod io;
pub mod model;
pub mod runner;
/// Clock, engine, collaborators and KPIs.
pub mod sim;
pub mod tariff;
pub mod telemetry;
