/// Hour-indexed simulation clock.
pub mod clock;
pub mod engine;
/// Scripted balancing-market regulation calls.
pub mod event;
pub mod kpi;
pub mod subscription;
pub mod types;
/// Outside-temperature sources.
pub mod weather;
