//! Export of run results.

pub mod export;
