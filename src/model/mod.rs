//! Physical and control model of a refrigerated warehouse.

/// Mean-reverting non-cooling load.
pub mod ancillary;
/// Dead-band refrigeration controller.
pub mod controller;
pub mod params;
/// Seeded random streams.
pub mod random;
pub mod regulation;
/// Temperature and stock state.
pub mod state;
pub mod turnover;

// Re-export the main types for convenience
pub use ancillary::AncillaryLoadModel;
pub use controller::{BandPosition, EnergyInfo, HysteresisCoolingController, ThermalEnvelope};
pub use params::{WarehouseOverrides, WarehouseParams};
pub use random::{RandomSource, RandomStreams, SeededStream};
pub use regulation::{RegulationCapability, RegulationCapacity, RegulationCapacityCalculator};
pub use state::{ThermalSnapshot, ThermalState};
pub use turnover::{StockTurnoverModel, Turnover};
