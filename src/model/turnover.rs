//! Stochastic stock turnover and the temperature blend it causes.

use tracing::debug;

use super::params::WarehouseParams;
use super::random::RandomSource;
use super::state::ThermalState;

/// Stock movement drawn for one hour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Turnover {
    /// Tonnes shipped out (at the current temperature).
    pub outgoing: f64,
    /// Tonnes received (at the new-stock temperature).
    pub incoming: f64,
    /// Resulting change of the internal temperature (K).
    pub delta_temp: f64,
}

/// Hourly turnover drawn from a clamped normal distribution.
///
/// Both movements have mean `turnover_ratio * stock_capacity / 24` and
/// standard deviation `turnover_sd * stock_capacity / 24`.
#[derive(Debug, Clone, PartialEq)]
pub struct StockTurnoverModel {
    mean: f64,
    sd: f64,
    new_stock_temp: f64,
}

impl StockTurnoverModel {
    pub fn new(params: &WarehouseParams) -> Self {
        let hourly = params.stock_capacity() / 24.0;
        Self {
            mean: params.turnover_ratio() * hourly,
            sd: params.turnover_sd() * hourly,
            new_stock_temp: params.new_stock_temp(),
        }
    }

    fn draw(&self, rng: &mut impl RandomSource) -> f64 {
        (rng.next_gaussian() * self.sd + self.mean).max(0.0)
    }

    /// Draws this hour's turnover and updates the stock.
    ///
    /// The returned temperature delta is *not* applied; the caller owns that
    /// step. Outgoing stock is drawn first and can never exceed what is on
    /// hand.
    pub fn apply(&self, state: &mut ThermalState, rng: &mut impl RandomSource) -> Turnover {
        let outgoing_draw = self.draw(rng);
        let incoming = self.draw(rng);

        let outgoing = outgoing_draw.min(state.stock());
        let remaining = state.stock() - outgoing;
        let blended = remaining + incoming;
        let temp = state.temperature();
        let delta_temp = if blended > 0.0 && incoming > 0.0 {
            (remaining * temp + incoming * self.new_stock_temp) / blended - temp
        } else {
            0.0
        };
        state.set_stock(blended);

        debug!(outgoing, incoming, delta_temp, "stock turnover");
        Turnover {
            outgoing,
            incoming,
            delta_temp,
        }
    }
}
