//! Trade fee computation: a pure function of notional value and rate.

use serde::{Deserialize, Serialize};

/// Maker/taker fee rates, expressed as a fraction of notional (0.001 = 10 bps).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeeModel {
    pub maker_rate: f64,
    pub taker_rate: f64,
}

impl FeeModel {
    pub fn new(maker_rate: f64, taker_rate: f64) -> Self {
        Self { maker_rate, taker_rate }
    }

    /// `(maker_fee, taker_fee)` for a trade of `price * quantity = notional`.
    pub fn compute(&self, price: i64, quantity: i64) -> (f64, f64) {
        let notional = price as f64 * quantity as f64;
        (notional * self.maker_rate, notional * self.taker_rate)
    }
}

impl Default for FeeModel {
    fn default() -> Self {
        Self {
            maker_rate: 0.001,
            taker_rate: 0.002,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let fees = FeeModel::default();
        assert_eq!(fees.maker_rate, 0.001);
        assert_eq!(fees.taker_rate, 0.002);
    }

    #[test]
    fn compute_scales_with_notional() {
        let fees = FeeModel::new(0.001, 0.002);
        let (maker, taker) = fees.compute(10_000, 2);
        assert_eq!(maker, 20.0);
        assert_eq!(taker, 40.0);
    }

    #[test]
    fn zero_quantity_yields_zero_fees() {
        let fees = FeeModel::default();
        assert_eq!(fees.compute(10_000, 0), (0.0, 0.0));
    }
}
