//! Portfolio exposure and earnings surprise arithmetic

use crate::model::{EarningsRecord, PortfolioWeights, QuoteMap};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Pure, total portfolio calculations
#[derive(Debug, Clone, Copy)]
pub struct QuantAnalyzer {
    clamp_exposure: bool,
}

impl QuantAnalyzer {
    pub fn new(clamp_exposure: bool) -> Self {
        Self { clamp_exposure }
    }

    /// `sum(weight * price) / sum(weight) * 100`, 0 when the total weight is 0.
    ///
    /// Symbols without a quote contribute a price of 0. With clamping enabled
    /// the result lies in [0, 100].
    pub fn exposure(&self, quotes: &QuoteMap, weights: &PortfolioWeights) -> f64 {
        let total_aum: f64 = weights.values().sum();
        if total_aum == 0.0 || !total_aum.is_finite() {
            warn!("total AUM is zero, cannot calculate exposure");
            return 0.0;
        }

        let exposure_value: f64 = weights
            .iter()
            .map(|(symbol, weight)| weight * quotes.get(symbol).map_or(0.0, |q| q.price))
            .sum();

        let exposure = exposure_value / total_aum * 100.0;
        let exposure = if !exposure.is_finite() {
            0.0
        } else if self.clamp_exposure {
            exposure.clamp(0.0, 100.0)
        } else {
            exposure
        };

        info!(exposure = format!("{exposure:.2}"), "portfolio exposure calculated");
        exposure
    }

    /// `(reported - estimated) / estimated * 100`, 0 when the estimate is 0
    pub fn earnings_surprise(&self, record: &EarningsRecord) -> f64 {
        if record.estimated_eps == 0.0 {
            return 0.0;
        }

        let surprise = (record.reported_eps - record.estimated_eps) / record.estimated_eps * 100.0;
        if surprise.is_finite() { surprise } else { 0.0 }
    }

    /// Surprise per symbol
    pub fn earnings_surprises(
        &self,
        earnings: &BTreeMap<String, EarningsRecord>,
    ) -> BTreeMap<String, f64> {
        earnings
            .iter()
            .map(|(symbol, record)| {
                let surprise = self.earnings_surprise(record);
                if record.estimated_eps == 0.0 {
                    warn!(symbol = %symbol, "estimated EPS is zero, cannot calculate surprise");
                } else {
                    info!(
                        symbol = %symbol,
                        surprise = format!("{surprise:.2}"),
                        reported = record.reported_eps,
                        estimated = record.estimated_eps,
                        "earnings surprise"
                    );
                }
                (symbol.clone(), surprise)
            })
            .collect()
    }
}

impl Default for QuantAnalyzer {
    fn default() -> Self {
        Self::new(true)
    }
}
