//! Source-biased reduction of a quote set to one representative price.
//!
//! A raw arithmetic mean is too easily skewed by a single premium or
//! bargain-bin listing. Instead each marketplace gets a directional skew:
//! the wholesale source leans toward its cheapest quotes, the retail source
//! toward its priciest, and the weighted mean is blended 50/50 with the
//! corresponding extreme to stabilize the estimate.

use crate::types::Marketplace;

/// Direction a marketplace's representative price is skewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceBias {
    /// Cheaper quotes dominate (wholesale / sourcing cost).
    Low,
    /// Pricier quotes dominate (retail / resale value).
    High,
}

impl Marketplace {
    #[must_use]
    pub fn bias(self) -> PriceBias {
        match self {
            Marketplace::AliExpress => PriceBias::Low,
            Marketplace::Amazon => PriceBias::High,
        }
    }
}

/// Reduce a list of normalized prices to one representative price.
///
/// Prices are sorted ascending and the quote at rank `i` (0-based, `n`
/// quotes total) is weighted `exp(-0.5 * i)` for [`PriceBias::Low`] or
/// `exp(0.5 * i / n)` for [`PriceBias::High`]. The weighted mean is then
/// averaged with the set's minimum (low bias) or maximum (high bias).
///
/// An empty list yields `0.0`, the "no usable data" marker propagated by
/// the assembler. A single price is returned unchanged.
#[must_use]
pub fn representative_price(prices: &[f64], bias: PriceBias) -> f64 {
    let mut sorted = prices.to_vec();
    sorted.sort_by(f64::total_cmp);

    if sorted.is_empty() {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let n = sorted.len() as f64;
    let mut total_weight = 0.0_f64;
    let mut weighted_sum = 0.0_f64;

    for (i, price) in sorted.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let rank = i as f64;
        let weight = match bias {
            PriceBias::Low => (-0.5 * rank).exp(),
            PriceBias::High => (0.5 * (rank / n)).exp(),
        };
        total_weight += weight;
        weighted_sum += price * weight;
    }

    let weighted_mean = weighted_sum / total_weight;
    let extreme = match bias {
        PriceBias::Low => sorted[0],
        PriceBias::High => sorted[sorted.len() - 1],
    };

    (weighted_mean + extreme) / 2.0
}
