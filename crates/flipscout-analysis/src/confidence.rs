//! Heuristic confidence score for a resale estimate.
//!
//! Combines sample size, provider relevance, and cross-listing price
//! consistency into one `[0, 1]` value. Thin or malformed quote sets
//! degrade the score; they never raise an error.

use crate::types::QuoteSet;

const MATCH_COUNT_WEIGHT: f64 = 0.4;
const RELEVANCE_WEIGHT: f64 = 0.4;
const PRICE_CONSISTENCY_WEIGHT: f64 = 0.2;

/// Full match-count credit is earned at ten combined listings (five per
/// marketplace).
const FULL_CREDIT_MATCHES: f64 = 10.0;

/// Score how trustworthy a resale estimate built from these two quote sets
/// is.
///
/// The three terms weigh 0.4 / 0.4 / 0.2 and each saturates at its weight,
/// so the result is always within `[0, 1]`. Two empty sets score exactly 0.
#[must_use]
pub fn confidence_score(supply: &QuoteSet, retail: &QuoteSet) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let combined = (supply.len() + retail.len()) as f64;
    let match_count_score = (combined / FULL_CREDIT_MATCHES).min(1.0) * MATCH_COUNT_WEIGHT;

    let relevance_score =
        (supply.top_relevance() + retail.top_relevance()) / 2.0 * RELEVANCE_WEIGHT;

    let price_consistency_score =
        (price_consistency(supply) + price_consistency(retail)) / 2.0 * PRICE_CONSISTENCY_WEIGHT;

    (match_count_score + relevance_score + price_consistency_score).clamp(0.0, 1.0)
}

/// Price consistency of one quote set in `[0, 1]`.
///
/// `max(0, 1 - stddev / first_price)` over the set's usable prices in
/// provider rank order; a tight spread relative to the top match scores
/// high. Sets with no usable price, or whose top price is not positive,
/// score 0.
fn price_consistency(set: &QuoteSet) -> f64 {
    let prices = set.usable_prices();
    let Some(&first) = prices.first() else {
        return 0.0;
    };
    if first <= 0.0 {
        return 0.0;
    }
    (1.0 - population_stddev(&prices) / first).max(0.0)
}

fn population_stddev(values: &[f64]) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScoredListing;

    fn quotes(prices: &[f64]) -> QuoteSet {
        QuoteSet {
            listings: prices
                .iter()
                .map(|&p| ScoredListing {
                    title: format!("listing at {p}"),
                    price: Some(p),
                    relevance: 1.0,
                })
                .collect(),
        }
    }

    #[test]
    fn both_sets_empty_scores_zero() {
        let score = confidence_score(&QuoteSet::default(), &QuoteSet::default());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn full_sets_with_identical_prices_score_one() {
        // 10 combined matches, top relevance 1.0, zero price spread.
        let supply = quotes(&[5.0, 5.0, 5.0, 5.0, 5.0]);
        let retail = quotes(&[40.0, 40.0, 40.0, 40.0, 40.0]);
        let score = confidence_score(&supply, &retail);
        assert!((score - 1.0).abs() < 1e-9, "expected 1.0, got {score}");
    }

    #[test]
    fn score_is_always_within_unit_interval() {
        let cases = [
            (quotes(&[]), quotes(&[])),
            (quotes(&[1.0]), quotes(&[])),
            (quotes(&[0.0]), quotes(&[1.0, 1000.0])),
            (quotes(&[5.0, 500.0]), quotes(&[2.0, 2.0, 2.0])),
        ];
        for (supply, retail) in cases {
            let score = confidence_score(&supply, &retail);
            assert!(
                (0.0..=1.0).contains(&score),
                "score {score} out of range for {} / {} listings",
                supply.len(),
                retail.len()
            );
        }
    }

    #[test]
    fn match_count_saturates_at_ten_combined() {
        let five = quotes(&[1.0, 1.0, 1.0, 1.0, 1.0]);
        let six = quotes(&[1.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        assert_eq!(confidence_score(&five, &five), confidence_score(&six, &six));
    }

    #[test]
    fn one_empty_set_halves_relevance_credit() {
        let supply = quotes(&[5.0, 5.0]);
        let empty = QuoteSet::default();
        let score = confidence_score(&supply, &empty);
        // 2 matches: 0.2 * 0.4 = 0.08; relevance (1.0 + 0.0)/2 * 0.4 = 0.2;
        // consistency (1.0 + 0.0)/2 * 0.2 = 0.1.
        assert!((score - 0.38).abs() < 1e-9, "expected 0.38, got {score}");
    }

    #[test]
    fn wide_price_spread_erases_consistency_credit() {
        let tight = quotes(&[10.0, 10.0, 10.0]);
        let wild = quotes(&[10.0, 500.0, 0.5]);
        let tight_score = confidence_score(&tight, &tight);
        let wild_score = confidence_score(&wild, &wild);
        assert!(
            tight_score > wild_score,
            "tight spread {tight_score} should outscore wild spread {wild_score}"
        );
    }

    #[test]
    fn unparseable_prices_do_not_count_toward_consistency() {
        let mut set = quotes(&[10.0, 10.0]);
        set.listings.push(ScoredListing {
            title: "no price shown".to_owned(),
            price: None,
            relevance: 1.0,
        });
        // Consistency uses the two usable prices only; zero spread.
        let score = confidence_score(&set, &set);
        // 6 matches: 0.6 * 0.4 = 0.24; relevance 0.4; consistency 0.2.
        assert!((score - 0.84).abs() < 1e-9, "expected 0.84, got {score}");
    }

    #[test]
    fn zero_first_price_scores_zero_consistency() {
        let set = quotes(&[0.0, 5.0]);
        // Would divide by zero otherwise; consistency term must be 0.
        let score = confidence_score(&set, &QuoteSet::default());
        let expected = (2.0 / 10.0) * 0.4 + (1.0 + 0.0) / 2.0 * 0.4;
        assert!(
            (score - expected).abs() < 1e-9,
            "expected {expected}, got {score}"
        );
    }
}
