//! Order-volume classification for marketplace listings.

use crate::types::{OrderMetrics, OrderVolume, VolumeLevel};

const HIGH_AVERAGE_ORDERS: u64 = 2_000;
const HIGH_TOP_ORDERS: u64 = 5_000;
const HIGH_TOTAL_ORDERS: u64 = 15_000;

const MEDIUM_AVERAGE_ORDERS: u64 = 500;
const MEDIUM_TOP_ORDERS: u64 = 1_500;
const MEDIUM_TOTAL_ORDERS: u64 = 5_000;

/// Classify per-listing order counts into a volume level.
///
/// Returns `None` when no listings were found — the section degrades to
/// "no data" rather than reporting zeroes as a real measurement.
#[must_use]
pub fn classify_order_volume(order_counts: &[u64]) -> Option<OrderVolume> {
    if order_counts.is_empty() {
        return None;
    }

    let total_orders: u64 = order_counts.iter().sum();
    let top_listing_orders = order_counts.iter().copied().max().unwrap_or(0);
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let average_orders = (total_orders as f64 / order_counts.len() as f64).round() as u64;

    let volume_level = if average_orders >= HIGH_AVERAGE_ORDERS
        || top_listing_orders >= HIGH_TOP_ORDERS
        || total_orders >= HIGH_TOTAL_ORDERS
    {
        VolumeLevel::High
    } else if average_orders >= MEDIUM_AVERAGE_ORDERS
        || top_listing_orders >= MEDIUM_TOP_ORDERS
        || total_orders >= MEDIUM_TOTAL_ORDERS
    {
        VolumeLevel::Medium
    } else {
        VolumeLevel::Low
    };

    Some(OrderVolume {
        volume_level,
        metrics: OrderMetrics {
            average_orders,
            top_listing_orders,
            total_orders,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_listings_yield_no_data() {
        assert!(classify_order_volume(&[]).is_none());
    }

    #[test]
    fn small_counts_classify_low() {
        let volume = classify_order_volume(&[10, 20, 30]).unwrap();
        assert_eq!(volume.volume_level, VolumeLevel::Low);
        assert_eq!(volume.metrics.average_orders, 20);
        assert_eq!(volume.metrics.top_listing_orders, 30);
        assert_eq!(volume.metrics.total_orders, 60);
    }

    #[test]
    fn medium_by_average() {
        let volume = classify_order_volume(&[500, 500]).unwrap();
        assert_eq!(volume.volume_level, VolumeLevel::Medium);
    }

    #[test]
    fn medium_by_single_hot_listing() {
        let volume = classify_order_volume(&[1_500, 10, 10]).unwrap();
        assert_eq!(volume.volume_level, VolumeLevel::Medium);
    }

    #[test]
    fn high_by_average() {
        let volume = classify_order_volume(&[2_000, 2_000]).unwrap();
        assert_eq!(volume.volume_level, VolumeLevel::High);
    }

    #[test]
    fn high_by_top_listing() {
        let volume = classify_order_volume(&[5_000, 1, 1]).unwrap();
        assert_eq!(volume.volume_level, VolumeLevel::High);
    }

    #[test]
    fn high_by_total() {
        let volume = classify_order_volume(&[4_000, 4_000, 4_000, 4_000]).unwrap();
        assert_eq!(volume.volume_level, VolumeLevel::High);
        assert_eq!(volume.metrics.total_orders, 16_000);
    }

    #[test]
    fn average_is_rounded() {
        let volume = classify_order_volume(&[1, 2]).unwrap();
        // 1.5 rounds to 2.
        assert_eq!(volume.metrics.average_orders, 2);
    }
}
