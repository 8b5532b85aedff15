//! Calendar bucketing of timestamped social posts.
//!
//! A window is bucketed into a dense, gap-free series: every calendar
//! period between the window bounds gets a bucket, zero-filled when no post
//! landed in it, so chart consumers never have to interpolate missing
//! periods. Posts with unparseable timestamps or outside the window are
//! skipped silently.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};

use crate::normalize::parse_epoch_seconds;
use crate::types::{BucketRow, EngagementSummary, RawPost};

/// Window granularity. Each is computed independently from the same sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Day,
    Week,
    Month,
}

impl Granularity {
    /// Window bounds ending at `now`: one day, seven days, or one calendar
    /// month back.
    #[must_use]
    pub fn window(self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = match self {
            Granularity::Day => now - Days::new(1),
            Granularity::Week => now - Days::new(7),
            // checked_sub_months only fails at the edge of representable time.
            Granularity::Month => now.checked_sub_months(Months::new(1)).unwrap_or(now),
        };
        (start, now)
    }
}

/// Bucket key for the period containing `date`.
///
/// Day buckets key on the date itself, week buckets on the Sunday starting
/// that week, month buckets on `YYYY-MM`.
fn bucket_key(date: NaiveDate, granularity: Granularity) -> String {
    match granularity {
        Granularity::Day => date.format("%Y-%m-%d").to_string(),
        Granularity::Week => week_start(date).format("%Y-%m-%d").to_string(),
        Granularity::Month => date.format("%Y-%m").to_string(),
    }
}

/// The Sunday on or before `date`.
fn week_start(date: NaiveDate) -> NaiveDate {
    let back = u64::from(date.weekday().num_days_from_sunday());
    date - Days::new(back)
}

/// Every bucket key between `start` and `end` inclusive, in ascending
/// order, stepping by the granularity. The first week and month keys are
/// aligned to their period start so a post anywhere in `[start, end]`
/// always maps onto a generated key.
fn bucket_keys(start: NaiveDate, end: NaiveDate, granularity: Granularity) -> Vec<String> {
    let mut keys = Vec::new();
    let mut current = match granularity {
        Granularity::Day => start,
        Granularity::Week => week_start(start),
        Granularity::Month => start.with_day(1).unwrap_or(start),
    };

    while current <= end {
        keys.push(bucket_key(current, granularity));
        current = match granularity {
            Granularity::Day => current + Days::new(1),
            Granularity::Week => current + Days::new(7),
            Granularity::Month => match current.checked_add_months(Months::new(1)) {
                Some(next) => next,
                None => break,
            },
        };
    }

    keys
}

#[derive(Default)]
struct BucketAccum {
    likes: u64,
    comments: u64,
    shares: u64,
    post_count: usize,
}

/// Bucket `posts` into the window ending at `now` for one granularity.
///
/// The emitted series always has exactly as many buckets as calendar
/// periods in the window, regardless of how many posts landed in them.
/// Summary averages are taken over all in-window posts, not per bucket.
#[must_use]
pub fn summarize(posts: &[RawPost], granularity: Granularity, now: DateTime<Utc>) -> EngagementSummary {
    let (start, end) = granularity.window(now);
    summarize_window(posts, granularity, start, end)
}

/// Same as [`summarize`] but over explicit window bounds.
#[must_use]
pub fn summarize_window(
    posts: &[RawPost],
    granularity: Granularity,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> EngagementSummary {
    let mut buckets: BTreeMap<String, BucketAccum> =
        bucket_keys(start.date_naive(), end.date_naive(), granularity)
            .into_iter()
            .map(|key| (key, BucketAccum::default()))
            .collect();

    let mut total = BucketAccum::default();

    for post in posts {
        let Some(created_at) = post
            .created_at_epoch_seconds
            .and_then(parse_epoch_seconds)
        else {
            continue;
        };
        if created_at < start || created_at > end {
            continue;
        }

        let key = bucket_key(created_at.date_naive(), granularity);
        if let Some(accum) = buckets.get_mut(&key) {
            accum.likes += post.likes;
            accum.comments += post.comments;
            accum.shares += post.shares;
            accum.post_count += 1;
        }

        total.likes += post.likes;
        total.comments += post.comments;
        total.shares += post.shares;
        total.post_count += 1;
    }

    let rows = buckets
        .into_iter()
        .map(|(date, accum)| {
            let likes = rounded_average(accum.likes, accum.post_count);
            let comments = rounded_average(accum.comments, accum.post_count);
            let shares = rounded_average(accum.shares, accum.post_count);
            BucketRow {
                date,
                likes,
                comments,
                shares,
                total_engagement: likes + comments + shares,
                post_count: accum.post_count,
            }
        })
        .collect();

    EngagementSummary {
        posts: rows,
        average_likes: rounded_average(total.likes, total.post_count),
        average_comments: rounded_average(total.comments, total.post_count),
        average_shares: rounded_average(total.shares, total.post_count),
        total_posts: total.post_count,
    }
}

/// `sum / count` rounded to a whole engagement count; 0 when empty.
fn rounded_average(sum: u64, count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let denom = count.max(1) as f64;
    #[allow(clippy::cast_precision_loss)]
    let total = sum as f64;
    (total / denom).round()
}
