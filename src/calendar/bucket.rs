use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::calendar::TagFilter;
use crate::models::Post;

/// Posts grouped by calendar day, keyed by date in ascending order.
pub type DayBuckets = BTreeMap<NaiveDate, Vec<Post>>;

/// Group posts by the calendar day of `created_at`, keeping only posts
/// that pass the tag filter.
///
/// Days are taken in UTC: `created_at` arrives as an absolute timestamp
/// and the grid must render the same way wherever the server runs.
/// Within a bucket the incoming order is preserved (the API serves
/// newest-first); no re-sort happens here.
pub fn day_buckets(posts: &[Post], filter: &TagFilter) -> DayBuckets {
    let mut buckets = DayBuckets::new();
    for post in posts {
        if !filter.matches(post) {
            continue;
        }
        buckets
            .entry(post.created_at.date_naive())
            .or_default()
            .push(post.clone());
    }
    buckets
}
