//! Month-view orchestration.
//!
//! `MonthView` owns everything the calendar page needs between renders:
//! which month is visible, the posts loaded for it, the active tag
//! filter, and the day the detail panel is open on. Month navigation is
//! the only trigger that refetches; filter changes re-bucket the posts
//! already in hand.
//!
//! Fetches are guarded by a monotonically increasing token. A response
//! for a month the user has already navigated away from commits nothing.

use chrono::NaiveDate;

use crate::api::{ApiClient, ApiResult};
use crate::calendar::{DayBuckets, TagFilter, day_buckets};
use crate::models::Post;

/// Where a post fetch can come from. The live implementation is
/// `ApiClient`; tests substitute canned sources.
pub trait PostSource {
    async fn posts_for_month(&self, year: i32, month: u32) -> ApiResult<Vec<Post>>;
}

impl PostSource for ApiClient {
    async fn posts_for_month(&self, year: i32, month: u32) -> ApiResult<Vec<Post>> {
        ApiClient::posts_for_month(self, year, month).await
    }
}

/// Lifecycle of the visible month's post collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthState {
    Idle,
    Loading { year: i32, month: u32 },
    Ready { year: i32, month: u32 },
}

/// Handed out by [`MonthView::begin_month`]; must be presented back to
/// [`MonthView::commit`]. Only the most recently issued token commits.
#[derive(Debug, Clone, Copy)]
pub struct FetchToken {
    seq: u64,
    year: i32,
    month: u32,
}

#[derive(Debug, Clone, Default)]
pub struct MonthView {
    filter: TagFilter,
    state: MonthState,
    posts: Vec<Post>,
    seq: u64,
    selected_day: Option<NaiveDate>,
}

impl Default for MonthState {
    fn default() -> Self {
        MonthState::Idle
    }
}

impl MonthView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MonthState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, MonthState::Loading { .. })
    }

    /// Start navigating to a month. Clears the day selection and puts the
    /// view into Loading, where day clicks are ignored.
    pub fn begin_month(&mut self, year: i32, month: u32) -> FetchToken {
        self.seq += 1;
        self.state = MonthState::Loading { year, month };
        self.selected_day = None;
        FetchToken {
            seq: self.seq,
            year,
            month,
        }
    }

    /// Commit a fetch result. Returns false if the token was superseded by
    /// a later `begin_month`, in which case the response is dropped and
    /// state is untouched.
    ///
    /// A failed fetch still lands in Ready, with no posts: the calendar
    /// renders empty instead of dying, and the user retries by navigating.
    pub fn commit(&mut self, token: FetchToken, result: ApiResult<Vec<Post>>) -> bool {
        if token.seq != self.seq {
            tracing::debug!(
                year = token.year,
                month = token.month,
                "Dropping stale month response"
            );
            return false;
        }
        self.posts = match result {
            Ok(posts) => posts,
            Err(e) => {
                tracing::error!("Failed to fetch posts for {}-{}: {e}", token.year, token.month);
                Vec::new()
            }
        };
        self.state = MonthState::Ready {
            year: token.year,
            month: token.month,
        };
        true
    }

    /// Navigate to a month end to end: begin, fetch, commit.
    pub async fn load<S: PostSource>(&mut self, source: &S, year: i32, month: u32) -> bool {
        let token = self.begin_month(year, month);
        let result = source.posts_for_month(year, month).await;
        self.commit(token, result)
    }

    /// The loaded posts bucketed by day under the current filter.
    pub fn buckets(&self) -> DayBuckets {
        day_buckets(&self.posts, &self.filter)
    }

    /// Posts for one day under the current filter, in fetch order.
    pub fn posts_for(&self, day: NaiveDate) -> Vec<Post> {
        self.posts
            .iter()
            .filter(|p| p.created_at.date_naive() == day && self.filter.matches(p))
            .cloned()
            .collect()
    }

    /// Open the detail panel on a day. Ignored while a month is loading,
    /// so clicks cannot act on a stale or empty grid.
    pub fn select_day(&mut self, day: NaiveDate) {
        if !self.is_loading() {
            self.selected_day = Some(day);
        }
    }

    pub fn selected_day(&self) -> Option<NaiveDate> {
        self.selected_day
    }

    pub fn filter(&self) -> &TagFilter {
        &self.filter
    }

    /// Flip a tag in the filter. No refetch: the next `buckets()` call
    /// sees the change.
    pub fn toggle_tag(&mut self, tag_id: i64) {
        self.filter.toggle(tag_id);
    }

    pub fn set_filter(&mut self, filter: TagFilter) {
        self.filter = filter;
    }
}
