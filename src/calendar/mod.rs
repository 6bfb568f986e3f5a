//! The calendar core: pure day bucketing, tag filter state, and the
//! month-view orchestrator that ties them to the remote gateway.

pub mod bucket;
pub mod filter;
pub mod view;

pub use bucket::{DayBuckets, day_buckets};
pub use filter::TagFilter;
pub use view::{FetchToken, MonthState, MonthView, PostSource};
