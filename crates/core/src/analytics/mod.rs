pub mod aggregator;
pub mod counters;
pub mod poll;
pub mod store;
pub mod summary;

pub use aggregator::AnalyticsAggregator;
pub use counters::{ActivityEntry, ActivityKind, AnalyticsCounters, PageView};
pub use poll::{PollHandle, SummaryPoller, DEFAULT_POLL_INTERVAL};
pub use store::{AnalyticsError, AnalyticsStore, JsonFileAnalyticsStore, MemoryAnalyticsStore};
pub use summary::{
    time_ago, AnalyticsSummary, ArticleStat, ArticleStatus, DeltaEstimator, FixedDelta, Metric,
    RandomDelta, RecentActivity,
};
