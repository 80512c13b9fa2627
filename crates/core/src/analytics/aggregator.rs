use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::counters::{ActivityEntry, ActivityKind, AnalyticsCounters};
use super::store::{AnalyticsError, AnalyticsStore, MemoryAnalyticsStore};
use super::summary::{self, AnalyticsSummary, DeltaEstimator, RandomDelta};
use crate::clock::{Clock, SystemClock};
use crate::content::store::ArticleSource;

/// Accumulates site activity into counters and derives the dashboard
/// summary from them.
///
/// Every tracking call is a load-modify-save against the store, serialized
/// by an internal lock so concurrent requests do not lose increments.
pub struct AnalyticsAggregator {
    store: Arc<dyn AnalyticsStore>,
    clock: Arc<dyn Clock>,
    delta: Arc<dyn DeltaEstimator>,
    write_lock: Mutex<()>,
}

fn activity(now: DateTime<Utc>, kind: ActivityKind, action: String) -> ActivityEntry {
    ActivityEntry {
        id: Uuid::new_v4().to_string(),
        action,
        timestamp: now,
        kind,
    }
}

fn page_view(c: &mut AnalyticsCounters, now: DateTime<Utc>, path: &str) {
    c.visits.increment(now);
    c.record_page_view(path);
}

fn article_view(c: &mut AnalyticsCounters, article_id: &str) {
    c.article_views
        .entry(article_id.to_string())
        .or_default()
        .views += 1;
}

fn media_view(c: &mut AnalyticsCounters, now: DateTime<Utc>, media_id: &str, title: &str) {
    c.media_views.entry(media_id.to_string()).or_default().views += 1;
    c.log(activity(
        now,
        ActivityKind::Media,
        format!("Media viewed: \"{title}\""),
    ));
}

fn contact_form(c: &mut AnalyticsCounters, now: DateTime<Utc>, name: &str) {
    c.log(activity(
        now,
        ActivityKind::Form,
        format!("New contact form submission from {name}"),
    ));
}

impl AnalyticsAggregator {
    pub fn new(store: Arc<dyn AnalyticsStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            delta: Arc::new(RandomDelta),
            write_lock: Mutex::new(()),
        }
    }

    /// An aggregator over a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryAnalyticsStore::new()))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_delta(mut self, delta: Arc<dyn DeltaEstimator>) -> Self {
        self.delta = delta;
        self
    }

    /// Current counters, initializing the store on first access.
    pub async fn counters(&self) -> Result<AnalyticsCounters, AnalyticsError> {
        let _guard = self.write_lock.lock().await;
        match self.store.load().await? {
            Some(counters) => Ok(counters),
            None => {
                let counters = AnalyticsCounters::default();
                self.store.save(&counters).await?;
                Ok(counters)
            }
        }
    }

    async fn update<F>(&self, apply: F) -> Result<(), AnalyticsError>
    where
        F: FnOnce(&mut AnalyticsCounters, DateTime<Utc>),
    {
        let _guard = self.write_lock.lock().await;
        let mut counters = self.store.load().await?.unwrap_or_default();
        apply(&mut counters, self.clock.now());
        self.store.save(&counters).await
    }

    /// One page view: visit counters and the per-path count go up by one.
    /// Repeated views are all counted.
    pub async fn track_page_view(&self, path: &str) -> Result<(), AnalyticsError> {
        self.update(|c, now| page_view(c, now, path)).await
    }

    pub async fn track_visitor(&self) -> Result<(), AnalyticsError> {
        self.update(|c, now| c.users.increment(now)).await
    }

    pub async fn track_article_view(&self, article_id: &str) -> Result<(), AnalyticsError> {
        self.update(|c, _| article_view(c, article_id)).await
    }

    pub async fn track_media_view(
        &self,
        media_id: &str,
        title: &str,
    ) -> Result<(), AnalyticsError> {
        self.update(|c, now| media_view(c, now, media_id, title))
            .await
    }

    /// The email is accepted for parity with the contact form but only the
    /// name reaches the activity log.
    pub async fn track_contact_form(
        &self,
        name: &str,
        _email: &str,
    ) -> Result<(), AnalyticsError> {
        self.update(|c, now| contact_form(c, now, name)).await
    }

    pub async fn track_new_article(&self, title: &str) -> Result<(), AnalyticsError> {
        self.update(|c, now| {
            c.log(activity(
                now,
                ActivityKind::Article,
                format!("Article published: \"{title}\""),
            ));
        })
        .await
    }

    pub async fn track_media_upload(&self, file_name: &str) -> Result<(), AnalyticsError> {
        self.update(|c, now| {
            c.media_upload_count += 1;
            c.log(activity(
                now,
                ActivityKind::Media,
                format!("New media uploaded: {file_name}"),
            ));
        })
        .await
    }

    /// Compute the summary. The article count is read live from `articles`
    /// on every call.
    pub async fn summary(
        &self,
        articles: &dyn ArticleSource,
    ) -> Result<AnalyticsSummary, AnalyticsError> {
        let live = articles.current_articles().await;
        let counters = self.counters().await?;
        Ok(summary::build(
            &counters,
            &live,
            self.clock.now(),
            self.delta.as_ref(),
        ))
    }

    /// Forget everything. The next access starts from zero.
    pub async fn reset(&self) -> Result<(), AnalyticsError> {
        let _guard = self.write_lock.lock().await;
        self.store.clear().await?;
        tracing::info!("analytics data cleared");
        Ok(())
    }

    /// Fill the counters with the demo data set shown on a fresh dashboard,
    /// in a single store round trip.
    pub async fn seed_sample_data(&self) -> Result<(), AnalyticsError> {
        self.update(|c, now| {
            for (path, views) in [("/home", 50), ("/services", 30), ("/contact", 20)] {
                for _ in 0..views {
                    page_view(c, now, path);
                }
            }
            for name in ["John Doe", "Jane Smith", "Dr. Ahmed"] {
                contact_form(c, now, name);
            }
            for id in ["article-1", "article-2", "article-1", "article-3"] {
                article_view(c, id);
            }
            for (id, title) in [
                ("media-1", "Interview Avec RTCI"),
                ("media-2", "Caravane de santé avec l'institut SALAH Azaiez"),
                ("media-1", "Interview Avec RTCI"),
                ("media-3", "Village Octobre Rose Congo Pointe Noire"),
            ] {
                media_view(c, now, id, title);
            }
        })
        .await?;
        tracing::info!("analytics sample data added");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::counters::ACTIVITY_LOG_CAPACITY;
    use crate::analytics::store::JsonFileAnalyticsStore;
    use crate::analytics::summary::FixedDelta;
    use crate::clock::ManualClock;
    use crate::content::model::Article;
    use chrono::{Duration, TimeZone};
    use tempfile::tempdir;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 9, 30, 0).unwrap()
    }

    fn aggregator(clock: Arc<ManualClock>) -> AnalyticsAggregator {
        AnalyticsAggregator::in_memory()
            .with_clock(clock)
            .with_delta(Arc::new(FixedDelta(4.5)))
    }

    fn articles() -> Vec<Article> {
        vec![
            Article {
                id: "article-1".into(),
                title: "IRM".into(),
                featured: true,
                ..Default::default()
            },
            Article {
                id: "article-2".into(),
                title: "Scanner".into(),
                featured: false,
                ..Default::default()
            },
        ]
    }

    #[tokio::test]
    async fn repeated_page_views_are_all_counted() {
        let analytics = aggregator(Arc::new(ManualClock::new(start())));
        for _ in 0..7 {
            analytics.track_page_view("/services").await.unwrap();
        }
        let summary = analytics.summary(&Vec::<Article>::new()).await.unwrap();
        assert_eq!(summary.total_visits, 7);
        assert_eq!(summary.top_pages.len(), 1);
        assert_eq!(summary.top_pages[0].views, 7);
    }

    #[tokio::test]
    async fn top_pages_sorted_with_ties_in_first_seen_order() {
        let analytics = aggregator(Arc::new(ManualClock::new(start())));
        for (path, n) in [
            ("/a", 1),
            ("/b", 3),
            ("/c", 3),
            ("/d", 2),
            ("/e", 1),
            ("/f", 4),
        ] {
            for _ in 0..n {
                analytics.track_page_view(path).await.unwrap();
            }
        }
        let summary = analytics.summary(&Vec::<Article>::new()).await.unwrap();
        let paths: Vec<_> = summary.top_pages.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["/f", "/b", "/c", "/d", "/a"]);
    }

    #[tokio::test]
    async fn activity_log_is_capped_and_newest_first() {
        let clock = Arc::new(ManualClock::new(start()));
        let analytics = aggregator(clock.clone());
        for i in 0..60 {
            analytics.track_new_article(&format!("A{i}")).await.unwrap();
            clock.advance(Duration::seconds(1));
        }
        let counters = analytics.counters().await.unwrap();
        assert_eq!(counters.activity_log.len(), ACTIVITY_LOG_CAPACITY);
        assert_eq!(counters.activity_log[0].action, "Article published: \"A59\"");
        assert_eq!(
            counters.activity_log[ACTIVITY_LOG_CAPACITY - 1].action,
            "Article published: \"A10\""
        );
        let expected: Vec<_> = (10..60)
            .rev()
            .map(|i| format!("Article published: \"A{i}\""))
            .collect();
        let actions: Vec<_> = counters
            .activity_log
            .iter()
            .map(|a| a.action.clone())
            .collect();
        assert_eq!(actions, expected);
        assert!(counters
            .activity_log
            .windows(2)
            .all(|w| w[0].timestamp > w[1].timestamp));

        let summary = analytics.summary(&Vec::<Article>::new()).await.unwrap();
        assert_eq!(summary.recent_activity.len(), 10);
        assert_eq!(summary.recent_activity[0].time_ago, "1 seconds ago");
        assert_eq!(summary.recent_activity[9].time_ago, "10 seconds ago");
    }

    #[tokio::test]
    async fn activity_messages() {
        let analytics = aggregator(Arc::new(ManualClock::new(start())));
        analytics.track_contact_form("Amel", "amel@example.tn").await.unwrap();
        analytics.track_media_view("media-1", "Interview").await.unwrap();
        analytics.track_media_upload("scan_1.png").await.unwrap();

        let counters = analytics.counters().await.unwrap();
        let actions: Vec<_> = counters
            .activity_log
            .iter()
            .map(|a| (a.kind, a.action.as_str()))
            .collect();
        assert_eq!(
            actions,
            vec![
                (ActivityKind::Media, "New media uploaded: scan_1.png"),
                (ActivityKind::Media, "Media viewed: \"Interview\""),
                (
                    ActivityKind::Form,
                    "New contact form submission from Amel"
                ),
            ]
        );
        assert_eq!(counters.media_upload_count, 1);
        assert_eq!(counters.media_views["media-1"].views, 1);
    }

    #[tokio::test]
    async fn summary_reads_articles_live() {
        let analytics = aggregator(Arc::new(ManualClock::new(start())));
        analytics.track_article_view("article-1").await.unwrap();
        analytics.track_article_view("article-1").await.unwrap();
        analytics.track_visitor().await.unwrap();

        let summary = analytics.summary(&articles()).await.unwrap();
        assert_eq!(summary.total_articles, 2);
        assert_eq!(summary.articles_change, 1);
        assert_eq!(summary.articles[0].views, 2);
        assert_eq!(summary.total_users, 1);
        assert_eq!(summary.users_change, 4.5);

        let fewer = vec![articles().remove(0)];
        assert_eq!(analytics.summary(&fewer).await.unwrap().total_articles, 1);
    }

    #[tokio::test]
    async fn reset_zeroes_everything() {
        let analytics = aggregator(Arc::new(ManualClock::new(start())));
        analytics.seed_sample_data().await.unwrap();
        analytics.track_media_upload("x.png").await.unwrap();
        analytics.reset().await.unwrap();

        let summary = analytics.summary(&Vec::<Article>::new()).await.unwrap();
        assert_eq!(summary.total_visits, 0);
        assert_eq!(summary.total_users, 0);
        assert_eq!(summary.total_media_files, 0);
        assert_eq!(summary.visits_change, 0.0);
        assert!(summary.top_pages.is_empty());
        assert!(summary.recent_activity.is_empty());
    }

    #[tokio::test]
    async fn sample_data_matches_dashboard_demo() {
        let analytics = aggregator(Arc::new(ManualClock::new(start())));
        analytics.seed_sample_data().await.unwrap();
        let counters = analytics.counters().await.unwrap();
        assert_eq!(counters.visits.total, 100);
        assert_eq!(counters.page_views[0].path, "/home");
        assert_eq!(counters.article_views["article-1"].views, 2);
        assert_eq!(counters.media_views["media-1"].views, 2);
        assert_eq!(counters.activity_log.len(), 7);
    }

    #[tokio::test]
    async fn counters_survive_a_new_aggregator_over_the_same_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("analytics.json");
        AnalyticsAggregator::new(Arc::new(JsonFileAnalyticsStore::new(&path)))
            .track_page_view("/")
            .await
            .unwrap();
        let reopened = AnalyticsAggregator::new(Arc::new(JsonFileAnalyticsStore::new(&path)));
        assert_eq!(reopened.counters().await.unwrap().visits.total, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_tracking_loses_nothing() {
        let analytics = Arc::new(AnalyticsAggregator::in_memory());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let analytics = analytics.clone();
                tokio::spawn(async move {
                    for _ in 0..25 {
                        analytics.track_page_view("/").await.unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(analytics.counters().await.unwrap().visits.total, 200);
    }
}
