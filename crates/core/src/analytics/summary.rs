use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::counters::{ActivityEntry, ActivityKind, AnalyticsCounters, PageView};
use crate::content::model::Article;

pub const TOP_PAGES_LIMIT: usize = 5;
pub const RECENT_ACTIVITY_LIMIT: usize = 10;
pub const ARTICLE_STATS_LIMIT: usize = 5;

/// Derived dashboard view over the counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_visits: u64,
    pub total_users: u64,
    pub total_articles: usize,
    pub total_media_files: u64,
    pub visits_change: f64,
    pub users_change: f64,
    pub articles_change: usize,
    pub media_change: u64,
    pub top_pages: Vec<PageView>,
    pub recent_activity: Vec<RecentActivity>,
    pub articles: Vec<ArticleStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    pub id: String,
    pub action: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub time_ago: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Published,
    Draft,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleStat {
    pub id: String,
    pub title: String,
    pub status: ArticleStatus,
    pub publish_date: String,
    pub views: u64,
    pub comments: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Visits,
    Users,
}

/// Produces the percentage-change figures. No historical baseline is kept,
/// so the shipped estimator is a placeholder.
pub trait DeltaEstimator: Send + Sync {
    fn percent_change(&self, metric: Metric, current: u64) -> f64;
}

/// Pseudo-random growth: 2 to 12 percent for visits, 1 to 9 for users,
/// rounded to one decimal; zero when there is nothing counted yet.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomDelta;

impl DeltaEstimator for RandomDelta {
    fn percent_change(&self, metric: Metric, current: u64) -> f64 {
        if current == 0 {
            return 0.0;
        }
        let (low, high) = match metric {
            Metric::Visits => (2.0, 12.0),
            Metric::Users => (1.0, 9.0),
        };
        let raw: f64 = rand::thread_rng().gen_range(low..high);
        (raw * 10.0).round() / 10.0
    }
}

/// Always reports the same change; useful where figures must be stable.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelta(pub f64);

impl DeltaEstimator for FixedDelta {
    fn percent_change(&self, _metric: Metric, current: u64) -> f64 {
        if current == 0 {
            0.0
        } else {
            self.0
        }
    }
}

/// "N seconds|minutes|hours|days ago", truncating. Future timestamps read
/// as "0 seconds ago".
pub fn time_ago(now: DateTime<Utc>, then: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);
    if secs < 60 {
        format!("{secs} seconds ago")
    } else if secs < 3_600 {
        format!("{} minutes ago", secs / 60)
    } else if secs < 86_400 {
        format!("{} hours ago", secs / 3_600)
    } else {
        format!("{} days ago", secs / 86_400)
    }
}

pub(crate) fn build(
    counters: &AnalyticsCounters,
    articles: &[Article],
    now: DateTime<Utc>,
    delta: &dyn DeltaEstimator,
) -> AnalyticsSummary {
    let article_stats: Vec<ArticleStat> = articles
        .iter()
        .map(|article| {
            let views = counters
                .article_views
                .get(&article.id)
                .cloned()
                .unwrap_or_default();
            ArticleStat {
                id: article.id.clone(),
                title: article.title.clone(),
                status: if article.featured {
                    ArticleStatus::Published
                } else {
                    ArticleStatus::Draft
                },
                publish_date: article.publish_date.clone(),
                views: views.views,
                comments: views.comments,
            }
        })
        .collect();
    let published = article_stats
        .iter()
        .filter(|a| a.status == ArticleStatus::Published)
        .count();

    // Stable sort: equal counts keep first-seen order.
    let mut top_pages = counters.page_views.clone();
    top_pages.sort_by(|a, b| b.views.cmp(&a.views));
    top_pages.truncate(TOP_PAGES_LIMIT);

    AnalyticsSummary {
        total_visits: counters.visits.total,
        total_users: counters.users.total,
        total_articles: articles.len(),
        total_media_files: counters.media_upload_count,
        visits_change: delta.percent_change(Metric::Visits, counters.visits.total),
        users_change: delta.percent_change(Metric::Users, counters.users.total),
        articles_change: published,
        media_change: 0,
        top_pages,
        recent_activity: counters
            .activity_log
            .iter()
            .take(RECENT_ACTIVITY_LIMIT)
            .map(|entry| recent(entry, now))
            .collect(),
        articles: article_stats.into_iter().take(ARTICLE_STATS_LIMIT).collect(),
    }
}

fn recent(entry: &ActivityEntry, now: DateTime<Utc>) -> RecentActivity {
    RecentActivity {
        id: entry.id.clone(),
        action: entry.action.clone(),
        timestamp: entry.timestamp,
        kind: entry.kind,
        time_ago: time_ago(now, entry.timestamp),
    }
}
