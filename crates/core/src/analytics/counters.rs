use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// The activity log keeps only this many newest entries.
pub const ACTIVITY_LOG_CAPACITY: usize = 50;

/// A running counter with daily and monthly windows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VisitCounter {
    pub total: u64,
    pub monthly: u64,
    pub daily: u64,
    pub last_update: Option<DateTime<Utc>>,
}

impl VisitCounter {
    /// Count one event at `now`. The daily and monthly windows restart when
    /// the calendar day or month of the previous update differs.
    pub fn increment(&mut self, now: DateTime<Utc>) {
        if let Some(last) = self.last_update {
            if last.date_naive() != now.date_naive() {
                self.daily = 0;
            }
            if (last.year(), last.month()) != (now.year(), now.month()) {
                self.monthly = 0;
            }
        }
        self.total += 1;
        self.monthly += 1;
        self.daily += 1;
        self.last_update = Some(now);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Form,
    Article,
    Media,
    User,
    Comment,
    Update,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: String,
    pub action: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageView {
    pub path: String,
    pub views: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleViews {
    pub views: u64,
    pub comments: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaViews {
    pub views: u64,
}

/// Everything the aggregator accumulates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyticsCounters {
    pub visits: VisitCounter,
    pub users: VisitCounter,
    /// Newest first, at most [`ACTIVITY_LOG_CAPACITY`] entries.
    pub activity_log: Vec<ActivityEntry>,
    /// In first-seen order.
    pub page_views: Vec<PageView>,
    pub article_views: BTreeMap<String, ArticleViews>,
    pub media_views: BTreeMap<String, MediaViews>,
    pub media_upload_count: u64,
}

impl AnalyticsCounters {
    pub fn record_page_view(&mut self, path: &str) {
        match self.page_views.iter_mut().find(|p| p.path == path) {
            Some(page) => page.views += 1,
            None => self.page_views.push(PageView {
                path: path.to_string(),
                views: 1,
            }),
        }
    }

    /// Prepend an entry and drop everything past the capacity.
    pub fn log(&mut self, entry: ActivityEntry) {
        self.activity_log.insert(0, entry);
        self.activity_log.truncate(ACTIVITY_LOG_CAPACITY);
    }
}
