use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::AnalyticsSummary;

/// Events pushed to live dashboard listeners over SSE.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SiteEvent {
    Welcome,
    ContentSaved(ContentSavedEvent),
    AnalyticsRefreshed(AnalyticsSummary),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSavedEvent {
    pub backend: String,
    pub articles: usize,
    pub media: usize,
    pub timestamp: DateTime<Utc>,
}

impl SiteEvent {
    /// Name used for the SSE `event:` field.
    pub fn name(&self) -> &'static str {
        match self {
            SiteEvent::Welcome => "welcome",
            SiteEvent::ContentSaved(_) => "contentSaved",
            SiteEvent::AnalyticsRefreshed(_) => "analyticsRefreshed",
        }
    }
}
