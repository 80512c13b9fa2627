use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::aggregator::AnalyticsAggregator;
use crate::content::store::ArticleSource;
use crate::events::{EventBus, SiteEvent};

/// Default refresh period of the dashboard summary.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Periodically recomputes the analytics summary and publishes it.
pub struct SummaryPoller;

impl SummaryPoller {
    /// Start polling. The first refresh happens one `period` after spawning.
    pub fn spawn(
        aggregator: Arc<AnalyticsAggregator>,
        articles: Arc<dyn ArticleSource>,
        bus: EventBus,
        period: Duration,
    ) -> PollHandle {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match aggregator.summary(articles.as_ref()).await {
                    Ok(summary) => {
                        let listeners = bus.publish(SiteEvent::AnalyticsRefreshed(summary));
                        tracing::debug!(listeners, "analytics summary refreshed");
                    }
                    Err(e) => tracing::warn!(error = %e, "analytics refresh failed"),
                }
            }
        });
        tracing::info!(period_secs = period.as_secs(), "analytics poller started");
        PollHandle { task }
    }
}

/// Stops the poller on `cancel` or when dropped.
#[derive(Debug)]
pub struct PollHandle {
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::model::Article;

    #[tokio::test(start_paused = true)]
    async fn publishes_on_every_tick_until_cancelled() {
        let aggregator = Arc::new(AnalyticsAggregator::in_memory());
        aggregator.track_page_view("/").await.unwrap();
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        let handle = SummaryPoller::spawn(
            aggregator.clone(),
            Arc::new(Vec::<Article>::new()),
            bus.clone(),
            Duration::from_secs(30),
        );

        match rx.recv().await.unwrap() {
            SiteEvent::AnalyticsRefreshed(summary) => assert_eq!(summary.total_visits, 1),
            other => panic!("unexpected event {other:?}"),
        }

        aggregator.track_page_view("/").await.unwrap();
        match rx.recv().await.unwrap() {
            SiteEvent::AnalyticsRefreshed(summary) => assert_eq!(summary.total_visits, 2),
            other => panic!("unexpected event {other:?}"),
        }

        handle.cancel();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(handle.is_finished());

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_stops_polling() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let handle = SummaryPoller::spawn(
            Arc::new(AnalyticsAggregator::in_memory()),
            Arc::new(Vec::<Article>::new()),
            bus.clone(),
            Duration::from_secs(30),
        );
        drop(handle);

        tokio::time::sleep(Duration::from_secs(95)).await;
        assert!(rx.try_recv().is_err());
    }
}
