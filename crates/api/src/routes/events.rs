use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use clinic_site_core::events::SiteEvent;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/events", get(listen))
}

fn to_sse(event: &SiteEvent) -> Event {
    Event::default()
        .event(event.name())
        .json_data(event)
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not encode site event");
            Event::default().event("error").data("event could not be encoded")
        })
}

/// Server-sent events: a welcome, then every published site event.
async fn listen(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let live = BroadcastStream::new(state.event_bus().subscribe()).filter_map(|msg| match msg {
        Ok(event) => Some(event),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "event listener lagged");
            None
        }
    });
    let stream = tokio_stream::once(SiteEvent::Welcome)
        .chain(live)
        .map(|event| Ok(to_sse(&event)));
    Sse::new(stream).keep_alive(KeepAlive::default())
}
