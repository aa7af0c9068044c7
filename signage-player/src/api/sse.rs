//! Server-Sent Events (SSE) stream
//!
//! Each client gets its own hub subscription. The SSE `event` field is the
//! event type and `data` is the JSON event. Streams end when the server
//! shuts down.

use crate::api::server::AppContext;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{Stream, StreamExt};
use signage_common::SignageEvent;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

/// GET /events - SSE event stream
pub async fn event_stream(
    State(ctx): State<AppContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = ctx.scheduler.state().subscribe();
    debug!("New SSE client connected (subscriber {})", subscription.id());

    let shutdown = ctx.shutdown.clone();
    let stream = ReceiverStream::new(subscription.into_receiver())
        .filter_map(|event| async move { to_sse_event(&event).map(Ok) })
        .take_until(async move { shutdown.cancelled().await });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn to_sse_event(event: &SignageEvent) -> Option<Event> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Event::default().event(event.event_type()).data(json)),
        Err(e) => {
            warn!("Failed to serialize event: {}", e);
            None
        }
    }
}
