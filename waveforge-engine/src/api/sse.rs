//! SSE streams for subscriptions and render progress
//!
//! Subscription streams open with a `Backend{ready}` event, replay the
//! active EDL as `EdlApplied` if one exists, then interleave relayed
//! broadcasts with heartbeats at a fixed cadence until the client
//! disconnects.

use super::server::AppContext;
use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::{BroadcastStream, IntervalStream, ReceiverStream};
use tracing::{info, warn};
use waveforge_common::events::EngineEvent;

/// Heartbeat cadence on subscription streams
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
pub struct SubscribeQuery {
    /// Optional session label, echoed in logs only
    #[serde(default)]
    pub session: Option<String>,
}

/// GET /events: subscribe to the engine event stream
pub async fn event_stream(
    State(ctx): State<AppContext>,
    Query(query): Query<SubscribeQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let service = ctx.service.clone();

    info!(
        "New event subscriber (session={})",
        query.session.as_deref().unwrap_or("-")
    );

    let mut initial = vec![EngineEvent::Backend {
        status: "ready".to_string(),
    }];
    if let Some(snapshot) = service.snapshot() {
        initial.push(EngineEvent::EdlApplied {
            edl_id: snapshot.edl.id.clone(),
            revision: snapshot.revision.clone(),
            track_count: snapshot.track_count,
            clip_count: snapshot.clip_count,
        });
    }

    let broadcasts = BroadcastStream::new(service.events().subscribe()).filter_map(|result| async {
        match result {
            Ok(event) => Some(event),
            Err(e) => {
                // Subscriber lagged behind its queue; skip the gap
                warn!("Event subscriber lagged: {:?}", e);
                None
            }
        }
    });

    let heartbeat_service = service.clone();
    let interval = tokio::time::interval_at(
        tokio::time::Instant::now() + HEARTBEAT_INTERVAL,
        HEARTBEAT_INTERVAL,
    );
    let heartbeats = IntervalStream::new(interval).map(move |_| EngineEvent::Heartbeat {
        monotonic_ms: heartbeat_service.uptime_ms(),
    });

    let events = stream::iter(initial)
        .chain(stream::select(broadcasts, heartbeats))
        .filter_map(|event| async move {
            Event::default().json_data(&event).ok().map(Ok)
        });

    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("keep-alive"),
    )
}

/// Wrap a render event channel as an SSE response.
///
/// Dropping the response (client disconnect) drops the receiver, which
/// the blocking render observes as cancellation.
pub fn sse_from_receiver(
    rx: mpsc::Receiver<EngineEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = ReceiverStream::new(rx).filter_map(|event| async move {
        Event::default().json_data(&event).ok().map(Ok)
    });

    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
