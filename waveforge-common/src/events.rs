//! Engine event types and broadcast bus
//!
//! # Architecture
//!
//! Lifecycle events fan out over a tokio broadcast channel: every
//! subscriber owns a bounded queue, so a slow SSE client can never
//! head-of-line-block the renderer or other subscribers. Events are
//! serializable for SSE transmission as tagged JSON.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Engine lifecycle events.
///
/// Delivered on the render stream (`Progress`, `Complete`, errors) and
/// mirrored on the broadcast bus so `/events` subscribers observe the
/// full engine lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngineEvent {
    /// An EDL passed validation and became the active snapshot
    EdlApplied {
        /// Document id of the accepted EDL
        edl_id: String,
        /// Derived content revision hash (12 hex chars)
        revision: String,
        /// Number of tracks in the snapshot
        track_count: usize,
        /// Total clips across all tracks
        clip_count: usize,
    },

    /// An EDL operation failed (validation or render)
    EdlError {
        /// Document id the failure refers to (may be empty)
        edl_id: String,
        /// Human-readable failure description
        reason: String,
    },

    /// Render progress update, emitted per processed block
    Progress {
        /// Fraction of the requested range rendered, in [0, 1]
        fraction: f64,
        /// Estimated seconds remaining, once measurable
        #[serde(skip_serializing_if = "Option::is_none")]
        eta_seconds: Option<f64>,
    },

    /// Terminal render success
    Complete {
        /// Path of the finished WAV file
        out_path: String,
        /// Rendered audio duration in seconds
        duration_sec: f64,
        /// SHA-256 of the fully flushed output file (64 hex chars)
        sha256: String,
    },

    /// Periodic liveness signal on subscription streams
    Heartbeat {
        /// Milliseconds since the engine service started
        monotonic_ms: u64,
    },

    /// Backend status notification (first event on every subscription)
    Backend {
        /// Status string, e.g. "ready"
        status: String,
    },

    /// Machine-readable failure on the one-shot file render stream
    Error {
        /// Stable error code (e.g. "NO_FILE_LOADED", "INVALID_RANGE")
        code: String,
        /// Human-readable failure description
        message: String,
    },
}

/// Broadcast bus for engine events.
///
/// Thin wrapper over `tokio::sync::broadcast` so emitting components
/// do not care whether anyone is listening.
pub struct EventBus {
    tx: broadcast::Sender<EngineEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events.
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers.
    ///
    /// Returns `Ok(subscriber_count)`, or `Err` when nobody is
    /// listening.
    pub fn emit(
        &self,
        event: EngineEvent,
    ) -> Result<usize, broadcast::error::SendError<EngineEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring the no-subscribers case.
    pub fn emit_lossy(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured per-subscriber buffer capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bus_new() {
        let bus = EventBus::new(64);
        assert_eq!(bus.capacity(), 64);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new(16);
        assert!(bus.emit(EngineEvent::Backend { status: "ready".into() }).is_err());
        // Lossy emit never fails
        bus.emit_lossy(EngineEvent::Heartbeat { monotonic_ms: 0 });
    }

    #[tokio::test]
    async fn test_emit_with_subscriber() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.emit(EngineEvent::EdlApplied {
            edl_id: "e1".into(),
            revision: "abc123def456".into(),
            track_count: 2,
            clip_count: 5,
        })
        .unwrap();

        match rx.recv().await.unwrap() {
            EngineEvent::EdlApplied { edl_id, revision, track_count, clip_count } => {
                assert_eq!(edl_id, "e1");
                assert_eq!(revision, "abc123def456");
                assert_eq!(track_count, 2);
                assert_eq!(clip_count, 5);
            }
            other => panic!("wrong event: {:?}", other),
        }
    }

    #[test]
    fn test_event_json_tagging() {
        let json = serde_json::to_string(&EngineEvent::Heartbeat { monotonic_ms: 1500 }).unwrap();
        assert_eq!(json, r#"{"type":"Heartbeat","monotonic_ms":1500}"#);

        // eta is omitted until measurable
        let json =
            serde_json::to_string(&EngineEvent::Progress { fraction: 0.5, eta_seconds: None })
                .unwrap();
        assert_eq!(json, r#"{"type":"Progress","fraction":0.5}"#);
    }
}
