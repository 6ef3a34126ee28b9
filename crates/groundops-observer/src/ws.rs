//! `WebSocket` stream of scheduler notifications.
//!
//! `GET /ws/notifications` forwards every
//! [`Notification`](groundops_types::Notification) as a JSON text frame, in
//! emission order. `?kinds=tick,event-processed` narrows the stream to the
//! listed notification names. Each connection owns its own broadcast
//! receiver, so a slow client only ever hurts itself.
//!
//! A client that falls behind the channel capacity receives a
//! `{"kind":"lagged","skipped":n}` frame and continues from the oldest
//! notification still buffered. UI mirrors should refetch `/api/world`
//! when they see it.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use groundops_types::Notification;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::AppState;

/// Query parameters for `GET /ws/notifications`.
#[derive(Debug, Default, Deserialize)]
pub struct StreamQuery {
    /// Comma-separated notification names to forward. Absent means all.
    pub kinds: Option<String>,
}

/// Which notification names a connection wants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindFilter {
    kinds: Option<BTreeSet<String>>,
}

impl KindFilter {
    /// Build a filter from a comma-separated list; blank entries are ignored.
    pub fn parse(list: Option<&str>) -> Self {
        let kinds: BTreeSet<String> = list
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_owned)
            .collect();
        Self {
            kinds: (!kinds.is_empty()).then_some(kinds),
        }
    }

    /// Whether `notification` passes the filter.
    pub fn accepts(&self, notification: &Notification) -> bool {
        self.kinds
            .as_ref()
            .is_none_or(|kinds| kinds.contains(notification.name()))
    }
}

/// What the connection loop should do next.
enum Flow {
    Continue,
    Close,
}

/// Upgrade to a `WebSocket` and start streaming.
pub async fn ws_notifications(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<StreamQuery>,
) -> impl IntoResponse {
    let filter = KindFilter::parse(query.kinds.as_deref());
    ws.on_upgrade(move |socket| stream(socket, state, filter))
}

async fn stream(mut socket: WebSocket, state: Arc<AppState>, filter: KindFilter) {
    let mut rx = state.subscribe();
    debug!(?filter, "Notification stream opened");

    loop {
        let flow = tokio::select! {
            received = rx.recv() => forward(&mut socket, &filter, received).await,
            incoming = socket.recv() => answer(&mut socket, incoming).await,
        };
        if matches!(flow, Flow::Close) {
            break;
        }
    }

    debug!("Notification stream closed");
}

/// Push one broadcast result to the client.
async fn forward(
    socket: &mut WebSocket,
    filter: &KindFilter,
    received: Result<Notification, RecvError>,
) -> Flow {
    let frame = match received {
        Ok(notification) if filter.accepts(&notification) => {
            match serde_json::to_string(&notification) {
                Ok(json) => json,
                Err(e) => {
                    warn!(kind = notification.name(), error = %e, "Notification not serializable");
                    return Flow::Continue;
                }
            }
        }
        Ok(_) => return Flow::Continue,
        Err(RecvError::Lagged(skipped)) => {
            debug!(skipped, "Stream client lagged");
            serde_json::json!({ "kind": "lagged", "skipped": skipped }).to_string()
        }
        Err(RecvError::Closed) => return Flow::Close,
    };
    if socket.send(Message::Text(frame.into())).await.is_err() {
        return Flow::Close;
    }
    Flow::Continue
}

/// React to a frame from the client. Only pings and closes matter.
async fn answer(
    socket: &mut WebSocket,
    incoming: Option<Result<Message, axum::Error>>,
) -> Flow {
    match incoming {
        Some(Ok(Message::Ping(payload))) => {
            if socket.send(Message::Pong(payload)).await.is_err() {
                return Flow::Close;
            }
            Flow::Continue
        }
        Some(Ok(Message::Close(_))) | None => Flow::Close,
        Some(Err(e)) => {
            debug!(error = %e, "Stream client error");
            Flow::Close
        }
        Some(Ok(_)) => Flow::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick() -> Notification {
        Notification::Tick {
            current_time: 100,
            queue_length: 0,
        }
    }

    #[test]
    fn empty_filter_accepts_everything() {
        assert!(KindFilter::parse(None).accepts(&tick()));
        assert!(KindFilter::parse(Some(" , ")).accepts(&tick()));
    }

    #[test]
    fn named_filter_is_exact() {
        let filter = KindFilter::parse(Some("event-processed, tick"));
        assert!(filter.accepts(&tick()));

        let filter = KindFilter::parse(Some("event-processed"));
        assert!(!filter.accepts(&tick()));
        assert!(filter.accepts(&Notification::EventProcessed {
            event_id: String::from("e"),
            event_type: groundops_types::SimulationEventType::AlertTrigger,
            processing_time_ms: 0,
            violations: Vec::new(),
        }));
    }
}
