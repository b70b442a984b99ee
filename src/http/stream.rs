//! Server-sent alert stream.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::domain::AlertEvent;

use super::AppState;

fn to_event(alert: &AlertEvent) -> Event {
    Event::default()
        .json_data(alert)
        .unwrap_or_else(|_| Event::default().comment("alert could not be encoded"))
}

/// Turn a broadcast receiver into an SSE event stream.
///
/// A lagging client skips the events it missed. The stream ends when the
/// feed shuts down.
pub fn alert_events(
    rx: broadcast::Receiver<AlertEvent>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(alert) => return Some((Ok(to_event(&alert)), rx)),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Alert subscriber lagged, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

pub async fn alert_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::info!("Alert stream client connected");
    Sse::new(alert_events(state.alerts.subscribe())).keep_alive(KeepAlive::default())
}
