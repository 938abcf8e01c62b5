/*
 * Responsibility
 * - GET /ws/locations (WebSocket)
 * - クライアントから受けた位置を検証し、AuthCtx の user id を付けて LocationHub に流す
 * - Hub からの更新を全クライアントへ配信する
 * - ソケット上の失敗は WebSocketError で表し、ログに残す
 */
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use chrono::Utc;
use futures::{Sink, SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;

use crate::{
    api::v1::{
        dto::locations::{LocationPayload, ServerFrame},
        extractors::{AuthCtx, AuthCtxExtractor},
    },
    services::realtime::{LocationHub, LocationUpdate, WebSocketError},
    state::AppState,
};

const PING_INTERVAL: Duration = Duration::from_secs(30);

pub async fn locations_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    AuthCtxExtractor(auth): AuthCtxExtractor,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state.locations, auth))
}

/// Parse, validate and publish one client frame.
pub fn publish_frame(
    hub: &LocationHub,
    auth: &AuthCtx,
    text: &str,
) -> Result<LocationUpdate, WebSocketError> {
    let payload: LocationPayload = serde_json::from_str(text)
        .map_err(|e| WebSocketError::with_source("invalid location frame", e))?;

    payload.validate().map_err(WebSocketError::new)?;

    let update = LocationUpdate {
        user_id: auth.user_id.clone(),
        latitude: payload.latitude,
        longitude: payload.longitude,
        timestamp: Utc::now(),
    };
    hub.publish(update.clone());

    Ok(update)
}

async fn send_frame<S>(sender: &mut S, frame: &ServerFrame) -> Result<(), WebSocketError>
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    let text = serde_json::to_string(frame)
        .map_err(|e| WebSocketError::with_source("encode frame failed", e))?;

    sender
        .send(Message::Text(text.into()))
        .await
        .map_err(|e| WebSocketError::with_source("send failed", e))
}

async fn handle_socket(socket: WebSocket, hub: LocationHub, auth: AuthCtx) {
    let (mut sender, mut receiver) = socket.split();
    let mut updates = hub.subscribe();

    let mut ping = tokio::time::interval(PING_INTERVAL);
    ping.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    tracing::info!(
        user_id = %auth.user_id,
        subscribers = hub.subscriber_count(),
        "location socket connected"
    );

    loop {
        // Ok(false): client went away
        let step: Result<bool, WebSocketError> = tokio::select! {
            update = updates.recv() => match update {
                Ok(update) => send_frame(&mut sender, &ServerFrame::Location(update))
                    .await
                    .map(|_| true),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(user_id = %auth.user_id, skipped, "location subscriber lagged");
                    Ok(true)
                }
                Err(RecvError::Closed) => Err(WebSocketError::new("location channel closed")),
            },

            _ = ping.tick() => sender
                .send(Message::Ping(Bytes::new()))
                .await
                .map(|_| true)
                .map_err(|e| WebSocketError::with_source("ping failed", e)),

            msg = receiver.next() => match msg {
                Some(Ok(Message::Text(text))) => match publish_frame(&hub, &auth, text.as_str()) {
                    Ok(_) => Ok(true),
                    Err(err) => {
                        tracing::debug!(user_id = %auth.user_id, error = %err, "rejected location frame");
                        let frame = ServerFrame::Error {
                            message: err.message().to_string(),
                        };
                        send_frame(&mut sender, &frame).await.map(|_| true)
                    }
                },
                Some(Ok(Message::Close(_))) | None => Ok(false),
                // Pong / Binary: nothing to do (pings are answered by axum)
                Some(Ok(_)) => Ok(true),
                Some(Err(e)) => Err(WebSocketError::with_source("receive failed", e)),
            },
        };

        match step {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => {
                tracing::warn!(
                    user_id = %auth.user_id,
                    error = %err,
                    cause = ?std::error::Error::source(&err),
                    "location socket failed"
                );
                break;
            }
        }
    }

    tracing::info!(user_id = %auth.user_id, "location socket closed");
}
