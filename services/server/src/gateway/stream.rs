//! Streaming chat bridge
//!
//! Connects a client-facing WebSocket to the running instance's stream
//! endpoint and pumps both directions with two independent tasks. The
//! tasks share nothing but the channel halves; whichever direction ends
//! first aborts its peer so a dead leg never leaves the other hanging.

use axum::extract::ws::{Message as ClientMessage, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as RuntimeMessage;
use tracing::debug;

use crate::gateway::GatewayError;
use crate::orchestrator::store::Endpoint;

/// Bridge a client WebSocket to the runtime's stream endpoint
pub async fn bridge(client: WebSocket, endpoint: &Endpoint) -> Result<(), GatewayError> {
    let url = format!("ws://{}/ws", endpoint);
    let (runtime, _) = connect_async(&url)
        .await
        .map_err(|e| GatewayError::Unreachable(e.to_string()))?;

    let (mut runtime_tx, mut runtime_rx) = runtime.split();
    let (mut client_tx, mut client_rx) = client.split();

    let mut to_runtime = tokio::spawn(async move {
        while let Some(message) = client_rx.next().await {
            let message = match message {
                Ok(message) => message,
                Err(e) => {
                    debug!(error = %e, "Client stream error");
                    break;
                }
            };
            let forward = match message {
                ClientMessage::Text(text) => RuntimeMessage::Text(text),
                ClientMessage::Binary(data) => RuntimeMessage::Binary(data),
                ClientMessage::Close(_) => break,
                // Pings and pongs stay on their own leg
                _ => continue,
            };
            if runtime_tx.send(forward).await.is_err() {
                break;
            }
        }
        let _ = runtime_tx.send(RuntimeMessage::Close(None)).await;
    });

    let mut to_client = tokio::spawn(async move {
        while let Some(message) = runtime_rx.next().await {
            let message = match message {
                Ok(message) => message,
                Err(e) => {
                    debug!(error = %e, "Runtime stream error");
                    break;
                }
            };
            let forward = match message {
                RuntimeMessage::Text(text) => ClientMessage::Text(text),
                RuntimeMessage::Binary(data) => ClientMessage::Binary(data),
                RuntimeMessage::Close(_) => break,
                _ => continue,
            };
            if client_tx.send(forward).await.is_err() {
                break;
            }
        }
        let _ = client_tx.send(ClientMessage::Close(None)).await;
    });

    // Whichever direction finishes first cancels the other
    tokio::select! {
        _ = &mut to_runtime => to_client.abort(),
        _ = &mut to_client => to_runtime.abort(),
    }

    debug!(endpoint = %endpoint, "Streaming session closed");
    Ok(())
}
