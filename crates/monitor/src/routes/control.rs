//! Control Routes
//!
//! Manual controls forwarded to the driver loop.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tokio::sync::oneshot;
use tracing::warn;

use crate::driver::{ControlMessage, GasProbe};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ControlResponse {
    pub accepted: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CaptureResponse {
    pub challenge_id: u64,
}

fn unavailable() -> (StatusCode, Json<ControlResponse>) {
    warn!("Control request while the driver loop is stopped");
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ControlResponse {
            accepted: false,
            message: "driver loop not running".to_string(),
        }),
    )
}

/// Clear the accident latch and a failed sobriety test
pub async fn post_reset(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.driver.control.send(ControlMessage::Reset).await.is_err() {
        return unavailable();
    }
    (
        StatusCode::ACCEPTED,
        Json(ControlResponse {
            accepted: true,
            message: "reset queued".to_string(),
        }),
    )
}

/// Start listening for the pending sobriety phrase
pub async fn post_capture(State(state): State<Arc<AppState>>) -> axum::response::Response {
    let (reply, response) = oneshot::channel();
    if state
        .driver
        .control
        .send(ControlMessage::StartCapture { reply })
        .await
        .is_err()
    {
        return unavailable().into_response();
    }

    match response.await {
        Ok(Some(challenge_id)) => {
            (StatusCode::ACCEPTED, Json(CaptureResponse { challenge_id })).into_response()
        }
        Ok(None) => (
            StatusCode::CONFLICT,
            Json(ControlResponse {
                accepted: false,
                message: "no sobriety test awaiting capture".to_string(),
            }),
        )
            .into_response(),
        Err(_) => unavailable().into_response(),
    }
}

/// One-off gas check that leaves the challenge alone
pub async fn get_probe(State(state): State<Arc<AppState>>) -> axum::response::Response {
    let (reply, response) = oneshot::channel::<GasProbe>();
    if state
        .driver
        .control
        .send(ControlMessage::ProbeGas { reply })
        .await
        .is_err()
    {
        return unavailable().into_response();
    }

    match response.await {
        Ok(probe) => Json(probe).into_response(),
        Err(_) => unavailable().into_response(),
    }
}
