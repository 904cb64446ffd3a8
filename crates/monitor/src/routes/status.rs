//! Status Routes

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use event_fusion::EngineSnapshot;

use crate::AppState;

/// Display-ready view of the latest snapshot
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub ear: String,
    pub mar: String,
    pub tilt: String,
    pub gps: String,
    pub prompt_lines: Option<[String; 2]>,
    pub accident_overlay: Option<String>,
    pub snapshot: EngineSnapshot,
}

impl From<EngineSnapshot> for StatusResponse {
    fn from(snapshot: EngineSnapshot) -> Self {
        Self {
            status: snapshot.status.to_string(),
            ear: snapshot.ear_text(),
            mar: snapshot.mar_text(),
            tilt: snapshot.tilt_text(),
            gps: snapshot.gps_text(),
            prompt_lines: snapshot.prompt_lines().map(|(first, second)| [first, second]),
            accident_overlay: snapshot.accident_overlay(),
            snapshot,
        }
    }
}

/// Get the current engine status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let snapshot = state.driver.snapshot.borrow().clone();
    Json(StatusResponse::from(snapshot))
}
