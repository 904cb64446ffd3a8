//! Out-of-band speech capture with a hard timeout

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::SpeechError;

/// Durations handed to the speech port for one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureTimings {
    pub ambient_calibration: Duration,
    pub listen_timeout: Duration,
    pub phrase_limit: Duration,
}

impl CaptureTimings {
    pub fn total(&self) -> Duration {
        self.ambient_calibration + self.listen_timeout + self.phrase_limit
    }
}

/// Ticket for one capture attempt; `challenge_id` ties the result back
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRequest {
    pub challenge_id: u64,
    pub prompt: String,
    pub timings: CaptureTimings,
}

/// Result of a capture attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureOutcome {
    /// Transcribed text
    Heard(String),
    /// Timeout, unintelligible audio or a device failure
    Failed(SpeechError),
}

/// Microphone + speech-to-text port; may block for the whole attempt
pub trait SpeechCapture: Send + Sync + 'static {
    fn capture(&self, timings: &CaptureTimings) -> Result<String, SpeechError>;
}

/// Run a capture on the blocking pool, resolving to `Failed(TimedOut)` if it
/// overruns its budget instead of hanging the caller.
pub async fn run_capture(capture: Arc<dyn SpeechCapture>, request: &CaptureRequest) -> CaptureOutcome {
    let timings = request.timings;
    let budget = timings.total();
    info!("Listening for sobriety phrase (challenge {})", request.challenge_id);

    let task = tokio::task::spawn_blocking(move || capture.capture(&timings));

    match tokio::time::timeout(budget, task).await {
        Ok(Ok(Ok(text))) => CaptureOutcome::Heard(text.to_lowercase()),
        Ok(Ok(Err(e))) => {
            warn!("Speech capture failed: {}", e);
            CaptureOutcome::Failed(e)
        }
        Ok(Err(join_error)) => {
            warn!("Speech capture task aborted: {}", join_error);
            CaptureOutcome::Failed(SpeechError::Device(join_error.to_string()))
        }
        Err(_) => {
            warn!("Speech capture exceeded {:?}", budget);
            CaptureOutcome::Failed(SpeechError::TimedOut)
        }
    }
}
