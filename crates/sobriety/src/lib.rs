//! Sobriety Challenge
//!
//! Spoken-phrase verification triggered by the alcohol sensor:
//! - Randomized prompt from a fixed vocabulary
//! - Timed, cancellable speech capture off the sensing loop
//! - Word-overlap scoring against the prompt

pub mod capture;
pub mod challenge;
pub mod config;
pub mod prompt;

pub use capture::{run_capture, CaptureOutcome, CaptureRequest, CaptureTimings, SpeechCapture};
pub use challenge::{ChallengePhase, ChallengeStatus, FailureReason, SobrietyChallenge, Verdict};
pub use config::{SobrietyConfig, DEFAULT_VOCABULARY};
pub use prompt::{display_lines, generate_prompt, match_ratio};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Speech capture error types
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeechError {
    #[error("No speech detected before timeout")]
    TimedOut,

    #[error("Could not understand audio")]
    Unintelligible,

    #[error("Speech device error: {0}")]
    Device(String),
}
