//! Sobriety challenge lifecycle
//!
//! `Idle -> Active` when the gas reading crosses the threshold while no
//! challenge is pending. A capture result moves `Active` to passed or
//! failed and always back to `Idle`; a failure additionally latches
//! `failed` until an external reset.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::capture::{CaptureOutcome, CaptureRequest, CaptureTimings};
use crate::config::SobrietyConfig;
use crate::prompt::{generate_prompt, match_ratio};

/// Where the challenge currently stands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengePhase {
    Idle,
    Active { prompt: String, capturing: bool },
}

/// Why a challenge failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FailureReason {
    /// Enough words were not heard
    Mismatch { ratio: f64 },
    /// Capture timed out or was unintelligible
    CaptureFailed(String),
}

/// Decision for a completed capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Verdict {
    Passed { ratio: f64 },
    Failed(FailureReason),
}

/// Serializable view for status displays
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChallengeStatus {
    pub active: bool,
    pub prompt_text: Option<String>,
    pub capturing: bool,
    pub failed: bool,
}

/// Sobriety challenge state owned by the engine
pub struct SobrietyChallenge {
    config: SobrietyConfig,
    phase: ChallengePhase,
    failed: bool,
    challenge_id: u64,
    rng: StdRng,
}

impl SobrietyChallenge {
    pub fn new(config: SobrietyConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Deterministic prompts for tests and replays
    pub fn with_rng(config: SobrietyConfig, rng: StdRng) -> Self {
        Self {
            config,
            phase: ChallengePhase::Idle,
            failed: false,
            challenge_id: 0,
            rng,
        }
    }

    /// Start a challenge if the reading is over threshold and none is pending
    ///
    /// Returns the new prompt when a challenge starts.
    pub fn observe_gas(&mut self, reading: Option<f64>) -> Option<String> {
        if self.is_active() || !self.alcohol_detected(reading) {
            return None;
        }

        let prompt = generate_prompt(&self.config.vocabulary, self.config.prompt_words, &mut self.rng);
        self.challenge_id += 1;
        self.phase = ChallengePhase::Active {
            prompt: prompt.clone(),
            capturing: false,
        };
        warn!(
            "Alcohol detected ({:.0}) - sobriety test {} required: {}",
            reading.unwrap_or_default(),
            self.challenge_id,
            prompt
        );
        Some(prompt)
    }

    /// One-off threshold check; never changes challenge state
    pub fn alcohol_detected(&self, reading: Option<f64>) -> bool {
        sensors::alcohol_detected(reading, self.config.alcohol_threshold)
    }

    /// Hand out a capture ticket for the pending challenge
    ///
    /// `None` when idle or when a capture is already running.
    pub fn begin_capture(&mut self) -> Option<CaptureRequest> {
        let timings = self.timings();
        match &mut self.phase {
            ChallengePhase::Active { prompt, capturing } if !*capturing => {
                *capturing = true;
                Some(CaptureRequest {
                    challenge_id: self.challenge_id,
                    prompt: prompt.clone(),
                    timings,
                })
            }
            _ => None,
        }
    }

    /// Apply a capture result; stale results (reset or superseded) are ignored
    pub fn complete_capture(&mut self, challenge_id: u64, outcome: &CaptureOutcome) -> Option<Verdict> {
        let prompt = match &self.phase {
            ChallengePhase::Active {
                prompt,
                capturing: true,
            } if challenge_id == self.challenge_id => prompt.clone(),
            _ => {
                info!("Ignoring capture result for stale challenge {}", challenge_id);
                return None;
            }
        };

        let verdict = match outcome {
            CaptureOutcome::Heard(text) => {
                let ratio = match_ratio(&prompt, text);
                if ratio >= self.config.pass_ratio {
                    Verdict::Passed { ratio }
                } else {
                    Verdict::Failed(FailureReason::Mismatch { ratio })
                }
            }
            CaptureOutcome::Failed(e) => Verdict::Failed(FailureReason::CaptureFailed(e.to_string())),
        };

        match &verdict {
            Verdict::Passed { ratio } => {
                info!("Sobriety test PASSED ({:.0}% match)", ratio * 100.0);
                self.failed = false;
            }
            Verdict::Failed(reason) => {
                warn!("Sobriety test FAILED: {:?}", reason);
                self.failed = true;
            }
        }
        self.phase = ChallengePhase::Idle;
        Some(verdict)
    }

    /// External reset: drop any pending challenge and the failed latch
    pub fn reset(&mut self) {
        self.phase = ChallengePhase::Idle;
        self.failed = false;
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, ChallengePhase::Active { .. })
    }

    /// Failed and not yet reset
    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn prompt(&self) -> Option<&str> {
        match &self.phase {
            ChallengePhase::Active { prompt, .. } => Some(prompt),
            ChallengePhase::Idle => None,
        }
    }

    pub fn phase(&self) -> &ChallengePhase {
        &self.phase
    }

    pub fn status(&self) -> ChallengeStatus {
        ChallengeStatus {
            active: self.is_active(),
            prompt_text: self.prompt().map(str::to_string),
            capturing: matches!(self.phase, ChallengePhase::Active { capturing: true, .. }),
            failed: self.failed,
        }
    }

    fn timings(&self) -> CaptureTimings {
        CaptureTimings {
            ambient_calibration: Duration::from_secs(self.config.ambient_calibration_secs),
            listen_timeout: Duration::from_secs(self.config.listen_timeout_secs),
            phrase_limit: Duration::from_secs(self.config.phrase_limit_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SpeechError;

    fn challenge() -> SobrietyChallenge {
        SobrietyChallenge::with_rng(SobrietyConfig::default(), StdRng::seed_from_u64(42))
    }

    fn heard_prompt(c: &SobrietyChallenge) -> CaptureOutcome {
        CaptureOutcome::Heard(c.prompt().unwrap().to_string())
    }

    #[test]
    fn test_starts_only_above_threshold() {
        let mut c = challenge();
        assert!(c.observe_gas(None).is_none());
        assert!(c.observe_gas(Some(500.0)).is_none());
        assert!(c.observe_gas(Some(650.0)).is_some());
        assert!(c.is_active());
    }

    #[test]
    fn test_no_retrigger_while_active() {
        let mut c = challenge();
        let first = c.observe_gas(Some(900.0)).unwrap();
        for _ in 0..10 {
            assert!(c.observe_gas(Some(900.0)).is_none());
        }
        assert_eq!(c.prompt(), Some(first.as_str()));
    }

    #[test]
    fn test_probe_is_pure() {
        let c = challenge();
        assert!(c.alcohol_detected(Some(800.0)));
        assert!(!c.is_active());
    }

    #[test]
    fn test_pass_returns_to_idle() {
        let mut c = challenge();
        c.observe_gas(Some(900.0));
        let request = c.begin_capture().unwrap();
        let outcome = heard_prompt(&c);
        let verdict = c.complete_capture(request.challenge_id, &outcome).unwrap();
        assert_eq!(verdict, Verdict::Passed { ratio: 1.0 });
        assert!(!c.is_active());
        assert!(!c.failed());
    }

    #[test]
    fn test_half_match_fails_and_latches() {
        let mut c = challenge();
        c.observe_gas(Some(900.0));
        let request = c.begin_capture().unwrap();
        let half: Vec<&str> = request.prompt.split(' ').take(2).collect();
        let verdict = c
            .complete_capture(request.challenge_id, &CaptureOutcome::Heard(half.join(" ")))
            .unwrap();
        assert_eq!(verdict, Verdict::Failed(FailureReason::Mismatch { ratio: 0.5 }));
        assert!(c.failed());
        assert!(!c.is_active());

        c.reset();
        assert!(!c.failed());
    }

    #[test]
    fn test_timeout_counts_as_failure() {
        let mut c = challenge();
        c.observe_gas(Some(900.0));
        let request = c.begin_capture().unwrap();
        let verdict = c
            .complete_capture(request.challenge_id, &CaptureOutcome::Failed(SpeechError::TimedOut))
            .unwrap();
        assert!(matches!(verdict, Verdict::Failed(FailureReason::CaptureFailed(_))));
    }

    #[test]
    fn test_single_capture_at_a_time() {
        let mut c = challenge();
        assert!(c.begin_capture().is_none());
        c.observe_gas(Some(900.0));
        assert!(c.begin_capture().is_some());
        assert!(c.begin_capture().is_none());
        assert!(c.status().capturing);
    }

    #[test]
    fn test_result_after_reset_ignored() {
        let mut c = challenge();
        c.observe_gas(Some(900.0));
        let request = c.begin_capture().unwrap();
        c.reset();
        let outcome = CaptureOutcome::Failed(SpeechError::Unintelligible);
        assert!(c.complete_capture(request.challenge_id, &outcome).is_none());
        assert!(!c.failed());
    }

    #[test]
    fn test_capture_budget_matches_config() {
        let mut c = challenge();
        c.observe_gas(Some(900.0));
        let request = c.begin_capture().unwrap();
        assert_eq!(request.timings.total(), Duration::from_secs(26));
    }
}
