//! Mouth baseline calibration and yawn debouncing
//!
//! The first `calibration_frames` smoothed MAR samples build a neutral
//! baseline with a 0.5-factor running average (first sample seeds it). After
//! that the baseline is frozen for the session and a yawn is any sample
//! above `baseline * mar_multiplier`.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::DmsConfig;

/// Calibration progress and the frozen baseline
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationState {
    /// Samples accumulated so far
    pub samples_taken: u32,
    /// Running baseline; only trusted once calibration is complete
    pub baseline_mouth_ratio: Option<f64>,
}

/// Result of feeding one smoothed MAR sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct YawnUpdate {
    pub calibrating: bool,
    pub yawn_triggered: bool,
}

/// Yawn debouncer with built-in neutral-mouth calibration
#[derive(Debug, Clone)]
pub struct YawnDebouncer {
    state: CalibrationState,
    calibration_frames: u32,
    multiplier: f64,
}

impl YawnDebouncer {
    pub fn new(config: &DmsConfig) -> Self {
        Self {
            state: CalibrationState::default(),
            calibration_frames: config.calibration_frames,
            multiplier: config.mar_multiplier,
        }
    }

    /// Feed one smoothed mouth ratio; non-finite samples are skipped
    pub fn update(&mut self, mouth_ratio: f64) -> YawnUpdate {
        if !mouth_ratio.is_finite() {
            return YawnUpdate {
                calibrating: self.is_calibrating(),
                yawn_triggered: false,
            };
        }

        if self.is_calibrating() {
            let baseline = match self.state.baseline_mouth_ratio {
                None => mouth_ratio,
                Some(current) => (current + mouth_ratio) / 2.0,
            };
            self.state.baseline_mouth_ratio = Some(baseline);
            self.state.samples_taken += 1;

            if !self.is_calibrating() {
                info!(
                    "Mouth calibration complete: baseline MAR {:.3} after {} frames",
                    baseline, self.state.samples_taken
                );
            }

            return YawnUpdate {
                calibrating: true,
                yawn_triggered: false,
            };
        }

        YawnUpdate {
            calibrating: false,
            yawn_triggered: self.exceeds_baseline(mouth_ratio),
        }
    }

    fn exceeds_baseline(&self, mouth_ratio: f64) -> bool {
        match self.trusted_baseline() {
            Some(baseline) => mouth_ratio > baseline * self.multiplier,
            None => false,
        }
    }

    pub fn is_calibrating(&self) -> bool {
        self.state.samples_taken < self.calibration_frames
    }

    /// Baseline, but only once calibration has completed
    pub fn trusted_baseline(&self) -> Option<f64> {
        if self.is_calibrating() {
            None
        } else {
            self.state.baseline_mouth_ratio
        }
    }

    pub fn state(&self) -> CalibrationState {
        self.state
    }
}
