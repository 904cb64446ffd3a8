//! One-shot accident latch
//!
//! Once latched the accident stays detected until an explicit reset, even
//! if the vehicle settles back below the threshold.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::AccidentConfig;

/// Accident latch state
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AccidentState {
    pub detected: bool,
    pub tilt_angle_at_detection: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct AccidentLatch {
    state: AccidentState,
    threshold: f64,
}

impl AccidentLatch {
    pub fn new(config: &AccidentConfig) -> Self {
        Self {
            state: AccidentState::default(),
            threshold: config.tilt_threshold_degrees,
        }
    }

    /// Feed a tilt angle; true only on the tick that latches
    pub fn update(&mut self, tilt_angle_degrees: f64) -> bool {
        if self.state.detected || !(tilt_angle_degrees > self.threshold) {
            return false;
        }

        self.state = AccidentState {
            detected: true,
            tilt_angle_at_detection: Some(tilt_angle_degrees),
        };
        warn!("ACCIDENT DETECTED - Tilt: {:.1}°", tilt_angle_degrees);
        true
    }

    pub fn reset(&mut self) {
        self.state = AccidentState::default();
    }

    pub fn is_detected(&self) -> bool {
        self.state.detected
    }

    pub fn state(&self) -> AccidentState {
        self.state
    }
}
