//! Consecutive-frame eye closure debouncer

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::DmsConfig;

/// Run length of low-EAR frames and whether it has crossed the limit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrowsinessState {
    pub consecutive_low_ear_frames: u32,
    pub active: bool,
}

/// Debounces per-frame eye closure into a sustained drowsiness signal
#[derive(Debug, Clone)]
pub struct DrowsinessDebouncer {
    state: DrowsinessState,
    threshold: f64,
    consec_frames: u32,
}

impl DrowsinessDebouncer {
    pub fn new(config: &DmsConfig) -> Self {
        Self {
            state: DrowsinessState::default(),
            threshold: config.ear_threshold,
            consec_frames: config.ear_consec_frames,
        }
    }

    /// Feed one frame's EAR; true while the closed-eye run is long enough
    pub fn update(&mut self, eye_aspect_ratio: f64) -> bool {
        if eye_aspect_ratio < self.threshold {
            self.state.consecutive_low_ear_frames =
                self.state.consecutive_low_ear_frames.saturating_add(1);
        } else {
            self.state.consecutive_low_ear_frames = 0;
        }

        let active = self.state.consecutive_low_ear_frames >= self.consec_frames;
        if active && !self.state.active {
            debug!(
                "Eyes closed for {} consecutive frames",
                self.state.consecutive_low_ear_frames
            );
        }
        self.state.active = active;
        active
    }

    /// No face in frame: the run is broken
    pub fn reset(&mut self) {
        self.state = DrowsinessState::default();
    }

    pub fn state(&self) -> DrowsinessState {
        self.state
    }
}
