//! DMS configuration

use serde::{Deserialize, Serialize};

/// DMS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DmsConfig {
    /// Eye aspect ratio below which a frame counts as "eyes closed"
    pub ear_threshold: f64,

    /// Consecutive closed-eye frames before drowsiness is reported
    pub ear_consec_frames: u32,

    /// Yawn fires when smoothed MAR exceeds baseline times this factor
    pub mar_multiplier: f64,

    /// Number of raw MAR readings averaged by the smoother
    pub mar_smooth_window: usize,

    /// Frames spent establishing the neutral mouth baseline
    pub calibration_frames: u32,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            ear_threshold: 0.25,
            ear_consec_frames: 20,
            mar_multiplier: 1.7,
            mar_smooth_window: 10,
            calibration_frames: 30,
        }
    }
}
