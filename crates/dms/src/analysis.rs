//! Per-frame DMS inputs and analysis results

use serde::{Deserialize, Serialize};

/// Raw ratios produced by the landmark extractor for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceSample {
    pub eye_aspect_ratio: f64,
    pub mouth_aspect_ratio: f64,
}

/// What the face pipeline saw in a frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FaceObservation {
    Face(FaceSample),
    #[default]
    NoFace,
}

impl FaceSample {
    /// Both ratios are usable numbers
    pub fn is_finite(&self) -> bool {
        self.eye_aspect_ratio.is_finite() && self.mouth_aspect_ratio.is_finite()
    }
}

impl FaceObservation {
    pub fn face(eye_aspect_ratio: f64, mouth_aspect_ratio: f64) -> Self {
        Self::Face(FaceSample {
            eye_aspect_ratio,
            mouth_aspect_ratio,
        })
    }
}

/// Metrics after smoothing; what the rest of the system sees per frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameMetrics {
    pub eye_aspect_ratio: f64,
    pub mouth_aspect_ratio_smoothed: f64,
}

/// DMS alert types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DmsAlert {
    /// Eyes closed for the configured run of frames
    Drowsiness,

    /// Mouth open well beyond the calibrated baseline
    Yawn,
}

/// Complete DMS analysis result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DmsAnalysis {
    /// Whether a face was detected
    pub face_detected: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<FrameMetrics>,

    /// Mouth baseline still being established
    pub calibrating: bool,

    /// Active alerts
    pub alerts: Vec<DmsAlert>,
}

impl DmsAnalysis {
    pub fn is_drowsy(&self) -> bool {
        self.alerts.contains(&DmsAlert::Drowsiness)
    }

    pub fn is_yawning(&self) -> bool {
        self.alerts.contains(&DmsAlert::Yawn)
    }

    /// Drowsiness and yawning share one escalation concern
    pub fn fatigue_triggered(&self) -> bool {
        self.is_drowsy() || self.is_yawning()
    }
}
