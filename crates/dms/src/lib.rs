//! Driver Monitoring System (DMS)
//!
//! Turns per-frame face ratios into durable driver conditions:
//! - Eye aspect ratio debounced into drowsiness
//! - Mouth aspect ratio smoothed, calibrated and debounced into yawns
//! - Landmark helpers for computing both ratios

pub mod analysis;
pub mod calibration;
pub mod config;
pub mod drowsiness;
pub mod landmarks;
pub mod smoothing;
pub mod state;

pub use analysis::{DmsAlert, DmsAnalysis, FaceObservation, FaceSample, FrameMetrics};
pub use calibration::{CalibrationState, YawnDebouncer, YawnUpdate};
pub use config::DmsConfig;
pub use drowsiness::{DrowsinessDebouncer, DrowsinessState};
pub use landmarks::{eye_aspect_ratio, final_ear, mouth_aspect_ratio, Point};
pub use smoothing::MarSmoother;
pub use state::DriverState;

use thiserror::Error;
use tracing::debug;

/// DMS error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DmsError {
    #[error("Expected {expected} landmarks, got {actual}")]
    LandmarkCount { expected: usize, actual: usize },

    #[error("Landmarks collapse to zero width")]
    DegenerateLandmarks,
}

/// Driver monitoring module
pub struct DmsModule {
    smoother: MarSmoother,
    yawn: YawnDebouncer,
    drowsiness: DrowsinessDebouncer,
}

impl DmsModule {
    /// Create a new DMS module with configuration
    pub fn new(config: &DmsConfig) -> Self {
        Self {
            smoother: MarSmoother::new(config.mar_smooth_window),
            yawn: YawnDebouncer::new(config),
            drowsiness: DrowsinessDebouncer::new(config),
        }
    }

    /// Analyze a single frame's observation
    ///
    /// A sample with a non-finite ratio is handled as a frame without a face
    /// and never reaches the mouth baseline.
    pub fn analyze(&mut self, observation: &FaceObservation) -> DmsAnalysis {
        let sample = match observation {
            FaceObservation::Face(sample) if sample.is_finite() => sample,
            FaceObservation::Face(sample) => {
                debug!("Discarding non-finite face sample {:?}", sample);
                return self.analyze_absent();
            }
            FaceObservation::NoFace => return self.analyze_absent(),
        };

        let mut alerts = Vec::new();

        let smoothed = self.smoother.push(sample.mouth_aspect_ratio);
        let yawn = self.yawn.update(smoothed);
        if yawn.yawn_triggered {
            alerts.push(DmsAlert::Yawn);
        }

        if self.drowsiness.update(sample.eye_aspect_ratio) {
            alerts.push(DmsAlert::Drowsiness);
        }

        DmsAnalysis {
            face_detected: true,
            metrics: Some(FrameMetrics {
                eye_aspect_ratio: sample.eye_aspect_ratio,
                mouth_aspect_ratio_smoothed: smoothed,
            }),
            calibrating: yawn.calibrating,
            alerts,
        }
    }

    fn analyze_absent(&mut self) -> DmsAnalysis {
        // A missing face is never evidence of drowsiness, and calibration
        // progress is left untouched.
        self.drowsiness.reset();

        DmsAnalysis {
            face_detected: false,
            metrics: None,
            calibrating: self.yawn.is_calibrating(),
            alerts: vec![],
        }
    }

    /// Current debouncer state
    pub fn state(&self) -> DriverState {
        DriverState {
            calibration: self.yawn.state(),
            drowsiness: self.drowsiness.state(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_face() -> FaceObservation {
        FaceObservation::face(0.3, 0.2)
    }

    #[test]
    fn test_no_yawn_while_calibrating() {
        let mut dms = DmsModule::new(&DmsConfig::default());
        for _ in 0..29 {
            let analysis = dms.analyze(&FaceObservation::face(0.3, 5.0));
            assert!(analysis.calibrating);
            assert!(!analysis.is_yawning());
        }
    }

    #[test]
    fn test_yawn_after_calibration() {
        let mut dms = DmsModule::new(&DmsConfig::default());
        for _ in 0..30 {
            dms.analyze(&open_face());
        }
        // Smoothed window needs enough wide-open frames to clear 1.7x
        let mut yawned = false;
        for _ in 0..10 {
            yawned |= dms.analyze(&FaceObservation::face(0.3, 0.8)).is_yawning();
        }
        assert!(yawned);
    }

    #[test]
    fn test_no_face_resets_drowsiness_not_calibration() {
        let mut dms = DmsModule::new(&DmsConfig::default());
        for _ in 0..10 {
            dms.analyze(&FaceObservation::face(0.1, 0.2));
        }
        let analysis = dms.analyze(&FaceObservation::NoFace);
        assert!(!analysis.face_detected);
        assert!(!analysis.fatigue_triggered());

        let state = dms.state();
        assert_eq!(state.drowsiness.consecutive_low_ear_frames, 0);
        assert_eq!(state.calibration.samples_taken, 10);
    }

    #[test]
    fn test_sustained_absence_raises_nothing() {
        let mut dms = DmsModule::new(&DmsConfig::default());
        for _ in 0..100 {
            let analysis = dms.analyze(&FaceObservation::NoFace);
            assert!(analysis.alerts.is_empty());
        }
    }

    #[test]
    fn test_non_finite_sample_does_not_poison_baseline() {
        let mut dms = DmsModule::new(&DmsConfig::default());
        let analysis = dms.analyze(&FaceObservation::face(0.3, f64::NAN));
        assert!(!analysis.face_detected);
        assert_eq!(dms.state().calibration.samples_taken, 0);

        for _ in 0..30 {
            dms.analyze(&open_face());
        }
        let baseline = dms.state().calibration.baseline_mouth_ratio.unwrap();
        assert!(baseline.is_finite());

        let mut yawned = false;
        for _ in 0..10 {
            yawned |= dms.analyze(&FaceObservation::face(0.3, 5.0)).is_yawning();
        }
        assert!(yawned);
    }

    #[test]
    fn test_non_finite_eye_ratio_breaks_closed_run() {
        let mut dms = DmsModule::new(&DmsConfig::default());
        for _ in 0..19 {
            dms.analyze(&FaceObservation::face(0.1, 0.2));
        }
        let analysis = dms.analyze(&FaceObservation::face(f64::INFINITY, 0.2));
        assert!(!analysis.fatigue_triggered());
        assert_eq!(dms.state().drowsiness.consecutive_low_ear_frames, 0);
        assert!(!dms.analyze(&FaceObservation::face(0.1, 0.2)).is_drowsy());
    }
}
